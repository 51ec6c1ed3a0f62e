//! Serialized forms of the application tree.
//!
//! `AppSnapshot` is what the tree source hands us; `SelectionSnapshot` is the
//! caller's desired state captured before a save so it can be checked against
//! a freshly loaded forest afterwards.

use serde::{Deserialize, Deserializer, Serialize};

/// Status string the control surface reports for a running component.
pub const ACTIVE_STATE: &str = "ACTIVE";

/// One component as reported by the tree source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSnapshot {
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub children: Vec<AppSnapshot>,
}

impl AppSnapshot {
    pub fn new(name: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: state.into(),
            version: String::new(),
            children: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_child(mut self, child: AppSnapshot) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_active(&self) -> bool {
        self.state == ACTIVE_STATE
    }
}

/// Jolokia read envelope around the application tree.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationTreeResponse {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub value: Vec<AppSnapshot>,
    #[serde(default)]
    pub error: Option<String>,
}

fn default_status() -> u16 {
    200
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<AppSnapshot>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<AppSnapshot>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Desired selection of one node, captured from a live forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub app_id: String,
    pub name: String,
    pub selected: bool,
    #[serde(default)]
    pub children: Vec<SelectionSnapshot>,
}

impl SelectionSnapshot {
    /// Number of nodes in this subtree, self included.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(SelectionSnapshot::node_count)
            .sum::<usize>()
    }
}
