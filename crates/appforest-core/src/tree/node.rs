//! A single component in the dependency forest.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use super::snapshot::{ACTIVE_STATE, AppSnapshot};

/// Slot index of a node inside its owning [`Forest`](super::Forest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One component: identity, last loaded status, and the user's intent.
///
/// `current_state` is atomic because every branch of a running save
/// acknowledges its own node while holding only a shared borrow of the
/// forest. No other branch ever writes it.
#[derive(Debug)]
pub struct Node {
    name: String,
    app_id: String,
    version: String,
    state: String,
    current_state: AtomicBool,
    pub(crate) selected: bool,
    pub(crate) error: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub(crate) fn from_snapshot(snapshot: &AppSnapshot, parent: Option<NodeId>) -> Self {
        let running = snapshot.state == ACTIVE_STATE;
        Self {
            name: snapshot.name.clone(),
            app_id: app_id_for(&snapshot.name),
            version: snapshot.version.clone(),
            state: snapshot.state.clone(),
            current_state: AtomicBool::new(running),
            selected: running,
            error: false,
            parent,
            children: Vec::new(),
        }
    }

    /// Identifier used to address the control surface.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name with periods removed, safe for element ids and config keys.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Raw status string from the last load, e.g. `ACTIVE`.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Whether the component was running at load time, or after this node's
    /// own save was acknowledged.
    pub fn current_state(&self) -> bool {
        self.current_state.load(Ordering::Acquire)
    }

    /// Desired state.
    pub fn selected(&self) -> bool {
        self.selected
    }

    /// Set by validation when the node did not reach its desired state.
    pub fn has_error(&self) -> bool {
        self.error
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Whether the user changed this node's selection. Does not look at children.
    pub fn is_dirty(&self) -> bool {
        self.selected != self.current_state()
    }

    pub(crate) fn acknowledge(&self, running: bool) {
        self.current_state.store(running, Ordering::Release);
    }
}

/// Strip periods so the name can be used as an element or config key.
pub fn app_id_for(name: &str) -> String {
    name.replace('.', "")
}
