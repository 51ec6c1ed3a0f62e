//! Error types for tree loading, execution and validation.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// The state-changing request issued against the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Install,
    Uninstall,
}

impl Action {
    /// Progress verb shown to the caller ("Installing foo").
    pub fn progress_verb(self) -> &'static str {
        match self {
            Action::Install => "Installing",
            Action::Uninstall => "Uninstalling",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Install => f.pad("install"),
            Action::Uninstall => f.pad("uninstall"),
        }
    }
}

/// Why a remote start/stop call did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteFailure {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// The control surface rejected or failed to complete a request for one component.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to {action} '{name}': {reason}")]
pub struct RemoteOperationError {
    pub name: String,
    pub action: Action,
    #[source]
    pub reason: RemoteFailure,
}

impl RemoteOperationError {
    pub fn new(name: impl Into<String>, action: Action, reason: RemoteFailure) -> Self {
        Self {
            name: name.into(),
            action,
            reason,
        }
    }
}

/// Desired snapshot and live tree disagree in shape or order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("snapshot shape mismatch at {path}: expected {expected}, found {found}")]
pub struct ShapeMismatchError {
    /// Slash-separated names from the root down to the diverging position.
    pub path: String,
    pub expected: String,
    pub found: String,
}

/// Outcome of a failed save.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Every remote failure collected once all in-flight branches settled.
    #[error("{} operation(s) failed: {}", .0.len(), join_failures(.0))]
    Remote(Vec<RemoteOperationError>),

    /// The caller cancelled the save; `completed` operations were acknowledged first.
    #[error("save cancelled after {completed} completed operation(s)")]
    Cancelled { completed: usize },
}

impl SaveError {
    /// Remote failures carried by this error, empty for cancellation.
    pub fn failures(&self) -> &[RemoteOperationError] {
        match self {
            SaveError::Remote(failures) => failures,
            SaveError::Cancelled { .. } => &[],
        }
    }
}

fn join_failures(failures: &[RemoteOperationError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Fetching or decoding the tree snapshot failed.
#[derive(Debug, Error)]
pub enum TreeSourceError {
    #[error("failed to read tree from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to request application tree: {0}")]
    Request(String),

    #[error("application tree request returned status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("failed to decode application tree: {0}")]
    Decode(#[from] serde_json::Error),
}
