//! AppForest Core Library
//!
//! Models interdependent components as a forest of dependency trees, where a
//! component may only run while its parent runs, and applies the user's
//! install/uninstall selections against a remote control surface in
//! dependency order.

pub mod config;
pub mod control;
pub mod error;
pub mod scheduler;
pub mod tree;
pub mod validate;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{AppForestConfig, ConfigStore, ControlConfig};

    // Control surface
    pub use crate::control::{ControlSurface, FileTreeSource, JolokiaClient, TreeSource};

    // Errors
    pub use crate::error::{
        Action, RemoteFailure, RemoteOperationError, SaveError, ShapeMismatchError,
        TreeSourceError,
    };

    // Tree
    pub use crate::tree::{AppSnapshot, Forest, Node, NodeId, SelectionSnapshot};

    // Execution
    pub use crate::scheduler::{PlannedStep, SaveOptions, SavePlan, SaveReport, Scheduler};
    pub use crate::validate::ValidationReport;
}
