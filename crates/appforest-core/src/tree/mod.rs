//! Dependency forest model: nodes, selection propagation and dirty tracking.

pub mod forest;
pub mod node;
pub mod snapshot;

pub use forest::Forest;
pub use node::{Node, NodeId, app_id_for};
pub use snapshot::{ACTIVE_STATE, AppSnapshot, ApplicationTreeResponse, SelectionSnapshot};
