//! Seams to the outside world: the remote control surface that starts and
//! stops components, and the source the forest snapshot is loaded from.

pub mod file;
pub mod jolokia;

use std::future::Future;

use crate::error::{RemoteOperationError, TreeSourceError};
use crate::tree::AppSnapshot;

pub use file::FileTreeSource;
pub use jolokia::JolokiaClient;

/// Starts and stops components by name.
///
/// Repeating a start on a running component (or a stop on a stopped one)
/// must succeed.
pub trait ControlSurface: Send + Sync {
    fn start(&self, name: &str) -> impl Future<Output = Result<(), RemoteOperationError>> + Send;

    fn stop(&self, name: &str) -> impl Future<Output = Result<(), RemoteOperationError>> + Send;
}

/// Supplies the ordered, nested application tree.
pub trait TreeSource: Send + Sync {
    fn fetch_tree(&self) -> impl Future<Output = Result<Vec<AppSnapshot>, TreeSourceError>> + Send;
}
