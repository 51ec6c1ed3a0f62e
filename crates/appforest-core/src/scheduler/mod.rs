//! Two-phase execution of the user's selection changes.
//!
//! Phase one removes unwanted components, children before parents. Phase two
//! starts wanted components, parents before children. Phase two only begins
//! once phase one has settled across the whole forest. Within a phase every
//! child of a node runs concurrently and the node waits for all of them.
//!
//! A failed branch does not cancel its siblings: every in-flight call is
//! allowed to settle and all failures are reported together. A failure in
//! phase one skips phase two entirely. Nothing is rolled back.

pub mod plan;
pub mod progress;

use std::sync::{Mutex, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, join_all};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::control::ControlSurface;
use crate::error::{Action, RemoteOperationError, SaveError};
use crate::tree::{Forest, NodeId};

pub use plan::{PlannedStep, SavePlan};
pub use progress::{ProgressFn, ProgressTracker, percent};
pub use tokio_util::sync::CancellationToken;

/// Knobs for a single save.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Checked before every remote call. Calls already in flight finish.
    pub cancel: Option<CancellationToken>,
}

impl SaveOptions {
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Components whose state change was acknowledged, in completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub uninstalled: Vec<String>,
    pub installed: Vec<String>,
}

impl SaveReport {
    pub fn total(&self) -> usize {
        self.uninstalled.len() + self.installed.len()
    }
}

#[derive(Debug)]
enum StepFailure {
    Remote(RemoteOperationError),
    Cancelled,
}

type BranchResult = Result<(), Vec<StepFailure>>;

/// Runs the uninstall and install phases of one save against a control surface.
pub struct Scheduler<'a, C> {
    forest: &'a Forest,
    control: &'a C,
    options: SaveOptions,
    acknowledged: Mutex<SaveReport>,
}

impl<'a, C: ControlSurface> Scheduler<'a, C> {
    pub fn new(forest: &'a Forest, control: &'a C) -> Self {
        Self {
            forest,
            control,
            options: SaveOptions::default(),
            acknowledged: Mutex::new(SaveReport::default()),
        }
    }

    pub fn with_options(mut self, options: SaveOptions) -> Self {
        self.options = options;
        self
    }

    /// Apply every pending change, reporting `(message, percent)` to `progress`.
    ///
    /// With nothing dirty this returns immediately without calling `progress`.
    pub async fn run(self, progress: ProgressFn<'_>) -> Result<SaveReport, SaveError> {
        let total = self.forest.num_nodes_changed();
        if total == 0 {
            debug!("no pending changes");
            return Ok(SaveReport::default());
        }

        info!(total, "applying pending changes");
        let tracker = ProgressTracker::new(total, progress);

        let uninstalls = self
            .forest
            .roots()
            .iter()
            .map(|&root| self.uninstall(root, &tracker))
            .collect();
        if let Err(failures) = join_branches(uninstalls).await {
            warn!("uninstall phase failed, skipping install phase");
            return Err(self.save_error(failures));
        }

        let installs = self
            .forest
            .roots()
            .iter()
            .map(|&root| self.install(root, &tracker))
            .collect();
        if let Err(failures) = join_branches(installs).await {
            warn!("install phase failed");
            return Err(self.save_error(failures));
        }

        tracker.finish(&format!("Finished applying {total} changes"));
        info!(total, "all changes applied");
        Ok(self
            .acknowledged
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner))
    }

    /// Remove the subtree's unwanted components, children first.
    fn uninstall<'s>(
        &'s self,
        id: NodeId,
        tracker: &'s ProgressTracker<'s>,
    ) -> BoxFuture<'s, BranchResult> {
        async move {
            if self.forest.count_dirty(id) == 0 {
                return Ok(());
            }
            let node = self.forest.node(id);

            let children = node
                .children()
                .iter()
                .map(|&child| self.uninstall(child, tracker))
                .collect();
            if let Err(failures) = join_branches(children).await {
                debug!(name = node.name(), "not stopping, a dependent failed");
                return Err(failures);
            }

            if !node.selected() && node.is_dirty() {
                self.save(id, tracker).await.map_err(|f| vec![f])?;
            }
            Ok(())
        }
        .boxed()
    }

    /// Start the subtree's wanted components, parents first.
    fn install<'s>(
        &'s self,
        id: NodeId,
        tracker: &'s ProgressTracker<'s>,
    ) -> BoxFuture<'s, BranchResult> {
        async move {
            if self.forest.count_dirty(id) == 0 {
                return Ok(());
            }
            let node = self.forest.node(id);

            if node.selected() && node.is_dirty() {
                self.save(id, tracker).await.map_err(|f| vec![f])?;
            }

            let children = node
                .children()
                .iter()
                .map(|&child| self.install(child, tracker))
                .collect();
            join_branches(children).await
        }
        .boxed()
    }

    /// Issue the single start or stop that brings one dirty node to its
    /// desired state, and acknowledge it on success.
    async fn save(&self, id: NodeId, tracker: &ProgressTracker<'_>) -> Result<(), StepFailure> {
        let node = self.forest.node(id);
        debug_assert!(node.is_dirty(), "save called on clean node {}", node.name());

        let action = if node.selected() {
            Action::Install
        } else {
            Action::Uninstall
        };

        if self.is_cancelled() {
            debug!(name = node.name(), %action, "cancelled before request");
            return Err(StepFailure::Cancelled);
        }

        tracker.report(&format!("{} {}", action.progress_verb(), node.name()));
        info!(name = node.name(), %action, "requesting state change");

        let result = match action {
            Action::Install => self.control.start(node.name()).await,
            Action::Uninstall => self.control.stop(node.name()).await,
        };

        match result {
            Ok(()) => {
                node.acknowledge(action == Action::Install);
                self.record(action, node.name());
                Ok(())
            }
            Err(err) => {
                warn!(name = node.name(), %action, error = %err, "state change failed");
                Err(StepFailure::Remote(err))
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.options
            .cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    fn record(&self, action: Action, name: &str) {
        let mut report = self
            .acknowledged
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match action {
            Action::Install => report.installed.push(name.to_string()),
            Action::Uninstall => report.uninstalled.push(name.to_string()),
        }
    }

    fn save_error(&self, failures: Vec<StepFailure>) -> SaveError {
        let mut remote = Vec::new();
        let mut cancelled = false;
        for failure in failures {
            match failure {
                StepFailure::Remote(err) => remote.push(err),
                StepFailure::Cancelled => cancelled = true,
            }
        }

        if remote.is_empty() && cancelled {
            let completed = self
                .acknowledged
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .total();
            SaveError::Cancelled { completed }
        } else {
            SaveError::Remote(remote)
        }
    }
}

/// Wait for every branch, then merge their failures.
async fn join_branches(branches: Vec<BoxFuture<'_, BranchResult>>) -> BranchResult {
    let failures: Vec<StepFailure> = join_all(branches)
        .await
        .into_iter()
        .filter_map(Result::err)
        .flatten()
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}

impl Forest {
    /// Apply every pending selection change through `control`.
    pub async fn save<C: ControlSurface>(
        &self,
        control: &C,
        progress: ProgressFn<'_>,
    ) -> Result<SaveReport, SaveError> {
        Scheduler::new(self, control).run(progress).await
    }

    /// Same as [`Forest::save`] with explicit options such as cancellation.
    pub async fn save_with<C: ControlSurface>(
        &self,
        control: &C,
        options: SaveOptions,
        progress: ProgressFn<'_>,
    ) -> Result<SaveReport, SaveError> {
        Scheduler::new(self, control)
            .with_options(options)
            .run(progress)
            .await
    }
}
