//! Post-save check of authoritative state against the user's intent.

use serde::Serialize;

use crate::error::ShapeMismatchError;
use crate::scheduler::percent;
use crate::tree::{ACTIVE_STATE, Forest, NodeId, SelectionSnapshot};

/// Classified outcome of a save, as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    /// App ids of nodes that were wanted but are not active.
    pub failed: Vec<String>,
    pub total: usize,
    pub done_percent: f64,
    pub message: String,
}

impl ValidationReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl Forest {
    /// Compare this freshly loaded forest against the selection captured
    /// before the save.
    ///
    /// The snapshot is paired with the forest by position and must have the
    /// same shape and order; any divergence fails before a single node is
    /// touched. Every wanted node whose status is not `ACTIVE` is flagged
    /// with `error` and listed in the report. `status` is called exactly once.
    pub fn validate_install(
        &mut self,
        desired: &[SelectionSnapshot],
        total: usize,
        status: impl FnOnce(&str, f64),
    ) -> Result<ValidationReport, ShapeMismatchError> {
        self.check_shape(desired)?;

        let mut failed = Vec::new();
        let roots = self.roots().to_vec();
        for (root, snapshot) in roots.into_iter().zip(desired) {
            self.validate_node(root, snapshot, &mut failed);
        }

        let report = classify(failed, total);
        status(&report.message, report.done_percent);
        Ok(report)
    }

    fn validate_node(&mut self, id: NodeId, desired: &SelectionSnapshot, failed: &mut Vec<String>) {
        let node = self.node_mut(id);
        if desired.selected && node.state() != ACTIVE_STATE {
            tracing::warn!(name = node.name(), state = node.state(), "wanted but not active");
            failed.push(node.app_id().to_string());
            node.error = true;
        }

        let children = self.node(id).children().to_vec();
        for (child, snapshot) in children.into_iter().zip(&desired.children) {
            self.validate_node(child, snapshot, failed);
        }
    }

    fn check_shape(&self, desired: &[SelectionSnapshot]) -> Result<(), ShapeMismatchError> {
        check_level(self, self.roots(), desired, "")
    }
}

fn check_level(
    forest: &Forest,
    live: &[NodeId],
    desired: &[SelectionSnapshot],
    path: &str,
) -> Result<(), ShapeMismatchError> {
    let location = if path.is_empty() { "/" } else { path };
    if live.len() != desired.len() {
        return Err(ShapeMismatchError {
            path: location.to_string(),
            expected: format!("{} children", desired.len()),
            found: format!("{} children", live.len()),
        });
    }

    for (&id, snapshot) in live.iter().zip(desired) {
        let node = forest.node(id);
        let child_path = format!("{}/{}", path, snapshot.name);
        if node.name() != snapshot.name {
            return Err(ShapeMismatchError {
                path: child_path,
                expected: snapshot.name.clone(),
                found: node.name().to_string(),
            });
        }
        check_level(forest, node.children(), &snapshot.children, &child_path)?;
    }
    Ok(())
}

/// Turn a fail list into the single summary line shown to the user.
fn classify(failed: Vec<String>, total: usize) -> ValidationReport {
    let (message, done_percent) = match failed.len() {
        0 => (
            format!("Total of {total} applications installed/uninstalled."),
            100.0,
        ),
        n => {
            let done = percent(total.saturating_sub(n), total.max(1));
            let message = if n == 1 {
                "An application failed to install."
            } else {
                "Several applications failed to install."
            };
            (message.to_string(), done)
        }
    };

    ValidationReport {
        failed,
        total,
        done_percent,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_success() {
        let report = classify(vec![], 4);
        assert!(report.is_success());
        assert_eq!(report.message, "Total of 4 applications installed/uninstalled.");
        assert_eq!(report.done_percent, 100.0);
    }

    #[test]
    fn test_classify_single_failure() {
        let report = classify(vec!["a".into()], 4);
        assert_eq!(report.message, "An application failed to install.");
        assert_eq!(report.done_percent, 75.0);
    }

    #[test]
    fn test_classify_several_failures() {
        let report = classify(vec!["a".into(), "b".into()], 4);
        assert_eq!(report.message, "Several applications failed to install.");
        assert_eq!(report.done_percent, 50.0);
    }

    #[test]
    fn test_classify_more_failures_than_total_clamps_to_zero() {
        let report = classify(vec!["a".into(), "b".into()], 1);
        assert_eq!(report.done_percent, 0.0);
    }

    #[test]
    fn test_classify_zero_total() {
        let report = classify(vec![], 0);
        assert_eq!(report.message, "Total of 0 applications installed/uninstalled.");
        assert_eq!(report.done_percent, 100.0);
    }
}
