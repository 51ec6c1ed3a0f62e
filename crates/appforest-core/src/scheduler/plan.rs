//! Serial preview of what a save would do.

use serde::Serialize;

use crate::error::Action;
use crate::tree::{Forest, NodeId};

/// One state-changing step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStep {
    #[serde(skip)]
    pub id: NodeId,
    pub name: String,
    pub app_id: String,
    pub action: Action,
    pub depth: usize,
}

/// Both phases of a save, each in one valid serial order.
///
/// Removals are listed children first, installs parents first. Steps from
/// independent subtrees may run concurrently when actually executed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SavePlan {
    pub uninstall: Vec<PlannedStep>,
    pub install: Vec<PlannedStep>,
}

impl SavePlan {
    pub fn len(&self) -> usize {
        self.uninstall.len() + self.install.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uninstall.is_empty() && self.install.is_empty()
    }

    /// Uninstall steps followed by install steps.
    pub fn steps(&self) -> impl Iterator<Item = &PlannedStep> {
        self.uninstall.iter().chain(self.install.iter())
    }
}

impl Forest {
    /// Compute the steps a save would issue, without calling anything.
    pub fn plan(&self) -> SavePlan {
        let mut plan = SavePlan::default();
        for &root in self.roots() {
            self.plan_uninstall(root, &mut plan.uninstall);
        }
        for &root in self.roots() {
            self.plan_install(root, &mut plan.install);
        }
        plan
    }

    fn plan_uninstall(&self, id: NodeId, out: &mut Vec<PlannedStep>) {
        if self.count_dirty(id) == 0 {
            return;
        }
        for &child in self.node(id).children() {
            self.plan_uninstall(child, out);
        }
        let node = self.node(id);
        if !node.selected() && node.is_dirty() {
            out.push(self.step(id, Action::Uninstall));
        }
    }

    fn plan_install(&self, id: NodeId, out: &mut Vec<PlannedStep>) {
        if self.count_dirty(id) == 0 {
            return;
        }
        let node = self.node(id);
        if node.selected() && node.is_dirty() {
            out.push(self.step(id, Action::Install));
        }
        for &child in node.children() {
            self.plan_install(child, out);
        }
    }

    fn step(&self, id: NodeId, action: Action) -> PlannedStep {
        let node = self.node(id);
        PlannedStep {
            id,
            name: node.name().to_string(),
            app_id: node.app_id().to_string(),
            action,
            depth: self.depth(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::AppSnapshot;

    fn names(steps: &[PlannedStep]) -> Vec<&str> {
        steps.iter().map(|step| step.name.as_str()).collect()
    }

    #[test]
    fn test_uninstall_is_post_order() {
        let mut forest = Forest::from_snapshots(&[AppSnapshot::new("r", "ACTIVE")
            .with_child(
                AppSnapshot::new("c1", "ACTIVE").with_child(AppSnapshot::new("g", "ACTIVE")),
            )
            .with_child(AppSnapshot::new("c2", "ACTIVE"))]);
        let root = forest.roots()[0];
        forest.deselect(root);

        let plan = forest.plan();
        assert!(plan.install.is_empty());
        assert_eq!(names(&plan.uninstall), vec!["g", "c1", "c2", "r"]);
        assert_eq!(plan.len(), forest.num_nodes_changed());
    }

    #[test]
    fn test_install_is_pre_order() {
        let mut forest = Forest::from_snapshots(&[AppSnapshot::new("r", "INACTIVE").with_child(
            AppSnapshot::new("c", "INACTIVE").with_child(AppSnapshot::new("g", "INACTIVE")),
        )]);
        let grandchild = forest.find("g").unwrap();
        forest.select(grandchild);

        let plan = forest.plan();
        assert!(plan.uninstall.is_empty());
        assert_eq!(names(&plan.install), vec!["r", "c", "g"]);
        assert_eq!(plan.install[2].depth, 2);
    }

    #[test]
    fn test_mixed_plan_covers_every_dirty_node_once() {
        let mut forest = Forest::from_snapshots(&[
            AppSnapshot::new("a", "ACTIVE").with_child(AppSnapshot::new("a1", "ACTIVE")),
            AppSnapshot::new("b", "INACTIVE").with_child(AppSnapshot::new("b1", "INACTIVE")),
        ]);
        let a1 = forest.find("a1").unwrap();
        let b1 = forest.find("b1").unwrap();
        forest.deselect(a1);
        forest.select(b1);

        let plan = forest.plan();
        assert_eq!(names(&plan.uninstall), vec!["a1"]);
        assert_eq!(names(&plan.install), vec!["b", "b1"]);
        assert_eq!(plan.steps().count(), forest.num_nodes_changed());
    }

    #[test]
    fn test_clean_forest_has_empty_plan() {
        let forest = Forest::from_snapshots(&[AppSnapshot::new("a", "ACTIVE")]);
        assert!(forest.plan().is_empty());
    }
}
