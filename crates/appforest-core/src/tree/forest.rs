//! The set of dependency trees loaded from one snapshot.

use super::node::{Node, NodeId};
use super::snapshot::{AppSnapshot, SelectionSnapshot};

/// Arena of nodes plus the ordered list of roots.
///
/// Children are stored in load order and the shape never changes after
/// construction. Only selection, error flags and acknowledged state mutate.
#[derive(Debug, Default)]
pub struct Forest {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Forest {
    /// Build a forest from the tree source payload, one tree per root snapshot.
    pub fn from_snapshots(snapshots: &[AppSnapshot]) -> Self {
        let mut forest = Self::default();
        for snapshot in snapshots {
            let id = forest.insert(snapshot, None);
            forest.roots.push(id);
        }
        forest
    }

    fn insert(&mut self, snapshot: &AppSnapshot, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node::from_snapshot(snapshot, parent));
        let children: Vec<NodeId> = snapshot
            .children
            .iter()
            .map(|child| self.insert(child, Some(id)))
            .collect();
        self.nodes[id.index()].children = children;
        id
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Node for an id handed out by this forest.
    ///
    /// # Panics
    /// Panics if `id` belongs to a different forest with more nodes.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids in pre-order (parent before children, roots in load order).
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ordered = Vec::with_capacity(self.nodes.len());
        for &root in &self.roots {
            self.collect_pre_order(root, &mut ordered);
        }
        ordered
    }

    fn collect_pre_order(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        for &child in self.node(id).children() {
            self.collect_pre_order(child, out);
        }
    }

    /// Depth of a node, roots are at depth 0.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cursor = self.node(id).parent();
        while let Some(parent) = cursor {
            depth += 1;
            cursor = self.node(parent).parent();
        }
        depth
    }

    /// Look up a node by its control-surface name, falling back to its app id.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        let by_name = self.nodes.iter().position(|node| node.name() == name);
        by_name
            .or_else(|| self.nodes.iter().position(|node| node.app_id() == name))
            .map(NodeId::new)
    }

    /// Mark a node as wanted. Every ancestor becomes wanted too, since a
    /// component cannot run without its parent.
    pub fn select(&mut self, id: NodeId) {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = &mut self.nodes[current.index()];
            node.selected = true;
            cursor = node.parent;
        }
    }

    /// Mark a node as unwanted. Every descendant becomes unwanted too.
    pub fn deselect(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &mut self.nodes[current.index()];
            node.selected = false;
            stack.extend(node.children.iter().copied());
        }
    }

    pub fn set_selected(&mut self, id: NodeId, selected: bool) {
        if selected {
            self.select(id);
        } else {
            self.deselect(id);
        }
    }

    pub fn is_dirty(&self, id: NodeId) -> bool {
        self.node(id).is_dirty()
    }

    /// Number of dirty nodes in the subtree rooted at `id`, self included.
    pub fn count_dirty(&self, id: NodeId) -> usize {
        let node = self.node(id);
        usize::from(node.is_dirty())
            + node
                .children()
                .iter()
                .map(|&child| self.count_dirty(child))
                .sum::<usize>()
    }

    /// Number of dirty nodes across every tree.
    pub fn num_nodes_changed(&self) -> usize {
        self.roots.iter().map(|&root| self.count_dirty(root)).sum()
    }

    /// Dirty nodes in pre-order.
    pub fn dirty_nodes(&self) -> Vec<NodeId> {
        self.ids()
            .into_iter()
            .filter(|&id| self.is_dirty(id))
            .collect()
    }

    /// Capture the desired state of every tree, shaped like the forest.
    pub fn desired_snapshot(&self) -> Vec<SelectionSnapshot> {
        self.roots
            .iter()
            .map(|&root| self.selection_of(root))
            .collect()
    }

    fn selection_of(&self, id: NodeId) -> SelectionSnapshot {
        let node = self.node(id);
        SelectionSnapshot {
            app_id: node.app_id().to_string(),
            name: node.name().to_string(),
            selected: node.selected(),
            children: node
                .children()
                .iter()
                .map(|&child| self.selection_of(child))
                .collect(),
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Forest {
        Forest::from_snapshots(&[AppSnapshot::new("root", "INACTIVE").with_child(
            AppSnapshot::new("child", "INACTIVE")
                .with_child(AppSnapshot::new("grandchild", "INACTIVE")),
        )])
    }

    #[test]
    fn test_construction_links_parents() {
        let forest = chain();
        assert_eq!(forest.len(), 3);
        let root = forest.roots()[0];
        let child = forest.node(root).children()[0];
        let grandchild = forest.node(child).children()[0];
        assert_eq!(forest.node(child).parent(), Some(root));
        assert_eq!(forest.node(grandchild).parent(), Some(child));
        assert_eq!(forest.depth(grandchild), 2);
        assert_eq!(forest.ids(), vec![root, child, grandchild]);
    }

    #[test]
    fn test_select_is_idempotent() {
        let mut forest = chain();
        let grandchild = forest.find("grandchild").unwrap();
        forest.select(grandchild);
        let after_first = forest.desired_snapshot();
        forest.select(grandchild);
        assert_eq!(forest.desired_snapshot(), after_first);
        assert_eq!(forest.num_nodes_changed(), 3);
    }

    #[test]
    fn test_find_falls_back_to_app_id() {
        let forest = Forest::from_snapshots(&[AppSnapshot::new("ddf.catalog", "ACTIVE")]);
        assert!(forest.find("ddf.catalog").is_some());
        assert_eq!(forest.find("ddfcatalog"), forest.find("ddf.catalog"));
        assert!(forest.find("missing").is_none());
    }

    #[test]
    fn test_empty_forest_has_nothing_to_change() {
        let forest = Forest::from_snapshots(&[]);
        assert!(forest.is_empty());
        assert_eq!(forest.num_nodes_changed(), 0);
        assert!(forest.desired_snapshot().is_empty());
    }
}
