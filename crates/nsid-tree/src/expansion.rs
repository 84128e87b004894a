use std::collections::BTreeSet;

use crate::node::{NodeAction, TreeNode};

/// Which folder nodes are expanded, keyed by path so the state outlives rebuilds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: BTreeSet<String>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, node: &TreeNode) -> bool {
        self.expanded.contains(&node.path)
    }

    /// Handle a click: folders toggle, record leaves report a detail request
    pub fn interact(&mut self, node: &TreeNode) -> NodeAction {
        let action = node.activate();
        if action == NodeAction::Toggle && !self.expanded.remove(&node.path) {
            self.expanded.insert(node.path.clone());
        }
        action
    }

    pub fn expand_all(&mut self, nodes: &[TreeNode]) {
        for node in nodes {
            node.visit(&mut |n| {
                if !n.is_leaf() {
                    self.expanded.insert(n.path.clone());
                }
            });
        }
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Forget paths that no longer exist in `nodes`
    pub fn retain_existing(&mut self, nodes: &[TreeNode]) {
        let mut present = BTreeSet::new();
        for node in nodes {
            node.visit(&mut |n| {
                present.insert(n.path.clone());
            });
        }
        self.expanded.retain(|path| present.contains(path));
    }
}
