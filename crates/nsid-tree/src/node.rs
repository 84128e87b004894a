use serde::{Deserialize, Serialize};

/// What a click on a node should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeAction {
    /// Expand or collapse a folder node
    Toggle,
    /// Open the detail view of the collection with this name
    OpenDetail(String),
    /// Intermediate node with nothing under it
    Ignore,
}

/// A node of the namespace tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Hierarchical address such as "3-1-2", regenerated on every build
    pub id: String,
    /// Dot-joined prefix of one or more collection names
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
    /// Set when this node or any descendant matches a schema key
    pub has_schema: bool,
    /// Set when `path` is exactly the name of an indexed collection
    pub is_record: bool,
    /// Set when any collection at or under this node is new
    pub is_new: bool,
    #[serde(skip)]
    pub(crate) matches_schema: bool,
}

impl TreeNode {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            path: path.into(),
            children: Some(Vec::new()),
            has_schema: false,
            is_record: false,
            is_new: false,
            matches_schema: false,
        }
    }

    /// Last dot segment of the path
    pub fn label(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    pub fn children(&self) -> &[TreeNode] {
        self.children.as_deref().unwrap_or_default()
    }

    /// No children attribute and an empty list both render as a leaf
    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    /// Only a record leaf opens a detail view
    pub fn activate(&self) -> NodeAction {
        if !self.is_leaf() {
            NodeAction::Toggle
        } else if self.is_record {
            NodeAction::OpenDetail(self.path.clone())
        } else {
            NodeAction::Ignore
        }
    }

    /// Depth-first search for a node by path, including `self`
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        if self.path == path {
            return Some(self);
        }
        if !path.starts_with(self.path.as_str()) {
            return None;
        }
        self.children().iter().find_map(|child| child.find(path))
    }

    /// Pre-order visit of this node and its descendants
    pub fn visit<F: FnMut(&TreeNode)>(&self, f: &mut F) {
        f(self);
        for child in self.children() {
            child.visit(f);
        }
    }

    /// Number of nodes in this subtree
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(TreeNode::size).sum::<usize>()
    }
}

/// Find a node by path across a forest
pub fn find_in<'a>(nodes: &'a [TreeNode], path: &str) -> Option<&'a TreeNode> {
    nodes.iter().find_map(|node| node.find(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(path: &str, children: Vec<TreeNode>) -> TreeNode {
        TreeNode {
            children: Some(children),
            ..TreeNode::new(path)
        }
    }

    fn leaf(path: &str, is_record: bool) -> TreeNode {
        TreeNode {
            children: None,
            is_record,
            ..TreeNode::new(path)
        }
    }

    #[test]
    fn test_activate() {
        assert_eq!(folder("a.b", vec![leaf("a.b.c", true)]).activate(), NodeAction::Toggle);
        assert_eq!(leaf("a.b.c", true).activate(), NodeAction::OpenDetail("a.b.c".to_string()));
        assert_eq!(leaf("a.b", false).activate(), NodeAction::Ignore);
        assert_eq!(folder("a.b", vec![]).activate(), NodeAction::Ignore);
    }

    #[test]
    fn test_find_and_size() {
        let tree = folder("a.b", vec![folder("a.b.c", vec![leaf("a.b.c.d", true)]), leaf("a.b.e", true)]);

        assert_eq!(tree.size(), 4);
        assert_eq!(tree.find("a.b.c.d").unwrap().label(), "d");
        assert!(tree.find("a.bc").is_none());
        assert!(find_in(std::slice::from_ref(&tree), "a.b.e").is_some());
    }

    #[test]
    fn test_serialized_shape_omits_missing_children() {
        let json = serde_json::to_value(leaf("a.b.c", true)).unwrap();
        assert!(json.get("children").is_none());
        assert_eq!(json["isRecord"], true);
        assert!(json.get("matchesSchema").is_none());
    }
}
