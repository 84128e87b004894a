//! Structural passes over a built tree. Each pass consumes its input and
//! returns a new tree, so no flag survives from one build into the next.

use nsid_types::SchemaKeySet;

use crate::node::TreeNode;
use crate::tld::TldAllowList;

/// Mark nodes whose own path contains a schema key
pub fn annotate_schema(nodes: Vec<TreeNode>, keys: &SchemaKeySet) -> Vec<TreeNode> {
    nodes
        .into_iter()
        .map(|mut node| {
            node.matches_schema = keys.matches(&node.path);
            node.children = node.children.map(|children| annotate_schema(children, keys));
            node
        })
        .collect()
}

/// Recompute `has_schema` bottom-up from the per-node matches
pub fn propagate_schema(nodes: Vec<TreeNode>) -> Vec<TreeNode> {
    nodes
        .into_iter()
        .map(|mut node| {
            node.children = node.children.map(propagate_schema);
            node.has_schema = node.matches_schema || node.children().iter().any(|c| c.has_schema);
            node
        })
        .collect()
}

fn retain_nodes<F>(nodes: Vec<TreeNode>, keep: &F) -> Vec<TreeNode>
where
    F: Fn(&TreeNode) -> bool,
{
    nodes
        .into_iter()
        .filter_map(|mut node| {
            node.children = node.children.map(|children| retain_nodes(children, keep));
            if keep(&node) || !node.is_leaf() {
                Some(node)
            } else {
                None
            }
        })
        .collect()
}

/// Keep nodes under an accepted top-level label, or with surviving children
pub fn filter_by_tld(nodes: Vec<TreeNode>, allowed: &TldAllowList) -> Vec<TreeNode> {
    retain_nodes(nodes, &|node: &TreeNode| allowed.allows_path(&node.path))
}

/// Keep nodes flagged `has_schema`, or with surviving children
pub fn filter_by_schema(nodes: Vec<TreeNode>) -> Vec<TreeNode> {
    retain_nodes(nodes, &|node: &TreeNode| node.has_schema)
}

/// Replace empty children lists with no list at all
pub fn prune(nodes: Vec<TreeNode>) -> Vec<TreeNode> {
    nodes
        .into_iter()
        .map(|mut node| {
            node.children = node
                .children
                .filter(|children| !children.is_empty())
                .map(prune);
            node
        })
        .collect()
}

/// Order siblings by path, ignoring case first
pub fn sort(nodes: Vec<TreeNode>) -> Vec<TreeNode> {
    let mut nodes: Vec<TreeNode> = nodes
        .into_iter()
        .map(|mut node| {
            node.children = node.children.map(sort);
            node
        })
        .collect();
    nodes.sort_by(|a, b| {
        a.path
            .to_lowercase()
            .cmp(&b.path.to_lowercase())
            .then_with(|| a.path.cmp(&b.path))
    });
    nodes
}

/// Splice single-folder chains: while a node's only child is an intermediate
/// folder, the grandchildren replace it. Flags are merged upward. A child that
/// is itself a collection is never spliced away.
pub fn compress(nodes: Vec<TreeNode>) -> Vec<TreeNode> {
    nodes
        .into_iter()
        .map(|mut node| {
            while let Some(mut children) = node.children.take() {
                let splice = children.len() == 1 && !children[0].is_leaf() && !children[0].is_record;
                if !splice {
                    node.children = Some(children);
                    break;
                }

                let only_child = children.remove(0);
                node.has_schema |= only_child.has_schema;
                node.is_new |= only_child.is_new;
                node.children = only_child.children;
            }
            node.children = node.children.map(compress);
            node
        })
        .collect()
}

fn assign_with_prefix(nodes: Vec<TreeNode>, prefix: Option<&str>) -> Vec<TreeNode> {
    nodes
        .into_iter()
        .enumerate()
        .map(|(index, mut node)| {
            node.id = match prefix {
                Some(prefix) => format!("{}-{}", prefix, index + 1),
                None => (index + 1).to_string(),
            };
            let id = node.id.clone();
            node.children = node.children.map(|children| assign_with_prefix(children, Some(&id)));
            node
        })
        .collect()
}

/// Give every node its depth-first address: "1", "1-2", "1-2-1", ...
pub fn assign_addresses(nodes: Vec<TreeNode>) -> Vec<TreeNode> {
    assign_with_prefix(nodes, None)
}
