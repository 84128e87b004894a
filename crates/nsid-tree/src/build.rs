use nsid_types::CollectionRecord;

use crate::node::TreeNode;

fn find_or_create<'a>(nodes: &'a mut Vec<TreeNode>, path: &str) -> &'a mut TreeNode {
    let index = match nodes.iter().position(|n| n.path == path) {
        Some(index) => index,
        None => {
            nodes.push(TreeNode::new(path));
            nodes.len() - 1
        }
    };
    &mut nodes[index]
}

/// Group flat collection names into a prefix tree.
///
/// The first `root_segments` segments form the root label and every longer
/// inclusive prefix gets its own node. Names with fewer than two segments, or
/// with an empty segment, are skipped. Every node comes out with a (possibly
/// empty) children list, unsorted and without addresses.
pub fn construct(records: &[CollectionRecord], root_segments: usize) -> Vec<TreeNode> {
    let root_segments = root_segments.max(1);
    let mut roots: Vec<TreeNode> = Vec::new();

    for record in records {
        let parts: Vec<&str> = record.name.split('.').collect();
        if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
            continue;
        }

        let root_depth = root_segments.min(parts.len());
        let mut node = find_or_create(&mut roots, &parts[..root_depth].join("."));
        node.is_new |= record.is_new;

        for depth in root_depth + 1..=parts.len() {
            let prefix = parts[..depth].join(".");
            let children = node.children.get_or_insert_with(Vec::new);
            node = find_or_create(children, &prefix);
            node.is_new |= record.is_new;
        }

        // only the node named exactly like the collection is a record
        node.is_record = true;
    }

    roots
}
