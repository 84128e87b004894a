//! Namespace tree for NSID collections.
//!
//! [`build_tree`] runs record-level filters, constructs the tree and then
//! applies the structural passes in [`transform`], each of which consumes a
//! tree and returns a new one.

pub mod build;
pub mod expansion;
pub mod node;
pub mod options;
pub mod records;
pub mod tld;
pub mod transform;

pub use build::construct;
pub use expansion::ExpansionState;
pub use node::{find_in, NodeAction, TreeNode};
pub use options::{DateRange, FilterOptions, TreeLayout};
pub use records::{filter_records, is_noisy_collection, is_transaction_collection};
pub use tld::{TldAllowList, DEFAULT_TLDS};

use nsid_types::{CollectionRecord, SchemaKeySet};
use tracing::debug;

/// Build the namespace tree for `records`
pub fn build_tree(records: &[CollectionRecord], schema_keys: &SchemaKeySet, options: &FilterOptions) -> Vec<TreeNode> {
    let selected = filter_records(records, options);
    let mut tree = construct(&selected, options.layout.root_segments);

    tree = transform::annotate_schema(tree, schema_keys);
    tree = transform::propagate_schema(tree);

    if options.except_invalid_tlds {
        tree = transform::filter_by_tld(tree, &options.allowed_tlds);
        tree = transform::propagate_schema(tree);
    }

    if options.only_with_schema {
        tree = transform::filter_by_schema(tree);
        tree = transform::propagate_schema(tree);
    }

    tree = transform::prune(tree);
    tree = transform::sort(tree);

    if options.layout.compress {
        tree = transform::compress(tree);
    }

    let tree = transform::assign_addresses(tree);
    debug!(
        "Built namespace tree with {} roots from {} of {} collections",
        tree.len(),
        selected.len(),
        records.len()
    );
    tree
}
