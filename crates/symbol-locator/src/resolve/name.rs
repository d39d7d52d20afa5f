use super::SearchOptions;
use crate::matcher::matches_symbol;
use crate::tree::{NodeId, SymbolTree};

/// Every node matching `query`, in pre-order.
///
/// The order is significant: the first entry is the canonical match when
/// the query is ambiguous.
pub fn resolve_by_name(
    tree: &SymbolTree,
    query: &str,
    options: &SearchOptions,
) -> Vec<NodeId> {
    let match_options = options.match_options();
    tree.pre_order(options.max_depth)
        .into_iter()
        .filter(|id| {
            let node = tree.node(*id);
            matches_symbol(query, &node.name, &tree.name_path(*id), match_options)
        })
        .filter(|id| options.accepts_kind(tree.node(*id).kind))
        .collect()
}
