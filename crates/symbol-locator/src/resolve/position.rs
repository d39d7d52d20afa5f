use lsp_types::Position;

use crate::tree::{NodeId, SymbolTree, range_contains_position};

/// Innermost symbol whose full range contains `position`.
///
/// Descends from the top level, at each step entering the first child (in
/// declaration order) that contains the position. Returns `None` when no
/// top-level symbol contains it.
pub fn resolve_at_position(
    tree: &SymbolTree,
    position: Position,
) -> Option<NodeId> {
    let mut innermost = None;
    let mut candidates = tree.roots();

    loop {
        let hit = candidates.iter().copied().find(|id| range_contains_position(&tree.node(*id).full_range, position));
        let Some(hit) = hit else {
            break;
        };
        innermost = Some(hit);
        candidates = tree.children(hit);
    }

    innermost
}
