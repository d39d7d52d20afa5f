//! Position and name resolution against a [`SymbolTree`](crate::tree::SymbolTree).

mod name;
mod position;

use lsp_types::SymbolKind;

use crate::matcher::MatchOptions;

pub use name::resolve_by_name;
pub use position::resolve_at_position;

/// Filters applied by [`resolve_by_name`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    /// Case-insensitive substring test on the bare name instead of path matching.
    pub substring: bool,
    /// Allow-list; empty means every kind.
    pub include_kinds: Vec<SymbolKind>,
    /// Deny-list applied after `include_kinds`.
    pub exclude_kinds: Vec<SymbolKind>,
    /// Only search nodes at most this deep (0 = top level only).
    pub max_depth: Option<usize>,
}

impl SearchOptions {
    pub fn substring() -> Self {
        Self {
            substring: true,
            ..Self::default()
        }
    }

    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            substring: self.substring,
        }
    }

    pub(crate) fn accepts_kind(
        &self,
        kind: SymbolKind,
    ) -> bool {
        if !self.include_kinds.is_empty() && !self.include_kinds.contains(&kind) {
            return false;
        }
        !self.exclude_kinds.contains(&kind)
    }
}

#[cfg(test)]
#[path = "../../tests/src/resolve/resolve_tests.rs"]
mod tests;
