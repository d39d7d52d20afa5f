//! Navigable symbol tree built from provider declarations.

mod build;
mod node;

pub use build::{MAX_TREE_DEPTH, TreeBuilder};
pub use node::{NAME_PATH_SEPARATOR, NodeId, SymbolNode, SymbolTree, range_contains_position, range_contains_range};

#[cfg(test)]
#[path = "../../tests/src/tree/tree_tests.rs"]
mod tests;
