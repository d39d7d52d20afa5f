use lsp_types::{Position, SymbolKind};

use super::*;
use crate::test_support::{range, sample_symbols, symbol, test_uri};
use crate::tree::SymbolTree;

fn sample_tree() -> SymbolTree {
    SymbolTree::from_document_symbols(test_uri("sample.ts"), sample_symbols())
}

fn paths(
    tree: &SymbolTree,
    ids: &[crate::tree::NodeId],
) -> Vec<String> {
    ids.iter().map(|id| tree.name_path(*id)).collect()
}

fn path_at(
    tree: &SymbolTree,
    line: u32,
    character: u32,
) -> Option<String> {
    resolve_at_position(tree, Position::new(line, character)).map(|id| tree.name_path(id))
}

#[test]
fn position_resolves_innermost_symbol() {
    let tree = sample_tree();
    assert_eq!(path_at(&tree, 8, 10).as_deref(), Some("Root/Level1/Level2/DeepClass/deepMethod"));
    assert_eq!(path_at(&tree, 4, 6).as_deref(), Some("Root/Level1/MidClass/processData"));
    assert_eq!(path_at(&tree, 15, 5).as_deref(), Some("Root/MyClass/value"));
}

#[test]
fn position_between_children_resolves_to_enclosing_symbol() {
    let tree = sample_tree();
    // Comment inside DeepClass's body.
    assert_eq!(path_at(&tree, 9, 10).as_deref(), Some("Root/Level1/Level2/DeepClass"));
    // Blank line inside Root.
    assert_eq!(path_at(&tree, 17, 0).as_deref(), Some("Root"));
}

#[test]
fn position_outside_every_declaration_is_none() {
    let tree = sample_tree();
    assert_eq!(path_at(&tree, 0, 5), None);
    assert_eq!(path_at(&tree, 22, 0), None);
    assert_eq!(path_at(&tree, 9999, 9999), None);
    assert_eq!(path_at(&tree, 21, 26), None);
}

#[test]
fn position_in_empty_tree_is_none() {
    let tree = SymbolTree::empty(test_uri("empty.ts"));
    assert_eq!(resolve_at_position(&tree, Position::new(0, 0)), None);
}

#[test]
fn overlapping_siblings_prefer_first_declared() {
    let symbols = vec![
        symbol("first", SymbolKind::FUNCTION, range(0, 0, 5, 0), range(0, 9, 0, 14), vec![]),
        symbol("second", SymbolKind::FUNCTION, range(3, 0, 8, 0), range(3, 9, 3, 15), vec![]),
    ];
    let tree = SymbolTree::from_document_symbols(test_uri("overlap.ts"), symbols);
    assert_eq!(path_at(&tree, 4, 0).as_deref(), Some("first"));
    assert_eq!(path_at(&tree, 6, 0).as_deref(), Some("second"));
}

#[test]
fn name_resolution_preserves_pre_order() {
    let tree = sample_tree();
    let hits = resolve_by_name(&tree, "processData", &SearchOptions::default());
    assert_eq!(
        paths(&tree, &hits),
        vec!["Root/Level1/MidClass/processData", "Root/MyClass/processData", "processData"]
    );
}

#[test]
fn name_resolution_supports_nested_and_absolute_paths() {
    let tree = sample_tree();
    let nested = resolve_by_name(&tree, "MyClass/processData", &SearchOptions::default());
    assert_eq!(paths(&tree, &nested), vec!["Root/MyClass/processData"]);

    let absolute = resolve_by_name(&tree, "/processData", &SearchOptions::default());
    assert_eq!(paths(&tree, &absolute), vec!["processData"]);

    let partial = resolve_by_name(&tree, "Class", &SearchOptions::default());
    assert!(partial.is_empty(), "suffix match must stop at segment boundaries");
}

#[test]
fn substring_search_uses_bare_names() {
    let tree = sample_tree();
    let hits = resolve_by_name(&tree, "class", &SearchOptions::substring());
    assert_eq!(paths(&tree, &hits), vec!["Root/Level1/MidClass", "Root/Level1/Level2/DeepClass", "Root/MyClass"]);
}

#[test]
fn kind_filters_combine_allow_then_deny() {
    let tree = sample_tree();
    let include = SearchOptions {
        include_kinds: vec![SymbolKind::METHOD, SymbolKind::FUNCTION],
        ..SearchOptions::default()
    };
    assert_eq!(resolve_by_name(&tree, "processData", &include).len(), 3);

    let include_then_exclude = SearchOptions {
        include_kinds: vec![SymbolKind::METHOD, SymbolKind::FUNCTION],
        exclude_kinds: vec![SymbolKind::METHOD],
        ..SearchOptions::default()
    };
    let hits = resolve_by_name(&tree, "processData", &include_then_exclude);
    assert_eq!(paths(&tree, &hits), vec!["processData"]);

    let exclude_only = SearchOptions {
        exclude_kinds: vec![SymbolKind::NAMESPACE],
        ..SearchOptions::default()
    };
    let everything = resolve_by_name(&tree, "", &exclude_only);
    assert_eq!(everything.len(), 9);
}

#[test]
fn depth_bound_limits_search() {
    let tree = sample_tree();
    let top_only = SearchOptions {
        max_depth: Some(0),
        ..SearchOptions::default()
    };
    let hits = resolve_by_name(&tree, "processData", &top_only);
    assert_eq!(paths(&tree, &hits), vec!["processData"]);

    let two_levels = SearchOptions {
        max_depth: Some(2),
        ..SearchOptions::default()
    };
    let hits = resolve_by_name(&tree, "processData", &two_levels);
    assert_eq!(paths(&tree, &hits), vec!["Root/MyClass/processData", "processData"]);
}

#[test]
fn empty_query_enumerates_all_symbols() {
    let tree = sample_tree();
    assert_eq!(resolve_by_name(&tree, "", &SearchOptions::default()).len(), tree.len());
}

#[test]
fn every_symbol_is_found_by_its_own_name_path() {
    let tree = sample_tree();
    for id in tree.ids() {
        let path = tree.name_path(id);
        let hits = resolve_by_name(&tree, &path, &SearchOptions::default());
        assert!(hits.contains(&id), "{path} should resolve to itself");
    }
}
