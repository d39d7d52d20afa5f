use expect_test::expect;
use lsp_types::{Position, SymbolKind, Url};

use super::*;
use crate::provider::{InMemoryProvider, ProviderError};
use crate::test_support::{range, sample_symbols, symbol, test_uri};

fn sample_tree() -> SymbolTree {
    SymbolTree::from_document_symbols(test_uri("sample.ts"), sample_symbols())
}

fn find(
    tree: &SymbolTree,
    path: &str,
) -> NodeId {
    tree.ids().find(|id| tree.name_path(*id) == path).expect("symbol exists")
}

struct BrokenHover;

impl HoverProvider for BrokenHover {
    async fn hover(
        &self,
        _uri: &Url,
        _position: Position,
    ) -> Result<Option<String>, ProviderError> {
        Err(ProviderError::Unavailable("hover crashed".to_string()))
    }
}

#[test]
fn depth_parsing() {
    assert_eq!(Depth::parse("1"), Ok(Depth::Levels(1)));
    assert_eq!(Depth::parse(" 3 "), Ok(Depth::Levels(3)));
    assert_eq!(Depth::parse("ALL"), Ok(Depth::All));
    assert_eq!("all".parse::<Depth>(), Ok(Depth::All));
    for invalid in ["0", "-1", "two", "", "1.5"] {
        assert_eq!(Depth::parse(invalid), Err(ResolutionError::InvalidQuery), "{invalid:?}");
    }
}

#[test]
fn depth_one_lists_direct_children() {
    let tree = sample_tree();
    let text = ReportRenderer::default().render_plain(&tree, find(&tree, "Root"), Depth::Levels(1));
    expect![[r#"
        NAME | KIND | RANGE | SELECTION | PARENT | EOL
        Level1 | Namespace | 2:2-12:3 | 2:12-2:18 | Root | EOL
        MyClass | Class | 13:2-16:3 | 13:8-13:15 | Root | EOL
        limit | Constant | 19:2-19:19 | 19:8-19:13 | Root | EOL
    "#]]
    .assert_eq(&text);
}

#[test]
fn depth_two_includes_grandchildren() {
    let tree = sample_tree();
    let text = ReportRenderer::default().render_plain(&tree, find(&tree, "Root"), Depth::Levels(2));
    expect![[r#"
        NAME | KIND | RANGE | SELECTION | PARENT | EOL
        Level1 | Namespace | 2:2-12:3 | 2:12-2:18 | Root | EOL
        MidClass | Class | 3:4-5:5 | 3:10-3:18 | Level1 | EOL
        Level2 | Namespace | 6:4-11:5 | 6:14-6:20 | Level1 | EOL
        MyClass | Class | 13:2-16:3 | 13:8-13:15 | Root | EOL
        processData | Method | 14:4-14:20 | 14:4-14:15 | MyClass | EOL
        value | Property | 15:4-15:14 | 15:4-15:9 | MyClass | EOL
        limit | Constant | 19:2-19:19 | 19:8-19:13 | Root | EOL
    "#]]
    .assert_eq(&text);
}

#[test]
fn all_walks_to_the_leaves() {
    let tree = sample_tree();
    let renderer = ReportRenderer::default();
    let names: Vec<&str> = renderer
        .descendants(&tree, find(&tree, "Root/Level1"), Depth::All)
        .into_iter()
        .map(|id| tree.node(id).name.as_str())
        .collect();
    assert_eq!(names, vec!["MidClass", "processData", "Level2", "DeepClass", "deepMethod"]);
}

#[test]
fn configured_cap_limits_every_depth() {
    let tree = sample_tree();
    let renderer = ReportRenderer::new(1);
    let root = find(&tree, "Root");
    assert_eq!(renderer.descendants(&tree, root, Depth::All).len(), 3);
    assert_eq!(renderer.descendants(&tree, root, Depth::Levels(5)).len(), 3);
    assert_eq!(ReportRenderer::new(0), ReportRenderer::new(1));
    assert_eq!(ReportRenderer::new(1000), ReportRenderer::default());
}

#[test]
fn all_is_capped_on_very_deep_trees() {
    let mut nested = symbol("leaf", SymbolKind::FUNCTION, range(40, 0, 40, 1), range(40, 0, 40, 1), vec![]);
    for level in (0..30u32).rev() {
        nested = symbol(
            &format!("n{level}"),
            SymbolKind::NAMESPACE,
            range(level, 0, 80 - level, 1),
            range(level, 0, level, 1),
            vec![nested],
        );
    }
    let tree = SymbolTree::from_document_symbols(test_uri("deep.ts"), vec![nested]);
    let rows = ReportRenderer::default().descendants(&tree, find(&tree, "n0"), Depth::All);
    assert_eq!(rows.len(), MAX_REPORT_DEPTH);
}

#[test]
fn leaf_symbol_renders_header_only() {
    let tree = sample_tree();
    let text = ReportRenderer::default().render_plain(&tree, find(&tree, "Root/limit"), Depth::All);
    assert_eq!(text, "NAME | KIND | RANGE | SELECTION | PARENT | EOL\n");
}

#[tokio::test]
async fn hover_column_is_filled_and_escaped() {
    let mut tree = sample_tree();
    let uri = tree.uri().clone();
    let provider = InMemoryProvider::new();
    provider.set_hover(uri.clone(), Position::new(14, 4), "(method) processData(): void");
    provider.set_hover(uri, Position::new(15, 4), "value: number | string\nread-only");

    let my_class = find(&tree, "Root/MyClass");
    let text = ReportRenderer::default().render_with_hover(&mut tree, my_class, Depth::Levels(1), &provider).await;
    expect![[r#"
        NAME | KIND | RANGE | SELECTION | PARENT | HOVER_INFO | EOL
        processData | Method | 14:4-14:20 | 14:4-14:15 | MyClass | (method) processData(): void | EOL
        value | Property | 15:4-15:14 | 15:4-15:9 | MyClass | value: number \| string\nread-only | EOL
    "#]]
    .assert_eq(&text);
    assert_eq!(text.lines().count(), 3);
}

#[tokio::test]
async fn hover_failures_leave_empty_cells() {
    let mut tree = sample_tree();
    let my_class = find(&tree, "Root/MyClass");
    let text = ReportRenderer::default().render_with_hover(&mut tree, my_class, Depth::Levels(1), &BrokenHover).await;
    expect![[r#"
        NAME | KIND | RANGE | SELECTION | PARENT | HOVER_INFO | EOL
        processData | Method | 14:4-14:20 | 14:4-14:15 | MyClass |  | EOL
        value | Property | 15:4-15:14 | 15:4-15:9 | MyClass |  | EOL
    "#]]
    .assert_eq(&text);
}
