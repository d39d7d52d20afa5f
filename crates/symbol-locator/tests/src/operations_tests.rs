use std::{collections::HashMap, sync::Mutex};

use lsp_types::{DocumentSymbolResponse, Position};

use super::*;
use crate::provider::InMemoryProvider;
use crate::test_support::{range, sample_symbols, test_uri};

fn sample_operations() -> (SymbolOperations<InMemoryProvider>, Url) {
    let uri = test_uri("sample.ts");
    let provider = InMemoryProvider::new();
    provider.insert(uri.clone(), sample_symbols());
    provider.set_hover(uri.clone(), Position::new(15, 4), "value: number");
    (SymbolOperations::new(provider), uri)
}

fn by_name(name: &str) -> Selector {
    Selector::Name(name.to_string())
}

/// Records rename requests and answers with a single-edit workspace edit.
#[derive(Default)]
struct RecordingRenamer {
    symbols: InMemoryProvider,
    requests: Mutex<Vec<(Position, String)>>,
}

impl DeclarationProvider for RecordingRenamer {
    async fn document_symbols(
        &self,
        uri: &Url,
    ) -> Result<DocumentSymbolResponse, ProviderError> {
        self.symbols.document_symbols(uri).await
    }
}

impl RenameProvider for RecordingRenamer {
    async fn rename(
        &self,
        uri: &Url,
        position: Position,
        new_name: &str,
    ) -> Result<Option<WorkspaceEdit>, ProviderError> {
        self.requests.lock().expect("lock").push((position, new_name.to_string()));
        let edit = TextEdit::new(Range::new(position, position), new_name.to_string());
        Ok(Some(WorkspaceEdit::new(HashMap::from([(uri.clone(), vec![edit])]))))
    }
}

#[tokio::test]
async fn insert_before_targets_declaration_start() {
    let (operations, uri) = sample_operations();
    let edit = operations.insert_before(&uri, &by_name("MyClass"), "// docs").await.expect("edit");
    assert_eq!(edit.range, range(13, 2, 13, 2));
    assert_eq!(edit.new_text, "// docs\n");
}

#[tokio::test]
async fn insert_after_targets_declaration_end() {
    let (operations, uri) = sample_operations();
    let edit = operations.insert_after(&uri, &by_name("MyClass/value"), "other = 2;").await.expect("edit");
    assert_eq!(edit.range, range(15, 14, 15, 14));
    assert_eq!(edit.new_text, "\nother = 2;");
}

#[tokio::test]
async fn replace_body_covers_full_range() {
    let (operations, uri) = sample_operations();
    let edit = operations
        .replace_body(&uri, &Selector::Position(Position::new(8, 12)), "deepMethod() { return 1; }")
        .await
        .expect("edit");
    assert_eq!(edit.range, range(8, 8, 8, 23));
}

#[tokio::test]
async fn ambiguous_target_uses_canonical_match() {
    let (operations, uri) = sample_operations();
    let edit = operations.replace_body(&uri, &by_name("processData"), "").await.expect("edit");
    assert_eq!(edit.range, range(4, 6, 4, 22));
}

#[tokio::test]
async fn resolution_failures_surface_as_errors() {
    let (operations, uri) = sample_operations();

    let error = operations.insert_before(&uri, &by_name("Missing"), "x").await.expect_err("must fail");
    assert!(matches!(error, OperationError::Resolution(ResolutionError::NotFound)), "got {error}");

    let error = operations.replace_body(&uri, &by_name("  "), "x").await.expect_err("must fail");
    assert!(matches!(error, OperationError::Resolution(ResolutionError::InvalidQuery)), "got {error}");

    let error =
        operations.replace_body(&uri, &Selector::Position(Position::new(0, 1)), "x").await.expect_err("must fail");
    assert!(matches!(error, OperationError::Resolution(ResolutionError::NotFound)), "got {error}");
}

#[tokio::test]
async fn empty_insertions_are_rejected() {
    let (operations, uri) = sample_operations();
    let error = operations.insert_after(&uri, &by_name("MyClass"), "").await.expect_err("must fail");
    assert!(matches!(error, OperationError::InvalidArgument(_)), "got {error}");
}

#[tokio::test]
async fn children_respect_depth_and_hover() {
    let (operations, uri) = sample_operations();

    let plain = operations.get_children(&uri, &by_name("MyClass"), "1", false, None).await.expect("report");
    assert_eq!(plain.lines().count(), 3);
    assert!(plain.starts_with("NAME | KIND | RANGE | SELECTION | PARENT | EOL\n"));

    let hovered = operations.get_children(&uri, &by_name("MyClass"), "1", true, None).await.expect("report");
    assert!(hovered.contains("| MyClass | value: number | EOL"), "{hovered}");

    let error = operations.get_children(&uri, &by_name("MyClass"), "0", false, None).await.expect_err("must fail");
    assert!(matches!(error, OperationError::Resolution(ResolutionError::InvalidQuery)), "got {error}");
}

#[tokio::test]
async fn oversized_children_report_is_header_only() {
    let (operations, uri) = sample_operations();
    let report = operations.get_children(&uri, &by_name("Root"), "all", true, Some(80)).await.expect("report");
    assert_eq!(report, header_only(true));
}

#[tokio::test]
async fn search_options_narrow_name_selectors() {
    let (operations, uri) = sample_operations();
    let operations = operations.with_search_options(SearchOptions {
        include_kinds: vec![lsp_types::SymbolKind::FUNCTION],
        ..SearchOptions::default()
    });
    let edit = operations.replace_body(&uri, &by_name("processData"), "").await.expect("edit");
    assert_eq!(edit.range, range(21, 0, 21, 25));
}

#[tokio::test]
async fn rename_asks_at_the_identifier() {
    let uri = test_uri("sample.ts");
    let renamer = RecordingRenamer::default();
    renamer.symbols.insert(uri.clone(), sample_symbols());
    let operations = SymbolOperations::new(renamer);

    let edit = operations.rename(&uri, &by_name("DeepClass"), " Abyss ").await.expect("rename");
    assert!(edit.changes.expect("changes").contains_key(&uri));

    let requests = operations.locator().provider().requests.lock().expect("lock").clone();
    assert_eq!(requests, vec![(Position::new(7, 12), "Abyss".to_string())]);
}

#[tokio::test]
async fn rename_rejects_blank_names_and_unsupported_providers() {
    let (operations, uri) = sample_operations();

    let error = operations.rename(&uri, &by_name("MyClass"), "   ").await.expect_err("must fail");
    assert!(matches!(error, OperationError::InvalidArgument(_)), "got {error}");

    let error = operations.rename(&uri, &by_name("MyClass"), "YourClass").await.expect_err("must fail");
    assert!(matches!(error, OperationError::Unsupported(_)), "got {error}");
}
