use std::{collections::HashMap, path::Path};

use dashmap::DashMap;
use lsp_types::{DocumentSymbol, DocumentSymbolResponse, Position, Url, WorkspaceEdit};
use serde::Deserialize;
use tracing::debug;

use super::{DeclarationProvider, HoverProvider, ProviderError, RenameProvider};

/// Thread-safe store of declarations and hover texts keyed by document.
///
/// Backs the CLI's `--symbols` snapshot mode and the test suites. Unknown
/// documents answer an empty declaration list, like a language server does
/// for unsupported files.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    documents: DashMap<Url, Vec<DocumentSymbol>>,
    hovers: DashMap<(Url, u32, u32), String>,
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    root: Option<String>,
    #[serde(default)]
    files: HashMap<String, Vec<DocumentSymbol>>,
    #[serde(default)]
    hovers: Vec<SnapshotHover>,
}

#[derive(Debug, Deserialize)]
struct SnapshotHover {
    uri: String,
    position: Position,
    text: String,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the declarations of a document.
    pub fn insert(
        &self,
        uri: Url,
        symbols: Vec<DocumentSymbol>,
    ) {
        self.documents.insert(uri, symbols);
    }

    pub fn set_hover(
        &self,
        uri: Url,
        position: Position,
        text: impl Into<String>,
    ) {
        self.hovers.insert((uri, position.line, position.character), text.into());
    }

    /// Return all registered document URIs.
    pub fn uris(&self) -> Vec<Url> {
        self.documents.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Load a JSON snapshot:
    ///
    /// ```json
    /// { "root": "/abs/project",
    ///   "files": { "src/app.ts": [ /* DocumentSymbol */ ] },
    ///   "hovers": [ { "uri": "src/app.ts", "position": {"line": 0, "character": 6}, "text": "..." } ] }
    /// ```
    ///
    /// Keys that are not `file://` URIs are resolved against `root`, which
    /// is itself relative to `base_dir` and defaults to it.
    pub fn from_snapshot_json(
        json: &str,
        base_dir: &Path,
    ) -> Result<Self, ProviderError> {
        let snapshot: Snapshot = serde_json::from_str(json).map_err(|error| ProviderError::Document {
            uri: base_dir.display().to_string(),
            reason: format!("invalid symbol snapshot: {error}"),
        })?;
        let root = snapshot.root.as_deref().map_or_else(|| base_dir.to_path_buf(), |root| base_dir.join(root));

        let provider = Self::new();
        for (key, symbols) in snapshot.files {
            let uri = snapshot_uri(&key, &root)?;
            debug!("[snapshot] {} declarations for {uri}", symbols.len());
            provider.insert(uri, symbols);
        }
        for hover in snapshot.hovers {
            let uri = snapshot_uri(&hover.uri, &root)?;
            provider.set_hover(uri, hover.position, hover.text);
        }
        Ok(provider)
    }

    pub fn from_snapshot_file(path: &Path) -> Result<Self, ProviderError> {
        let json = std::fs::read_to_string(path).map_err(|error| ProviderError::Document {
            uri: path.display().to_string(),
            reason: error.to_string(),
        })?;
        let base_dir = path.parent().unwrap_or(Path::new("."));
        Self::from_snapshot_json(&json, base_dir)
    }
}

fn snapshot_uri(
    key: &str,
    root: &Path,
) -> Result<Url, ProviderError> {
    if key.starts_with("file://") {
        return Url::parse(key).map_err(|error| ProviderError::Document {
            uri: key.to_string(),
            reason: error.to_string(),
        });
    }
    let path = root.join(key);
    let absolute = std::path::absolute(&path).unwrap_or(path);
    Url::from_file_path(&absolute).map_err(|()| ProviderError::Document {
        uri: key.to_string(),
        reason: format!("{} is not an absolute file path", absolute.display()),
    })
}

impl DeclarationProvider for InMemoryProvider {
    async fn document_symbols(
        &self,
        uri: &Url,
    ) -> Result<DocumentSymbolResponse, ProviderError> {
        let symbols = self.documents.get(uri).map(|entry| entry.value().clone()).unwrap_or_default();
        Ok(DocumentSymbolResponse::Nested(symbols))
    }
}

impl HoverProvider for InMemoryProvider {
    async fn hover(
        &self,
        uri: &Url,
        position: Position,
    ) -> Result<Option<String>, ProviderError> {
        Ok(self.hovers.get(&(uri.clone(), position.line, position.character)).map(|entry| entry.value().clone()))
    }
}

impl RenameProvider for InMemoryProvider {
    /// Snapshots carry no reference information, so no rename is possible.
    async fn rename(
        &self,
        _uri: &Url,
        _position: Position,
        _new_name: &str,
    ) -> Result<Option<WorkspaceEdit>, ProviderError> {
        Ok(None)
    }
}

#[cfg(test)]
#[path = "../../tests/src/provider/memory_tests.rs"]
mod tests;
