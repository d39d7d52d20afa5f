//! Top-level symbol summaries for every source file under a directory.

use std::{
    collections::BTreeMap,
    path::{Component, Path, PathBuf},
};

use lsp_types::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::{
    config::OverviewSettings,
    governor::{AnswerSizeGovernor, Governed},
    kind::kind_name,
    provider::DeclarationProvider,
    tree::SymbolTree,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopLevelSymbol {
    pub name: String,
    pub kind: String,
}

/// Workspace-relative file path (with `/` separators) to its top-level symbols.
pub type Overview = BTreeMap<String, Vec<TopLevelSymbol>>;

pub struct OverviewScanner<P> {
    provider: P,
    root: PathBuf,
    settings: OverviewSettings,
}

impl<P: DeclarationProvider> OverviewScanner<P> {
    pub fn new(
        provider: P,
        root: impl Into<PathBuf>,
        settings: OverviewSettings,
    ) -> Self {
        let root = root.into();
        let root = std::path::absolute(&root).unwrap_or(root);
        Self {
            provider,
            root,
            settings,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Summarize every source file under `relative_path` (a directory or a
    /// single file). A path that does not exist yields an empty overview.
    pub async fn overview(
        &self,
        relative_path: &str,
        max_answer_chars: Option<usize>,
    ) -> Governed<Overview> {
        let mut overview = Overview::new();

        for path in self.list_files(relative_path) {
            let Some(key) = self.workspace_key(&path) else {
                continue;
            };
            let Ok(uri) = Url::from_file_path(&path) else {
                debug!("[overview] cannot address {} as a file URI", path.display());
                continue;
            };
            match self.provider.document_symbols(&uri).await {
                Ok(response) => {
                    let tree = SymbolTree::from_response(uri, response);
                    let symbols: Vec<TopLevelSymbol> = tree
                        .roots()
                        .iter()
                        .map(|id| {
                            let node = tree.node(*id);
                            TopLevelSymbol {
                                name: node.name.clone(),
                                kind: kind_name(node.kind).to_string(),
                            }
                        })
                        .collect();
                    if !symbols.is_empty() {
                        overview.insert(key, symbols);
                    }
                },
                Err(error) => warn!("[overview] skipping {key}: {error}"),
            }
        }

        info!("[overview] {} files with symbols under '{relative_path}'", overview.len());
        let limit = max_answer_chars.unwrap_or(self.settings.max_answer_chars);
        AnswerSizeGovernor::new(limit).bound(overview)
    }

    /// Source files under `relative_path`, sorted, filtered by the settings.
    pub fn list_files(
        &self,
        relative_path: &str,
    ) -> Vec<PathBuf> {
        let relative = Path::new(relative_path.trim());
        if relative.is_absolute() || relative.components().any(|c| matches!(c, Component::ParentDir)) {
            debug!("[overview] '{relative_path}' is not inside the workspace");
            return Vec::new();
        }
        let start = self.root.join(relative);
        if !start.exists() {
            debug!("[overview] '{relative_path}' does not exist under {}", self.root.display());
            return Vec::new();
        }

        let excluded: Vec<PathBuf> = self.settings.exclude_paths.iter().map(|p| self.root.join(p)).collect();
        let max_size = self.settings.max_file_size_bytes();

        WalkDir::new(&start)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| should_visit(entry, &excluded))
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| self.has_source_extension(entry.path()))
            .filter(|entry| {
                let fits = entry.metadata().map(|m| m.len() <= max_size).unwrap_or(false);
                if !fits {
                    debug!("[overview] skipping {} (unreadable or over {max_size} bytes)", entry.path().display());
                }
                fits
            })
            .map(DirEntry::into_path)
            .collect()
    }

    fn has_source_extension(
        &self,
        path: &Path,
    ) -> bool {
        if self.settings.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.settings.extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(ext)))
    }

    fn workspace_key(
        &self,
        path: &Path,
    ) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let segments: Vec<&str> = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(segment) => segment.to_str(),
                _ => None,
            })
            .collect();
        (!segments.is_empty()).then(|| segments.join("/"))
    }
}

/// Hidden entries and excluded prefixes are pruned; the starting entry is
/// always visited.
fn should_visit(
    entry: &DirEntry,
    excluded: &[PathBuf],
) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    if excluded.iter().any(|prefix| entry.path().starts_with(prefix)) {
        return false;
    }
    entry.file_name().to_str().is_some_and(|name| !name.starts_with('.'))
}

#[cfg(test)]
#[path = "../tests/src/overview_tests.rs"]
mod tests;
