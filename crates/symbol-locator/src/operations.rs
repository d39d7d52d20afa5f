//! Edits and reports addressed by symbol rather than by offset.
//!
//! Every operation resolves its target through [`SymbolLocator`] first. On an
//! ambiguous name the canonical (first declared) match is used.

use std::fmt::{Display, Formatter};

use lsp_types::{Range, TextEdit, Url, WorkspaceEdit};
use tracing::{debug, info};

use crate::{
    governor::{AnswerSizeGovernor, Governed},
    locator::{ResolutionError, Selector, SymbolLocator},
    provider::{DeclarationProvider, HoverProvider, ProviderError, RenameProvider},
    report::{Depth, ReportRenderer, header_only},
    resolve::SearchOptions,
    tree::{NodeId, SymbolTree},
};

#[derive(Debug)]
pub enum OperationError {
    /// The target symbol could not be resolved.
    Resolution(ResolutionError),
    /// A provider call after resolution failed.
    Provider(ProviderError),
    InvalidArgument(String),
    /// The provider declined the request for this symbol.
    Unsupported(String),
}

impl From<ResolutionError> for OperationError {
    fn from(error: ResolutionError) -> Self {
        Self::Resolution(error)
    }
}

impl From<ProviderError> for OperationError {
    fn from(error: ProviderError) -> Self {
        Self::Provider(error)
    }
}

impl Display for OperationError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::Resolution(error) => write!(f, "{error}"),
            Self::Provider(error) => write!(f, "{error}"),
            Self::InvalidArgument(reason) => write!(f, "invalid argument: {reason}"),
            Self::Unsupported(reason) => write!(f, "unsupported: {reason}"),
        }
    }
}

impl std::error::Error for OperationError {}

pub struct SymbolOperations<P> {
    locator: SymbolLocator<P>,
    renderer: ReportRenderer,
    search: SearchOptions,
}

impl<P: DeclarationProvider> SymbolOperations<P> {
    pub fn new(provider: P) -> Self {
        Self {
            locator: SymbolLocator::new(provider),
            renderer: ReportRenderer::default(),
            search: SearchOptions::default(),
        }
    }

    pub fn with_renderer(
        mut self,
        renderer: ReportRenderer,
    ) -> Self {
        self.renderer = renderer;
        self
    }

    /// Filters applied when a selector is a name.
    pub fn with_search_options(
        mut self,
        search: SearchOptions,
    ) -> Self {
        self.search = search;
        self
    }

    pub fn locator(&self) -> &SymbolLocator<P> {
        &self.locator
    }

    /// Insert `text` on its own line before the symbol's declaration.
    pub async fn insert_before(
        &self,
        uri: &Url,
        selector: &Selector,
        text: &str,
    ) -> Result<TextEdit, OperationError> {
        require_text(text)?;
        let (tree, id) = self.resolve(uri, selector).await?;
        let start = tree.node(id).full_range.start;
        Ok(TextEdit::new(Range::new(start, start), format!("{text}\n")))
    }

    /// Insert `text` on its own line after the symbol's declaration.
    pub async fn insert_after(
        &self,
        uri: &Url,
        selector: &Selector,
        text: &str,
    ) -> Result<TextEdit, OperationError> {
        require_text(text)?;
        let (tree, id) = self.resolve(uri, selector).await?;
        let end = tree.node(id).full_range.end;
        Ok(TextEdit::new(Range::new(end, end), format!("\n{text}")))
    }

    /// Replace the whole declaration, body included.
    pub async fn replace_body(
        &self,
        uri: &Url,
        selector: &Selector,
        text: &str,
    ) -> Result<TextEdit, OperationError> {
        let (tree, id) = self.resolve(uri, selector).await?;
        Ok(TextEdit::new(tree.node(id).full_range, text.to_string()))
    }

    /// Descendant report without hover text.
    pub async fn children_report(
        &self,
        uri: &Url,
        selector: &Selector,
        depth: &str,
        max_answer_chars: Option<usize>,
    ) -> Result<String, OperationError> {
        let depth = Depth::parse(depth)?;
        let (tree, id) = self.resolve(uri, selector).await?;
        let table = self.renderer.render_plain(&tree, id, depth);
        Ok(governed_table(table, false, max_answer_chars))
    }

    async fn resolve(
        &self,
        uri: &Url,
        selector: &Selector,
    ) -> Result<(SymbolTree, NodeId), OperationError> {
        let result = self.locator.locate_with(uri, selector, &self.search).await;
        if let Some(path) = result.name_path() {
            debug!("[operations] {selector:?} resolved to {path} ({} alternatives)", result.alternatives().len());
        }
        let (tree, outcome) = result.into_parts();
        Ok((tree, outcome?))
    }
}

impl<P: DeclarationProvider + HoverProvider> SymbolOperations<P> {
    /// Descendant report, with hover text when `include_hover` is set.
    pub async fn get_children(
        &self,
        uri: &Url,
        selector: &Selector,
        depth: &str,
        include_hover: bool,
        max_answer_chars: Option<usize>,
    ) -> Result<String, OperationError> {
        if !include_hover {
            return self.children_report(uri, selector, depth, max_answer_chars).await;
        }
        let depth = Depth::parse(depth)?;
        let (mut tree, id) = self.resolve(uri, selector).await?;
        let table = self.renderer.render_with_hover(&mut tree, id, depth, self.locator.provider()).await;
        Ok(governed_table(table, true, max_answer_chars))
    }
}

impl<P: DeclarationProvider + RenameProvider> SymbolOperations<P> {
    /// Ask the provider for the edits renaming the symbol everywhere.
    pub async fn rename(
        &self,
        uri: &Url,
        selector: &Selector,
        new_name: &str,
    ) -> Result<WorkspaceEdit, OperationError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(OperationError::InvalidArgument("new name is empty".to_string()));
        }
        let (tree, id) = self.resolve(uri, selector).await?;
        let node = tree.node(id);
        let position = node.selection_range.start;

        match self.locator.provider().rename(uri, position, new_name).await? {
            Some(edit) => {
                info!("[operations] renaming {} to {new_name}", tree.name_path(id));
                Ok(edit)
            },
            None => Err(OperationError::Unsupported(format!("cannot rename {}", node.name))),
        }
    }
}

fn require_text(text: &str) -> Result<(), OperationError> {
    if text.is_empty() {
        return Err(OperationError::InvalidArgument("text to insert is empty".to_string()));
    }
    Ok(())
}

/// Oversized tables degrade to the bare header row.
fn governed_table(
    table: String,
    include_hover: bool,
    max_answer_chars: Option<usize>,
) -> String {
    let Some(limit) = max_answer_chars else {
        return table;
    };
    match AnswerSizeGovernor::new(limit).bound_text(table) {
        Governed::Complete(table) => table,
        Governed::Oversized {
            ..
        } => header_only(include_hover),
    }
}

#[cfg(test)]
#[path = "../tests/src/operations_tests.rs"]
mod tests;
