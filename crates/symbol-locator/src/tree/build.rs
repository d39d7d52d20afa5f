use lsp_types::{DocumentSymbol, DocumentSymbolResponse, Range, SymbolInformation, Url};
use tracing::{debug, warn};

use super::node::{NodeId, SymbolNode, SymbolTree, range_contains_range};
use crate::locator::ResolutionError;
use crate::provider::DeclarationProvider;

/// Nesting below this depth is dropped while building.
pub const MAX_TREE_DEPTH: usize = 64;

impl SymbolTree {
    pub fn from_response(
        uri: Url,
        response: DocumentSymbolResponse,
    ) -> Self {
        match response {
            DocumentSymbolResponse::Nested(symbols) => Self::from_document_symbols(uri, symbols),
            DocumentSymbolResponse::Flat(symbols) => Self::from_symbol_information(uri, symbols),
        }
    }

    /// Build from the hierarchical LSP shape.
    pub fn from_document_symbols(
        uri: Url,
        symbols: Vec<DocumentSymbol>,
    ) -> Self {
        let mut tree = Self::empty(uri);
        for symbol in symbols {
            if let Some(id) = tree.push_document_symbol(symbol, None, 0) {
                tree.roots.push(id);
            }
        }
        tree.sort_in_declaration_order();
        tree
    }

    /// Build from the flat LSP shape, nesting entries by range containment.
    pub fn from_symbol_information(
        uri: Url,
        symbols: Vec<SymbolInformation>,
    ) -> Self {
        let mut entries: Vec<SymbolInformation> =
            symbols.into_iter().filter(|info| !info.name.trim().is_empty()).collect();
        // Outer declarations first so that every parent is open before its children.
        entries.sort_by(|a, b| {
            let (a, b) = (&a.location.range, &b.location.range);
            (a.start.line, a.start.character)
                .cmp(&(b.start.line, b.start.character))
                .then_with(|| (b.end.line, b.end.character).cmp(&(a.end.line, a.end.character)))
        });

        let mut tree = Self::empty(uri);
        let mut open: Vec<NodeId> = Vec::new();
        for info in entries {
            let range = info.location.range;
            while let Some(&top) = open.last() {
                if range_contains_range(&tree.node(top).full_range, &range) {
                    break;
                }
                open.pop();
            }
            if open.len() >= MAX_TREE_DEPTH {
                debug!("[tree] dropping '{}' nested deeper than {MAX_TREE_DEPTH} levels", info.name);
                continue;
            }

            let parent = open.last().copied();
            let id = NodeId::new(tree.nodes.len());
            tree.nodes.push(SymbolNode {
                name: info.name,
                kind: info.kind,
                detail: info.container_name.map(|container| format!("in {container}")),
                full_range: range,
                selection_range: range,
                hover_text: None,
                parent,
                children: Vec::new(),
                depth: open.len(),
            });
            match parent {
                Some(parent) => tree.nodes[parent.index()].children.push(id),
                None => tree.roots.push(id),
            }
            open.push(id);
        }
        tree
    }

    fn push_document_symbol(
        &mut self,
        symbol: DocumentSymbol,
        parent: Option<NodeId>,
        depth: usize,
    ) -> Option<NodeId> {
        if symbol.name.trim().is_empty() {
            debug!("[tree] dropping unnamed {:?} symbol and its children", symbol.kind);
            return None;
        }

        let id = NodeId::new(self.nodes.len());
        self.nodes.push(SymbolNode {
            name: symbol.name,
            kind: symbol.kind,
            detail: symbol.detail,
            full_range: symbol.range,
            selection_range: clamp_selection(symbol.range, symbol.selection_range),
            hover_text: None,
            parent,
            children: Vec::new(),
            depth,
        });

        let children = symbol.children.unwrap_or_default();
        if !children.is_empty() && depth + 1 >= MAX_TREE_DEPTH {
            warn!("[tree] symbol nesting exceeds {MAX_TREE_DEPTH} levels, ignoring {} children", children.len());
            return Some(id);
        }
        for child in children {
            if let Some(child_id) = self.push_document_symbol(child, Some(id), depth + 1) {
                self.nodes[id.index()].children.push(child_id);
            }
        }
        Some(id)
    }

    /// Providers are not required to sort; declaration order is source order.
    fn sort_in_declaration_order(&mut self) {
        let start_of = |nodes: &[SymbolNode], id: &NodeId| {
            let start = nodes[id.index()].full_range.start;
            (start.line, start.character)
        };

        let mut roots = std::mem::take(&mut self.roots);
        roots.sort_by_key(|id| start_of(&self.nodes, id));
        self.roots = roots;

        for idx in 0..self.nodes.len() {
            let mut children = std::mem::take(&mut self.nodes[idx].children);
            children.sort_by_key(|id| start_of(&self.nodes, id));
            self.nodes[idx].children = children;
        }
    }
}

/// A selection range escaping its declaration collapses to the declaration start.
fn clamp_selection(
    full_range: Range,
    selection_range: Range,
) -> Range {
    if range_contains_range(&full_range, &selection_range) {
        selection_range
    } else {
        Range::new(full_range.start, full_range.start)
    }
}

/// Fetches a fresh [`SymbolTree`] from the declaration provider.
pub struct TreeBuilder<'a, P> {
    provider: &'a P,
}

impl<'a, P: DeclarationProvider> TreeBuilder<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
        }
    }

    pub async fn build(
        &self,
        uri: &Url,
    ) -> Result<SymbolTree, ResolutionError> {
        match self.provider.document_symbols(uri).await {
            Ok(response) => {
                let tree = SymbolTree::from_response(uri.clone(), response);
                debug!("[tree] built {} symbols for {uri}", tree.len());
                Ok(tree)
            },
            Err(error) => {
                warn!("[tree] declaration provider unavailable for {uri}: {error}");
                Err(ResolutionError::ProviderUnavailable)
            },
        }
    }
}
