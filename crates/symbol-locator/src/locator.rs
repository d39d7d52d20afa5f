//! The single entry point every symbol-addressed operation goes through.
//!
//! A [`SymbolLocator`] rebuilds the document's [`SymbolTree`] on each call and
//! resolves a position or a name-path query against it. Failures are values
//! in the returned [`ResolutionResult`], never panics.

use std::fmt::{Display, Formatter};

use lsp_types::{Position, Range, Url};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    kind::kind_name,
    matcher::NamePathQuery,
    provider::DeclarationProvider,
    resolve::{SearchOptions, resolve_at_position, resolve_by_name},
    tree::{NodeId, SymbolNode, SymbolTree, TreeBuilder},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionError {
    /// No symbol matched, or the position is outside every declaration.
    NotFound,
    /// Empty, blank or malformed query, or no selector at all.
    InvalidQuery,
    /// The declaration provider could not be reached.
    ProviderUnavailable,
}

impl Display for ResolutionError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "symbol not found"),
            Self::InvalidQuery => write!(f, "invalid symbol query"),
            Self::ProviderUnavailable => write!(f, "declaration provider unavailable"),
        }
    }
}

impl std::error::Error for ResolutionError {}

/// How a caller addresses a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Position(Position),
    Name(String),
}

impl Selector {
    /// Pick the effective selector; a name wins over a position.
    pub fn from_parts(
        position: Option<Position>,
        symbol_name: Option<&str>,
    ) -> Option<Self> {
        match (symbol_name, position) {
            (Some(name), _) => Some(Self::Name(name.to_string())),
            (None, Some(position)) => Some(Self::Position(position)),
            (None, None) => None,
        }
    }
}

/// Outcome of one `locate` call. Owns the tree it was resolved against.
#[derive(Debug, Clone)]
pub struct ResolutionResult {
    tree: SymbolTree,
    symbol: Option<NodeId>,
    alternatives: Vec<NodeId>,
    error: Option<ResolutionError>,
}

impl ResolutionResult {
    fn found(
        tree: SymbolTree,
        mut matches: Vec<NodeId>,
    ) -> Self {
        if matches.is_empty() {
            return Self::failed(tree, ResolutionError::NotFound);
        }
        let symbol = matches.remove(0);
        Self {
            tree,
            symbol: Some(symbol),
            alternatives: matches,
            error: None,
        }
    }

    fn failed(
        tree: SymbolTree,
        error: ResolutionError,
    ) -> Self {
        Self {
            tree,
            symbol: None,
            alternatives: Vec::new(),
            error: Some(error),
        }
    }

    /// The canonical match.
    pub fn symbol(&self) -> Option<&SymbolNode> {
        self.symbol.map(|id| self.tree.node(id))
    }

    pub fn symbol_id(&self) -> Option<NodeId> {
        self.symbol
    }

    /// `true` only when exactly one symbol matched.
    pub fn is_unique(&self) -> bool {
        self.symbol.is_some() && self.alternatives.is_empty()
    }

    /// The other matches, in declaration order.
    pub fn alternatives(&self) -> &[NodeId] {
        &self.alternatives
    }

    pub fn error(&self) -> Option<ResolutionError> {
        self.error
    }

    pub fn name_path(&self) -> Option<String> {
        self.symbol.map(|id| self.tree.name_path(id))
    }

    pub fn tree(&self) -> &SymbolTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut SymbolTree {
        &mut self.tree
    }

    pub fn into_parts(self) -> (SymbolTree, Result<NodeId, ResolutionError>) {
        let outcome = match (self.symbol, self.error) {
            (Some(id), _) => Ok(id),
            (None, error) => Err(error.unwrap_or(ResolutionError::NotFound)),
        };
        (self.tree, outcome)
    }

    /// Serializable summary for callers outside the crate.
    pub fn to_report(&self) -> ResolutionReport {
        ResolutionReport {
            symbol: self.symbol.map(|id| LocatedSymbol::new(&self.tree, id)),
            is_unique: self.is_unique(),
            alternatives: self.alternatives.iter().map(|id| LocatedSymbol::new(&self.tree, *id)).collect(),
            error: self.error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionReport {
    pub symbol: Option<LocatedSymbol>,
    pub is_unique: bool,
    pub alternatives: Vec<LocatedSymbol>,
    pub error: Option<ResolutionError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocatedSymbol {
    pub name: String,
    pub name_path: String,
    pub kind: &'static str,
    pub range: Range,
    pub selection_range: Range,
}

impl LocatedSymbol {
    fn new(
        tree: &SymbolTree,
        id: NodeId,
    ) -> Self {
        let node = tree.node(id);
        Self {
            name: node.name.clone(),
            name_path: tree.name_path(id),
            kind: kind_name(node.kind),
            range: node.full_range,
            selection_range: node.selection_range,
        }
    }
}

enum Target {
    At(Position),
    Named(NamePathQuery),
}

pub struct SymbolLocator<P> {
    provider: P,
}

impl<P: DeclarationProvider> SymbolLocator<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// A fresh tree for `uri`.
    pub async fn tree(
        &self,
        uri: &Url,
    ) -> Result<SymbolTree, ResolutionError> {
        TreeBuilder::new(&self.provider).build(uri).await
    }

    /// Resolve by name (preferred when both are given) or by position.
    pub async fn locate(
        &self,
        uri: &Url,
        position: Option<Position>,
        symbol_name: Option<&str>,
    ) -> ResolutionResult {
        match Selector::from_parts(position, symbol_name) {
            Some(selector) => self.locate_with(uri, &selector, &SearchOptions::default()).await,
            None => {
                debug!("[locate] neither a position nor a name was given for {uri}");
                ResolutionResult::failed(SymbolTree::empty(uri.clone()), ResolutionError::InvalidQuery)
            },
        }
    }

    /// Like [`locate`](Self::locate) with explicit search filters. The
    /// filters apply to name queries only.
    pub async fn locate_with(
        &self,
        uri: &Url,
        selector: &Selector,
        options: &SearchOptions,
    ) -> ResolutionResult {
        let target = match selector {
            Selector::Position(position) => Target::At(*position),
            Selector::Name(raw) => match NamePathQuery::parse(raw, options.substring) {
                Some(query) => Target::Named(query),
                None => {
                    debug!("[locate] rejecting query {raw:?}");
                    return ResolutionResult::failed(SymbolTree::empty(uri.clone()), ResolutionError::InvalidQuery);
                },
            },
        };

        let tree = match self.tree(uri).await {
            Ok(tree) => tree,
            Err(error) => return ResolutionResult::failed(SymbolTree::empty(uri.clone()), error),
        };

        match target {
            Target::At(position) => {
                let hit = resolve_at_position(&tree, position);
                debug!("[locate] {uri} @ {}:{} -> {hit:?}", position.line, position.character);
                ResolutionResult::found(tree, hit.into_iter().collect())
            },
            Target::Named(query) => {
                let matches = resolve_by_name(&tree, query.as_str(), options);
                if matches.len() > 1 {
                    warn!(
                        "[locate] '{}' is ambiguous in {uri}: using {}, {} alternatives",
                        query.as_str(),
                        tree.name_path(matches[0]),
                        matches.len() - 1
                    );
                }
                ResolutionResult::found(tree, matches)
            },
        }
    }
}

#[cfg(test)]
#[path = "../tests/src/locator_tests.rs"]
mod tests;
