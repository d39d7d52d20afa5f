use lsp_types::{Position, Range, SymbolKind, Url};

/// Separator between segments of a name path.
pub const NAME_PATH_SEPARATOR: char = '/';

/// Index of a node inside its [`SymbolTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One declared symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolNode {
    pub name: String,
    pub kind: SymbolKind,
    /// Provider-supplied detail string (signature, type), if any.
    pub detail: Option<String>,
    /// Whole declaration including its body.
    pub full_range: Range,
    /// Identifier token only; contained in `full_range`.
    pub selection_range: Range,
    /// Documentation/type text, filled in only when a caller asks for hover.
    pub hover_text: Option<String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) depth: usize,
}

impl SymbolNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Distance from the top level (top-level symbols have depth 0).
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Symbols declared in one document, rebuilt for every query.
///
/// Nodes live in a flat arena; `parent` links are plain indices used for
/// name-path reconstruction only.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolTree {
    uri: Url,
    pub(crate) nodes: Vec<SymbolNode>,
    pub(crate) roots: Vec<NodeId>,
}

impl SymbolTree {
    pub fn empty(uri: Url) -> Self {
        Self {
            uri,
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level symbols in declaration order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(
        &self,
        id: NodeId,
    ) -> &SymbolNode {
        &self.nodes[id.index()]
    }

    pub fn get(
        &self,
        id: NodeId,
    ) -> Option<&SymbolNode> {
        self.nodes.get(id.index())
    }

    pub fn children(
        &self,
        id: NodeId,
    ) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn parent(
        &self,
        id: NodeId,
    ) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn set_hover_text(
        &mut self,
        id: NodeId,
        text: Option<String>,
    ) {
        if let Some(node) = self.nodes.get_mut(id.index()) {
            node.hover_text = text;
        }
    }

    /// Ancestors' names joined with `/`, ending in the node's own name.
    pub fn name_path(
        &self,
        id: NodeId,
    ) -> String {
        let mut segments = Vec::with_capacity(self.node(id).depth + 1);
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id);
            segments.push(node.name.as_str());
            current = node.parent;
        }
        segments.reverse();
        segments.join(&NAME_PATH_SEPARATOR.to_string())
    }

    /// Pre-order traversal of the whole tree, optionally limited to nodes
    /// whose depth is at most `max_depth`.
    pub fn pre_order(
        &self,
        max_depth: Option<usize>,
    ) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if max_depth.is_some_and(|max| node.depth > max) {
                continue;
            }
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// All node ids in arena order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId::new)
    }
}

/// `start <= position <= end`, comparing `(line, character)` lexicographically.
pub fn range_contains_position(
    range: &Range,
    position: Position,
) -> bool {
    let pos = (position.line, position.character);
    (range.start.line, range.start.character) <= pos && pos <= (range.end.line, range.end.character)
}

pub fn range_contains_range(
    outer: &Range,
    inner: &Range,
) -> bool {
    range_contains_position(outer, inner.start) && range_contains_position(outer, inner.end)
}
