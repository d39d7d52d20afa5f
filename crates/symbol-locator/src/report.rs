//! Tabular descendant reports.
//!
//! ```text
//! NAME | KIND | RANGE | SELECTION | PARENT | EOL
//! MidClass | Class | 3:4-5:5 | 3:10-3:18 | Level1 | EOL
//! ```
//!
//! Ranges are `line:character-line:character`, 0-based. PARENT is the bare
//! name of the row's parent. Cell text is escaped so that every row stays on
//! one physical line.

use std::str::FromStr;

use lsp_types::Range;
use tracing::debug;

use crate::{
    config::ReportSettings,
    kind::kind_name,
    locator::ResolutionError,
    provider::HoverProvider,
    tree::{NodeId, SymbolTree},
};

/// Hard cap on report depth, `"all"` included.
pub const MAX_REPORT_DEPTH: usize = 20;

const COLUMN_SEPARATOR: &str = " | ";
const END_OF_ROW: &str = "EOL";

/// How many levels of descendants a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Levels(usize),
    All,
}

impl Depth {
    /// `"all"` or a positive integer. Zero and anything else is invalid.
    pub fn parse(text: &str) -> Result<Self, ResolutionError> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        match text.parse::<usize>() {
            Ok(0) | Err(_) => Err(ResolutionError::InvalidQuery),
            Ok(levels) => Ok(Self::Levels(levels)),
        }
    }

    fn levels(
        self,
        cap: usize,
    ) -> usize {
        match self {
            Self::Levels(levels) => levels.min(cap),
            Self::All => cap,
        }
    }
}

impl FromStr for Depth {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRenderer {
    max_depth: usize,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self {
            max_depth: MAX_REPORT_DEPTH,
        }
    }
}

impl ReportRenderer {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth: max_depth.clamp(1, MAX_REPORT_DEPTH),
        }
    }

    pub fn from_settings(settings: &ReportSettings) -> Self {
        Self::new(settings.max_depth)
    }

    /// Descendants of `symbol` down to `depth` levels, in pre-order.
    pub fn descendants(
        &self,
        tree: &SymbolTree,
        symbol: NodeId,
        depth: Depth,
    ) -> Vec<NodeId> {
        let levels = depth.levels(self.max_depth);
        let mut out = Vec::new();
        let mut stack: Vec<(NodeId, usize)> = tree.children(symbol).iter().rev().map(|id| (*id, 1)).collect();
        while let Some((id, level)) = stack.pop() {
            out.push(id);
            if level < levels {
                stack.extend(tree.children(id).iter().rev().map(|child| (*child, level + 1)));
            }
        }
        out
    }

    /// Table without the hover column.
    pub fn render_plain(
        &self,
        tree: &SymbolTree,
        symbol: NodeId,
        depth: Depth,
    ) -> String {
        let rows = self.descendants(tree, symbol, depth);
        render_table(tree, &rows, false)
    }

    /// Table with a HOVER_INFO column, fetching hover text for every row.
    ///
    /// Failed or empty hovers leave the cell blank.
    pub async fn render_with_hover<H: HoverProvider>(
        &self,
        tree: &mut SymbolTree,
        symbol: NodeId,
        depth: Depth,
        hover: &H,
    ) -> String {
        let rows = self.descendants(tree, symbol, depth);
        let uri = tree.uri().clone();
        for id in &rows {
            let position = tree.node(*id).selection_range.start;
            let text = match hover.hover(&uri, position).await {
                Ok(text) => text,
                Err(error) => {
                    debug!("[report] hover failed at {}:{}: {error}", position.line, position.character);
                    None
                },
            };
            tree.set_hover_text(*id, text);
        }
        render_table(tree, &rows, true)
    }
}

/// The header row alone, as rendered for a symbol without children.
pub fn header_only(include_hover: bool) -> String {
    let mut header = vec!["NAME", "KIND", "RANGE", "SELECTION", "PARENT"];
    if include_hover {
        header.push("HOVER_INFO");
    }
    header.push(END_OF_ROW);

    let mut out = header.join(COLUMN_SEPARATOR);
    out.push('\n');
    out
}

fn render_table(
    tree: &SymbolTree,
    rows: &[NodeId],
    include_hover: bool,
) -> String {
    let mut out = header_only(include_hover);

    for id in rows {
        let node = tree.node(*id);
        let parent = node.parent().map(|parent| tree.node(parent).name.as_str()).unwrap_or_default();
        let mut cells = vec![
            escape_cell(&node.name),
            kind_name(node.kind).to_string(),
            format_range(&node.full_range),
            format_range(&node.selection_range),
            escape_cell(parent),
        ];
        if include_hover {
            cells.push(escape_cell(node.hover_text.as_deref().unwrap_or_default()));
        }
        cells.push(END_OF_ROW.to_string());
        out.push_str(&cells.join(COLUMN_SEPARATOR));
        out.push('\n');
    }
    out
}

fn format_range(range: &Range) -> String {
    format!("{}:{}-{}:{}", range.start.line, range.start.character, range.end.line, range.end.character)
}

fn escape_cell(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '|' => out.push_str("\\|"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "../tests/src/report_tests.rs"]
mod tests;
