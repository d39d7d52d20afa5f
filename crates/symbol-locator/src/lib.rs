pub mod config;
pub mod governor;
pub mod kind;
pub mod locator;
pub mod matcher;
pub mod operations;
pub mod overview;
pub mod provider;
pub mod report;
pub mod resolve;
pub mod tree;

pub use config::Settings;
pub use governor::{AnswerSizeGovernor, Governed, answer_json};
pub use locator::{ResolutionError, ResolutionReport, ResolutionResult, Selector, SymbolLocator};
pub use matcher::{MatchOptions, NamePathQuery, matches};
pub use operations::{OperationError, SymbolOperations};
pub use overview::{Overview, OverviewScanner, TopLevelSymbol};
pub use provider::{
    DeclarationProvider, HoverProvider, InMemoryProvider, LanguageServerClient, ProviderError, RenameProvider,
};
pub use report::{Depth, MAX_REPORT_DEPTH, ReportRenderer};
pub use resolve::{SearchOptions, resolve_at_position, resolve_by_name};
pub use tree::{NodeId, SymbolNode, SymbolTree, TreeBuilder};

#[cfg(test)]
#[path = "../tests/src/support.rs"]
pub(crate) mod test_support;
