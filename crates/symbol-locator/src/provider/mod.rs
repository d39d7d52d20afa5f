//! External collaborators that supply declarations, hover text and renames.
//!
//! The engine never analyses source itself. Everything it knows about a
//! document comes through these traits, and every call is made afresh so
//! results always reflect the live document.

mod lsp;
mod memory;

use std::{
    fmt::{Display, Formatter},
    future::Future,
    sync::Arc,
};

use lsp_types::{DocumentSymbolResponse, Position, Url, WorkspaceEdit};

pub use lsp::{LanguageServerClient, TransportError};
pub use memory::InMemoryProvider;

/// Supplies the raw symbol declarations of one document.
///
/// Files with no declarations, or of unsupported types, answer an empty
/// response rather than an error.
pub trait DeclarationProvider: Send + Sync {
    fn document_symbols(
        &self,
        uri: &Url,
    ) -> impl Future<Output = Result<DocumentSymbolResponse, ProviderError>> + Send;
}

/// Supplies documentation/type text for a position.
pub trait HoverProvider: Send + Sync {
    fn hover(
        &self,
        uri: &Url,
        position: Position,
    ) -> impl Future<Output = Result<Option<String>, ProviderError>> + Send;
}

/// Computes the edits that rename the symbol at a position.
pub trait RenameProvider: Send + Sync {
    fn rename(
        &self,
        uri: &Url,
        position: Position,
        new_name: &str,
    ) -> impl Future<Output = Result<Option<WorkspaceEdit>, ProviderError>> + Send;
}

impl<T: DeclarationProvider + ?Sized> DeclarationProvider for &T {
    fn document_symbols(
        &self,
        uri: &Url,
    ) -> impl Future<Output = Result<DocumentSymbolResponse, ProviderError>> + Send {
        (**self).document_symbols(uri)
    }
}

impl<T: DeclarationProvider + ?Sized> DeclarationProvider for Arc<T> {
    fn document_symbols(
        &self,
        uri: &Url,
    ) -> impl Future<Output = Result<DocumentSymbolResponse, ProviderError>> + Send {
        (**self).document_symbols(uri)
    }
}

impl<T: HoverProvider + ?Sized> HoverProvider for &T {
    fn hover(
        &self,
        uri: &Url,
        position: Position,
    ) -> impl Future<Output = Result<Option<String>, ProviderError>> + Send {
        (**self).hover(uri, position)
    }
}

impl<T: HoverProvider + ?Sized> HoverProvider for Arc<T> {
    fn hover(
        &self,
        uri: &Url,
        position: Position,
    ) -> impl Future<Output = Result<Option<String>, ProviderError>> + Send {
        (**self).hover(uri, position)
    }
}

impl<T: RenameProvider + ?Sized> RenameProvider for &T {
    fn rename(
        &self,
        uri: &Url,
        position: Position,
        new_name: &str,
    ) -> impl Future<Output = Result<Option<WorkspaceEdit>, ProviderError>> + Send {
        (**self).rename(uri, position, new_name)
    }
}

impl<T: RenameProvider + ?Sized> RenameProvider for Arc<T> {
    fn rename(
        &self,
        uri: &Url,
        position: Position,
        new_name: &str,
    ) -> impl Future<Output = Result<Option<WorkspaceEdit>, ProviderError>> + Send {
        (**self).rename(uri, position, new_name)
    }
}

#[derive(Debug)]
pub enum ProviderError {
    /// The backend could not be reached or has gone away.
    Unavailable(String),
    /// The backend did not answer in time.
    Timeout {
        method: String,
        after_ms: u64,
    },
    /// The backend answered with a JSON-RPC error.
    Rejected {
        method: String,
        code: i64,
        message: String,
    },
    /// The backend answered with something that is not the expected shape.
    InvalidResponse {
        method: String,
        reason: String,
    },
    /// A document could not be read or addressed.
    Document {
        uri: String,
        reason: String,
    },
}

impl Display for ProviderError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "provider unavailable: {reason}"),
            Self::Timeout {
                method,
                after_ms,
            } => {
                write!(f, "{method} timed out after {after_ms} ms")
            },
            Self::Rejected {
                method,
                code,
                message,
            } => {
                write!(f, "{method} failed with code {code}: {message}")
            },
            Self::InvalidResponse {
                method,
                reason,
            } => {
                write!(f, "{method} returned an invalid response: {reason}")
            },
            Self::Document {
                uri,
                reason,
            } => {
                write!(f, "cannot use document {uri}: {reason}")
            },
        }
    }
}

impl std::error::Error for ProviderError {}
