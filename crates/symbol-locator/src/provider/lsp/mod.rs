//! Language server backend: a minimal LSP client over stdio.

mod client;
mod transport;

pub use client::LanguageServerClient;
pub use transport::TransportError;
