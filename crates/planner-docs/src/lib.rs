mod client;
mod library;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

pub use client::{parse_body, unwrap_envelope, Context7Client};
pub use library::{fetch_library_docs, resolve_library_id, DOCS_TOOL, RESOLVE_TOOL};

/// A JSON-RPC capability: method and params in, the envelope's `result` out.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DocsClient: Send + Sync {
    async fn call(&self, method: &str, params: Value) -> Result<Value, DocsError>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocsError {
    #[error("Context7 request failed: {0}")]
    Transport(String),

    #[error("Context7 HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Failed to parse Context7 response: {body}")]
    Unparseable { body: String },

    #[error("{message}")]
    Rpc { message: String },

    #[error("Context7 returned no library id for {library}")]
    MissingLibraryId { library: String },
}

impl DocsError {
    /// Whether the failure happened before a JSON-RPC answer was read.
    pub fn is_transport(&self) -> bool {
        matches!(self, DocsError::Transport(_) | DocsError::Http { .. })
    }
}
