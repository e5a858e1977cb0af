/// Content Store Access
///
/// The portfolio reads projects and skills from a headless document store and
/// writes contact submissions back to it. Backends implement `ContentClient`;
/// the rest of the service only ever sees the trait object.

pub mod asset;
pub mod memory;
pub mod models;
pub mod query;
pub mod sanity;

pub use asset::AssetUrlResolver;
pub use memory::InMemoryContentStore;
pub use models::*;
pub use query::{DocumentQuery, SortDirection};
pub use sanity::{SanityClient, SanityClientConfig};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors raised by content store backends
#[derive(Error, Debug)]
pub enum ContentError {
    /// Network failure talking to the store
    #[error("transport error: {0}")]
    Transport(String),

    /// Store answered with a non-success status
    #[error("store returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not what the store contract promises
    #[error("malformed response: {0}")]
    Decode(String),

    /// Query could not be evaluated by this backend
    #[error("unsupported query: {0}")]
    Query(String),

    /// Document rejected before being sent
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

/// Remote content store contract
///
/// `fetch` evaluates a query expression and returns the matching documents;
/// `create` writes one document and returns what the store stored. Newly
/// created documents are not guaranteed to be visible to a following `fetch`.
#[async_trait]
pub trait ContentClient: Send + Sync {
    /// Evaluate a query and return the matching documents
    async fn fetch(&self, query: &str) -> Result<Vec<Value>, ContentError>;

    /// Create a single document
    async fn create(&self, document: Value) -> Result<Value, ContentError>;

    /// Short tag used in logs and metrics
    fn backend_tag(&self) -> &'static str;
}
