//! Remote document fetcher trait.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Error returned by a [`Fetcher`]: network failures, non-success responses
/// and bodies that are not a parseable document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct FetchError(pub String);

impl FetchError {
    /// Create a fetch error with a message.
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Source of raw release documents.
///
/// Implement this trait to load documents from somewhere other than HTTP, or
/// to stub the network in tests. The returned value is handed to a
/// [`DocumentValidator`](crate::core::DocumentValidator) before use.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the document at `url`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if the document cannot be retrieved or parsed.
    async fn fetch(&self, url: &str) -> Result<Value, FetchError>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        (**self).fetch(url).await
    }
}
