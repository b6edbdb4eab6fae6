use std::fmt;

use thiserror::Error;

/// Opaque reference to an element rendered by the document handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(String);

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// The element is missing or went stale. Usually transient.
    #[error("element not found: {0}")]
    ElementNotFound(String),
    /// The browser session or window is gone.
    #[error("session lost: {0}")]
    SessionLost(String),
    /// The driver could not be reached at all.
    #[error("document handle unreachable: {0}")]
    HandleUnreachable(String),
}

impl DocumentError {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DocumentError::ElementNotFound(_))
    }
}

/// Explicit outcome of a lookup, replacing error-driven control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    Retry(String),
    Fatal(DocumentError),
}

impl<T> From<Result<T, DocumentError>> for Lookup<T> {
    fn from(result: Result<T, DocumentError>) -> Self {
        match result {
            Ok(value) => Lookup::Found(value),
            Err(DocumentError::ElementNotFound(what)) => Lookup::Retry(what),
            Err(err) => Lookup::Fatal(err),
        }
    }
}

/// The capability through which the scanner reads and drives the chat panel.
///
/// Implementations enforce their own bounded wait on every call.
#[async_trait::async_trait]
pub trait DocumentHandle: Send + Sync {
    async fn find_by_path(&self, query: &str) -> Result<ElementRef, DocumentError>;

    /// Resolves `query` relative to `origin`.
    async fn find_from(&self, origin: &ElementRef, query: &str)
        -> Result<ElementRef, DocumentError>;

    async fn click(&self, element: &ElementRef) -> Result<(), DocumentError>;

    async fn scroll_into_view(&self, element: &ElementRef) -> Result<(), DocumentError>;

    async fn clear_and_type(&self, element: &ElementRef, text: &str)
        -> Result<(), DocumentError>;

    async fn submit_key(&self, element: &ElementRef) -> Result<(), DocumentError>;

    async fn get_text(&self, element: &ElementRef) -> Result<String, DocumentError>;

    async fn get_attribute(&self, element: &ElementRef, name: &str)
        -> Result<String, DocumentError>;

    /// Number of elements currently matching `query`.
    async fn live_result_count(&self, query: &str) -> Result<usize, DocumentError>;

    /// Releases the underlying session. Further calls may fail.
    async fn close(&self) -> Result<(), DocumentError> {
        Ok(())
    }
}
