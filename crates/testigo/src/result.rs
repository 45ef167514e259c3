//! Result and error types for Testigo.

use thiserror::Error;

/// Result type for Testigo operations
pub type TestigoResult<T> = Result<T, TestigoError>;

/// Errors that can occur in Testigo
///
/// Every variant is a programmer-facing test-authoring error. There is
/// no transient failure mode in an in-memory call ledger, so nothing
/// here is retried or recovered from.
#[derive(Debug, Error)]
pub enum TestigoError {
    /// Recorder configured with an empty method vocabulary
    #[error("method vocabulary is empty")]
    EmptyVocabulary,

    /// Recorder configured with a duplicate method name
    #[error("duplicate method name in vocabulary: {name}")]
    DuplicateMethod {
        /// The duplicated method name
        name: String,
    },

    /// Operation referenced a method outside the configured vocabulary
    #[error("unknown method: {name}")]
    UnknownMethod {
        /// The offending method name
        name: String,
    },

    /// A pending waiter was discarded by reset, dispose, or recorder drop
    #[error("waiter for '{method}' was discarded before the call was recorded")]
    WaiterDiscarded {
        /// Method the waiter was registered for
        method: String,
    },

    /// A scripted response was requested for a method with none configured
    #[error("no scripted response for method: {method}")]
    MissingResponse {
        /// Method with no remaining response
        method: String,
    },

    /// A deferred value's resolver was dropped without resolving
    #[error("resolver dropped before the deferred value was resolved")]
    ResolverDropped,

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
