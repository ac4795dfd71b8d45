//! Error types for cache operations.

use thiserror::Error;

/// Errors reported by the cache.
///
/// The cache operations themselves never fail; only malformed requests and
/// starting a purger outside a runtime do.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The request carried no `act` selector.
    #[error("No cache action defined")]
    MissingAction,
    /// The `act` selector was not save, load or remove.
    #[error("Unknown cache action: {0}")]
    UnknownAction(String),
    /// A required argument (`key`, or `value` for save) was absent.
    #[error("Missing required argument: {0}")]
    MissingArgument(&'static str),
    /// No tokio runtime was available to run the purger on.
    #[error("Cache runtime error: {0}")]
    Runtime(String),
}

/// A specialized `Result` type for cache requests.
pub type CacheResult<T> = Result<T, CacheError>;
