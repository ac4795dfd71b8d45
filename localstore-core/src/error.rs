//! Error types and result types for document store operations.
//!
//! Every store and dispatcher operation completes with either a result or one of
//! these errors. Use [`DocumentStoreResult<T>`] as the return type for fallible operations.

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with the document store.
///
/// The first four variants form the request-level taxonomy reported back to callers.
/// [`DocumentStoreError::Persistence`] only ever surfaces from the snapshot gateway's
/// internals, where it is logged and swallowed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentStoreError {
    /// A required request argument (`type`, `guid` or `fields`) was absent or empty.
    #[error("Missing required argument: {0}")]
    MissingArgument(&'static str),
    /// `read` or `list` was issued against a type that has no collection yet.
    #[error("Unknown type: {0}")]
    UnknownType(String),
    /// `update` did not resolve to an existing document.
    /// The first argument is the document guid, the second is the type name.
    #[error("Document {0} not found in type {1}")]
    NotFound(String, String),
    /// The action selector was absent or not one of the recognized actions.
    #[error("Unknown action: {0}")]
    UnknownAction(String),
    /// `fields` was present but was not an object or a list of objects.
    #[error("Invalid fields: {0}")]
    InvalidFields(String),
    /// Serialization/deserialization error when converting to or from JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Reading or writing the snapshot file failed.
    #[error("Persistence error: {0}")]
    Persistence(String),
    /// Error during store setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for DocumentStoreError {
    fn from(err: std::io::Error) -> Self {
        DocumentStoreError::Persistence(err.to_string())
    }
}
