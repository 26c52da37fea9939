//! Error types for the collection layer.

use thiserror::Error;

/// Result type for collection operations.
pub type CollectionResult<T> = Result<T, CollectionError>;

/// Errors that can occur in collection operations.
///
/// Rejected insertions are not errors: `add` reports them by returning
/// `None`, since conflicting keys are an expected outcome of merging
/// configuration.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// The collection does not enforce a unique key, so key lookups are
    /// unsupported.
    #[error("collection has no unique key")]
    KeyUnsupported,

    /// The collection is already wrapped by an override collection.
    #[error("collection is already an override collection")]
    AlreadyOverridable,

    /// An item failed validation.
    #[error("invalid item: {0}")]
    InvalidItem(String),

    /// A codec could not convert between an item and its record.
    #[error("codec error: {0}")]
    Codec(String),

    /// A destroy hook failed.
    #[error("destroy hook failed: {0}")]
    Destroy(String),

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
