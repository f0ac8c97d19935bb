//! Store error types.

use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by the document store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading the store file failed
    #[error("Failed to access store file: {0}")]
    Io(#[from] std::io::Error),

    /// The store file or a document could not be (de)serialized
    #[error("Failed to serialize store contents: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The atomic rename of the rewritten store file failed
    #[error("Failed to persist store file: {0}")]
    Persist(#[from] tempfile::PersistError),

    /// A stored document does not match the expected record type
    #[error("Document {table}/{doc_id} is corrupt: {source}")]
    Corrupt {
        /// Table holding the document
        table: String,
        /// Document id
        doc_id: String,
        /// Decode failure
        #[source]
        source: serde_json::Error,
    },

    /// Insert of a document id that already exists
    #[error("Document {table}/{doc_id} already exists")]
    DuplicateDocument {
        /// Table holding the document
        table: String,
        /// Document id
        doc_id: String,
    },

    /// Update of a document id that does not exist
    #[error("Document {table}/{doc_id} does not exist")]
    MissingDocument {
        /// Table holding the document
        table: String,
        /// Document id
        doc_id: String,
    },
}
