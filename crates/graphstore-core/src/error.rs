//! Error types for the graph storage engine.

use thiserror::Error;

/// Result type alias using the engine's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the graph storage engine.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors from record file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config JSON could not be parsed.
    #[error("config error: {0}")]
    Json(#[from] serde_json::Error),

    /// A record file's size is not a multiple of its record size, or a
    /// decoded pointer violates a store invariant.
    #[error("corrupt store: {0}")]
    CorruptStore(String),

    /// A requested record index is at or beyond the store's record count.
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// An entity is absent after a rehydration attempt, or present but
    /// tombstoned.
    #[error("not found: {0}")]
    NotFound(String),

    /// `create_graph` called while a graph is already present.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A relationship create with a null endpoint, an `add_property` on a
    /// non-owner, or an unknown comparator.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Raised by the CLI's command tokenizer.
    #[error("syntax error: {0}")]
    SyntaxError(String),

    /// Storage misconfiguration, e.g. an operation touching a store kind
    /// disabled in the engine config.
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Create a corrupt-store error.
    pub fn corrupt_store(msg: impl Into<String>) -> Self {
        Self::CorruptStore(msg.into())
    }

    /// Create a record-not-found error.
    pub fn record_not_found(msg: impl Into<String>) -> Self {
        Self::RecordNotFound(msg.into())
    }

    /// Create a not-found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an already-exists error.
    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    /// Create an invalid-argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a syntax error.
    pub fn syntax(msg: impl Into<String>) -> Self {
        Self::SyntaxError(msg.into())
    }

    /// Create a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
