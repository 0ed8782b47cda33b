/// Core error types for Lyra
use thiserror::Error;

/// Result type alias using `LyraError`
pub type Result<T> = std::result::Result<T, LyraError>;

/// Core error type for Lyra
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LyraError {
    /// A mutation was attempted without a signed-in user
    #[error("Authentication required")]
    Unauthenticated,

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The current user does not own the entity being mutated
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Invalid input (empty playlist name, malformed record)
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Network or store failure, recoverable by retry
    #[error("Transient I/O error: {0}")]
    TransientIo(String),

    /// Uniqueness conflict reported by the store
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store answered with a payload we could not decode
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LyraError {
    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an unauthorized error
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a transient I/O error
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::TransientIo(msg.into())
    }

    /// Whether retrying the same operation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientIo(_))
    }
}

impl From<serde_json::Error> for LyraError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}
