use thiserror::Error;
use tourist_model::{ModelError, SlotFailure};

#[derive(Error, Debug)]
pub enum AlbumError {
    /// Non-ok API status, non-2xx HTTP response or transport failure.
    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Image cache write/read/delete failure.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AlbumError {
    /// Whether the same call may succeed later without any input change.
    pub fn is_retryable(&self) -> bool {
        match self {
            AlbumError::Remote(_)
            | AlbumError::Parse(_)
            | AlbumError::Storage(_) => true,
            AlbumError::Database(err) => matches!(
                err,
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
            ),
            AlbumError::NotFound(_)
            | AlbumError::Precondition(_)
            | AlbumError::InvalidInput(_) => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AlbumError::NotFound(_))
    }

    /// Projection used when a failed resolve is reported to subscribers.
    pub fn to_slot_failure(&self) -> SlotFailure {
        match self {
            AlbumError::Remote(msg) => SlotFailure::Remote(msg.clone()),
            AlbumError::Parse(msg) => SlotFailure::Parse(msg.clone()),
            other => SlotFailure::Storage(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for AlbumError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AlbumError::Parse(err.to_string())
        } else {
            AlbumError::Remote(err.to_string())
        }
    }
}

impl From<std::io::Error> for AlbumError {
    fn from(err: std::io::Error) -> Self {
        AlbumError::Storage(err.to_string())
    }
}

impl From<ModelError> for AlbumError {
    fn from(err: ModelError) -> Self {
        AlbumError::InvalidInput(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AlbumError>;
