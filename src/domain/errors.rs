use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Capability error: {message}")]
    Capability { message: String, transient: bool },

    #[error("Cache corrupt: {0}")]
    CacheCorrupt(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Upstream failure worth retrying (timeouts, rate limits, 5xx).
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Capability {
            message: msg.into(),
            transient: true,
        }
    }

    pub fn permanent(msg: impl Into<String>) -> Self {
        Self::Capability {
            message: msg.into(),
            transient: false,
        }
    }

    pub fn cache_corrupt(msg: impl Into<String>) -> Self {
        Self::CacheCorrupt(msg.into())
    }

    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Capability { transient: true, .. })
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
