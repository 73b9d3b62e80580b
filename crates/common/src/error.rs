//! Common error types and handling for Unifest

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Unifest application
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid state: {0}")]
    State(String),

    #[error("Capacity exceeded: {0}")]
    Capacity(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Partial failure: {0}")]
    PartialFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the error code for machine-readable reporting
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Unexpected(_) => "UNEXPECTED_ERROR",
            Error::Transport(_) => "TRANSPORT_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::State(_) => "STATE_ERROR",
            Error::Capacity(_) => "CAPACITY_ERROR",
            Error::Conflict(_) => "CONFLICT",
            Error::NotFound(_) => "NOT_FOUND",
            Error::PartialFailure(_) => "PARTIAL_FAILURE",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller can fix this error by changing its input or
    /// re-reading current state (as opposed to infrastructure failures).
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::State(_)
                | Error::Capacity(_)
                | Error::Conflict(_)
                | Error::NotFound(_)
        )
    }
}
