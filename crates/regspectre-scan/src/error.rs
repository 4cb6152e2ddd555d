use thiserror::Error;

/// Result type alias for provider operations
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Errors surfaced by registry provider adapters
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Credentials missing, expired, or rejected
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Authenticated but not permitted to perform the operation
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Network or service failure
    #[error("{0}")]
    Transport(String),

    /// Provider response could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// The provider does not implement this capability
    #[error("operation not supported by this provider")]
    Unsupported,

    /// The scan deadline expired before the call completed
    #[error("scan deadline exceeded")]
    DeadlineExceeded,
}

impl ProviderError {
    /// True when retrying without configuration changes could help
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// True when the failure is about credentials or permissions
    #[must_use]
    pub const fn is_auth_error(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::AccessDenied(_))
    }
}
