//! Error type definitions
//!
//! Defines the main error types used throughout the session provider.
//! Transport and parsing failures inside the resolver and bundle intel
//! layers are caught locally and re-raised as one of the domain kinds
//! below; callers match on the kind, never on a wrapped transport error.

use thiserror::Error;

/// Main error type for the session provider
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The provider rejected the login attempt, or the login failed for
    /// any non-TOTP reason. Non-retryable: the sp_dc credential itself
    /// is suspect.
    #[error("Invalid sp_dc credential: {0}")]
    CredentialInvalid(String),

    /// HMAC computation or TOTP derivation failed
    #[error("TOTP generation failed: {0}")]
    CodeGeneration(String),

    /// Every secret mirror was unreachable, unparseable or empty
    #[error("Secret unavailable: {0}")]
    SecretUnavailable(String),

    /// The web-player bundle no longer matches the expected layout
    #[error("Bundle format changed: {0}")]
    BundleFormatChanged(String),

    /// Operation name absent from both query and mutation namespaces
    #[error("Operation hash not found for '{name}'")]
    OperationHashNotFound {
        /// The persisted-operation name that was looked up
        name: String,
    },

    /// A privileged operation was invoked before any successful login
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    /// Catch-all for unrecognized failures during a session refresh
    #[error("Unexpected error while refreshing the session: {0}")]
    SessionRefresh(String),

    /// Network/HTTP client errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new invalid-credential error
    pub fn credential_invalid(msg: impl Into<String>) -> Self {
        Self::CredentialInvalid(msg.into())
    }

    /// Create a new code generation error
    pub fn code_generation(msg: impl Into<String>) -> Self {
        Self::CodeGeneration(msg.into())
    }

    /// Create a new secret-unavailable error
    pub fn secret_unavailable(msg: impl Into<String>) -> Self {
        Self::SecretUnavailable(msg.into())
    }

    /// Create a new bundle-format error
    pub fn bundle_format(msg: impl Into<String>) -> Self {
        Self::BundleFormatChanged(msg.into())
    }

    /// Create a new operation-hash-not-found error
    pub fn hash_not_found(name: impl Into<String>) -> Self {
        Self::OperationHashNotFound { name: name.into() }
    }

    /// Create a new unauthenticated error
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    /// Create a new session refresh error
    pub fn session_refresh(msg: impl Into<String>) -> Self {
        Self::SessionRefresh(msg.into())
    }

    /// Whether this error is one of the recognized domain kinds a session
    /// refresh must re-raise verbatim instead of collapsing into
    /// [`Error::SessionRefresh`].
    pub fn is_recognized_login_failure(&self) -> bool {
        matches!(
            self,
            Self::CredentialInvalid(_) | Self::CodeGeneration(_) | Self::SecretUnavailable(_)
        )
    }

    /// Whether a caller may reasonably retry after this error
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SecretUnavailable(_) | Self::SessionRefresh(_))
    }
}
