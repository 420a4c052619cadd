//! Error types for the crypto crate.
//!
//! Two families live here. [`CryptoError`] covers faults on the signing side,
//! which indicate a misconfigured caller. [`VerifyError`] is the closed set of
//! verdicts a token verification can return; those are routine and are
//! handed back as data.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors that can occur while producing a signed artifact.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Caller setup is invalid (empty secret, zero TTL, ...)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// The OS random number generator failed
    #[error("Random source unavailable: {0}")]
    RandomSource(String),

    /// Claims could not be serialized into a JSON object
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CryptoError {
    /// Shorthand for a [`CryptoError::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// True when the error stems from caller configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Reason a token failed verification.
///
/// Variants are listed in the order the checks run; the first failing check
/// decides the verdict and nothing else about the token is revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyError {
    /// No secret was supplied
    #[error("missing_secret")]
    MissingSecret,

    /// Token is not three dot-separated segments
    #[error("invalid_format")]
    InvalidFormat,

    /// Signature does not match the header and payload
    #[error("invalid_signature")]
    InvalidSignature,

    /// Header is undecodable or names an unsupported algorithm
    #[error("invalid_header")]
    InvalidHeader,

    /// Payload is not a JSON object
    #[error("invalid_payload")]
    InvalidPayload,

    /// Reserved claims are missing or mistyped
    #[error("invalid_claims")]
    InvalidClaims,

    /// Token reached its expiry second
    #[error("expired")]
    Expired,
}

impl VerifyError {
    /// Every reason, in check order.
    pub const ALL: [VerifyError; 7] = [
        Self::MissingSecret,
        Self::InvalidFormat,
        Self::InvalidSignature,
        Self::InvalidHeader,
        Self::InvalidPayload,
        Self::InvalidClaims,
        Self::Expired,
    ];

    /// Stable snake_case identifier for the reason.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingSecret => "missing_secret",
            Self::InvalidFormat => "invalid_format",
            Self::InvalidSignature => "invalid_signature",
            Self::InvalidHeader => "invalid_header",
            Self::InvalidPayload => "invalid_payload",
            Self::InvalidClaims => "invalid_claims",
            Self::Expired => "expired",
        }
    }
}
