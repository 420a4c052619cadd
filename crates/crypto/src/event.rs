//! Signed inter-service events (webhooks and callbacks).
//!
//! The signature is lowercase hex HMAC-SHA256 over `"{timestamp}.{nonce}."`
//! followed by the raw body bytes. Signing and verification never look at the
//! clock; rejecting stale timestamps or repeated nonces is left to the
//! receiver, with [`is_fresh`] as an opt-in helper.

use serde::{Deserialize, Serialize};

use crate::{constant_time_compare, hmac_sha256_hex, CryptoError, Result};

/// Header carrying the signing timestamp.
pub const TIMESTAMP_HEADER: &str = "X-Signature-Timestamp";

/// Header carrying the nonce.
pub const NONCE_HEADER: &str = "X-Signature-Nonce";

/// Header carrying the hex signature.
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// Length of a rendered event signature.
pub const SIGNATURE_LEN: usize = 64;

/// Default freshness window used by receivers (5 minutes).
pub const DEFAULT_TOLERANCE_SECONDS: u64 = 300;

/// Sign an event body.
///
/// # Arguments
/// * `secret` - Shared secret
/// * `timestamp` - Seconds since the Unix epoch, rendered in decimal
/// * `nonce` - Per-event unique value
/// * `body` - Exact bytes that will be sent
///
/// # Returns
/// 64-character lowercase hex signature
pub fn sign(secret: impl AsRef<[u8]>, timestamp: i64, nonce: &str, body: impl AsRef<[u8]>) -> Result<String> {
    let secret = secret.as_ref();
    if secret.is_empty() {
        return Err(CryptoError::configuration("event secret must not be empty"));
    }

    hmac_sha256_hex(secret, &signing_input(timestamp, nonce, body.as_ref()))
}

/// Recompute the signature and compare it in constant time.
///
/// Returns false for an empty secret rather than failing; use
/// [`verify_checked`] to tell that case apart from a bad signature.
pub fn verify(
    secret: impl AsRef<[u8]>,
    timestamp: i64,
    nonce: &str,
    body: impl AsRef<[u8]>,
    signature: &str,
) -> bool {
    verify_checked(secret, timestamp, nonce, body, signature).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "event signature not checked");
        false
    })
}

/// Like [`verify`], but an empty secret is a [`CryptoError::Configuration`]
/// just as it is for [`sign`].
pub fn verify_checked(
    secret: impl AsRef<[u8]>,
    timestamp: i64,
    nonce: &str,
    body: impl AsRef<[u8]>,
    signature: &str,
) -> Result<bool> {
    let expected = sign(secret, timestamp, nonce, body)?;
    Ok(constant_time_compare(expected.as_bytes(), signature.as_bytes()))
}

/// True when `timestamp` lies within `tolerance_seconds` of `now`, either side.
pub fn is_fresh(timestamp: i64, now: i64, tolerance_seconds: u64) -> bool {
    let diff = now.abs_diff(timestamp);
    if diff > tolerance_seconds {
        tracing::debug!(diff, tolerance_seconds, "event timestamp outside window");
        return false;
    }
    true
}

/// Generate a random nonce: 32 bytes from the OS generator as 64 hex chars.
pub fn generate_nonce() -> Result<String> {
    let mut bytes = [0u8; 32];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| CryptoError::RandomSource(e.to_string()))?;
    Ok(crate::encoding::hex_lower(bytes))
}

fn signing_input(timestamp: i64, nonce: &str, body: &[u8]) -> Vec<u8> {
    let prefix = format!("{timestamp}.{nonce}.");
    let mut input = Vec::with_capacity(prefix.len() + body.len());
    input.extend_from_slice(prefix.as_bytes());
    input.extend_from_slice(body);
    input
}

/// The three values a sender attaches to an event, usually as headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEvent {
    /// Seconds since the Unix epoch
    pub timestamp: i64,
    /// Per-event unique value
    pub nonce: String,
    /// Lowercase hex HMAC-SHA256
    pub signature: String,
}

impl SignedEvent {
    /// Sign `body` at `timestamp` under a freshly generated nonce.
    pub fn sign(secret: impl AsRef<[u8]>, timestamp: i64, body: impl AsRef<[u8]>) -> Result<Self> {
        let nonce = generate_nonce()?;
        Self::sign_with_nonce(secret, timestamp, nonce, body)
    }

    /// Sign `body` with a caller-chosen nonce.
    pub fn sign_with_nonce(
        secret: impl AsRef<[u8]>,
        timestamp: i64,
        nonce: impl Into<String>,
        body: impl AsRef<[u8]>,
    ) -> Result<Self> {
        let nonce = nonce.into();
        let signature = sign(secret, timestamp, &nonce, body)?;
        Ok(Self {
            timestamp,
            nonce,
            signature,
        })
    }

    /// Check `body` against this event's signature.
    pub fn verify(&self, secret: impl AsRef<[u8]>, body: impl AsRef<[u8]>) -> bool {
        verify(secret, self.timestamp, &self.nonce, body, &self.signature)
    }

    /// Header name/value pairs for transport.
    pub fn headers(&self) -> [(&'static str, String); 3] {
        [
            (TIMESTAMP_HEADER, self.timestamp.to_string()),
            (NONCE_HEADER, self.nonce.clone()),
            (SIGNATURE_HEADER, self.signature.clone()),
        ]
    }
}
