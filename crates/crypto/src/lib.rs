//! Shared-secret trust primitives for Trustmark services.
//!
//! This crate provides:
//! - HMAC-SHA256 signing and constant-time comparison
//! - Compact HS256 authorization tokens with expiry and identity claims
//! - Timestamp + nonce signatures for inter-service events
//!
//! Every function takes its secret explicitly and keeps no state between
//! calls.

#![warn(missing_docs)]

pub mod encoding;
pub mod event;
pub mod token;

mod error;
mod hmac_impl;
mod timing;

#[cfg(feature = "wasm")]
mod wasm;

pub use error::{CryptoError, Result, VerifyError};
pub use hmac_impl::{hmac_sha256, hmac_sha256_hex, verify_signature, DIGEST_LEN};
pub use timing::constant_time_compare;
pub use token::{Claims, IssueOptions, VerifyOptions};

/// Current time in whole seconds since the Unix epoch.
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
