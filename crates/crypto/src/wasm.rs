//! WASM bindings for token and event verification.
//!
//! JavaScript numbers arrive as `f64`; timestamps must be finite whole
//! numbers within the safe-integer range or the call fails.

use wasm_bindgen::prelude::*;

use crate::token::{self, IssueOptions, VerifyOptions};
use crate::{CryptoError, Result};

/// Largest integer a JavaScript number holds exactly (2^53 - 1).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Sign an event body and return the hex signature.
///
/// Throws for an empty secret or a timestamp that is not a whole number.
#[wasm_bindgen]
pub fn sign_event_hex(secret: &str, timestamp: f64, nonce: &str, body: &str) -> std::result::Result<String, JsError> {
    sign_event(secret, timestamp, nonce, body).map_err(|e| JsError::new(&e.to_string()))
}

/// Verify an event signature (constant-time comparison).
///
/// False for an empty secret or a timestamp that is not a whole number.
#[wasm_bindgen]
pub fn verify_event_hex(secret: &str, timestamp: f64, nonce: &str, body: &str, signature: &str) -> bool {
    match timestamp_from_js(timestamp) {
        Ok(timestamp) => crate::event::verify(secret, timestamp, nonce, body, signature),
        Err(_) => false,
    }
}

/// Issue a token from a JSON claims object.
///
/// Throws for an empty secret, a zero TTL or claims that are not a JSON object.
#[wasm_bindgen]
pub fn issue_token_json(claims_json: &str, secret: &str, expires_in_seconds: u32) -> std::result::Result<String, JsError> {
    issue_token(claims_json, secret, expires_in_seconds).map_err(|e| JsError::new(&e.to_string()))
}

/// Verify a token and return `{"ok":true,"claims":{...}}` or
/// `{"ok":false,"reason":"..."}`.
#[wasm_bindgen]
pub fn verify_token_json(token: &str, secret: &str) -> String {
    let verdict = match token::verify::<serde_json::Map<String, serde_json::Value>>(token, secret, &VerifyOptions::default()) {
        Ok(claims) => serde_json::json!({ "ok": true, "claims": claims }),
        Err(reason) => serde_json::json!({ "ok": false, "reason": reason.code() }),
    };
    verdict.to_string()
}

fn sign_event(secret: &str, timestamp: f64, nonce: &str, body: &str) -> Result<String> {
    crate::event::sign(secret, timestamp_from_js(timestamp)?, nonce, body)
}

fn issue_token(claims_json: &str, secret: &str, expires_in_seconds: u32) -> Result<String> {
    let claims: serde_json::Value = serde_json::from_str(claims_json)?;
    token::issue(&claims, secret, &IssueOptions::new(u64::from(expires_in_seconds)))
}

fn timestamp_from_js(timestamp: f64) -> Result<i64> {
    if !timestamp.is_finite() || timestamp.fract() != 0.0 || timestamp.abs() > MAX_SAFE_INTEGER {
        return Err(CryptoError::configuration(format!(
            "timestamp must be a whole number of seconds, got {timestamp}"
        )));
    }
    Ok(timestamp as i64)
}
