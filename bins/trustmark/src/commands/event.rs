//! `event sign` and `event verify`

use anyhow::{Context, Result};
use serde_json::json;
use trustmark_crypto::event::{self, SignedEvent};
use trustmark_crypto::unix_now;

use super::{read_body, require_secret, Outcome};
use crate::output::{print_json, OutputFormat, Status};

/// Arguments for `event sign`
#[derive(Debug, Clone)]
pub struct SignArgs {
    pub body: String,
    pub timestamp: Option<i64>,
    pub nonce: Option<String>,
}

/// Arguments for `event verify`
#[derive(Debug, Clone)]
pub struct VerifyArgs {
    pub body: String,
    pub timestamp: i64,
    pub nonce: String,
    pub signature: String,
    pub check_freshness: bool,
    pub now: Option<i64>,
}

/// Sign a body and print the signature headers.
pub fn sign(args: &SignArgs, secret: Option<&str>, format: OutputFormat) -> Result<Outcome> {
    let secret = require_secret(secret)?;
    let body = read_body(&args.body)?;
    let timestamp = args.timestamp.unwrap_or_else(unix_now);

    let signed = match &args.nonce {
        Some(nonce) => SignedEvent::sign_with_nonce(secret, timestamp, nonce.as_str(), &body),
        None => SignedEvent::sign(secret, timestamp, &body),
    }
    .context("Failed to sign event")?;
    tracing::info!(timestamp, body_len = body.len(), "event signed");

    match format {
        OutputFormat::Text => {
            for (name, value) in signed.headers() {
                println!("{name}: {value}");
            }
        }
        OutputFormat::Json => print_json(&signed)?,
    }
    Ok(Outcome::Accepted)
}

/// Verify a received event, optionally enforcing the freshness window.
pub fn verify(
    args: &VerifyArgs,
    tolerance_seconds: u64,
    secret: Option<&str>,
    format: OutputFormat,
) -> Result<Outcome> {
    let secret = require_secret(secret)?;
    let body = read_body(&args.body)?;

    let signature_ok = event::verify_checked(secret, args.timestamp, &args.nonce, &body, args.signature.trim())
        .context("Failed to verify event")?;
    let reason = if !signature_ok {
        Some("invalid_signature")
    } else if args.check_freshness
        && !event::is_fresh(args.timestamp, args.now.unwrap_or_else(unix_now), tolerance_seconds)
    {
        Some("stale_timestamp")
    } else {
        None
    };

    match (reason, format) {
        (None, OutputFormat::Text) => Status::success("Event signature valid"),
        (None, OutputFormat::Json) => print_json(&json!({ "valid": true }))?,
        (Some(reason), OutputFormat::Text) => Status::error(&format!("Event rejected: {reason}")),
        (Some(reason), OutputFormat::Json) => print_json(&json!({ "valid": false, "reason": reason }))?,
    }

    Ok(if reason.is_none() { Outcome::Accepted } else { Outcome::Rejected })
}
