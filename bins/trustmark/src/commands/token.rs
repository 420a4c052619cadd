//! `token issue` and `token verify`

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use trustmark_crypto::token::{self, Claims, IssueOptions, VerifyOptions};

use super::{require_secret, Outcome};
use crate::output::{print_json, OutputFormat, Status};

/// Arguments for `token issue`
#[derive(Debug, Clone)]
pub struct IssueArgs {
    pub claims: Option<String>,
    pub ttl: u64,
    pub iat: Option<i64>,
    pub jti: Option<String>,
}

/// Issue a token and print it.
pub fn issue(args: &IssueArgs, secret: Option<&str>, format: OutputFormat) -> Result<Outcome> {
    let secret = require_secret(secret)?;

    let claims: Value = match &args.claims {
        Some(raw) => serde_json::from_str(raw).context("--claims is not valid JSON")?,
        None => Value::Object(Map::new()),
    };

    let mut options = IssueOptions::new(args.ttl);
    if let Some(iat) = args.iat {
        options = options.issued_at(iat);
    }
    if let Some(jti) = &args.jti {
        options = options.token_id(jti.as_str());
    }

    let token = token::issue(&claims, secret, &options).context("Failed to issue token")?;
    tracing::info!(ttl = args.ttl, "token issued");

    match format {
        OutputFormat::Text => println!("{token}"),
        OutputFormat::Json => print_json(&json!({ "token": token }))?,
    }
    Ok(Outcome::Accepted)
}

/// Verify a token and print its claims or the rejection reason.
pub fn verify(token: &str, now: Option<i64>, secret: Option<&str>, format: OutputFormat) -> Result<Outcome> {
    let options = VerifyOptions { now_seconds: now };
    let verdict: std::result::Result<Claims, _> = token::verify(token.trim(), secret.unwrap_or_default(), &options);

    match (verdict, format) {
        (Ok(claims), OutputFormat::Text) => {
            Status::success(&format!("Token valid (jti {}, expires {})", claims.jti, claims.exp));
            print_json(&claims)?;
            Ok(Outcome::Accepted)
        }
        (Ok(claims), OutputFormat::Json) => {
            print_json(&json!({ "valid": true, "claims": claims }))?;
            Ok(Outcome::Accepted)
        }
        (Err(reason), OutputFormat::Text) => {
            Status::error(&format!("Token rejected: {reason}"));
            Ok(Outcome::Rejected)
        }
        (Err(reason), OutputFormat::Json) => {
            print_json(&json!({ "valid": false, "reason": reason }))?;
            Ok(Outcome::Rejected)
        }
    }
}
