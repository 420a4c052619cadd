//! CLI command implementations

pub mod event;
pub mod token;

use anyhow::{bail, Context, Result};
use std::io::Read;

/// How a command finished when it did not error out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Artifact produced or input accepted
    Accepted,
    /// Input was checked and rejected
    Rejected,
}

/// Resolve a body argument: `-` reads stdin, `@path` reads a file, anything
/// else is taken literally. Bytes are returned untouched.
pub fn read_body(arg: &str) -> Result<Vec<u8>> {
    if arg == "-" {
        let mut body = Vec::new();
        std::io::stdin()
            .read_to_end(&mut body)
            .context("Failed to read body from stdin")?;
        return Ok(body);
    }
    if let Some(path) = arg.strip_prefix('@') {
        return std::fs::read(path).with_context(|| format!("Failed to read body file {path}"));
    }
    Ok(arg.as_bytes().to_vec())
}

/// Secret required for signing.
pub fn require_secret(secret: Option<&str>) -> Result<&str> {
    match secret {
        Some(secret) => Ok(secret),
        None => bail!("No secret provided: pass --secret or set TRUSTMARK_SECRET"),
    }
}
