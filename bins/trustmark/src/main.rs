//! trustmark - issue and verify signed tokens and events
//!
//! Exit codes: `0` accepted, `1` rejected by verification, `2` usage or
//! configuration error.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod config;
mod output;

use commands::{event, token, Outcome};
use config::Config;
use output::{OutputFormat, Status};

/// Exit code for a verification that ran and rejected its input
const EXIT_REJECTED: u8 = 1;

/// Exit code for usage and configuration errors
const EXIT_ERROR: u8 = 2;

/// Shared-secret tokens and signed events for Trustmark services
#[derive(Parser)]
#[command(name = "trustmark")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Shared secret
    #[arg(long, global = true, env = "TRUSTMARK_SECRET", hide_env_values = true)]
    secret: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue and verify authorization tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Sign and verify inter-service events
    Event {
        #[command(subcommand)]
        action: EventAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue a signed token
    Issue {
        /// Claims as a JSON object
        #[arg(long)]
        claims: Option<String>,

        /// Lifetime in seconds (defaults to token.default_ttl_seconds)
        #[arg(long)]
        ttl: Option<u64>,

        /// Issued-at override, seconds since the Unix epoch
        #[arg(long, allow_hyphen_values = true)]
        iat: Option<i64>,

        /// Token identifier override
        #[arg(long)]
        jti: Option<String>,
    },

    /// Verify a token and print its claims
    Verify {
        /// The token to verify
        token: String,

        /// Current time override, seconds since the Unix epoch
        #[arg(long, allow_hyphen_values = true)]
        now: Option<i64>,
    },
}

#[derive(Subcommand)]
enum EventAction {
    /// Sign an event body
    Sign {
        /// Body text, `@file` to read a file, `-` for stdin
        #[arg(long)]
        body: String,

        /// Timestamp override, seconds since the Unix epoch
        #[arg(long, allow_hyphen_values = true)]
        timestamp: Option<i64>,

        /// Nonce override (random by default)
        #[arg(long)]
        nonce: Option<String>,
    },

    /// Verify a received event signature
    Verify {
        /// Body text, `@file` to read a file, `-` for stdin
        #[arg(long)]
        body: String,

        /// Timestamp the sender signed with
        #[arg(long, allow_hyphen_values = true)]
        timestamp: i64,

        /// Nonce the sender signed with
        #[arg(long)]
        nonce: String,

        /// Hex signature to check
        #[arg(long)]
        signature: String,

        /// Also reject timestamps outside event.tolerance_seconds
        #[arg(long)]
        check_freshness: bool,

        /// Current time override for --check-freshness
        #[arg(long, allow_hyphen_values = true)]
        now: Option<i64>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            Status::error(&format!("{e:#}"));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut log_config = config.schema.log.clone();
    if cli.verbose {
        log_config = log_config.verbose();
    }
    if let Err(e) = trustmark_telemetry::init_with_config(&log_config) {
        Status::warning(&e.to_string());
    }
    if let Some(path) = &config.path {
        tracing::debug!(path = %path.display(), "loaded configuration");
    }

    let secret = cli.secret.as_deref();
    let format = cli.format;

    let result = match cli.command {
        Commands::Token { action } => match action {
            TokenAction::Issue { claims, ttl, iat, jti } => {
                let args = token::IssueArgs {
                    claims,
                    ttl: ttl.unwrap_or(config.schema.token.default_ttl_seconds),
                    iat,
                    jti,
                };
                token::issue(&args, secret, format)
            }
            TokenAction::Verify { token: raw, now } => token::verify(&raw, now, secret, format),
        },

        Commands::Event { action } => match action {
            EventAction::Sign { body, timestamp, nonce } => {
                event::sign(&event::SignArgs { body, timestamp, nonce }, secret, format)
            }
            EventAction::Verify {
                body,
                timestamp,
                nonce,
                signature,
                check_freshness,
                now,
            } => {
                let args = event::VerifyArgs {
                    body,
                    timestamp,
                    nonce,
                    signature,
                    check_freshness,
                    now,
                };
                event::verify(&args, config.schema.event.tolerance_seconds, secret, format)
            }
        },
    };

    match result {
        Ok(Outcome::Accepted) => ExitCode::SUCCESS,
        Ok(Outcome::Rejected) => ExitCode::from(EXIT_REJECTED),
        Err(e) => {
            Status::error(&format!("{e:#}"));
            ExitCode::from(EXIT_ERROR)
        }
    }
}
