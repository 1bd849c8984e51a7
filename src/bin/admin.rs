//! CLI administration tool for apigate.
//!
//! Produces password hashes for the seed user and issues or inspects
//! session tokens offline, using the same configuration as the server.
//!
//! # Usage
//!
//! ```bash
//! # Hash a password for ADMIN_PASSWORD_HASH (prompts when omitted)
//! cargo run --bin admin -- hash-password
//!
//! # Check a password against a stored hash
//! cargo run --bin admin -- verify-password '$argon2id$v=19$...'
//!
//! # Issue an access token for a subject
//! cargo run --bin admin -- issue-token --subject alice
//!
//! # Decode and validate a token
//! cargo run --bin admin -- inspect-token eyJhbGciOi...
//! ```
//!
//! # Environment Variables
//!
//! - `SECRET_KEY`, `ALGORITHM`, `ACCESS_TOKEN_EXPIRE_MINUTES`,
//!   `REFRESH_TOKEN_EXPIRE_DAYS`: as for the server

use apigate::application::services::TokenService;
use apigate::config::load_from_env;
use apigate::domain::entities::TokenKind;

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use dialoguer::{Confirm, Password};

/// CLI tool for managing apigate.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
enum Commands {
    /// Hash a password into PHC format for ADMIN_PASSWORD_HASH
    HashPassword {
        /// Password to hash (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Check a password against a PHC hash
    VerifyPassword {
        /// Stored PHC hash
        hash: String,

        /// Password to check (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Issue a signed token
    IssueToken {
        /// Token subject (username)
        #[arg(short, long)]
        subject: String,

        /// Token kind
        #[arg(short, long, value_enum, default_value_t = KindArg::Access)]
        kind: KindArg,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Decode and validate a token
    InspectToken {
        /// Encoded token
        token: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Access,
    Refresh,
}

impl From<KindArg> for TokenKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Access => TokenKind::Access,
            KindArg::Refresh => TokenKind::Refresh,
        }
    }
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::HashPassword { password } => hash_password(password),
        Commands::VerifyPassword { hash, password } => verify_password(&hash, password),
        Commands::IssueToken { subject, kind, yes } => issue_token(&subject, kind.into(), yes),
        Commands::InspectToken { token } => inspect_token(&token),
    }
}

fn read_password(provided: Option<String>, confirm: bool) -> Result<String> {
    if let Some(p) = provided {
        return Ok(p);
    }

    let mut prompt = Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Repeat password", "Passwords do not match");
    }
    Ok(prompt.interact()?)
}

fn token_service() -> Result<TokenService> {
    let config = load_from_env()?;
    TokenService::from_config(&config)
}

/// Prints an Argon2id PHC hash of the password.
fn hash_password(password: Option<String>) -> Result<()> {
    println!("{}", "🔐 Hash Password".bright_blue().bold());
    println!();

    let password = read_password(password, true)?;
    let hash = TokenService::hash_credential(&password)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

    println!("  {}", hash.bright_yellow());
    println!();
    println!("{}", "Add this to your environment:".bright_white());
    println!("  {}='{}'", "ADMIN_PASSWORD_HASH".bright_cyan(), hash);
    println!();

    Ok(())
}

fn verify_password(hash: &str, password: Option<String>) -> Result<()> {
    let password = read_password(password, false)?;

    if TokenService::verify_credential(&password, hash) {
        println!("{}", "✅ Password matches".green().bold());
        Ok(())
    } else {
        println!("{}", "❌ Password does not match".red().bold());
        std::process::exit(1);
    }
}

/// Issues a token signed with the configured secret.
///
/// # Flow
///
/// 1. Load token settings from the environment
/// 2. Confirm (unless `--yes` flag)
/// 3. Sign with the configured lifetime for the kind
/// 4. Print the token and its expiry
///
/// Refresh tokens issued here are not recorded by a running server and
/// will be rejected by `POST /refresh`.
fn issue_token(subject: &str, kind: TokenKind, skip_confirm: bool) -> Result<()> {
    println!("{}", "🔑 Issue Token".bright_blue().bold());
    println!();

    let tokens = token_service()?;

    println!("  Subject: {}", subject.cyan());
    println!("  Kind:    {}", kind.to_string().cyan());
    println!(
        "  Expires: in {} minutes",
        tokens.ttl(kind).num_minutes().to_string().cyan()
    );
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Issue this token?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let token = tokens
        .issue_kind(subject, kind)
        .map_err(|e| anyhow::anyhow!("Failed to issue token: {}", e))?;

    println!();
    println!("  {}", token.bright_yellow());
    println!();
    if kind == TokenKind::Access {
        println!("{}", "Add this to your requests:".bright_white());
        println!(
            "  {}: Bearer {}",
            "Authorization".bright_cyan(),
            token.bright_yellow()
        );
        println!();
    }

    Ok(())
}

/// Validates a token and prints its claims.
fn inspect_token(token: &str) -> Result<()> {
    println!("{}", "🔍 Inspect Token".bright_blue().bold());
    println!();

    let tokens = token_service()?;

    match tokens.validate(token) {
        Ok(claims) => {
            let issued = DateTime::from_timestamp(claims.iat, 0).context("iat out of range")?;
            let expires =
                DateTime::from_timestamp_millis(claims.exp_ms).context("exp out of range")?;

            println!("  Status:  {}", "VALID".green().bold());
            println!("  Subject: {}", claims.sub.cyan());
            println!("  Kind:    {}", claims.kind.to_string().cyan());
            println!("  Issued:  {}", issued.format("%Y-%m-%d %H:%M:%S UTC"));
            println!("  Expires: {}", expires.format("%Y-%m-%d %H:%M:%S%.3f UTC"));
            println!("  ID:      {}", claims.jti.bright_black());
            println!();
            Ok(())
        }
        Err(reason) => {
            println!("  Status: {}", "INVALID".red().bold());
            println!("  Reason: {}", reason.to_string().yellow());
            println!();
            std::process::exit(1);
        }
    }
}
