//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::csp::DEFAULT_CONTENT_SECURITY_POLICY;
use crate::db::Database;
use crate::jwt::{MAX_TOKEN_EXPIRY, TokenConfig};
use clap::Parser;
use std::time::Duration;
use tracing::{error, info, warn};

const MIN_SECRET_LENGTH: usize = 32;

pub const ACCESS_SECRET_ENV: &str = "ACCESS_SECRET";
pub const REFRESH_SECRET_ENV: &str = "REFRESH_SECRET";

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "accountd",
    about = "User accounts with cookie-based JWT sessions"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8000")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, env = "DATABASE_PATH", default_value = "accountd.db")]
    pub database: String,

    /// Path to file containing the access token secret. Prefer the ACCESS_SECRET env var
    #[arg(long)]
    pub access_secret_file: Option<String>,

    /// Path to file containing the refresh token secret. Prefer the REFRESH_SECRET env var
    #[arg(long)]
    pub refresh_secret_file: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, env = "ACCESS_TOKEN_EXPIRY", default_value = "900", value_parser = parse_expiry)]
    pub access_token_expiry: u64,

    /// Refresh token lifetime in seconds
    #[arg(long, env = "REFRESH_TOKEN_EXPIRY", default_value = "604800", value_parser = parse_expiry)]
    pub refresh_token_expiry: u64,

    /// Send cookies without the Secure flag (plain HTTP development only)
    #[arg(long, env = "INSECURE_COOKIES")]
    pub insecure_cookies: bool,

    /// Content-Security-Policy header value
    #[arg(long, env = "CONTENT_SECURITY_POLICY", default_value = DEFAULT_CONTENT_SECURITY_POLICY)]
    pub content_security_policy: String,

    /// Log output format
    #[arg(short, long, env = "LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,
}

fn parse_expiry(s: &str) -> Result<u64, String> {
    let secs: u64 = s
        .parse()
        .map_err(|_| format!("Expiry must be a number of seconds: {}", s))?;
    if secs == 0 {
        return Err("Expiry must be greater than zero".to_string());
    }
    if secs > MAX_TOKEN_EXPIRY.as_secs() {
        return Err(format!(
            "Expiry must not exceed {} seconds",
            MAX_TOKEN_EXPIRY.as_secs()
        ));
    }
    Ok(secs)
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load a token secret from an environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
///
/// Removes the environment variable, so call it before any other thread is
/// started (in particular before the async runtime is built).
pub fn load_secret(env_var: &str, secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var(env_var) {
        // Clear the environment variable to prevent leaking
        // SAFETY: main calls this before building the runtime, while the
        // process is still single-threaded.
        unsafe { std::env::remove_var(env_var) };
        secret
    } else if let Some(path) = secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read secret file");
                return None;
            }
        }
    } else {
        error!(
            env = %env_var,
            "Token secret is required. Set the environment variable (recommended) or pass a secret file"
        );
        return None;
    };

    if secret.len() < MIN_SECRET_LENGTH {
        error!(
            env = %env_var,
            "Token secret is shorter than {} bytes. Use a longer secret",
            MIN_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    args: &Args,
    db: Database,
    access_secret: String,
    refresh_secret: String,
) -> ServerConfig {
    let secure_cookies = !args.insecure_cookies;
    if !secure_cookies {
        warn!("Cookies are sent without the Secure flag");
    }

    let mut tokens = TokenConfig::new(access_secret, refresh_secret);
    tokens.access_token_expiry = Duration::from_secs(args.access_token_expiry);
    tokens.refresh_token_expiry = Duration::from_secs(args.refresh_token_expiry);

    ServerConfig {
        db,
        tokens,
        secure_cookies,
        content_security_policy: args.content_security_policy.clone(),
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
