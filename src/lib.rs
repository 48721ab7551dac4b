pub mod accounts;
pub mod api;
pub mod auth;
pub mod cli;
pub mod csp;
pub mod db;
pub mod jwt;

use accounts::AccountService;
use api::{ApiState, create_api_router};
use axum::{Router, middleware};
use csp::{SecurityHeaders, security_headers};
use db::Database;
use jwt::{TokenConfig, TokenConfigError, TokenService};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Signing secrets and lifetimes for access and refresh tokens
    pub tokens: TokenConfig,
    /// Whether to set Secure flag on cookies (should be true in production with HTTPS)
    pub secure_cookies: bool,
    /// Content-Security-Policy header value sent on every response
    pub content_security_policy: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid token configuration: {0}")]
    Tokens(#[from] TokenConfigError),

    #[error("invalid content security policy: {0}")]
    ContentSecurityPolicy(#[from] axum::http::header::InvalidHeaderValue),
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Result<Router, StartupError> {
    let tokens = Arc::new(TokenService::new(&config.tokens)?);
    let accounts = Arc::new(AccountService::new(Arc::new(config.db.users())));
    let headers = SecurityHeaders::new(&config.content_security_policy)?;

    let api_router = create_api_router(ApiState {
        accounts,
        tokens,
        secure_cookies: config.secure_cookies,
    });

    Ok(Router::new()
        .nest("/api", api_router)
        .layer(middleware::from_fn_with_state(headers, security_headers)))
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(app: Router, listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app).await
}

/// Start the server on the given port in a background task. Use port 0 to let the OS choose a random port.
/// Returns the actual address the server is listening on.
/// Note: For production use, prefer `run_server` directly in main.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> Result<(tokio::task::JoinHandle<()>, SocketAddr), std::io::Error> {
    let app = create_app(&config).map_err(std::io::Error::other)?;

    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = run_server(app, listener).await {
            tracing::error!(error = %e, "Server error");
        }
    });

    Ok((handle, local_addr))
}
