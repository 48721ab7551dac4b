mod error;
mod tokens;
mod users;
mod validation;

use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

use crate::accounts::AccountService;
use crate::auth::{HasTokenService, require_auth};
use crate::jwt::TokenService;

pub use error::{ApiError, ResultExt};
pub use validation::{ValidatedJson, validate_request};

/// Shared state for every API handler.
#[derive(Clone)]
pub struct ApiState {
    pub accounts: Arc<AccountService>,
    pub tokens: Arc<TokenService>,
    pub secure_cookies: bool,
}

impl HasTokenService for ApiState {
    fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}

/// Create the API router.
pub fn create_api_router(state: ApiState) -> Router {
    let protected = Router::new()
        .route("/me", get(users::me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth::<ApiState>,
        ));

    Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/auth/refresh", post(tokens::refresh))
        .route("/logout", post(tokens::logout))
        .route("/health", get(health))
        .merge(protected)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
