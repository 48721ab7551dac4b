//! Account endpoints.
//!
//! - POST `/register` - Create an account
//! - POST `/login` - Check credentials and set both token cookies
//! - GET `/me` - Current account (behind the auth middleware)

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::ApiState;
use super::error::{ApiError, ResultExt};
use super::validation::ValidatedJson;
use crate::accounts::Account;
use crate::auth::{ApiAuth, access_cookie, refresh_cookie};

#[derive(Deserialize, Validate)]
pub(super) struct RegisterRequest {
    #[validate(length(min = 3, message = "username must be at least 3 characters long"))]
    username: String,
    #[validate(email(message = "email must be a valid email address"))]
    email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters long"))]
    password: String,
}

pub(super) async fn register(
    State(state): State<ApiState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state
        .accounts
        .register(&payload.username, &payload.email, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(account)))
}

#[derive(Deserialize, Validate)]
pub(super) struct LoginRequest {
    #[validate(email(message = "email must be a valid email address"))]
    email: String,
    #[validate(length(min = 1, message = "password is required"))]
    password: String,
}

#[derive(Serialize)]
struct LoginUser {
    id: i64,
    email: String,
}

#[derive(Serialize)]
struct LoginResponse {
    user: LoginUser,
}

pub(super) async fn login(
    State(state): State<ApiState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state
        .accounts
        .authenticate(&payload.email, &payload.password)
        .await?;

    let access = state
        .tokens
        .issue_access_token(account.id)
        .internal_err("Failed to issue access token")?;
    let refresh = state
        .tokens
        .issue_refresh_token(account.id)
        .internal_err("Failed to issue refresh token")?;

    let cookies = [
        (
            SET_COOKIE,
            access_cookie(&access.token, access.duration, state.secure_cookies),
        ),
        (
            SET_COOKIE,
            refresh_cookie(&refresh.token, refresh.duration, state.secure_cookies),
        ),
    ];

    Ok((
        StatusCode::OK,
        AppendHeaders(cookies),
        Json(LoginResponse {
            user: LoginUser {
                id: account.id,
                email: account.email,
            },
        }),
    ))
}

pub(super) async fn me(
    State(state): State<ApiState>,
    ApiAuth(auth): ApiAuth,
) -> Result<Json<Account>, ApiError> {
    state
        .accounts
        .find_account(auth.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::unauthorized("User not found"))
}
