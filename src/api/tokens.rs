//! Token endpoints.
//!
//! - POST `/auth/refresh` - Exchange the refresh cookie for a new access cookie
//! - POST `/logout` - Clear both cookies

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse},
};
use tracing::{debug, info};

use super::ApiState;
use super::error::{ApiError, ResultExt};
use crate::auth::{
    REFRESH_COOKIE_NAME, access_cookie, clear_access_cookie, clear_refresh_cookie, get_cookie,
};

/// Refresh the access token using a valid refresh token.
/// The refresh token itself is not rotated.
pub(super) async fn refresh(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let refresh_token = get_cookie(&headers, REFRESH_COOKIE_NAME).ok_or_else(|| {
        debug!("Refresh rejected: no refresh token");
        ApiError::unauthorized("Missing refresh token")
    })?;

    let claims = match state.tokens.validate_refresh_token(refresh_token) {
        Ok(claims) => claims,
        Err(e) if e.is_rejection() => {
            debug!("Refresh rejected: invalid or expired refresh token");
            return Err(ApiError::unauthorized("Invalid or expired refresh token"));
        }
        Err(e) => return Err(ApiError::internal_error("Failed to validate refresh token", e)),
    };

    let account = state
        .accounts
        .find_account(claims.user_id)
        .await?
        .ok_or_else(|| {
            debug!(user_id = claims.user_id, "Refresh rejected: user not found");
            ApiError::unauthorized("User not found")
        })?;

    let access = state
        .tokens
        .issue_access_token(account.id)
        .internal_err("Failed to issue access token")?;

    info!(user_id = account.id, "Access token refreshed");

    Ok((
        StatusCode::OK,
        [(
            SET_COOKIE,
            access_cookie(&access.token, access.duration, state.secure_cookies),
        )],
        Json(serde_json::json!({ "success": true })),
    ))
}

/// Logout - clear both cookies. Tokens already issued stay valid until expiry.
pub(super) async fn logout(State(state): State<ApiState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        AppendHeaders([
            (SET_COOKIE, clear_access_cookie(state.secure_cookies)),
            (SET_COOKIE, clear_refresh_cookie(state.secure_cookies)),
        ]),
        Json(serde_json::json!({ "success": true })),
    )
}
