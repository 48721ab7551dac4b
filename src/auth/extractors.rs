//! Axum middleware and extractors for authentication.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error};

use super::cookie::{ACCESS_COOKIE_NAME, get_cookie};
use super::errors::{AuthError, AuthErrorKind};
use super::state::HasTokenService;
use super::types::AuthenticatedUser;
use crate::jwt::{TokenError, TokenService};

/// Core authentication logic shared by the middleware and the extractor.
fn authenticate_request(
    headers: &HeaderMap,
    tokens: &TokenService,
) -> Result<AuthenticatedUser, AuthErrorKind> {
    let access_token = get_cookie(headers, ACCESS_COOKIE_NAME).ok_or_else(|| {
        debug!("Request rejected: no access token");
        AuthErrorKind::MissingToken
    })?;

    match tokens.validate_access_token(access_token) {
        Ok(claims) => {
            debug!(user_id = claims.user_id, "Access token accepted");
            Ok(AuthenticatedUser {
                user_id: claims.user_id,
            })
        }
        Err(TokenError::Expired) => {
            debug!("Request rejected: access token expired");
            Err(AuthErrorKind::Expired)
        }
        Err(e) if e.is_rejection() => {
            debug!("Request rejected: invalid access token");
            Err(AuthErrorKind::InvalidToken)
        }
        Err(e) => {
            error!(error = %e, "Failed to validate access token");
            Err(AuthErrorKind::Internal)
        }
    }
}

/// Middleware guarding a group of routes.
///
/// Rejects the request with 401 unless it carries a valid access token cookie,
/// otherwise attaches an [`AuthenticatedUser`] to the request extensions.
pub async fn require_auth<S>(
    State(state): State<S>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    S: HasTokenService + Clone + Send + Sync + 'static,
{
    let user = authenticate_request(request.headers(), state.tokens())?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Extractor for handlers that require authentication.
/// Reuses the identity attached by [`require_auth`] when the route is behind it.
pub struct ApiAuth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for ApiAuth
where
    S: HasTokenService + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(ApiAuth(*user));
        }

        let user = authenticate_request(&parts.headers, state.tokens())?;
        parts.extensions.insert(user);
        Ok(ApiAuth(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::{TokenClaims, TokenClass, TokenConfig};
    use axum::{
        Extension, Router,
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    #[derive(Clone)]
    struct TestState {
        tokens: Arc<TokenService>,
    }

    impl HasTokenService for TestState {
        fn tokens(&self) -> &TokenService {
            &self.tokens
        }
    }

    const ACCESS_SECRET: &[u8] = b"middleware-access-secret";
    const REFRESH_SECRET: &[u8] = b"middleware-refresh-secret";

    fn state() -> TestState {
        let tokens = TokenService::new(&TokenConfig::new(ACCESS_SECRET, REFRESH_SECRET)).unwrap();
        TestState {
            tokens: Arc::new(tokens),
        }
    }

    async fn layered_handler(Extension(user): Extension<AuthenticatedUser>) -> String {
        user.user_id.to_string()
    }

    async fn extractor_handler(ApiAuth(user): ApiAuth) -> String {
        user.user_id.to_string()
    }

    fn app(state: TestState) -> Router {
        let layered = Router::new()
            .route("/layered", get(layered_handler))
            .route("/both", get(extractor_handler))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_auth::<TestState>,
            ));

        Router::new()
            .route("/extracted", get(extractor_handler))
            .merge(layered)
            .with_state(state)
    }

    async fn call(app: Router, uri: &str, cookie: Option<String>) -> (StatusCode, String) {
        let mut builder = HttpRequest::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn expired_access_token() -> String {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let claims = TokenClaims {
            user_id: 5,
            token_class: TokenClass::Access,
            iat: now - 120,
            exp: now - 60,
            jti: "expired".to_string(),
        };
        jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(ACCESS_SECRET),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_layer_attaches_user_id() {
        let state = state();
        let token = state.tokens.issue_access_token(5).unwrap().token;

        for uri in ["/layered", "/both", "/extracted"] {
            let (status, body) =
                call(app(state.clone()), uri, Some(format!("access_token={}", token))).await;
            assert_eq!(status, StatusCode::OK, "{}", uri);
            assert_eq!(body, "5");
        }
    }

    #[tokio::test]
    async fn test_missing_cookie_rejected() {
        for uri in ["/layered", "/extracted"] {
            let (status, body) = call(app(state()), uri, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert!(body.contains("Missing access token"));
        }
    }

    #[tokio::test]
    async fn test_expired_cookie_reports_expired() {
        let cookie = format!("access_token={}", expired_access_token());
        let (status, body) = call(app(state()), "/layered", Some(cookie)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Access token expired"));
    }

    #[tokio::test]
    async fn test_refresh_token_in_access_cookie_rejected() {
        let state = state();
        let refresh = state.tokens.issue_refresh_token(5).unwrap().token;

        let cookie = format!("access_token={}", refresh);
        let (status, body) = call(app(state), "/layered", Some(cookie)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Invalid access token"));
        assert!(!body.to_lowercase().contains("signature"));
    }

    #[tokio::test]
    async fn test_garbage_cookie_rejected() {
        let cookie = "access_token=not-a-jwt".to_string();
        let (status, body) = call(app(state()), "/extracted", Some(cookie)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Invalid access token"));
    }
}
