#![allow(dead_code)]

use accountd::jwt::{TokenClaims, TokenClass, TokenConfig};
use accountd::{ServerConfig, create_app, db::Database};
use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

pub const ACCESS_SECRET: &[u8] = b"integration-test-access-secret-0123456789";
pub const REFRESH_SECRET: &[u8] = b"integration-test-refresh-secret-0123456789";

pub const PASSWORD: &str = "secret1";

/// Build the full application on an in-memory database.
pub async fn create_test_app() -> (Router, Database) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let app = create_test_app_with_db(db.clone());
    (app, db)
}

pub fn create_test_app_with_db(db: Database) -> Router {
    let config = ServerConfig {
        db,
        tokens: TokenConfig::new(ACCESS_SECRET, REFRESH_SECRET),
        secure_cookies: false,
        content_security_policy: "default-src 'self'".to_string(),
    };
    create_app(&config).expect("Failed to create app")
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    body: &str,
    cookie: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub fn extract_set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

/// Find the `Set-Cookie` line for a cookie name.
pub fn find_cookie<'a>(cookies: &'a [String], name: &str) -> Option<&'a str> {
    let prefix = format!("{}=", name);
    cookies
        .iter()
        .find(|c| c.starts_with(&prefix))
        .map(|c| c.as_str())
}

/// Value of a `Set-Cookie` line, without attributes.
pub fn cookie_value(cookies: &[String], name: &str) -> Option<String> {
    let cookie = find_cookie(cookies, name)?;
    let (pair, _) = cookie.split_once(';').unwrap_or((cookie, ""));
    pair.split_once('=').map(|(_, v)| v.to_string())
}

pub async fn register_user(app: &Router, username: &str, email: &str) -> serde_json::Value {
    let body = serde_json::json!({
        "username": username,
        "email": email,
        "password": PASSWORD,
    });
    let response = post_json(app, "/api/register", &body.to_string(), None).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

/// Log in and return (access_token, refresh_token).
pub async fn login_user(app: &Router, email: &str) -> (String, String) {
    let body = serde_json::json!({ "email": email, "password": PASSWORD });
    let response = post_json(app, "/api/login", &body.to_string(), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = extract_set_cookies(&response);
    let access = cookie_value(&cookies, "access_token").expect("access cookie");
    let refresh = cookie_value(&cookies, "refresh_token").expect("refresh cookie");
    (access, refresh)
}

pub fn access_cookie_header(token: &str) -> String {
    format!("access_token={}", token)
}

pub fn refresh_cookie_header(token: &str) -> String {
    format!("refresh_token={}", token)
}

/// Sign claims that expired a minute ago with the given secret.
pub fn expired_token(user_id: i64, class: TokenClass, secret: &[u8]) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = TokenClaims {
        user_id,
        token_class: class,
        iat: now - 120,
        exp: now - 60,
        jti: uuid::Uuid::new_v4().to_string(),
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret),
    )
    .unwrap()
}
