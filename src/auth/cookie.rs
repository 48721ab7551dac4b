//! Cookie parsing and `Set-Cookie` construction for the auth tokens.

use axum::http::header;

/// Cookie name for the access token.
pub const ACCESS_COOKIE_NAME: &str = "access_token";

/// Cookie name for the refresh token.
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// The access token is sent with every request.
pub const ACCESS_COOKIE_PATH: &str = "/";

/// The refresh token is only ever sent to the refresh endpoint.
pub const REFRESH_COOKIE_PATH: &str = "/api/auth/refresh";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    for cookie_header in headers.get_all(header::COOKIE) {
        let Ok(cookie_header) = cookie_header.to_str() else {
            continue;
        };
        for part in cookie_header.split(';') {
            let part = part.trim();
            if let Some((key, value)) = part.split_once('=') {
                if key.trim() == name {
                    return Some(value.trim());
                }
            }
        }
    }
    None
}

fn build_cookie(name: &str, value: &str, path: &str, max_age: u64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path={}; Max-Age={}{}",
        name, value, path, max_age, secure
    )
}

/// `Set-Cookie` value carrying a new access token.
pub fn access_cookie(token: &str, max_age: u64, secure: bool) -> String {
    build_cookie(ACCESS_COOKIE_NAME, token, ACCESS_COOKIE_PATH, max_age, secure)
}

/// `Set-Cookie` value carrying a new refresh token.
pub fn refresh_cookie(token: &str, max_age: u64, secure: bool) -> String {
    build_cookie(REFRESH_COOKIE_NAME, token, REFRESH_COOKIE_PATH, max_age, secure)
}

/// `Set-Cookie` value that deletes the access token.
pub fn clear_access_cookie(secure: bool) -> String {
    build_cookie(ACCESS_COOKIE_NAME, "", ACCESS_COOKIE_PATH, 0, secure)
}

/// `Set-Cookie` value that deletes the refresh token. Must use the same path it was set with.
pub fn clear_refresh_cookie(secure: bool) -> String {
    build_cookie(REFRESH_COOKIE_NAME, "", REFRESH_COOKIE_PATH, 0, secure)
}
