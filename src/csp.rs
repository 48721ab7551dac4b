//! Security headers middleware.
//!
//! Adds a Content-Security-Policy plus anti-sniffing and anti-framing headers
//! to every response.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};

/// Default policy: only same-origin resources.
pub const DEFAULT_CONTENT_SECURITY_POLICY: &str = "default-src 'self'";

/// Pre-parsed header values, built once at startup.
#[derive(Clone, Debug)]
pub struct SecurityHeaders {
    content_security_policy: HeaderValue,
}

impl SecurityHeaders {
    /// Fails if the policy contains characters not allowed in a header value.
    pub fn new(policy: &str) -> Result<Self, header::InvalidHeaderValue> {
        Ok(Self {
            content_security_policy: HeaderValue::from_str(policy)?,
        })
    }
}

/// Middleware that adds security headers to responses.
pub async fn security_headers(
    State(headers): State<SecurityHeaders>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let response_headers = response.headers_mut();
    response_headers.insert(
        header::CONTENT_SECURITY_POLICY,
        headers.content_security_policy.clone(),
    );

    // Prevent MIME sniffing
    response_headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );

    // Fallback for browsers without frame-ancestors support
    response_headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));

    response
}
