//! Cookie-based JWT authentication.
//!
//! The access token travels in an HttpOnly `access_token` cookie on every
//! request. The refresh token lives in a `refresh_token` cookie scoped to the
//! refresh endpoint and is never accepted here.

mod cookie;
mod errors;
mod extractors;
mod state;
mod types;

pub use cookie::{
    ACCESS_COOKIE_NAME, ACCESS_COOKIE_PATH, REFRESH_COOKIE_NAME, REFRESH_COOKIE_PATH,
    access_cookie, clear_access_cookie, clear_refresh_cookie, get_cookie, refresh_cookie,
};
pub use errors::{AuthError, AuthErrorKind};
pub use extractors::{ApiAuth, require_auth};
pub use state::HasTokenService;
pub use types::AuthenticatedUser;
