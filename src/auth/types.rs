//! Authentication user types.

/// Identity attached to a request once its access token has been validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Database user ID from the token claims
    pub user_id: i64,
}
