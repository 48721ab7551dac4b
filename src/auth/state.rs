//! Authentication state trait.

use crate::jwt::TokenService;

/// Trait for state types that can validate access tokens.
pub trait HasTokenService {
    fn tokens(&self) -> &TokenService;
}
