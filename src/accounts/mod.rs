//! Account registration and credential checks.

mod password;
mod service;
mod store;

pub use password::{hash_password, verify_password};
pub use service::{Account, AccountError, AccountService, MIN_PASSWORD_LENGTH};
pub use store::{StoreError, User, UserStore};
