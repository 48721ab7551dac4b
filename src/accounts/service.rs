use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::password::{DUMMY_PASSWORD_HASH, hash_password, verify_password};
use super::store::{StoreError, User, UserStore};

/// Shortest password accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<User> for Account {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("password must be at least {} characters long", MIN_PASSWORD_LENGTH)]
    PasswordTooShort,

    #[error("email already registered")]
    EmailTaken,

    /// Unknown email or wrong password; the two are indistinguishable.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("user store error: {0}")]
    Store(#[source] StoreError),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl From<StoreError> for AccountError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::EmailTaken => AccountError::EmailTaken,
            e => AccountError::Store(e),
        }
    }
}

/// Registration and login rules on top of a [`UserStore`].
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    dummy_hash: &'static str,
}

impl AccountService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self {
            store,
            dummy_hash: DUMMY_PASSWORD_HASH,
        }
    }

    /// Create a new account.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, AccountError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AccountError::PasswordTooShort);
        }

        // Fast path only; the store's unique constraint is what actually holds.
        if self.store.find_by_email(email).await?.is_some() {
            debug!("Registration rejected: email already registered");
            return Err(AccountError::EmailTaken);
        }

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AccountError::Hashing(e.to_string()))?
            .map_err(|e| AccountError::Hashing(e.to_string()))?;

        let id = self.store.create(username, email, &password_hash).await?;
        info!(user_id = id, "Account registered");

        Ok(Account {
            id,
            username: username.to_string(),
            email: email.to_string(),
        })
    }

    /// Check an email/password pair.
    ///
    /// Unknown emails are verified against a dummy hash, so both rejections
    /// cost one Argon2 verification.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Account, AccountError> {
        let user = self.store.find_by_email(email).await?;

        let password = password.to_string();
        let password_hash = match &user {
            Some(user) => user.password_hash.clone(),
            None => self.dummy_hash.to_string(),
        };
        let verified =
            tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
                .await
                .map_err(|e| AccountError::Hashing(e.to_string()))?
                .map_err(|e| {
                    error!(error = %e, "Password hash is unreadable");
                    AccountError::Hashing(e.to_string())
                })?;

        let Some(user) = user.filter(|_| verified) else {
            debug!("Login rejected");
            return Err(AccountError::InvalidCredentials);
        };

        info!(user_id = user.id, "Login succeeded");
        Ok(user.into())
    }

    /// Look up an account by ID.
    pub async fn find_account(&self, id: i64) -> Result<Option<Account>, AccountError> {
        Ok(self.store.find_by_id(id).await?.map(Account::from))
    }
}
