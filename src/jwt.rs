//! JWT token generation and validation.
//!
//! Access and refresh tokens are signed with two different secrets, so a
//! token of one class can never verify as the other even if its `typ` claim
//! were rewritten.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Token class for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenClass {
    /// Short-lived token authorizing resource access
    Access,
    /// Long-lived token that can only mint new access tokens
    Refresh,
}

impl TokenClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenClass::Access => "access",
            TokenClass::Refresh => "refresh",
        }
    }
}

/// JWT claims shared by both token classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Database user ID
    pub user_id: i64,
    /// Token class
    #[serde(rename = "typ")]
    pub token_class: TokenClass,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Random token ID, keeps two tokens minted in the same second distinct
    pub jti: String,
}

/// Default access token lifetime: 15 minutes
pub const DEFAULT_ACCESS_TOKEN_EXPIRY: Duration = Duration::from_secs(15 * 60);

/// Default refresh token lifetime: 7 days
pub const DEFAULT_REFRESH_TOKEN_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Longest lifetime accepted for either token class: 365 days
pub const MAX_TOKEN_EXPIRY: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Secrets and lifetimes for both token classes.
#[derive(Clone)]
pub struct TokenConfig {
    pub access_secret: Vec<u8>,
    pub refresh_secret: Vec<u8>,
    pub access_token_expiry: Duration,
    pub refresh_token_expiry: Duration,
}

impl TokenConfig {
    /// Config with the default lifetimes.
    pub fn new(access_secret: impl Into<Vec<u8>>, refresh_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_token_expiry: DEFAULT_ACCESS_TOKEN_EXPIRY,
            refresh_token_expiry: DEFAULT_REFRESH_TOKEN_EXPIRY,
        }
    }

    fn validate(&self) -> Result<(), TokenConfigError> {
        if self.access_secret.is_empty() {
            return Err(TokenConfigError::EmptySecret(TokenClass::Access));
        }
        if self.refresh_secret.is_empty() {
            return Err(TokenConfigError::EmptySecret(TokenClass::Refresh));
        }
        if self.access_secret == self.refresh_secret {
            return Err(TokenConfigError::SharedSecret);
        }
        if self.access_token_expiry > MAX_TOKEN_EXPIRY {
            return Err(TokenConfigError::ExpiryTooLong(TokenClass::Access));
        }
        if self.refresh_token_expiry > MAX_TOKEN_EXPIRY {
            return Err(TokenConfigError::ExpiryTooLong(TokenClass::Refresh));
        }
        Ok(())
    }
}

// Secrets are left out.
impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .finish_non_exhaustive()
    }
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The JWT token string
    pub token: String,
    /// Token duration in seconds
    pub duration: u64,
}

#[derive(Clone)]
struct SigningKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    duration: u64,
}

impl SigningKeys {
    fn new(secret: &[u8], expiry: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            duration: expiry.as_secs(),
        }
    }
}

/// Issues and validates access and refresh tokens.
#[derive(Clone)]
pub struct TokenService {
    access: SigningKeys,
    refresh: SigningKeys,
}

impl TokenService {
    /// Build the service. Fails if a secret is empty or both classes share one.
    pub fn new(config: &TokenConfig) -> Result<Self, TokenConfigError> {
        config.validate()?;
        Ok(Self {
            access: SigningKeys::new(&config.access_secret, config.access_token_expiry),
            refresh: SigningKeys::new(&config.refresh_secret, config.refresh_token_expiry),
        })
    }

    fn keys(&self, class: TokenClass) -> &SigningKeys {
        match class {
            TokenClass::Access => &self.access,
            TokenClass::Refresh => &self.refresh,
        }
    }

    /// Generate a short-lived access token for a user.
    pub fn issue_access_token(&self, user_id: i64) -> Result<IssuedToken, TokenError> {
        self.issue(TokenClass::Access, user_id)
    }

    /// Generate a long-lived refresh token for a user.
    pub fn issue_refresh_token(&self, user_id: i64) -> Result<IssuedToken, TokenError> {
        self.issue(TokenClass::Refresh, user_id)
    }

    /// Validate and decode an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.validate(TokenClass::Access, token)
    }

    /// Validate and decode a refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.validate(TokenClass::Refresh, token)
    }

    fn issue(&self, class: TokenClass, user_id: i64) -> Result<IssuedToken, TokenError> {
        let keys = self.keys(class);
        let now = unix_now()?;

        let claims = TokenClaims {
            user_id,
            token_class: class,
            iat: now,
            exp: now
                .checked_add(keys.duration)
                .ok_or(TokenError::TimeError)?,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let header = Header::new(Algorithm::HS256);
        let token = jsonwebtoken::encode(&header, &claims, &keys.encoding_key)
            .map_err(TokenError::Signing)?;

        Ok(IssuedToken {
            token,
            duration: keys.duration,
        })
    }

    fn validate(&self, class: TokenClass, token: &str) -> Result<TokenClaims, TokenError> {
        // Pinning HS256 here is what rejects tokens whose header names another
        // algorithm; the header's `alg` is never trusted.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let token_data =
            jsonwebtoken::decode::<TokenClaims>(token, &self.keys(class).decoding_key, &validation)
                .map_err(TokenError::from_decode)?;
        let claims = token_data.claims;

        if claims.token_class != class {
            return Err(TokenError::InvalidSignature);
        }

        // The library accepts exp == now; a token is only valid strictly before exp.
        if claims.exp <= unix_now()? {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

fn unix_now() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| TokenError::TimeError)
}

/// Errors that can occur during JWT operations.
#[derive(Debug)]
pub enum TokenError {
    /// Signature does not verify, algorithm is not HS256, or wrong token class
    InvalidSignature,
    /// Signature is fine but the token is past its expiry
    Expired,
    /// Not a decodable token
    Malformed(jsonwebtoken::errors::Error),
    /// Error signing the token
    Signing(jsonwebtoken::errors::Error),
    /// System clock before the epoch, or expiry past the representable range
    TimeError,
}

impl TokenError {
    fn from_decode(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                TokenError::InvalidSignature
            }
            _ => TokenError::Malformed(e),
        }
    }

    /// Whether this failure is the client's fault rather than ours.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TokenError::InvalidSignature | TokenError::Expired | TokenError::Malformed(_)
        )
    }
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::InvalidSignature => write!(f, "Invalid token signature"),
            TokenError::Expired => write!(f, "Token expired"),
            TokenError::Malformed(e) => write!(f, "Malformed token: {}", e),
            TokenError::Signing(e) => write!(f, "Failed to sign token: {}", e),
            TokenError::TimeError => write!(f, "Token timestamp out of range"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Errors rejecting a token configuration at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenConfigError {
    EmptySecret(TokenClass),
    SharedSecret,
    ExpiryTooLong(TokenClass),
}

impl std::fmt::Display for TokenConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenConfigError::EmptySecret(class) => {
                write!(f, "The {} token secret must not be empty", class.as_str())
            }
            TokenConfigError::SharedSecret => {
                write!(f, "Access and refresh tokens must use different secrets")
            }
            TokenConfigError::ExpiryTooLong(class) => write!(
                f,
                "The {} token expiry must not exceed {} seconds",
                class.as_str(),
                MAX_TOKEN_EXPIRY.as_secs()
            ),
        }
    }
}

impl std::error::Error for TokenConfigError {}
