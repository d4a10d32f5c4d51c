pub mod identity;
pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AppConfig;

pub use identity::{Identity, Role};

/// Token payload: `{ user: { id, role }, iat, exp }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user: ClaimsUser,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimsUser {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Claims {
    pub fn new(user_id: i64, role: Role, expiry: Duration) -> Self {
        let now = Utc::now();
        Self {
            user: ClaimsUser {
                id: user_id,
                role: Some(role.as_str().to_string()),
            },
            exp: (now + expiry).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("{0}")]
    MalformedHeader(&'static str),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token carries no role")]
    MissingRole,

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),
}

/// Signs and verifies session tokens (HS256).
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl TokenService {
    pub fn new(secret: &str, expiry_hours: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry: Duration::hours(expiry_hours as i64),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.security.jwt_secret, config.security.jwt_expiry_hours)
    }

    /// Issue a token for a user whose role has just been looked up.
    pub fn sign(&self, user_id: i64, role: Role) -> Result<String, AuthError> {
        self.sign_claims(&Claims::new(user_id, role, self.expiry))
    }

    pub fn sign_claims(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    /// Check signature and expiry and return the raw claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(token_data.claims)
    }

    /// Recover the requester identity from a bearer token.
    ///
    /// The role is taken from the token as issued; it is not re-read from
    /// storage, so a role change only takes effect once the token expires.
    pub fn resolve(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.verify(token)?;
        let role = match claims.user.role.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Role::parse(raw),
            _ => return Err(AuthError::MissingRole),
        };
        Ok(Identity::new(claims.user.id, role))
    }
}
