//! JWT utility module.
//!
//! Provides JWT token generation and parsing functions.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::config::{get_env, APP_CONFIG};
use crate::error::AppResult;

/// Minimum recommended length for JWT secrets.
const MIN_SECRET_LENGTH: usize = 32;

/// Token role that may only read resources.
pub const ROLE_VIEWER: &str = "viewer";

/// Token role with full read/write access.
pub const ROLE_ADMIN: &str = "admin";

static JWT_SECRET: Lazy<String> = Lazy::new(|| {
    let secret = get_env("JWT_SECRET", None);

    if secret.is_empty() {
        assert!(
            !APP_CONFIG.is_production,
            "JWT_SECRET must be set in production environment"
        );
        tracing::warn!(
            "JWT_SECRET not set - using insecure default. \
             Set RUST_ENV=production to enforce security requirements."
        );
        "default-secret-change-me-in-production".to_string()
    } else if secret.len() < MIN_SECRET_LENGTH {
        tracing::warn!(
            "JWT_SECRET is shorter than {} characters. \
             Consider using a longer secret for better security.",
            MIN_SECRET_LENGTH
        );
        secret
    } else {
        secret
    }
});

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (console or integration identifier)
    pub sub: String,
    /// Access role (`admin` or `viewer`)
    pub role: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl Claims {
    /// Whether this token may mutate resources.
    #[must_use]
    pub fn can_write(&self) -> bool {
        self.role != ROLE_VIEWER
    }
}

/// Generates a JWT token for the given subject and role.
#[must_use = "the generated token should be used"]
pub fn gen_token(subject: &str, role: &str) -> AppResult<String> {
    let now = chrono::Utc::now().timestamp();
    let exp = now + APP_CONFIG.jwt_expiration_hours * 3600;

    let claims = Claims {
        sub: subject.to_string(),
        role: role.to_string(),
        exp,
        iat: now,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )?;

    Ok(token)
}

/// Parses and validates a JWT token.
#[must_use = "the parsed claims should be used"]
pub fn parse_token(token: &str) -> AppResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(JWT_SECRET.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}
