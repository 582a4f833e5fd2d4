//! JWT issuing and validation.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::{AppError, Result};

/// Which of the two credentials a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims. The identity is the username, carried in `sub`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and validates HS256 access and refresh tokens.
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenService {
    pub fn new(secret: impl Into<String>, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn issue_access_token(&self, username: &str) -> Result<String> {
        self.issue(username, TokenType::Access, self.access_ttl)
    }

    pub fn issue_refresh_token(&self, username: &str) -> Result<String> {
        self.issue(username, TokenType::Refresh, self.refresh_ttl)
    }

    fn issue(&self, username: &str, token_type: TokenType, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            token_type,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        debug!(
            "Issuing {:?} token for {}, expires in {}s",
            token_type,
            username,
            ttl.num_seconds()
        );

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?)
    }

    /// Validates signature, expiry and token type, returning the claims.
    pub fn validate(&self, token: &str, expected: TokenType) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            debug!("Rejected token: {}", e);
            AppError::Unauthenticated("Invalid or expired token".to_string())
        })?
        .claims;

        if claims.token_type != expected {
            debug!(
                "Rejected {:?} token where {:?} was expected",
                claims.token_type, expected
            );
            return Err(AppError::Unauthenticated(format!(
                "Only {} tokens are allowed",
                match expected {
                    TokenType::Access => "access",
                    TokenType::Refresh => "refresh",
                }
            )));
        }

        Ok(claims)
    }
}
