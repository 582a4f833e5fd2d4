//! Bearer token extractors for protected handlers.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::debug;

use super::jwt::TokenType;
use crate::error::AppError;
use crate::schemas::AppState;

/// Caller identity resolved from a valid access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessIdentity {
    pub username: String,
}

/// Caller identity resolved from a valid refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshIdentity {
    pub username: String,
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthenticated("Missing authorization token".to_string()))?;

    header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::Unauthenticated(
                "Invalid authorization format. Use: Bearer {token}".to_string(),
            )
        })
}

#[async_trait]
impl FromRequestParts<AppState> for AccessIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.tokens.validate(token, TokenType::Access)?;
        debug!("Resolved caller {} from access token", claims.sub);
        Ok(Self { username: claims.sub })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RefreshIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.tokens.validate(token, TokenType::Refresh)?;
        debug!("Resolved caller {} from refresh token", claims.sub);
        Ok(Self { username: claims.sub })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/orders/");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_missing_header() {
        let parts = parts_with(None);
        assert!(matches!(bearer_token(&parts), Err(AppError::Unauthenticated(_))));
    }

    #[test]
    fn test_wrong_scheme() {
        let parts = parts_with(Some("Basic YWxpY2U6cHcx"));
        assert!(bearer_token(&parts).is_err());

        let parts = parts_with(Some("Bearer "));
        assert!(bearer_token(&parts).is_err());
    }

    #[test]
    fn test_bearer_token_extracted() {
        let parts = parts_with(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def.ghi");
    }
}
