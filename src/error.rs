use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use thiserror::Error;
use tracing::error;

use crate::schemas::{ErrorResponse, MessageResponse};

/// Mutating operations guarded by the order ownership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    Update,
    UpdateStatus,
    Delete,
}

impl OrderAction {
    /// The phrase used in the "not authorized" message.
    pub fn describe(self) -> &'static str {
        match self {
            OrderAction::Update => "update this order",
            OrderAction::UpdateStatus => "update this order status",
            OrderAction::Delete => "delete this order",
        }
    }
}

/// Error type shared by the services and the HTTP handlers
#[derive(Error, Debug)]
pub enum AppError {
    /// Request payload or stored row violates a field constraint
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced user or order does not exist
    #[error("Not Found")]
    NotFound,

    /// Bearer token missing, malformed, of the wrong kind or expired
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Unknown email or wrong password on login
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Caller is authenticated but does not own the order
    #[error("You are not authorized to {}", .0.describe())]
    NotOwner(OrderAction),

    #[error("Database error: {0}")]
    Database(DbErr),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err {
            // Raised by the entity `before_save` hooks
            DbErr::Custom(message) => AppError::Validation(message),
            other => AppError::Database(other),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthenticated(_)
            | AppError::InvalidCredentials
            | AppError::NotOwner(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::PasswordHash(_) | AppError::Token(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            AppError::Validation(message) | AppError::Unauthenticated(message) => {
                (status, Json(ErrorResponse::new(message.clone()))).into_response()
            }
            AppError::NotFound => (status, Json(ErrorResponse::not_found())).into_response(),
            AppError::InvalidCredentials | AppError::NotOwner(_) => {
                (status, Json(MessageResponse::new(self.to_string()))).into_response()
            }
            AppError::Database(_) | AppError::PasswordHash(_) | AppError::Token(_) => {
                error!("Internal error while handling request: {}", self);
                (status, Json(ErrorResponse::new("Internal Server Error"))).into_response()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::{json, Value};

    async fn body_of(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let (status, body) = body_of(AppError::NotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Not Found" }));
    }

    #[tokio::test]
    async fn test_not_owner_messages() {
        let (status, body) = body_of(AppError::NotOwner(OrderAction::Update)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "message": "You are not authorized to update this order" }));

        let (_, body) = body_of(AppError::NotOwner(OrderAction::UpdateStatus)).await;
        assert_eq!(
            body["message"],
            "You are not authorized to update this order status"
        );

        let (_, body) = body_of(AppError::NotOwner(OrderAction::Delete)).await;
        assert_eq!(body["message"], "You are not authorized to delete this order");
    }

    #[tokio::test]
    async fn test_invalid_credentials_body() {
        let (status, body) = body_of(AppError::InvalidCredentials).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "message": "Invalid email or password" }));
    }

    #[tokio::test]
    async fn test_internal_errors_are_opaque() {
        let (status, body) =
            body_of(AppError::Database(DbErr::Conn(sea_orm::RuntimeErr::Internal(
                "connection refused".to_string(),
            ))))
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal Server Error" }));
    }

    #[test]
    fn test_custom_db_error_becomes_validation() {
        let err = AppError::from(DbErr::Custom("quantity must be a positive integer".into()));
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
