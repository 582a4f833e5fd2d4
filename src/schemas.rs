use crate::auth::{PasswordHasher, TokenService};
use crate::handlers::auth::{
    LoginRequest, LoginResponse, RefreshResponse, SignupRequest, UserResponse,
};
use crate::handlers::orders::{
    CreateOrderRequest, OrderResponse, UpdateOrderRequest, UpdateOrderStatusRequest,
};
use model::entities::order::{OrderSize, OrderStatus};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Access/refresh token issuer
    pub tokens: TokenService,
    /// Password hashing
    pub passwords: PasswordHasher,
}

/// Framework-level error body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }

    pub fn not_found() -> Self {
        Self::new("Not Found")
    }

    pub fn method_not_allowed() -> Self {
        Self::new("Method Not Allowed")
    }
}

/// Application-level message body, used for confirmations and denials
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// Registers the bearer scheme referenced by protected operations.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::signup,
        crate::handlers::auth::login,
        crate::handlers::auth::refresh,
        crate::handlers::auth::get_users,
        crate::handlers::auth::get_user,
        crate::handlers::orders::create_order,
        crate::handlers::orders::get_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order,
        crate::handlers::orders::delete_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::get_user_order,
        crate::handlers::orders::get_user_orders,
    ),
    components(
        schemas(
            ErrorResponse,
            MessageResponse,
            HealthResponse,
            SignupRequest,
            LoginRequest,
            LoginResponse,
            RefreshResponse,
            UserResponse,
            CreateOrderRequest,
            UpdateOrderRequest,
            UpdateOrderStatusRequest,
            OrderResponse,
            OrderSize,
            OrderStatus,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Signup, login, token refresh and user directory"),
        (name = "orders", description = "Pizza orders"),
    ),
    info(
        title = "Pizza Delivery API",
        description = "A simple pizza delivery service with token authentication",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
