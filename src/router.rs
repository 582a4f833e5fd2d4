use crate::error::AppError;
use crate::handlers::{
    auth::{get_user, get_users, login, refresh, signup},
    health::health_check,
    orders::{
        create_order, delete_order, get_order, get_orders, get_user_order, get_user_orders,
        update_order, update_order_status,
    },
};
use crate::schemas::{ApiDoc, AppState, ErrorResponse};
use axum::{
    http::{header, StatusCode},
    middleware::map_response,
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Auth routes
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/users", get(get_users))
        .route("/auth/user/:user_id", get(get_user))
        // Order routes
        .route("/orders/", post(create_order).get(get_orders))
        .route(
            "/orders/:order_id",
            get(get_order).put(update_order).delete(delete_order),
        )
        .route("/orders/:order_id/status", patch(update_order_status))
        .route(
            "/orders/user/:user_id/order/:order_id/",
            get(get_user_order),
        )
        .route("/orders/user/:user_id/orders", get(get_user_orders))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive())
                .layer(map_response(method_not_allowed_as_json)),
        )
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound
}

/// Gives the router's bare 405 responses the same JSON shape as other errors.
async fn method_not_allowed_as_json(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let mut replaced = (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse::method_not_allowed()),
    )
        .into_response();
    if let Some(allow) = response.headers().get(header::ALLOW) {
        replaced.headers_mut().insert(header::ALLOW, allow.clone());
    }
    replaced
}
