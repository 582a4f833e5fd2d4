use crate::auth::AccessIdentity;
use crate::error::AppError;
use crate::handlers::{PathParams, ValidatedJson};
use crate::schemas::{AppState, MessageResponse};
use crate::services::{NewOrder, OrderChanges, OrderService};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDateTime;
use model::entities::order::{self, OrderSize, OrderStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for placing an order
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateOrderRequest {
    /// Size of pizza to order
    pub size: OrderSize,
    /// Flavour of pizza to order
    #[validate(length(min = 1))]
    pub flavour: String,
    /// Number of pizzas (default: 1)
    #[validate(range(min = 1))]
    pub quantity: Option<i32>,
}

/// Request body for replacing an order's size, flavour and quantity
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateOrderRequest {
    pub size: OrderSize,
    #[validate(length(min = 1))]
    pub flavour: String,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

/// Request body for changing an order's status
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// Order details
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: i32,
    pub size: OrderSize,
    pub status: OrderStatus,
    pub flavour: String,
    pub quantity: i32,
    /// Date of order creation (UTC)
    pub date_created: NaiveDateTime,
    /// The customer who placed the order, if any
    pub customer_id: Option<i32>,
}

impl From<order::Model> for OrderResponse {
    fn from(model: order::Model) -> Self {
        Self {
            id: model.id,
            size: model.size,
            status: model.status,
            flavour: model.flavour,
            quantity: model.quantity,
            date_created: model.date_created,
            customer_id: model.customer_id,
        }
    }
}

fn to_responses(orders: Vec<order::Model>) -> Vec<OrderResponse> {
    orders.into_iter().map(OrderResponse::from).collect()
}

/// Place an order
#[utoipa::path(
    post,
    path = "/orders/",
    tag = "orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created successfully", body = OrderResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_order(
    State(state): State<AppState>,
    identity: AccessIdentity,
    ValidatedJson(request): ValidatedJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    trace!("Entering create_order function");
    debug!(
        "Creating order: size {:?}, flavour {}, quantity {:?}",
        request.size, request.flavour, request.quantity
    );

    let created = OrderService::new(&state.db)
        .create(
            &identity.username,
            NewOrder {
                size: request.size,
                flavour: request.flavour,
                quantity: request.quantity.unwrap_or(1),
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from(created))))
}

/// Get all orders
#[utoipa::path(
    get,
    path = "/orders/",
    tag = "orders",
    responses(
        (status = 200, description = "Orders retrieved successfully", body = Vec<OrderResponse>),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_orders(
    State(state): State<AppState>,
    identity: AccessIdentity,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    trace!("Entering get_orders function");

    let orders = OrderService::new(&state.db).list_all().await?;
    debug!("Retrieved {} orders from database", orders.len());

    Ok(Json(to_responses(orders)))
}

/// Get an order by id
#[utoipa::path(
    get,
    path = "/orders/{order_id}",
    tag = "orders",
    params(
        ("order_id" = i32, Path, description = "Order ID"),
    ),
    responses(
        (status = 200, description = "Order retrieved successfully", body = OrderResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_order(
    PathParams(order_id): PathParams<i32>,
    State(state): State<AppState>,
    identity: AccessIdentity,
) -> Result<Json<OrderResponse>, AppError> {
    trace!("Entering get_order function for order_id: {}", order_id);

    let found = OrderService::new(&state.db).get_by_id(order_id).await?;

    Ok(Json(OrderResponse::from(found)))
}

/// Update an order's size, flavour and quantity
#[utoipa::path(
    put,
    path = "/orders/{order_id}",
    tag = "orders",
    params(
        ("order_id" = i32, Path, description = "Order ID"),
    ),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated successfully", body = OrderResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not authorized to update this order", body = MessageResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_order(
    PathParams(order_id): PathParams<i32>,
    State(state): State<AppState>,
    identity: AccessIdentity,
    ValidatedJson(request): ValidatedJson<UpdateOrderRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    trace!("Entering update_order function for order_id: {}", order_id);

    let updated = OrderService::new(&state.db)
        .update(
            &identity.username,
            order_id,
            OrderChanges {
                size: request.size,
                flavour: request.flavour,
                quantity: request.quantity,
            },
        )
        .await?;

    Ok(Json(OrderResponse::from(updated)))
}

/// Delete an order
#[utoipa::path(
    delete,
    path = "/orders/{order_id}",
    tag = "orders",
    params(
        ("order_id" = i32, Path, description = "Order ID"),
    ),
    responses(
        (status = 200, description = "Order deleted successfully", body = MessageResponse),
        (status = 401, description = "Not authorized to delete this order", body = MessageResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_order(
    PathParams(order_id): PathParams<i32>,
    State(state): State<AppState>,
    identity: AccessIdentity,
) -> Result<Json<MessageResponse>, AppError> {
    trace!("Entering delete_order function for order_id: {}", order_id);

    let deleted = OrderService::new(&state.db)
        .delete(&identity.username, order_id)
        .await?;
    info!("Order {} removed", deleted.id);

    Ok(Json(MessageResponse::new(format!(
        "Order: {}, deleted successfully",
        deleted.id
    ))))
}

/// Update an order's status
#[utoipa::path(
    patch,
    path = "/orders/{order_id}/status",
    tag = "orders",
    params(
        ("order_id" = i32, Path, description = "Order ID"),
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status updated", body = OrderResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not authorized to update this order status", body = MessageResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_order_status(
    PathParams(order_id): PathParams<i32>,
    State(state): State<AppState>,
    identity: AccessIdentity,
    ValidatedJson(request): ValidatedJson<UpdateOrderStatusRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    trace!("Entering update_order_status function for order_id: {}", order_id);

    let updated = OrderService::new(&state.db)
        .update_status(&identity.username, order_id, request.status)
        .await?;

    Ok(Json(OrderResponse::from(updated)))
}

/// Get a specific order of a user
#[utoipa::path(
    get,
    path = "/orders/user/{user_id}/order/{order_id}/",
    tag = "orders",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("order_id" = i32, Path, description = "Order ID"),
    ),
    responses(
        (status = 200, description = "Order retrieved successfully", body = OrderResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 404, description = "User or order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_user_order(
    PathParams((user_id, order_id)): PathParams<(i32, i32)>,
    State(state): State<AppState>,
    identity: AccessIdentity,
) -> Result<Json<OrderResponse>, AppError> {
    trace!("Entering get_user_order function for user_id: {}, order_id: {}", user_id, order_id);

    let found = OrderService::new(&state.db)
        .get_by_user_and_order(user_id, order_id)
        .await?;

    Ok(Json(OrderResponse::from(found)))
}

/// Get all orders of a user
#[utoipa::path(
    get,
    path = "/orders/user/{user_id}/orders",
    tag = "orders",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "Orders retrieved successfully", body = Vec<OrderResponse>),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_user_orders(
    PathParams(user_id): PathParams<i32>,
    State(state): State<AppState>,
    identity: AccessIdentity,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    trace!("Entering get_user_orders function for user_id: {}", user_id);

    let orders = OrderService::new(&state.db).list_by_user(user_id).await?;
    debug!("User {} has {} orders", user_id, orders.len());

    Ok(Json(to_responses(orders)))
}
