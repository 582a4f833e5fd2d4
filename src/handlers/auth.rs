use crate::auth::{AccessIdentity, RefreshIdentity};
use crate::error::AppError;
use crate::handlers::{PathParams, ValidatedJson};
use crate::schemas::AppState;
use crate::services::{AuthService, NewUser};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use model::entities::user;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for signing up
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct SignupRequest {
    /// A username (must be unique)
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    /// An email (must be unique)
    #[validate(email, length(max = 120))]
    pub email: String,
    /// A password
    #[validate(length(min = 1))]
    pub password: String,
}

/// Request body for logging in
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    pub message: String,
    pub access_token: String,
}

/// User details. The password hash is never exposed.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    /// Shows if a user is active
    pub is_active: bool,
    /// Shows if a user is a staff member
    pub is_staff: bool,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            is_active: model.is_active,
            is_staff: model.is_staff,
        }
    }
}

/// Register a user
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, description = "Invalid request or username/email taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    trace!("Entering signup function");
    debug!("Signing up user {} with email: {}", request.username, request.email);

    let created = AuthService::from_state(&state)
        .register(NewUser {
            username: request.username,
            email: request.email,
            password: request.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(created))))
}

/// Generate an access and a refresh token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 201, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Invalid email or password", body = MessageResponse)
    )
)]
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), AppError> {
    trace!("Entering login function");

    let pair = AuthService::from_state(&state)
        .login(&request.email, &request.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            message: "Login successful!".to_string(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }),
    ))
}

/// Mint a new access token from a refresh token
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "auth",
    responses(
        (status = 200, description = "Refresh successful", body = RefreshResponse),
        (status = 401, description = "Missing, invalid or expired refresh token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn refresh(
    State(state): State<AppState>,
    identity: RefreshIdentity,
) -> Result<Json<RefreshResponse>, AppError> {
    trace!("Entering refresh function");

    let access_token = AuthService::from_state(&state).refresh(&identity.username)?;
    info!("Issued refreshed access token for {}", identity.username);

    Ok(Json(RefreshResponse {
        message: "Refresh successful!".to_string(),
        access_token,
    }))
}

/// Get all users
#[utoipa::path(
    get,
    path = "/auth/users",
    tag = "auth",
    responses(
        (status = 200, description = "Users retrieved successfully", body = Vec<UserResponse>),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
    identity: AccessIdentity,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    trace!("Entering get_users function");

    let users = AuthService::from_state(&state).list_users().await?;
    debug!("Retrieved {} users from database", users.len());

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Get a user by id
#[utoipa::path(
    get,
    path = "/auth/user/{user_id}",
    tag = "auth",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = UserResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_user(
    PathParams(user_id): PathParams<i32>,
    State(state): State<AppState>,
    identity: AccessIdentity,
) -> Result<Json<UserResponse>, AppError> {
    trace!("Entering get_user function for user_id: {}", user_id);

    let found = AuthService::from_state(&state).get_user(user_id).await?;
    debug!("Found user {} ({})", found.username, found.id);

    Ok(Json(UserResponse::from(found)))
}
