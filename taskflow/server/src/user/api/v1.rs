use crate::auth::{AuthState, CurrentUser};
use crate::error::{ApiError, ErrorResponse};
use crate::user::{User, UserService, UserServiceError};
use crate::web::extract::ValidatedJson;
use axum::{
    Extension, Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Shared state for the user endpoints.
#[derive(Clone)]
pub struct UserState {
    pub db: Arc<DatabaseConnection>,
    pub auth: Arc<AuthState>,
}

/// JSON representation of a User for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserJson {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserJson {
    fn from(user: User) -> Self {
        Self {
            id: user.id(),
            name: user.name().to_string(),
            email: user.email().to_string(),
            created_at: user.created_at(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub user: UserJson,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserJson,
    /// Bearer token for the Authorization header
    pub token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
    pub name: String,
    #[validate(email(message = "Email must be valid"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Email must be valid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::EmailTaken(_) => {
                ApiError::Conflict("User with this email already exists".to_string())
            }
            UserServiceError::InvalidCredentials => {
                ApiError::Authentication("Invalid credentials".to_string())
            }
            UserServiceError::UserNotFound(_) => ApiError::NotFound("User not found".to_string()),
            err @ (UserServiceError::Auth(_) | UserServiceError::Database(_)) => {
                ApiError::internal(err)
            }
        }
    }
}

/// Handler for POST /users/register.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    tag = "Users"
)]
pub async fn register_handler(
    State(state): State<Arc<UserState>>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let service = UserService::new(&state.db);
    let user = service
        .register_user(&payload.name, &payload.email, &payload.password)
        .await?;
    tracing::info!("User registered: {}", user.email());

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            user: UserJson::from(user),
        }),
    ))
}

/// Handler for POST /users/login.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "Users"
)]
pub async fn login_handler(
    State(state): State<Arc<UserState>>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let service = UserService::new(&state.db);
    let user = service
        .authenticate(&payload.email, &payload.password)
        .await?;
    let token = state
        .auth
        .issue_token(user.id(), user.email())
        .map_err(ApiError::internal)?;
    tracing::info!("User logged in: {}", user.email());

    Ok(Json(LoginResponse {
        user: UserJson::from(user),
        token,
    }))
}

/// Handler for GET /users/profile.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User no longer exists", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Users"
)]
pub async fn profile_handler(
    State(state): State<Arc<UserState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<UserResponse>, ApiError> {
    let service = UserService::new(&state.db);
    let user = service.get_user_by_id(current_user.id).await?;

    Ok(Json(UserResponse {
        user: UserJson::from(user),
    }))
}

/// Creates the router for endpoints reachable without a token.
pub fn create_public_router(state: Arc<UserState>) -> Router {
    Router::new()
        .route("/users/register", post(register_handler))
        .route("/users/login", post(login_handler))
        .with_state(state)
}

/// Creates the router for endpoints that need an authenticated user.
pub fn create_protected_router(state: Arc<UserState>) -> Router {
    Router::new()
        .route("/users/profile", get(profile_handler))
        .with_state(state)
}
