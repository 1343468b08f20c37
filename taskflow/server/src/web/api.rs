use std::sync::Arc;

use crate::analytics::api::v1::AnalyticsState;
use crate::auth::{self, AuthState};
use crate::task::api::v1::TaskState;
use crate::user::api::v1::UserState;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;

/// Creates the API routes for JSON API endpoints.
///
/// Registration and login are public. Every other route requires a bearer token.
pub fn create_api_router(auth_state: Arc<AuthState>, db: Arc<DatabaseConnection>) -> Router {
    let user_state = Arc::new(UserState {
        db: db.clone(),
        auth: auth_state.clone(),
    });
    let task_state = Arc::new(TaskState { db: db.clone() });
    let analytics_state = Arc::new(AnalyticsState { db });

    let public_routes = crate::user::api::v1::create_public_router(user_state.clone());
    let protected_routes = Router::new()
        .merge(crate::user::api::v1::create_protected_router(user_state))
        .merge(crate::task::api::v1::create_api_router(task_state))
        .merge(crate::analytics::api::v1::create_api_router(analytics_state))
        .layer(ServiceBuilder::new().layer(from_fn(auth::api::v1::require_auth_middleware)));

    public_routes
        .merge(protected_routes)
        .layer(ServiceBuilder::new().layer(from_fn_with_state(
            auth_state,
            auth::api::v1::auth_user_middleware,
        )))
}
