use crate::analytics::AnalyticsService;
use crate::auth::CurrentUser;
use crate::entities::sea_orm_active_enums::{TaskPriority, TaskStatus};
use crate::error::{ApiError, ErrorResponse};
use crate::task::{
    NewTask, SortOrder, Task, TaskChanges, TaskFilter, TaskService, TaskServiceError,
    TaskSortField,
};
use crate::web::extract::{ValidatedJson, ValidatedQuery, parse_id};
use axum::{
    Extension, Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Shared state for the task endpoints.
#[derive(Clone)]
pub struct TaskState {
    pub db: Arc<DatabaseConnection>,
}

/// JSON representation of a Task for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskJson {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub category: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    /// Free-form suggestions attached by the client
    #[schema(value_type = Object)]
    pub ai_suggestions: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            id: task.id(),
            user_id: task.user_id(),
            title: task.title().to_string(),
            description: task.description().map(str::to_string),
            priority: task.priority(),
            status: task.status(),
            category: task.category().map(str::to_string),
            due_date: task.due_date(),
            ai_suggestions: task.ai_suggestions().clone(),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskResponse {
    pub task: TaskJson,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TasksResponse {
    pub tasks: Vec<TaskJson>,
}

fn validate_object(value: &serde_json::Value) -> Result<(), ValidationError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(ValidationError::new("object").with_message("aiSuggestions must be an object".into()))
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 3, max = 200, message = "Title must be between 3 and 200 characters"))]
    pub title: String,
    #[validate(length(max = 1000, message = "Description cannot exceed 1000 characters"))]
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<DateTime<Utc>>,
    #[validate(length(max = 50, message = "Category cannot exceed 50 characters"))]
    pub category: Option<String>,
    #[validate(custom(function = "validate_object"))]
    #[schema(value_type = Option<Object>)]
    pub ai_suggestions: Option<serde_json::Value>,
}

impl From<CreateTaskRequest> for NewTask {
    fn from(request: CreateTaskRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            priority: request.priority,
            status: request.status,
            category: request.category,
            due_date: request.due_date,
            ai_suggestions: request.ai_suggestions,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 3, max = 200, message = "Title must be between 3 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 1000, message = "Description cannot exceed 1000 characters"))]
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<DateTime<Utc>>,
    #[validate(length(max = 50, message = "Category cannot exceed 50 characters"))]
    pub category: Option<String>,
    #[validate(custom(function = "validate_object"))]
    #[schema(value_type = Option<Object>)]
    pub ai_suggestions: Option<serde_json::Value>,
}

impl From<UpdateTaskRequest> for TaskChanges {
    fn from(request: UpdateTaskRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            priority: request.priority,
            status: request.status,
            category: request.category,
            due_date: request.due_date,
            ai_suggestions: request.ai_suggestions,
        }
    }
}

/// Query parameters for narrowing and ordering the task list.
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    #[validate(length(max = 50))]
    pub category: Option<String>,
    /// Case-insensitive substring of the title
    #[validate(length(max = 200))]
    pub search: Option<String>,
    pub sort_by: Option<TaskSortField>,
    pub sort_order: Option<SortOrder>,
}

impl From<TaskListQuery> for TaskFilter {
    fn from(query: TaskListQuery) -> Self {
        Self {
            status: query.status,
            priority: query.priority,
            category: query.category,
            search: query.search,
            sort_by: query.sort_by.unwrap_or_default(),
            sort_order: query.sort_order.unwrap_or_default(),
        }
    }
}

impl From<TaskServiceError> for ApiError {
    fn from(err: TaskServiceError) -> Self {
        match err {
            TaskServiceError::TaskNotFound(_) => ApiError::NotFound("Task not found".to_string()),
            err @ TaskServiceError::Database(_) => ApiError::internal(err),
        }
    }
}

/// Handler for POST /tasks.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<Arc<TaskState>>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    let task = TaskService::new(&state.db)
        .create_task(current_user.id, NewTask::from(payload))
        .await?;
    tracing::info!("Task created: {}", task.id());

    if task.is_completed() {
        AnalyticsService::new(&state.db)
            .record_task_analytics(task.id(), current_user.id)
            .await?;
    }

    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            task: TaskJson::from(task),
        }),
    ))
}

/// Handler for GET /tasks.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/tasks",
    params(TaskListQuery),
    responses(
        (status = 200, description = "Tasks of the current user", body = TasksResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Tasks"
)]
pub async fn get_tasks_handler(
    State(state): State<Arc<TaskState>>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedQuery(query): ValidatedQuery<TaskListQuery>,
) -> Result<Json<TasksResponse>, ApiError> {
    let tasks = TaskService::new(&state.db)
        .get_tasks(current_user.id, &TaskFilter::from(query))
        .await?;
    tracing::info!("Retrieved {} tasks for user {}", tasks.len(), current_user.id);

    Ok(Json(TasksResponse {
        tasks: tasks.into_iter().map(TaskJson::from).collect(),
    }))
}

/// Handler for GET /tasks/{id}.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "The task", body = TaskResponse),
        (status = 404, description = "No such task for this user", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Tasks"
)]
pub async fn get_task_handler(
    State(state): State<Arc<TaskState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task_id = parse_id(&id)?;
    let task = TaskService::new(&state.db)
        .get_task_by_id(task_id, current_user.id)
        .await?;

    Ok(Json(TaskResponse {
        task: TaskJson::from(task),
    }))
}

/// Handler for PATCH /tasks/{id}.
///
/// Every successful update refreshes the task's analytics record.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    patch,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = TaskResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 404, description = "No such task for this user", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Tasks"
)]
pub async fn update_task_handler(
    State(state): State<Arc<TaskState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task_id = parse_id(&id)?;
    let task = TaskService::new(&state.db)
        .update_task(task_id, current_user.id, TaskChanges::from(payload))
        .await?;
    tracing::info!("Task updated: {}", task.id());

    AnalyticsService::new(&state.db)
        .record_task_analytics(task.id(), current_user.id)
        .await?;

    Ok(Json(TaskResponse {
        task: TaskJson::from(task),
    }))
}

/// Handler for DELETE /tasks/{id}.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "No such task for this user", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let task_id = parse_id(&id)?;
    TaskService::new(&state.db)
        .delete_task(task_id, current_user.id)
        .await?;
    tracing::info!("Task deleted: {}", task_id);

    Ok(StatusCode::NO_CONTENT)
}

/// Creates and returns the tasks API router.
pub fn create_api_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route("/tasks", get(get_tasks_handler).post(create_task_handler))
        .route(
            "/tasks/{id}",
            get(get_task_handler)
                .patch(update_task_handler)
                .delete(delete_task_handler),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_object_suggestions() {
        let request: CreateTaskRequest = serde_json::from_value(serde_json::json!({
            "title": "Write report",
            "aiSuggestions": ["not", "an", "object"]
        }))
        .unwrap();

        assert!(request.validate().is_err());
    }

    #[test]
    fn rejects_short_title_on_update() {
        let request: UpdateTaskRequest =
            serde_json::from_value(serde_json::json!({ "title": "ab" })).unwrap();

        assert!(request.validate().is_err());
    }

    #[test]
    fn accepts_empty_update() {
        let request: UpdateTaskRequest = serde_json::from_value(serde_json::json!({})).unwrap();

        assert!(request.validate().is_ok());
        assert!(TaskChanges::from(request).status.is_none());
    }
}
