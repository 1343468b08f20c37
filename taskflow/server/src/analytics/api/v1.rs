use crate::analytics::{
    AnalyticsService, AnalyticsServiceError, AnalyticsWithTask, CategorySummary, DateRange,
};
use crate::auth::CurrentUser;
use crate::entities::sea_orm_active_enums::{TaskPriority, TaskStatus};
use crate::error::{ApiError, ErrorResponse};
use crate::task::api::v1::TaskJson;
use crate::web::extract::ValidatedQuery;
use axum::{Extension, Router, extract::State, response::Json, routing::get};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Shared state for the analytics endpoints.
#[derive(Clone)]
pub struct AnalyticsState {
    pub db: Arc<DatabaseConnection>,
}

/// JSON representation of an analytics record, with its task when it still exists.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsJson {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_id: Option<Uuid>,
    pub task: Option<TaskJson>,
    /// Minutes from creation to completion, 0 until captured
    pub completion_time: i32,
    /// 0 to 100, absent until the task is first completed
    pub productivity_score: Option<i32>,
    pub category: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AnalyticsWithTask> for AnalyticsJson {
    fn from(record: AnalyticsWithTask) -> Self {
        let analytics = record.analytics;
        Self {
            id: analytics.id(),
            user_id: analytics.user_id(),
            task_id: analytics.task_id(),
            task: record.task.map(TaskJson::from),
            completion_time: analytics.completion_time(),
            productivity_score: analytics.productivity_score(),
            category: analytics.category().map(str::to_string),
            priority: analytics.priority(),
            status: analytics.status(),
            created_at: analytics.created_at(),
            updated_at: analytics.updated_at(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalyticsResponse {
    pub analytics: Vec<AnalyticsJson>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummaryJson {
    pub category: Option<String>,
    pub avg_completion_time: Option<f64>,
    pub avg_productivity_score: Option<f64>,
    pub total_tasks: i64,
}

impl From<CategorySummary> for CategorySummaryJson {
    fn from(summary: CategorySummary) -> Self {
        Self {
            category: summary.category,
            avg_completion_time: summary.avg_completion_time,
            avg_productivity_score: summary.avg_productivity_score,
            total_tasks: summary.total_tasks,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AggregatedAnalyticsResponse {
    pub analytics: Vec<CategorySummaryJson>,
}

/// Optional date window for the aggregated view. Only applied when both ends are given.
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AggregatedQuery {
    /// RFC 3339 timestamp or YYYY-MM-DD
    pub start_date: Option<String>,
    /// RFC 3339 timestamp or YYYY-MM-DD
    pub end_date: Option<String>,
}

impl AggregatedQuery {
    fn date_range(&self) -> Result<Option<DateRange>, ApiError> {
        let (Some(start), Some(end)) = (&self.start_date, &self.end_date) else {
            return Ok(None);
        };
        let start = parse_date_bound(start)?;
        let end = parse_date_bound(end)?;
        DateRange::new(start, end)
            .map(Some)
            .ok_or_else(|| ApiError::Validation("startDate must not be after endDate".to_string()))
    }
}

/// Accepts a full timestamp or a calendar date, which is read as midnight UTC.
fn parse_date_bound(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| ApiError::Validation(format!("Invalid date '{}'", raw)))
}

impl From<AnalyticsServiceError> for ApiError {
    fn from(err: AnalyticsServiceError) -> Self {
        match err {
            AnalyticsServiceError::TaskNotFound(_) => {
                ApiError::NotFound("Task not found".to_string())
            }
            err @ AnalyticsServiceError::Database(_) => ApiError::internal(err),
        }
    }
}

/// Handler for GET /analytics.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/analytics",
    responses(
        (status = 200, description = "Analytics records, most recently updated first", body = AnalyticsResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Analytics"
)]
pub async fn get_user_analytics_handler(
    State(state): State<Arc<AnalyticsState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let records = AnalyticsService::new(&state.db)
        .get_user_analytics(current_user.id)
        .await?;
    tracing::info!("Retrieved analytics for user {}", current_user.id);

    Ok(Json(AnalyticsResponse {
        analytics: records.into_iter().map(AnalyticsJson::from).collect(),
    }))
}

/// Handler for GET /analytics/aggregated.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/analytics/aggregated",
    params(AggregatedQuery),
    responses(
        (status = 200, description = "Per-category summaries ordered by category", body = AggregatedAnalyticsResponse),
        (status = 400, description = "Invalid date window", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Analytics"
)]
pub async fn get_aggregated_analytics_handler(
    State(state): State<Arc<AnalyticsState>>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedQuery(query): ValidatedQuery<AggregatedQuery>,
) -> Result<Json<AggregatedAnalyticsResponse>, ApiError> {
    let range = query.date_range()?;
    let summaries = AnalyticsService::new(&state.db)
        .get_aggregated_analytics(current_user.id, range)
        .await?;
    tracing::info!("Retrieved aggregated analytics for user {}", current_user.id);

    Ok(Json(AggregatedAnalyticsResponse {
        analytics: summaries.into_iter().map(CategorySummaryJson::from).collect(),
    }))
}

/// Creates and returns the analytics API router.
pub fn create_api_router(state: Arc<AnalyticsState>) -> Router {
    Router::new()
        .route("/analytics", get(get_user_analytics_handler))
        .route("/analytics/aggregated", get(get_aggregated_analytics_handler))
        .with_state(state)
}
