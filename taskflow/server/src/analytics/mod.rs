use crate::entities::sea_orm_active_enums::{TaskPriority, TaskStatus};
use crate::entities::*;
use crate::task::Task;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Alias, Expr, Func, NullOrdering, OnConflict, Order, SimpleExpr};
use sea_orm::*;
use uuid::Uuid;

pub mod api;
pub mod projection;

use projection::TaskProjection;

/// A stored analytics record.
#[derive(Debug, PartialEq, Clone)]
pub struct Analytics {
    id: Uuid,
    user_id: Uuid,
    task_id: Option<Uuid>,
    projection: TaskProjection,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Analytics {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Returns the tracked task, or `None` once the task has been deleted.
    pub fn task_id(&self) -> Option<Uuid> {
        self.task_id
    }

    /// Minutes from creation to first observed completion, 0 while uncaptured.
    pub fn completion_time(&self) -> i32 {
        self.projection.completion_time
    }

    pub fn productivity_score(&self) -> Option<i32> {
        self.projection.productivity_score
    }

    pub fn category(&self) -> Option<&str> {
        self.projection.category.as_deref()
    }

    pub fn priority(&self) -> TaskPriority {
        self.projection.priority
    }

    pub fn status(&self) -> TaskStatus {
        self.projection.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl From<analytics::Model> for Analytics {
    fn from(model: analytics::Model) -> Self {
        Self {
            projection: TaskProjection::from(&model),
            id: model.id,
            user_id: model.user_id,
            task_id: model.task_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// An analytics record together with its task, if the task still exists.
#[derive(Debug, PartialEq, Clone)]
pub struct AnalyticsWithTask {
    pub analytics: Analytics,
    pub task: Option<Task>,
}

/// Inclusive bounds on a record's `updated_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    /// Returns `None` when `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

/// Per-category summary of a user's analytics records.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct CategorySummary {
    pub category: Option<String>,
    pub avg_completion_time: Option<f64>,
    /// Mean over completed records only; `None` when no record in the group has a score.
    pub avg_productivity_score: Option<f64>,
    pub total_tasks: i64,
}

/// Error type for AnalyticsService operations.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsServiceError {
    #[error("Task with ID {0} not found")]
    TaskNotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

pub struct AnalyticsService<'a> {
    db: &'a sea_orm::DatabaseConnection,
}

impl AnalyticsService<'_> {
    pub fn new(db: &sea_orm::DatabaseConnection) -> AnalyticsService<'_> {
        AnalyticsService { db }
    }

    /// Creates or refreshes the analytics record of a task from its current state.
    ///
    /// The read and the write are separate statements. Concurrent calls for the
    /// same task are last-write-wins: a first insert that loses the race on the
    /// `(user_id, task_id)` index turns into an update of the winner's row.
    #[tracing::instrument(skip(self))]
    pub async fn record_task_analytics(
        &self,
        task_id: Uuid,
        user_id: Uuid,
    ) -> Result<Analytics, AnalyticsServiceError> {
        let task = task::Entity::find_by_id(task_id)
            .filter(task::Column::UserId.eq(user_id))
            .one(self.db)
            .await?
            .map(Task::from)
            .ok_or(AnalyticsServiceError::TaskNotFound(task_id))?;

        let existing = analytics::Entity::find()
            .filter(analytics::Column::UserId.eq(user_id))
            .filter(analytics::Column::TaskId.eq(task_id))
            .one(self.db)
            .await?;

        let mut projection = existing
            .as_ref()
            .map(TaskProjection::from)
            .unwrap_or_else(|| TaskProjection::for_task(&task));
        let outcome = projection.refresh(&task);

        if let Some(minutes) = outcome.captured_completion_time {
            tracing::info!("Task {} completed in {} minutes", task_id, minutes);
        }
        if let Some(score) = outcome.recomputed_score {
            tracing::info!("Productivity score for task {}: {}", task_id, score);
        }

        let now = Utc::now();
        let saved = match existing {
            Some(model) => {
                let mut active_model: analytics::ActiveModel = model.into();
                apply_projection(&mut active_model, projection);
                active_model.updated_at = ActiveValue::Set(now);
                active_model.update(self.db).await?
            }
            None => {
                let mut active_model = analytics::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4()),
                    user_id: ActiveValue::Set(user_id),
                    task_id: ActiveValue::Set(Some(task_id)),
                    created_at: ActiveValue::Set(now),
                    updated_at: ActiveValue::Set(now),
                    ..Default::default()
                };
                apply_projection(&mut active_model, projection);
                analytics::Entity::insert(active_model)
                    .on_conflict(
                        OnConflict::columns([analytics::Column::UserId, analytics::Column::TaskId])
                            .update_columns([
                                analytics::Column::Category,
                                analytics::Column::Priority,
                                analytics::Column::Status,
                                analytics::Column::CompletionTime,
                                analytics::Column::ProductivityScore,
                                analytics::Column::UpdatedAt,
                            ])
                            .to_owned(),
                    )
                    .exec_with_returning(self.db)
                    .await?
            }
        };

        Ok(Analytics::from(saved))
    }

    /// Lists a user's analytics records joined with their tasks, most recently updated first.
    #[tracing::instrument(skip(self))]
    pub async fn get_user_analytics(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<AnalyticsWithTask>, AnalyticsServiceError> {
        let records = analytics::Entity::find()
            .filter(analytics::Column::UserId.eq(user_id))
            .order_by_desc(analytics::Column::UpdatedAt)
            .find_also_related(task::Entity)
            .all(self.db)
            .await?
            .into_iter()
            .map(|(analytics, task)| AnalyticsWithTask {
                analytics: Analytics::from(analytics),
                task: task.map(Task::from),
            })
            .collect();
        Ok(records)
    }

    /// Groups a user's analytics records by category, ordered by category with
    /// the uncategorized group first.
    ///
    /// Records without a score do not count towards the score average but do
    /// count towards `total_tasks` and the completion time average.
    #[tracing::instrument(skip(self))]
    pub async fn get_aggregated_analytics(
        &self,
        user_id: Uuid,
        range: Option<DateRange>,
    ) -> Result<Vec<CategorySummary>, AnalyticsServiceError> {
        let mut query = analytics::Entity::find()
            .select_only()
            .column(analytics::Column::Category)
            .column_as(average(analytics::Column::CompletionTime), "avg_completion_time")
            .column_as(
                average(analytics::Column::ProductivityScore),
                "avg_productivity_score",
            )
            .column_as(Expr::col(analytics::Column::Id).count(), "total_tasks")
            .filter(analytics::Column::UserId.eq(user_id));

        if let Some(range) = range {
            query = query.filter(analytics::Column::UpdatedAt.between(range.start(), range.end()));
        }

        let summaries = query
            .group_by(analytics::Column::Category)
            .order_by_with_nulls(analytics::Column::Category, Order::Asc, NullOrdering::First)
            .into_model::<CategorySummary>()
            .all(self.db)
            .await?;
        Ok(summaries)
    }
}

/// `AVG(column)` as double precision, since Postgres returns NUMERIC for integer averages.
fn average(column: analytics::Column) -> SimpleExpr {
    Expr::expr(Func::avg(Expr::col(column))).cast_as(Alias::new("float8"))
}

fn apply_projection(active_model: &mut analytics::ActiveModel, projection: TaskProjection) {
    active_model.category = ActiveValue::Set(projection.category);
    active_model.priority = ActiveValue::Set(projection.priority);
    active_model.status = ActiveValue::Set(projection.status);
    active_model.completion_time = ActiveValue::Set(projection.completion_time);
    active_model.productivity_score = ActiveValue::Set(projection.productivity_score);
}
