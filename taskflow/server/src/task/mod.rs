use crate::entities::sea_orm_active_enums::{TaskPriority, TaskStatus};
use crate::entities::*;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr, Order};
use sea_orm::*;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

pub mod api;

#[derive(Debug, PartialEq, Clone)]
pub struct Task {
    id: Uuid,
    user_id: Uuid,
    title: String,
    description: Option<String>,
    priority: TaskPriority,
    status: TaskStatus,
    category: Option<String>,
    due_date: Option<DateTime<Utc>>,
    ai_suggestions: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the ID of the owning user.
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn priority(&self) -> TaskPriority {
        self.priority
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns the opaque suggestion payload attached by clients.
    pub fn ai_suggestions(&self) -> &serde_json::Value {
        &self.ai_suggestions
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the time of the last mutation.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            description: model.description,
            priority: model.priority,
            status: model.status,
            category: model.category,
            due_date: model.due_date,
            ai_suggestions: model.ai_suggestions,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Fields of a task being created. Absent fields take their defaults.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub category: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub ai_suggestions: Option<serde_json::Value>,
}

/// Partial update of a task. Only `Some` fields are written.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub category: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub ai_suggestions: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum TaskSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    DueDate,
    Priority,
    Title,
}

impl TaskSortField {
    fn column(self) -> task::Column {
        match self {
            Self::CreatedAt => task::Column::CreatedAt,
            Self::UpdatedAt => task::Column::UpdatedAt,
            Self::DueDate => task::Column::DueDate,
            Self::Priority => task::Column::Priority,
            Self::Title => task::Column::Title,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

/// Narrows and orders a task listing. The default lists newest first.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category: Option<String>,
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
    pub sort_by: TaskSortField,
    pub sort_order: SortOrder,
}

/// Error type for TaskService operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    #[error("Task with ID {0} not found")]
    TaskNotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

fn trimmed(value: String) -> String {
    value.trim().to_string()
}

pub struct TaskService<'a> {
    db: &'a sea_orm::DatabaseConnection,
}

impl TaskService<'_> {
    pub fn new(db: &sea_orm::DatabaseConnection) -> TaskService<'_> {
        TaskService { db }
    }

    /// Creates a task owned by `user_id`.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(&self, user_id: Uuid, new_task: NewTask) -> Result<Task, TaskServiceError> {
        let now = Utc::now();
        let active_model = task::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            user_id: ActiveValue::Set(user_id),
            title: ActiveValue::Set(trimmed(new_task.title)),
            description: ActiveValue::Set(new_task.description.map(trimmed)),
            priority: ActiveValue::Set(new_task.priority.unwrap_or_default()),
            status: ActiveValue::Set(new_task.status.unwrap_or_default()),
            category: ActiveValue::Set(new_task.category.map(trimmed)),
            due_date: ActiveValue::Set(new_task.due_date),
            ai_suggestions: ActiveValue::Set(
                new_task
                    .ai_suggestions
                    .unwrap_or_else(|| serde_json::json!({})),
            ),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };
        let created_model = active_model.insert(self.db).await?;
        Ok(Task::from(created_model))
    }

    /// Lists the tasks of `user_id` that match `filter`.
    #[tracing::instrument(skip(self))]
    pub async fn get_tasks(&self, user_id: Uuid, filter: &TaskFilter) -> Result<Vec<Task>, TaskServiceError> {
        let mut query = task::Entity::find().filter(task::Column::UserId.eq(user_id));

        if let Some(status) = filter.status {
            query = query.filter(task::Column::Status.eq(status));
        }
        if let Some(priority) = filter.priority {
            query = query.filter(task::Column::Priority.eq(priority));
        }
        if let Some(category) = &filter.category {
            query = query.filter(task::Column::Category.eq(category.as_str()));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(task::Column::Title)))
                    .like(LikeExpr::new(pattern).escape('\\')),
            );
        }

        let tasks = query
            .order_by(filter.sort_by.column(), filter.sort_order.into())
            .order_by_desc(task::Column::Id)
            .all(self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    /// Retrieves a single task, scoped to its owner.
    #[tracing::instrument(skip(self))]
    pub async fn get_task_by_id(&self, task_id: Uuid, user_id: Uuid) -> Result<Task, TaskServiceError> {
        self.find_owned(task_id, user_id).await.map(Task::from)
    }

    /// Applies `changes` to a task and stamps `updated_at`.
    #[tracing::instrument(skip(self))]
    pub async fn update_task(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        changes: TaskChanges,
    ) -> Result<Task, TaskServiceError> {
        let task_to_update = self.find_owned(task_id, user_id).await?;

        let mut active_model: task::ActiveModel = task_to_update.into();
        if let Some(title) = changes.title {
            active_model.title = ActiveValue::Set(trimmed(title));
        }
        if let Some(description) = changes.description {
            active_model.description = ActiveValue::Set(Some(trimmed(description)));
        }
        if let Some(priority) = changes.priority {
            active_model.priority = ActiveValue::Set(priority);
        }
        if let Some(status) = changes.status {
            active_model.status = ActiveValue::Set(status);
        }
        if let Some(category) = changes.category {
            active_model.category = ActiveValue::Set(Some(trimmed(category)));
        }
        if let Some(due_date) = changes.due_date {
            active_model.due_date = ActiveValue::Set(Some(due_date));
        }
        if let Some(ai_suggestions) = changes.ai_suggestions {
            active_model.ai_suggestions = ActiveValue::Set(ai_suggestions);
        }
        active_model.updated_at = ActiveValue::Set(Utc::now());

        let updated_model = active_model.update(self.db).await?;
        Ok(Task::from(updated_model))
    }

    /// Deletes a task, scoped to its owner.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&self, task_id: Uuid, user_id: Uuid) -> Result<(), TaskServiceError> {
        let result = task::Entity::delete_many()
            .filter(task::Column::Id.eq(task_id))
            .filter(task::Column::UserId.eq(user_id))
            .exec(self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(TaskServiceError::TaskNotFound(task_id));
        }
        Ok(())
    }

    async fn find_owned(&self, task_id: Uuid, user_id: Uuid) -> Result<task::Model, TaskServiceError> {
        task::Entity::find_by_id(task_id)
            .filter(task::Column::UserId.eq(user_id))
            .one(self.db)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(task_id))
    }
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
