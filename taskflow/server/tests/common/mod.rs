#![allow(dead_code)]

use chrono::{DateTime, Utc};
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, ActiveValue, Database, DatabaseConnection};
use taskflow_server::entities::sea_orm_active_enums::{TaskPriority, TaskStatus};
use taskflow_server::entities::{analytics, task, user};
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::{postgres, testcontainers};
use uuid::Uuid;

pub async fn setup_container() -> anyhow::Result<testcontainers::ContainerAsync<postgres::Postgres>>
{
    let container = postgres::Postgres::default().start().await?;
    Ok(container)
}

pub async fn setup_db(
    container: &testcontainers::ContainerAsync<postgres::Postgres>,
) -> anyhow::Result<DatabaseConnection> {
    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let db_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);
    let db = Database::connect(&db_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Inserts a user directly, bypassing password hashing.
pub async fn insert_user(db: &DatabaseConnection, email: &str) -> user::Model {
    let now = Utc::now();
    user::ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4()),
        name: ActiveValue::Set("Test User".to_string()),
        email: ActiveValue::Set(email.to_string()),
        password_hash: ActiveValue::Set("not-a-real-hash".to_string()),
        created_at: ActiveValue::Set(now),
        updated_at: ActiveValue::Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to insert user")
}

/// Describes a task row with explicit timestamps.
pub struct TaskFixture {
    pub title: &'static str,
    pub category: Option<&'static str>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskFixture {
    pub fn pending(title: &'static str, created_at: DateTime<Utc>) -> Self {
        Self {
            title,
            category: None,
            priority: TaskPriority::Medium,
            status: TaskStatus::Pending,
            due_date: None,
            created_at,
            updated_at: created_at,
        }
    }
}

pub async fn insert_task(db: &DatabaseConnection, user_id: Uuid, fixture: TaskFixture) -> task::Model {
    task::ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4()),
        user_id: ActiveValue::Set(user_id),
        title: ActiveValue::Set(fixture.title.to_string()),
        description: ActiveValue::Set(None),
        priority: ActiveValue::Set(fixture.priority),
        status: ActiveValue::Set(fixture.status),
        category: ActiveValue::Set(fixture.category.map(str::to_string)),
        due_date: ActiveValue::Set(fixture.due_date),
        ai_suggestions: ActiveValue::Set(serde_json::json!({})),
        created_at: ActiveValue::Set(fixture.created_at),
        updated_at: ActiveValue::Set(fixture.updated_at),
    }
    .insert(db)
    .await
    .expect("Failed to insert task")
}

/// Inserts an analytics row directly, for aggregation tests.
pub async fn insert_analytics(
    db: &DatabaseConnection,
    user_id: Uuid,
    category: Option<&str>,
    completion_time: i32,
    productivity_score: Option<i32>,
    updated_at: DateTime<Utc>,
) -> analytics::Model {
    analytics::ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4()),
        user_id: ActiveValue::Set(user_id),
        task_id: ActiveValue::Set(None),
        completion_time: ActiveValue::Set(completion_time),
        productivity_score: ActiveValue::Set(productivity_score),
        category: ActiveValue::Set(category.map(str::to_string)),
        priority: ActiveValue::Set(TaskPriority::Medium),
        status: ActiveValue::Set(if productivity_score.is_some() {
            TaskStatus::Completed
        } else {
            TaskStatus::Pending
        }),
        created_at: ActiveValue::Set(updated_at),
        updated_at: ActiveValue::Set(updated_at),
    }
    .insert(db)
    .await
    .expect("Failed to insert analytics")
}
