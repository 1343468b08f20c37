use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;
use sea_orm_migration::sea_orm::Iterable;

use crate::m20250901_000001_create_users_table::Users;
use crate::m20250901_000002_create_tasks_table::{
    TaskPriority, TaskPriorityVariants, TaskStatus, TaskStatusVariants, Tasks,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Analytics {
    Table,
    Id,
    UserId,
    TaskId,
    CompletionTime,
    ProductivityScore,
    Category,
    Priority,
    Status,
    CreatedAt,
    UpdatedAt,
}

const FK_ANALYTICS_TO_USERS: &str = "fk-analytics-user_id";
const FK_ANALYTICS_TO_TASKS: &str = "fk-analytics-task_id";
const IDX_ANALYTICS_USER_TASK: &str = "idx-analytics-user_id-task_id";
const IDX_ANALYTICS_USER_UPDATED: &str = "idx-analytics-user_id-updated_at";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Analytics::Table)
                    .if_not_exists()
                    .col(pk_uuid(Analytics::Id))
                    .col(uuid(Analytics::UserId))
                    .col(uuid_null(Analytics::TaskId))
                    .col(integer(Analytics::CompletionTime).default(0))
                    .col(integer_null(Analytics::ProductivityScore))
                    .col(string_null(Analytics::Category))
                    .col(enumeration(
                        Analytics::Priority,
                        TaskPriority,
                        TaskPriorityVariants::iter(),
                    ))
                    .col(
                        enumeration(Analytics::Status, TaskStatus, TaskStatusVariants::iter())
                            .default("Pending"),
                    )
                    .col(
                        timestamp_with_time_zone(Analytics::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Analytics::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_ANALYTICS_TO_USERS)
                            .from(Analytics::Table, Analytics::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_ANALYTICS_TO_TASKS)
                            .from(Analytics::Table, Analytics::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_ANALYTICS_USER_TASK)
                    .table(Analytics::Table)
                    .col(Analytics::UserId)
                    .col(Analytics::TaskId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_ANALYTICS_USER_UPDATED)
                    .table(Analytics::Table)
                    .col(Analytics::UserId)
                    .col(Analytics::UpdatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Analytics::Table).to_owned())
            .await
    }
}
