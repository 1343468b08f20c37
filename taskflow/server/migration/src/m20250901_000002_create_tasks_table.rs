use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;
use sea_orm_migration::sea_orm::{EnumIter, Iterable};

use crate::m20250901_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
pub enum Tasks {
    Table,
    Id,
    UserId,
    Title,
    Description,
    Priority,
    Status,
    Category,
    DueDate,
    AiSuggestions,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub struct TaskPriority;

#[derive(DeriveIden, EnumIter)]
pub enum TaskPriorityVariants {
    #[sea_orm(iden = "Low")]
    Low,
    #[sea_orm(iden = "Medium")]
    Medium,
    #[sea_orm(iden = "High")]
    High,
}

#[derive(DeriveIden)]
pub struct TaskStatus;

#[derive(DeriveIden, EnumIter)]
pub enum TaskStatusVariants {
    #[sea_orm(iden = "Pending")]
    Pending,
    #[sea_orm(iden = "Completed")]
    Completed,
}

const FK_TASKS_TO_USERS: &str = "fk-tasks-user_id";
const IDX_TASKS_USER_CREATED: &str = "idx-tasks-user_id-created_at";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(TaskPriority)
                    .values(TaskPriorityVariants::iter())
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(TaskStatus)
                    .values(TaskStatusVariants::iter())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tasks::Table)
                    .if_not_exists()
                    .col(pk_uuid(Tasks::Id))
                    .col(uuid(Tasks::UserId))
                    .col(string(Tasks::Title))
                    .col(text_null(Tasks::Description))
                    .col(
                        enumeration(Tasks::Priority, TaskPriority, TaskPriorityVariants::iter())
                            .default("Medium"),
                    )
                    .col(
                        enumeration(Tasks::Status, TaskStatus, TaskStatusVariants::iter())
                            .default("Pending"),
                    )
                    .col(string_null(Tasks::Category))
                    .col(timestamp_with_time_zone_null(Tasks::DueDate))
                    .col(json_binary(Tasks::AiSuggestions).default(Expr::cust("'{}'::jsonb")))
                    .col(
                        timestamp_with_time_zone(Tasks::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Tasks::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_TASKS_TO_USERS)
                            .from(Tasks::Table, Tasks::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_TASKS_USER_CREATED)
                    .table(Tasks::Table)
                    .col(Tasks::UserId)
                    .col(Tasks::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(TaskStatus).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(TaskPriority).to_owned())
            .await
    }
}
