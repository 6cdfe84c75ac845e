use sea_orm_migration::prelude::*;

/// Tables that point at a page through a polymorphic `(target_model,
/// target_id)` pair.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Activities::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Activities::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Activities::UserId).uuid().not_null())
                    .col(ColumnDef::new(Activities::TargetId).uuid().not_null())
                    .col(
                        ColumnDef::new(Activities::TargetModel)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Activities::Action).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Activities::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notifications::UserId).uuid().not_null())
                    .col(ColumnDef::new(Notifications::TargetId).uuid().not_null())
                    .col(
                        ColumnDef::new(Notifications::TargetModel)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notifications::Action)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notifications::Status)
                            .string_len(16)
                            .not_null()
                            .default("UNREAD"),
                    )
                    .col(
                        ColumnDef::new(Notifications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Watchers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Watchers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Watchers::UserId).uuid().not_null())
                    .col(ColumnDef::new(Watchers::TargetId).uuid().not_null())
                    .col(
                        ColumnDef::new(Watchers::TargetModel)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Watchers::Status)
                            .string_len(16)
                            .not_null()
                            .default("WATCH"),
                    )
                    .col(
                        ColumnDef::new(Watchers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_activities_target")
                    .table(Activities::Table)
                    .col(Activities::TargetModel)
                    .col(Activities::TargetId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notifications_target")
                    .table(Notifications::Table)
                    .col(Notifications::TargetModel)
                    .col(Notifications::TargetId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_watchers_target")
                    .table(Watchers::Table)
                    .col(Watchers::TargetModel)
                    .col(Watchers::TargetId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Watchers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Activities::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Activities {
    Table,
    Id,
    UserId,
    TargetId,
    TargetModel,
    Action,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Notifications {
    Table,
    Id,
    UserId,
    TargetId,
    TargetModel,
    Action,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Watchers {
    Table,
    Id,
    UserId,
    TargetId,
    TargetModel,
    Status,
    CreatedAt,
}
