use sea_orm_migration::prelude::*;

/// Tables that belong to a page through a plain `page_id` column.
///
/// None of them carries a foreign key to `pages`: page merges move these
/// rows onto the surviving page before the others are deleted.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Attachments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Attachments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Attachments::PageId).uuid().not_null())
                    .col(ColumnDef::new(Attachments::CreatorId).uuid().not_null())
                    .col(
                        ColumnDef::new(Attachments::FileName)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Attachments::CreatedAt)
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
                    .table(Bookmarks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bookmarks::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Bookmarks::PageId).uuid().not_null())
                    .col(ColumnDef::new(Bookmarks::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(Bookmarks::CreatedAt)
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
                    .table(Backlinks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Backlinks::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Backlinks::PageId).uuid().not_null())
                    .col(ColumnDef::new(Backlinks::FromPageId).uuid().not_null())
                    .col(ColumnDef::new(Backlinks::FromRevisionId).uuid().null())
                    .col(
                        ColumnDef::new(Backlinks::UpdatedAt)
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
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Comments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Comments::PageId).uuid().not_null())
                    .col(ColumnDef::new(Comments::CreatorId).uuid().not_null())
                    .col(ColumnDef::new(Comments::Comment).text().not_null())
                    .col(
                        ColumnDef::new(Comments::CreatedAt)
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
                    .table(Shares::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Shares::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Shares::PageId).uuid().not_null())
                    .col(
                        ColumnDef::new(Shares::Status)
                            .string_len(16)
                            .not_null()
                            .default("ACTIVE"),
                    )
                    .col(
                        ColumnDef::new(Shares::CreatedAt)
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
                    .name("idx_attachments_page_id")
                    .table(Attachments::Table)
                    .col(Attachments::PageId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookmarks_page_id")
                    .table(Bookmarks::Table)
                    .col(Bookmarks::PageId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_backlinks_page_id")
                    .table(Backlinks::Table)
                    .col(Backlinks::PageId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comments_page_id")
                    .table(Comments::Table)
                    .col(Comments::PageId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_shares_page_id")
                    .table(Shares::Table)
                    .col(Shares::PageId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_backlinks_from_page_id")
                    .table(Backlinks::Table)
                    .col(Backlinks::FromPageId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Shares::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Comments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Backlinks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bookmarks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Attachments::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Attachments {
    Table,
    Id,
    PageId,
    CreatorId,
    FileName,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Bookmarks {
    Table,
    Id,
    PageId,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Backlinks {
    Table,
    Id,
    PageId,
    FromPageId,
    FromRevisionId,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum Comments {
    Table,
    Id,
    PageId,
    CreatorId,
    Comment,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Shares {
    Table,
    Id,
    PageId,
    Status,
    CreatedAt,
}
