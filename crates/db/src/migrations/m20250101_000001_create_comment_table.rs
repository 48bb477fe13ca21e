//! Create comment table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Comment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Comment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Comment::ParentId).string_len(128).not_null())
                    // No foreign key: replies outlive the comment they answer
                    .col(ColumnDef::new(Comment::ReplyToId).string_len(32).null())
                    .col(ColumnDef::new(Comment::AuthorId).string_len(128).not_null())
                    .col(ColumnDef::new(Comment::AuthorName).string_len(256).not_null())
                    .col(ColumnDef::new(Comment::AuthorRole).string_len(64).not_null())
                    .col(ColumnDef::new(Comment::Content).text().not_null())
                    .col(
                        ColumnDef::new(Comment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (parent_id, created_at) - thread fetch in display order
        manager
            .create_index(
                Index::create()
                    .name("idx_comment_parent_created")
                    .table(Comment::Table)
                    .col(Comment::ParentId)
                    .col(Comment::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: reply_to_id (for reply lookups)
        manager
            .create_index(
                Index::create()
                    .name("idx_comment_reply_to_id")
                    .table(Comment::Table)
                    .col(Comment::ReplyToId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Comment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Comment {
    Table,
    Id,
    ParentId,
    ReplyToId,
    AuthorId,
    AuthorName,
    AuthorRole,
    Content,
    CreatedAt,
}
