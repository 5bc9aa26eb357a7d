//! Create activity table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // References carry no foreign keys: the log outlives what it points at.
        manager
            .create_table(
                Table::create()
                    .table(Activity::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Activity::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Activity::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Activity::Kind).string_len(16).not_null())
                    .col(ColumnDef::new(Activity::VideoId).string_len(32))
                    .col(ColumnDef::new(Activity::PostId).string_len(32))
                    .col(ColumnDef::new(Activity::CommentId).string_len(32))
                    .col(ColumnDef::new(Activity::LikeId).string_len(32))
                    .col(
                        ColumnDef::new(Activity::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::cust(
                        "video_id IS NOT NULL OR post_id IS NOT NULL \
                         OR comment_id IS NOT NULL OR like_id IS NOT NULL",
                    ))
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, created_at) for per-user activity feeds
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_user_created")
                    .table(Activity::Table)
                    .col(Activity::UserId)
                    .col(Activity::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Activity::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Activity {
    Table,
    Id,
    UserId,
    Kind,
    VideoId,
    PostId,
    CommentId,
    LikeId,
    CreatedAt,
}
