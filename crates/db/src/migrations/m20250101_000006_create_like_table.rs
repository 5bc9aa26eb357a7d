//! Create like table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Like::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Like::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Like::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Like::TargetType).string_len(16).not_null())
                    .col(ColumnDef::new(Like::TargetId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Like::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_like_user")
                            .from(Like::Table, Like::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, target_type, target_id) - one like per user per target.
        // Toggle inserts rely on this for ON CONFLICT DO NOTHING.
        manager
            .create_index(
                Index::create()
                    .name("idx_like_user_target")
                    .table(Like::Table)
                    .col(Like::UserId)
                    .col(Like::TargetType)
                    .col(Like::TargetId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: (target_type, target_id) for counting a target's likes
        manager
            .create_index(
                Index::create()
                    .name("idx_like_target")
                    .table(Like::Table)
                    .col(Like::TargetType)
                    .col(Like::TargetId)
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, target_type, created_at) for liked-item feeds
        manager
            .create_index(
                Index::create()
                    .name("idx_like_user_type_created")
                    .table(Like::Table)
                    .col(Like::UserId)
                    .col(Like::TargetType)
                    .col(Like::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Like::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Like {
    Table,
    Id,
    UserId,
    TargetType,
    TargetId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
