//! Create channel table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Channel::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Channel::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Channel::OwnerId).string_len(32).not_null())
                    .col(ColumnDef::new(Channel::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Channel::Handle).string_len(128).unique_key())
                    .col(ColumnDef::new(Channel::Description).text())
                    .col(
                        ColumnDef::new(Channel::Visibility)
                            .string_len(16)
                            .not_null()
                            .default("private"),
                    )
                    .col(ColumnDef::new(Channel::BannerImage).string_len(1024))
                    .col(
                        ColumnDef::new(Channel::SubscriberCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Channel::ViewsCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Channel::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Channel::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_channel_owner")
                            .from(Channel::Table, Channel::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: owner_id (ownership checks, owned channel listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_channel_owner_id")
                    .table(Channel::Table)
                    .col(Channel::OwnerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Channel::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Channel {
    Table,
    Id,
    OwnerId,
    Name,
    Handle,
    Description,
    Visibility,
    BannerImage,
    SubscriberCount,
    ViewsCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
