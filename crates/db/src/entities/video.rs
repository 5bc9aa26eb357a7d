//! Video entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Visibility levels shared by videos, posts and channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    #[sea_orm(string_value = "public")]
    Public,
    #[sea_orm(string_value = "private")]
    Private,
    #[sea_orm(string_value = "unlisted")]
    Unlisted,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "video")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Publishing channel
    #[sea_orm(indexed)]
    pub channel_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Thumbnail URL returned by the upload service
    pub thumbnail: String,

    /// Duration in seconds
    pub duration: i32,

    pub is_published: bool,

    pub visibility: Visibility,

    /// Like count (denormalized)
    #[sea_orm(default_value = 0)]
    pub likes_count: i64,

    /// Comment count including replies (denormalized)
    #[sea_orm(default_value = 0)]
    pub comments_count: i64,

    /// View count (denormalized, increment-only)
    #[sea_orm(default_value = 0)]
    pub views_count: i64,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::channel::Entity",
        from = "Column::ChannelId",
        to = "super::channel::Column::Id",
        on_delete = "Cascade"
    )]
    Channel,
}

impl Related<super::channel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Channel.def()
    }
}

impl Model {
    /// Whether the video accepts likes and comments.
    #[must_use]
    pub fn is_engageable(&self) -> bool {
        self.is_published && self.visibility == Visibility::Public
    }
}

impl ActiveModelBehavior for ActiveModel {}
