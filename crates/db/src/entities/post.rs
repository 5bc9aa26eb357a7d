//! Post entity (community posts published by a channel).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::video::Visibility;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Authoring channel
    #[sea_orm(indexed)]
    pub channel_id: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Media URLs returned by the upload service
    #[sea_orm(column_type = "Json")]
    pub media: Json,

    pub visibility: Visibility,

    #[sea_orm(default_value = 0)]
    pub likes_count: i64,

    #[sea_orm(default_value = 0)]
    pub comments_count: i64,

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
    /// Whether the post accepts likes and comments.
    #[must_use]
    pub fn is_engageable(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

impl ActiveModelBehavior for ActiveModel {}
