//! Channel entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::video::Visibility;

/// Channel - the publishing identity that owns videos and posts.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "channel")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// User who owns the channel.
    #[sea_orm(indexed)]
    pub owner_id: String,

    /// Channel name.
    pub name: String,

    /// Unique lower-case handle (optional).
    #[sea_orm(nullable, unique)]
    pub handle: Option<String>,

    /// Channel description (optional).
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub visibility: Visibility,

    /// Banner image URL (optional).
    #[sea_orm(nullable)]
    pub banner_image: Option<String>,

    /// Number of subscribers (denormalized, see `CounterSync`).
    #[sea_orm(default_value = 0)]
    pub subscriber_count: i64,

    /// Total views across the channel (denormalized).
    #[sea_orm(default_value = 0)]
    pub views_count: i64,

    /// When the channel was created.
    pub created_at: DateTimeWithTimeZone,

    /// When the channel was last updated.
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
