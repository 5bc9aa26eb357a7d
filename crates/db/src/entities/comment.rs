//! Comment entity.
//!
//! Comments are stored flat; `parent_id` is the back-reference that forms
//! the reply tree. Exactly one of `video_id` / `post_id` is set (enforced by
//! a table check) and [`Model::scope`] exposes it as a [`ThreadScope`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use videotube_common::{AppError, AppResult};

use crate::target::ThreadScope;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    #[sea_orm(indexed)]
    pub author_id: String,

    #[sea_orm(nullable, indexed)]
    pub video_id: Option<String>,

    #[sea_orm(nullable, indexed)]
    pub post_id: Option<String>,

    /// Comment being replied to; `None` for thread roots
    #[sea_orm(nullable, indexed)]
    pub parent_id: Option<String>,

    #[sea_orm(default_value = false)]
    pub is_deleted: bool,

    /// At most one pinned comment per scope
    #[sea_orm(default_value = false)]
    pub is_pinned: bool,

    #[sea_orm(default_value = 0)]
    pub likes_count: i64,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Author,
    #[sea_orm(
        belongs_to = "super::video::Entity",
        from = "Column::VideoId",
        to = "super::video::Column::Id",
        on_delete = "Cascade"
    )]
    Video,
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_delete = "Cascade"
    )]
    Post,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::video::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Video.def()
    }
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl Model {
    /// The thread scope this comment belongs to.
    pub fn scope(&self) -> AppResult<ThreadScope> {
        ThreadScope::from_columns(self.video_id.as_deref(), self.post_id.as_deref()).ok_or_else(
            || AppError::Internal(format!("Comment {} has no single thread scope", self.id)),
        )
    }
}

impl ActiveModelBehavior for ActiveModel {}
