//! Activity entity (append-only engagement log).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of logged engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    #[sea_orm(string_value = "watch")]
    Watch,
    #[sea_orm(string_value = "like")]
    Like,
    #[sea_orm(string_value = "comment")]
    Comment,
    #[sea_orm(string_value = "post")]
    Post,
}

/// Activity row. References are plain ids without foreign keys so a log
/// entry survives the deletion of what it points at.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub user_id: String,

    pub kind: ActivityKind,

    #[sea_orm(nullable)]
    pub video_id: Option<String>,

    #[sea_orm(nullable)]
    pub post_id: Option<String>,

    #[sea_orm(nullable)]
    pub comment_id: Option<String>,

    #[sea_orm(nullable)]
    pub like_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
