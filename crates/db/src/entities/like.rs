//! Like relation entity.
//!
//! One row per `(user, target)`; the pair is unique. The target is stored as
//! a discriminant plus a single id and read back through [`Model::target`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::target::{TargetKind, TargetRef};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "like")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user who liked
    pub user_id: String,

    /// Kind of the liked record (video, post or comment)
    pub target_type: TargetKind,

    /// ID of the liked record
    pub target_id: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Model {
    /// The liked target as a tagged reference.
    #[must_use]
    pub fn target(&self) -> TargetRef {
        TargetRef::new(self.target_type, self.target_id.clone())
    }
}

impl ActiveModelBehavior for ActiveModel {}
