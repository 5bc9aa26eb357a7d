//! Activity repository.

use std::sync::Arc;

use crate::entities::activity::{self, ActivityKind};
use crate::entities::Activity;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use videotube_common::{AppError, AppResult};

/// Activity repository. Rows are only ever inserted and read.
#[derive(Clone)]
pub struct ActivityRepository {
    db: Arc<DatabaseConnection>,
}

impl ActivityRepository {
    /// Create a new activity repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append an activity.
    pub async fn create(&self, model: activity::ActiveModel) -> AppResult<activity::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Activities of a user, newest first, optionally of a single kind.
    pub async fn find_by_user(
        &self,
        user_id: &str,
        kind: Option<ActivityKind>,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<activity::Model>> {
        let mut query = Activity::find().filter(activity::Column::UserId.eq(user_id));

        if let Some(kind) = kind {
            query = query.filter(activity::Column::Kind.eq(kind));
        }

        query
            .order_by_desc(activity::Column::CreatedAt)
            .order_by_desc(activity::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
