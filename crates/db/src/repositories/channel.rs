//! Channel repository.

use std::sync::Arc;

use crate::entities::{Channel, channel};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use videotube_common::{AppError, AppResult};

/// Channel repository for database operations.
#[derive(Clone)]
pub struct ChannelRepository {
    db: Arc<DatabaseConnection>,
}

impl ChannelRepository {
    /// Create a new channel repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a channel by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<channel::Model>> {
        Channel::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find channels by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<channel::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Channel::find()
            .filter(channel::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new channel.
    pub async fn create(&self, model: channel::ActiveModel) -> AppResult<channel::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Channel IDs in ascending order, strictly after `after`.
    pub async fn ids_after(&self, after: Option<&str>, limit: u64) -> AppResult<Vec<String>> {
        let mut query = Channel::find()
            .select_only()
            .column(channel::Column::Id)
            .order_by_asc(channel::Column::Id);

        if let Some(id) = after {
            query = query.filter(channel::Column::Id.gt(id));
        }

        query
            .limit(limit)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
