//! Post repository.

use std::sync::Arc;

use crate::entities::{Post, post};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use videotube_common::{AppError, AppResult};

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find posts by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<post::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Post::find()
            .filter(post::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Post IDs in ascending order, strictly after `after`.
    pub async fn ids_after(&self, after: Option<&str>, limit: u64) -> AppResult<Vec<String>> {
        let mut query = Post::find()
            .select_only()
            .column(post::Column::Id)
            .order_by_asc(post::Column::Id);

        if let Some(id) = after {
            query = query.filter(post::Column::Id.gt(id));
        }

        query
            .limit(limit)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
