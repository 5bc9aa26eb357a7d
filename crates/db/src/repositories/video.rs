//! Video repository.

use std::sync::Arc;

use crate::entities::{Video, video};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use videotube_common::{AppError, AppResult};

/// Video repository for database operations.
#[derive(Clone)]
pub struct VideoRepository {
    db: Arc<DatabaseConnection>,
}

impl VideoRepository {
    /// Create a new video repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a video by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<video::Model>> {
        Video::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find videos by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<video::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Video::find()
            .filter(video::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new video.
    pub async fn create(&self, model: video::ActiveModel) -> AppResult<video::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Video IDs in ascending order, strictly after `after`.
    pub async fn ids_after(&self, after: Option<&str>, limit: u64) -> AppResult<Vec<String>> {
        let mut query = Video::find()
            .select_only()
            .column(video::Column::Id)
            .order_by_asc(video::Column::Id);

        if let Some(id) = after {
            query = query.filter(video::Column::Id.gt(id));
        }

        query
            .limit(limit)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::video::Visibility;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_video(id: &str, published: bool, visibility: Visibility) -> video::Model {
        video::Model {
            id: id.to_string(),
            channel_id: "ch1".to_string(),
            title: "Title".to_string(),
            description: String::new(),
            thumbnail: "https://cdn.example/t.png".to_string(),
            duration: 120,
            is_published: published,
            visibility,
            likes_count: 0,
            comments_count: 0,
            views_count: 0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let video = create_test_video("v1", true, Visibility::Public);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[video]])
                .into_connection(),
        );

        let repo = VideoRepository::new(db);
        let found = repo.find_by_id("v1").await.unwrap().unwrap();

        assert_eq!(found.channel_id, "ch1");
        assert!(found.is_engageable());
    }

    #[test]
    fn test_unpublished_video_is_not_engageable() {
        assert!(!create_test_video("v1", false, Visibility::Public).is_engageable());
        assert!(!create_test_video("v1", true, Visibility::Unlisted).is_engageable());
    }
}
