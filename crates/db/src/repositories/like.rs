//! Like repository.

use std::sync::Arc;

use crate::entities::{Like, like};
use crate::target::{TargetKind, TargetRef};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use videotube_common::{AppError, AppResult};

/// Like repository for database operations.
#[derive(Clone)]
pub struct LikeRepository {
    db: Arc<DatabaseConnection>,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find likes by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<like::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Like::find()
            .filter(like::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the like a user holds on a target.
    pub async fn find_by_user_and_target(
        &self,
        user_id: &str,
        target: &TargetRef,
    ) -> AppResult<Option<like::Model>> {
        Like::find()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::TargetType.eq(target.kind()))
            .filter(like::Column::TargetId.eq(target.id()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a like unless the user already likes the target.
    ///
    /// Returns `true` only when this call created the row. A duplicate
    /// (including one inserted by a concurrent caller) is not an error.
    pub async fn insert_if_absent(&self, model: like::ActiveModel) -> AppResult<bool> {
        let inserted = Like::insert(model)
            .on_conflict(
                OnConflict::columns([
                    like::Column::UserId,
                    like::Column::TargetType,
                    like::Column::TargetId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(inserted == 1)
    }

    /// Delete the like a user holds on a target.
    ///
    /// Returns `true` only when this call removed the row.
    pub async fn delete_by_user_and_target(
        &self,
        user_id: &str,
        target: &TargetRef,
    ) -> AppResult<bool> {
        let result = Like::delete_many()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::TargetType.eq(target.kind()))
            .filter(like::Column::TargetId.eq(target.id()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Count likes on a target.
    pub async fn count_by_target(&self, target: &TargetRef) -> AppResult<u64> {
        Like::find()
            .filter(like::Column::TargetType.eq(target.kind()))
            .filter(like::Column::TargetId.eq(target.id()))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Likes a user placed on one kind of target, newest first.
    pub async fn find_by_user_and_kind(
        &self,
        user_id: &str,
        kind: TargetKind,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<like::Model>> {
        Like::find()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::TargetType.eq(kind))
            .order_by_desc(like::Column::CreatedAt)
            .order_by_desc(like::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_like(id: &str, user_id: &str, target: &TargetRef) -> like::Model {
        like::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            target_type: target.kind(),
            target_id: target.id().to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn test_find_by_user_and_target() {
        let target = TargetRef::Video("v1".into());
        let like = create_test_like("l1", "u1", &target);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[like]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        let found = repo
            .find_by_user_and_target("u1", &target)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.target(), target);
    }

    #[tokio::test]
    async fn test_insert_if_absent_reports_conflict_as_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1), exec(0)])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        let model = like::ActiveModel {
            id: Set("l1".to_string()),
            user_id: Set("u1".to_string()),
            target_type: Set(TargetKind::Post),
            target_id: Set("p1".to_string()),
            created_at: Set(Utc::now().into()),
        };

        assert!(repo.insert_if_absent(model.clone()).await.unwrap());
        assert!(!repo.insert_if_absent(model).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_reports_whether_a_row_was_removed() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1), exec(0)])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        let target = TargetRef::Comment("c1".into());

        assert!(repo.delete_by_user_and_target("u1", &target).await.unwrap());
        assert!(!repo.delete_by_user_and_target("u1", &target).await.unwrap());
    }
}
