//! Comment repository.

use std::sync::Arc;

use crate::entities::{Comment, comment};
use crate::{ThreadScope, is_unique_violation};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use videotube_common::{AppError, AppResult};

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

/// Restrict a comment query to one thread scope.
fn in_scope<Q: QueryFilter>(query: Q, scope: &ThreadScope) -> Q {
    match scope {
        ThreadScope::Video(id) => query.filter(comment::Column::VideoId.eq(id.as_str())),
        ThreadScope::Post(id) => query.filter(comment::Column::PostId.eq(id.as_str())),
    }
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find comments by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<comment::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Comment::find()
            .filter(comment::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new comment.
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Replace the content of a comment.
    pub async fn update_content(
        &self,
        comment: comment::Model,
        content: String,
    ) -> AppResult<comment::Model> {
        let mut active: comment::ActiveModel = comment.into();
        active.content = Set(content);
        active.updated_at = Set(Some(Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Flag a comment as deleted.
    ///
    /// Returns `false` when the comment was already deleted (or is gone).
    pub async fn soft_delete(&self, id: &str) -> AppResult<bool> {
        let result = Comment::update_many()
            .col_expr(comment::Column::IsDeleted, Expr::value(true))
            .col_expr(comment::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(comment::Column::Id.eq(id))
            .filter(comment::Column::IsDeleted.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Make `id` the only pinned comment of `scope`.
    ///
    /// Clearing the previous pin and setting the new one commit together.
    /// Returns `false` (and changes nothing) when `id` is deleted or missing.
    /// A concurrent pin that commits first surfaces as [`AppError::Conflict`].
    pub async fn pin(&self, id: &str, scope: &ThreadScope) -> AppResult<bool> {
        match self.pin_in_transaction(id, scope).await {
            Ok(pinned) => Ok(pinned),
            Err(e) if is_unique_violation(&e) => Err(AppError::Conflict(format!(
                "Another comment was pinned concurrently in {} {}",
                scope.kind(),
                scope.id()
            ))),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn pin_in_transaction(&self, id: &str, scope: &ThreadScope) -> Result<bool, DbErr> {
        let txn = self.db.begin().await?;

        let clear = Comment::update_many()
            .col_expr(comment::Column::IsPinned, Expr::value(false))
            .filter(comment::Column::IsPinned.eq(true))
            .filter(comment::Column::Id.ne(id));
        in_scope(clear, scope).exec(&txn).await?;

        let set = Comment::update_many()
            .col_expr(comment::Column::IsPinned, Expr::value(true))
            .filter(comment::Column::Id.eq(id))
            .filter(comment::Column::IsDeleted.eq(false));
        let result = in_scope(set, scope).exec(&txn).await?;

        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        txn.commit().await?;
        Ok(true)
    }

    /// Pinned comments of a scope. Holds at most one row.
    pub async fn find_pinned(&self, scope: &ThreadScope) -> AppResult<Vec<comment::Model>> {
        in_scope(Comment::find(), scope)
            .filter(comment::Column::IsPinned.eq(true))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Visible root comments of a scope, pinned first, then newest first.
    pub async fn find_roots(
        &self,
        scope: &ThreadScope,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<comment::Model>> {
        in_scope(Comment::find(), scope)
            .filter(comment::Column::ParentId.is_null())
            .filter(comment::Column::IsDeleted.eq(false))
            .order_by_desc(comment::Column::IsPinned)
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Visible direct replies of the given comments, oldest first.
    pub async fn find_replies(&self, parent_ids: &[String]) -> AppResult<Vec<comment::Model>> {
        if parent_ids.is_empty() {
            return Ok(vec![]);
        }

        Comment::find()
            .filter(comment::Column::ParentId.is_in(parent_ids.iter().cloned()))
            .filter(comment::Column::IsDeleted.eq(false))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Direct replies of a comment, deleted ones included.
    pub async fn count_replies(&self, parent_id: &str) -> AppResult<u64> {
        Comment::find()
            .filter(comment::Column::ParentId.eq(parent_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every comment ever made in a scope: replies and deleted comments count.
    pub async fn count_in_scope(&self, scope: &ThreadScope) -> AppResult<u64> {
        in_scope(Comment::find(), scope)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Comment IDs in ascending order, strictly after `after`.
    pub async fn ids_after(&self, after: Option<&str>, limit: u64) -> AppResult<Vec<String>> {
        let mut query = Comment::find()
            .select_only()
            .column(comment::Column::Id)
            .order_by_asc(comment::Column::Id);

        if let Some(id) = after {
            query = query.filter(comment::Column::Id.gt(id));
        }

        query
            .limit(limit)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
