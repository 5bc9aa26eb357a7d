//! Denormalized counter columns.
//!
//! Counter columns live on several tables. This repository is the only
//! writer: callers name a target kind and a [`CounterField`] and never
//! touch any other column of the row.

use std::sync::Arc;

use crate::target::TargetKind;
use sea_orm::sea_query::{Alias, Expr, Query};
use sea_orm::{ConnectionTrait, DatabaseConnection};
use videotube_common::{AppError, AppResult};

/// A cached count kept on a target row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterField {
    Likes,
    Comments,
    Subscribers,
    Views,
}

impl CounterField {
    /// Short name used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Likes => "likes",
            Self::Comments => "comments",
            Self::Subscribers => "subscribers",
            Self::Views => "views",
        }
    }
}

impl std::fmt::Display for CounterField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the `(table, column)` holding a counter.
fn location(kind: TargetKind, field: CounterField) -> AppResult<(&'static str, &'static str)> {
    let column = match (kind, field) {
        (TargetKind::Video | TargetKind::Post | TargetKind::Comment, CounterField::Likes) => {
            "likes_count"
        }
        (TargetKind::Video | TargetKind::Post, CounterField::Comments) => "comments_count",
        (TargetKind::Video | TargetKind::Post | TargetKind::Channel, CounterField::Views) => {
            "views_count"
        }
        (TargetKind::Channel, CounterField::Subscribers) => "subscriber_count",
        _ => {
            return Err(AppError::Internal(format!(
                "{kind} has no {field} counter"
            )));
        }
    };

    Ok((kind.as_str(), column))
}

/// Counter repository for database operations.
#[derive(Clone)]
pub struct CounterRepository {
    db: Arc<DatabaseConnection>,
}

impl CounterRepository {
    /// Create a new counter repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Add `delta` to a counter in a single statement.
    ///
    /// A negative delta only applies while the counter stays non-negative.
    /// Returns the number of rows updated (0 when the target is gone or the
    /// decrement would underflow).
    pub async fn add(
        &self,
        kind: TargetKind,
        field: CounterField,
        id: &str,
        delta: i64,
    ) -> AppResult<u64> {
        let (table, column) = location(kind, field)?;

        let mut stmt = Query::update();
        stmt.table(Alias::new(table))
            .value(Alias::new(column), Expr::col(Alias::new(column)).add(delta))
            .and_where(Expr::col(Alias::new("id")).eq(id));

        if delta < 0 {
            stmt.and_where(Expr::col(Alias::new(column)).gte(-delta));
        }

        let backend = self.db.get_database_backend();
        self.db
            .execute(backend.build(&stmt))
            .await
            .map(|result| result.rows_affected())
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Overwrite a counter. Returns whether the target row exists.
    pub async fn set(
        &self,
        kind: TargetKind,
        field: CounterField,
        id: &str,
        value: i64,
    ) -> AppResult<bool> {
        let (table, column) = location(kind, field)?;

        let mut stmt = Query::update();
        stmt.table(Alias::new(table))
            .value(Alias::new(column), value)
            .and_where(Expr::col(Alias::new("id")).eq(id));

        let backend = self.db.get_database_backend();
        self.db
            .execute(backend.build(&stmt))
            .await
            .map(|result| result.rows_affected() == 1)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Read a counter. `None` when the target does not exist.
    pub async fn get(
        &self,
        kind: TargetKind,
        field: CounterField,
        id: &str,
    ) -> AppResult<Option<i64>> {
        let (table, column) = location(kind, field)?;

        let mut stmt = Query::select();
        stmt.column(Alias::new(column))
            .from(Alias::new(table))
            .and_where(Expr::col(Alias::new("id")).eq(id));

        let backend = self.db.get_database_backend();
        let row = self
            .db
            .query_one(backend.build(&stmt))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(|row| row.try_get::<i64>("", column))
            .transpose()
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[test]
    fn test_location_covers_engagement_counters() {
        assert_eq!(
            location(TargetKind::Video, CounterField::Likes).unwrap(),
            ("video", "likes_count")
        );
        assert_eq!(
            location(TargetKind::Post, CounterField::Comments).unwrap(),
            ("post", "comments_count")
        );
        assert_eq!(
            location(TargetKind::Comment, CounterField::Likes).unwrap(),
            ("comment", "likes_count")
        );
        assert_eq!(
            location(TargetKind::Channel, CounterField::Subscribers).unwrap(),
            ("channel", "subscriber_count")
        );
    }

    #[test]
    fn test_location_rejects_unknown_pairs() {
        assert!(location(TargetKind::Channel, CounterField::Likes).is_err());
        assert!(location(TargetKind::Comment, CounterField::Comments).is_err());
        assert!(location(TargetKind::Video, CounterField::Subscribers).is_err());
    }

    #[tokio::test]
    async fn test_add_reports_rows_affected() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = CounterRepository::new(db);
        let updated = repo
            .add(TargetKind::Video, CounterField::Likes, "v1", 1)
            .await
            .unwrap();

        assert_eq!(updated, 1);
    }

    #[tokio::test]
    async fn test_invalid_pair_never_reaches_database() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = CounterRepository::new(db);
        let result = repo
            .add(TargetKind::Channel, CounterField::Likes, "ch1", 1)
            .await;

        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
