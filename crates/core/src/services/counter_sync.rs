//! Counter synchronisation.
//!
//! Relation rows (likes, subscriptions, comments) are the source of truth;
//! the `*_count` columns on targets are caches. Adjustments happen after the
//! relation write and outside its transaction, so a failure here degrades to
//! drift instead of failing the caller. [`CounterSync::reconcile`] repairs
//! drift by recounting.

use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use videotube_common::config::CounterConfig;
use videotube_common::{AppError, AppResult};
use videotube_db::repositories::{
    ChannelRepository, CommentRepository, CounterField, CounterRepository, LikeRepository,
    PostRepository, SubscriptionRepository, VideoRepository,
};
use videotube_db::{TargetKind, TargetRef, ThreadScope};

/// Counters backed by a relation set, per target kind.
///
/// `views_count` is driven by watch activity only and has nothing to be
/// recounted from.
#[must_use]
pub const fn reconcilable_fields(kind: TargetKind) -> &'static [CounterField] {
    match kind {
        TargetKind::Video | TargetKind::Post => &[CounterField::Likes, CounterField::Comments],
        TargetKind::Comment => &[CounterField::Likes],
        TargetKind::Channel => &[CounterField::Subscribers],
    }
}

/// A counter overwritten by reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterCorrection {
    #[serde(serialize_with = "serialize_field")]
    pub field: CounterField,
    pub cached: i64,
    pub actual: i64,
}

fn serialize_field<S: serde::Serializer>(field: &CounterField, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(field.as_str())
}

/// Outcome of reconciling one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub target: TargetRef,
    pub corrections: Vec<CounterCorrection>,
}

impl ReconcileReport {
    /// Whether every counter already matched.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.corrections.is_empty()
    }
}

/// Counter sync service.
#[derive(Clone)]
pub struct CounterSync {
    counters: CounterRepository,
    likes: LikeRepository,
    subscriptions: SubscriptionRepository,
    comments: CommentRepository,
    videos: VideoRepository,
    posts: PostRepository,
    channels: ChannelRepository,
    retry_delay: Duration,
}

impl CounterSync {
    /// Create a new counter sync service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, config: &CounterConfig) -> Self {
        Self {
            counters: CounterRepository::new(Arc::clone(&db)),
            likes: LikeRepository::new(Arc::clone(&db)),
            subscriptions: SubscriptionRepository::new(Arc::clone(&db)),
            comments: CommentRepository::new(Arc::clone(&db)),
            videos: VideoRepository::new(Arc::clone(&db)),
            posts: PostRepository::new(Arc::clone(&db)),
            channels: ChannelRepository::new(db),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// Apply `delta` to a counter.
    ///
    /// Never fails: one retry after the configured delay, then the drift is
    /// logged and left for reconciliation.
    pub async fn adjust(&self, kind: TargetKind, field: CounterField, id: &str, delta: i64) {
        let Err(first) = self.try_adjust(kind, field, id, delta).await else {
            return;
        };

        warn!(
            error = %first,
            target_type = %kind,
            target_id = %id,
            counter = %field,
            delta,
            "Counter adjustment failed, retrying"
        );
        tokio::time::sleep(self.retry_delay).await;

        if let Err(e) = self.try_adjust(kind, field, id, delta).await {
            error!(
                error = %e,
                target_type = %kind,
                target_id = %id,
                counter = %field,
                delta,
                "Counter drift: adjustment failed after retry"
            );
        }
    }

    /// Increment a counter by one.
    pub async fn increment(&self, kind: TargetKind, field: CounterField, id: &str) {
        self.adjust(kind, field, id, 1).await;
    }

    /// Decrement a counter by one.
    pub async fn decrement(&self, kind: TargetKind, field: CounterField, id: &str) {
        self.adjust(kind, field, id, -1).await;
    }

    async fn try_adjust(
        &self,
        kind: TargetKind,
        field: CounterField,
        id: &str,
        delta: i64,
    ) -> AppResult<()> {
        let updated = self.counters.add(kind, field, id, delta).await?;

        if updated == 0 {
            // Target gone, or a decrement that would go below zero
            warn!(
                target_type = %kind,
                target_id = %id,
                counter = %field,
                delta,
                "Counter drift: no row updated"
            );
        }

        Ok(())
    }

    /// Read a cached counter.
    pub async fn get(&self, kind: TargetKind, field: CounterField, id: &str) -> AppResult<i64> {
        self.counters
            .get(kind, field, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{kind} {id} not found")))
    }

    /// Recount every relation-backed counter of `target` and overwrite the
    /// cached values that differ. Safe to repeat.
    pub async fn reconcile(&self, target: &TargetRef) -> AppResult<ReconcileReport> {
        target.validate()?;

        let mut corrections = Vec::new();

        for &field in reconcilable_fields(target.kind()) {
            let cached = self.get(target.kind(), field, target.id()).await?;
            let actual = self.count_relations(target, field).await?;

            if cached != actual {
                self.counters
                    .set(target.kind(), field, target.id(), actual)
                    .await?;
                corrections.push(CounterCorrection {
                    field,
                    cached,
                    actual,
                });
            }
        }

        if !corrections.is_empty() {
            info!(
                target_type = %target.kind(),
                target_id = %target.id(),
                corrected = corrections.len(),
                "Reconciled drifted counters"
            );
        }

        Ok(ReconcileReport {
            target: target.clone(),
            corrections,
        })
    }

    /// Reconcile every target of `kind`, `batch_size` ids at a time.
    ///
    /// Returns the number of counters corrected. A target that disappears
    /// mid-sweep is skipped.
    pub async fn reconcile_all(&self, kind: TargetKind, batch_size: u64) -> AppResult<u64> {
        let batch_size = batch_size.max(1);
        let mut after: Option<String> = None;
        let mut corrected = 0u64;

        loop {
            let ids = self.ids_after(kind, after.as_deref(), batch_size).await?;
            let Some(last) = ids.last().cloned() else {
                break;
            };

            for id in ids {
                match self.reconcile(&TargetRef::new(kind, id)).await {
                    Ok(report) => corrected += report.corrections.len() as u64,
                    Err(AppError::NotFound(msg)) => debug!(%msg, "Target vanished during sweep"),
                    Err(e) => return Err(e),
                }
            }

            after = Some(last);
        }

        Ok(corrected)
    }

    async fn ids_after(
        &self,
        kind: TargetKind,
        after: Option<&str>,
        limit: u64,
    ) -> AppResult<Vec<String>> {
        match kind {
            TargetKind::Video => self.videos.ids_after(after, limit).await,
            TargetKind::Post => self.posts.ids_after(after, limit).await,
            TargetKind::Comment => self.comments.ids_after(after, limit).await,
            TargetKind::Channel => self.channels.ids_after(after, limit).await,
        }
    }

    async fn count_relations(&self, target: &TargetRef, field: CounterField) -> AppResult<i64> {
        let count = match (target, field) {
            (_, CounterField::Likes) => self.likes.count_by_target(target).await?,
            (TargetRef::Video(id), CounterField::Comments) => {
                self.comments
                    .count_in_scope(&ThreadScope::Video(id.clone()))
                    .await?
            }
            (TargetRef::Post(id), CounterField::Comments) => {
                self.comments
                    .count_in_scope(&ThreadScope::Post(id.clone()))
                    .await?
            }
            (TargetRef::Channel(id), CounterField::Subscribers) => {
                self.subscriptions.count_by_channel(id).await?
            }
            _ => {
                return Err(AppError::Internal(format!(
                    "{} has no {field} relation set",
                    target.kind()
                )));
            }
        };

        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn service(db: MockDatabase) -> CounterSync {
        CounterSync::new(
            Arc::new(db.into_connection()),
            &CounterConfig { retry_delay_ms: 1 },
        )
    }

    #[test]
    fn test_views_are_never_reconciled() {
        for kind in [
            TargetKind::Video,
            TargetKind::Post,
            TargetKind::Comment,
            TargetKind::Channel,
        ] {
            assert!(!reconcilable_fields(kind).contains(&CounterField::Views));
        }
    }

    #[tokio::test]
    async fn test_adjust_swallows_repeated_failure() {
        // No exec results: both attempts fail inside the mock
        let sync = service(MockDatabase::new(DatabaseBackend::Postgres));

        sync.adjust(TargetKind::Video, CounterField::Likes, "v1", 1)
            .await;
    }

    #[tokio::test]
    async fn test_adjust_retries_once() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([sea_orm::DbErr::Custom("connection reset".into())])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }]);
        let conn = Arc::new(db.into_connection());
        let sync = CounterSync::new(Arc::clone(&conn), &CounterConfig { retry_delay_ms: 1 });

        sync.adjust(TargetKind::Channel, CounterField::Subscribers, "ch1", -1)
            .await;
        drop(sync);

        let log = Arc::try_unwrap(conn)
            .ok()
            .map(|conn| conn.into_transaction_log())
            .unwrap();
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn test_reconcile_rejects_malformed_id() {
        let sync = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = sync.reconcile(&TargetRef::Video("bad".into())).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
