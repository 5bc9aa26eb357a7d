//! Subscription repository.

use std::sync::Arc;

use crate::entities::{Subscription, subscription};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use videotube_common::{AppError, AppResult};

/// Subscription repository for database operations.
#[derive(Clone)]
pub struct SubscriptionRepository {
    db: Arc<DatabaseConnection>,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a subscription by subscriber and channel.
    pub async fn find_by_subscriber_and_channel(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> AppResult<Option<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .filter(subscription::Column::ChannelId.eq(channel_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a subscription unless it already exists.
    ///
    /// Returns `true` only when this call created the row.
    pub async fn insert_if_absent(&self, model: subscription::ActiveModel) -> AppResult<bool> {
        let inserted = Subscription::insert(model)
            .on_conflict(
                OnConflict::columns([
                    subscription::Column::SubscriberId,
                    subscription::Column::ChannelId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(inserted == 1)
    }

    /// Delete a subscription.
    ///
    /// Returns `true` only when this call removed the row.
    pub async fn delete_by_subscriber_and_channel(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> AppResult<bool> {
        let result = Subscription::delete_many()
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .filter(subscription::Column::ChannelId.eq(channel_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Count subscribers of a channel.
    pub async fn count_by_channel(&self, channel_id: &str) -> AppResult<u64> {
        Subscription::find()
            .filter(subscription::Column::ChannelId.eq(channel_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Subscriptions to a channel, newest first.
    pub async fn find_by_channel(
        &self,
        channel_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::ChannelId.eq(channel_id))
            .order_by_desc(subscription::Column::CreatedAt)
            .order_by_desc(subscription::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Subscriptions held by a user, newest first.
    pub async fn find_by_subscriber(
        &self,
        subscriber_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .order_by_desc(subscription::Column::CreatedAt)
            .order_by_desc(subscription::Column::Id)
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
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_subscription(id: &str, subscriber_id: &str) -> subscription::Model {
        subscription::Model {
            id: id.to_string(),
            subscriber_id: subscriber_id.to_string(),
            channel_id: "ch1".to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_channel() {
        let newer = create_test_subscription("s2", "u2");
        let older = create_test_subscription("s1", "u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[newer, older]])
                .into_connection(),
        );

        let repo = SubscriptionRepository::new(db);
        let result = repo.find_by_channel("ch1", 0, 10).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].subscriber_id, "u2");
    }

    #[tokio::test]
    async fn test_find_by_subscriber_and_channel_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<subscription::Model>::new()])
                .into_connection(),
        );

        let repo = SubscriptionRepository::new(db);
        let result = repo
            .find_by_subscriber_and_channel("u1", "ch1")
            .await
            .unwrap();

        assert!(result.is_none());
    }
}
