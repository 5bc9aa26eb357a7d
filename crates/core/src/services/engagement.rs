//! Engagement service: likes and subscriptions.
//!
//! Toggles never check-then-insert. The unlike path deletes and looks at
//! the affected row count; the like path inserts with `ON CONFLICT DO
//! NOTHING` against the unique `(user, target)` index. A caller that loses a
//! race on either path sees the state it asked for and leaves the counter
//! alone, so the counter moves exactly once per relation row created or
//! removed.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{DatabaseConnection, Set};
use tracing::debug;
use videotube_common::{AppError, AppResult, IdGenerator};
use videotube_db::entities::{like, subscription};
use videotube_db::repositories::{CounterField, LikeRepository, SubscriptionRepository};
use videotube_db::{TargetKind, TargetRef};

use crate::services::counter_sync::CounterSync;
use crate::services::feed::FeedService;
use crate::services::registry::TargetRegistry;
use crate::views::{
    FeedItem, LikeToggle, LikedCommentView, LikedPostView, LikedVideoView, Page, PageRequest,
    SubscribedChannelView, SubscriberView, SubscriptionToggle,
};

/// Engagement service for likes and subscriptions.
#[derive(Clone)]
pub struct EngagementService {
    registry: TargetRegistry,
    likes: LikeRepository,
    subscriptions: SubscriptionRepository,
    counters: CounterSync,
    feed: FeedService,
    id_gen: IdGenerator,
}

impl EngagementService {
    /// Create a new engagement service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        registry: TargetRegistry,
        counters: CounterSync,
        feed: FeedService,
    ) -> Self {
        Self {
            registry,
            likes: LikeRepository::new(Arc::clone(&db)),
            subscriptions: SubscriptionRepository::new(db),
            counters,
            feed,
            id_gen: IdGenerator::new(),
        }
    }

    // === Likes ===

    /// Flip the like `user_id` holds on `target`.
    pub async fn toggle_like(&self, user_id: &str, target: &TargetRef) -> AppResult<LikeToggle> {
        IdGenerator::validate_named("user id", user_id)?;
        target.validate()?;
        if !target.kind().is_likeable() {
            return Err(AppError::Validation(format!(
                "A {} cannot be liked",
                target.kind()
            )));
        }

        self.registry.require_eligible(target).await?;

        if self
            .likes
            .find_by_user_and_target(user_id, target)
            .await?
            .is_some()
        {
            if self.likes.delete_by_user_and_target(user_id, target).await? {
                self.counters
                    .decrement(target.kind(), CounterField::Likes, target.id())
                    .await;
            } else {
                debug!(user_id = %user_id, target_id = %target.id(), "Like already removed concurrently");
            }
            return Ok(LikeToggle { liked: false });
        }

        let model = like::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            target_type: Set(target.kind()),
            target_id: Set(target.id().to_string()),
            created_at: Set(Utc::now().into()),
        };

        if self.likes.insert_if_absent(model).await? {
            self.counters
                .increment(target.kind(), CounterField::Likes, target.id())
                .await;
        } else {
            debug!(user_id = %user_id, target_id = %target.id(), "Like already created concurrently");
        }

        Ok(LikeToggle { liked: true })
    }

    /// Whether `user_id` currently likes `target`.
    pub async fn is_liked(&self, user_id: &str, target: &TargetRef) -> AppResult<bool> {
        IdGenerator::validate_named("user id", user_id)?;
        target.validate()?;

        Ok(self
            .likes
            .find_by_user_and_target(user_id, target)
            .await?
            .is_some())
    }

    // === Subscriptions ===

    /// Flip the subscription `user_id` holds on `channel_id`.
    ///
    /// Subscribing to a channel you own is always a conflict.
    pub async fn toggle_subscription(
        &self,
        user_id: &str,
        channel_id: &str,
    ) -> AppResult<SubscriptionToggle> {
        IdGenerator::validate_named("user id", user_id)?;
        IdGenerator::validate_named("channel id", channel_id)?;

        let Some(owner_id) = self.registry.channel_owner(channel_id).await? else {
            return Err(AppError::NotFound(format!("channel {channel_id} not found")));
        };

        if owner_id == user_id {
            return Err(AppError::Conflict(
                "Cannot subscribe to your own channel".to_string(),
            ));
        }

        if self
            .subscriptions
            .find_by_subscriber_and_channel(user_id, channel_id)
            .await?
            .is_some()
        {
            if self
                .subscriptions
                .delete_by_subscriber_and_channel(user_id, channel_id)
                .await?
            {
                self.counters
                    .decrement(TargetKind::Channel, CounterField::Subscribers, channel_id)
                    .await;
            }
            return Ok(SubscriptionToggle { subscribed: false });
        }

        let model = subscription::ActiveModel {
            id: Set(self.id_gen.generate()),
            subscriber_id: Set(user_id.to_string()),
            channel_id: Set(channel_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        if self.subscriptions.insert_if_absent(model).await? {
            self.counters
                .increment(TargetKind::Channel, CounterField::Subscribers, channel_id)
                .await;
        }

        Ok(SubscriptionToggle { subscribed: true })
    }

    /// Whether `user_id` subscribes to `channel_id`.
    pub async fn is_subscribed(&self, user_id: &str, channel_id: &str) -> AppResult<bool> {
        IdGenerator::validate_named("user id", user_id)?;
        IdGenerator::validate_named("channel id", channel_id)?;

        Ok(self
            .subscriptions
            .find_by_subscriber_and_channel(user_id, channel_id)
            .await?
            .is_some())
    }

    // === Reads ===

    pub async fn list_liked_videos(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> AppResult<Page<FeedItem<LikedVideoView>>> {
        self.feed.liked_videos(user_id, page).await
    }

    pub async fn list_liked_posts(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> AppResult<Page<FeedItem<LikedPostView>>> {
        self.feed.liked_posts(user_id, page).await
    }

    pub async fn list_liked_comments(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> AppResult<Page<FeedItem<LikedCommentView>>> {
        self.feed.liked_comments(user_id, page).await
    }

    pub async fn list_subscribers(
        &self,
        channel_id: &str,
        page: PageRequest,
    ) -> AppResult<Page<FeedItem<SubscriberView>>> {
        self.feed.subscribers(channel_id, page).await
    }

    pub async fn list_subscriptions(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> AppResult<Page<FeedItem<SubscribedChannelView>>> {
        self.feed.subscriptions(user_id, page).await
    }
}
