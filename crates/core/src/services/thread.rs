//! Thread service: comment lifecycle.
//!
//! A comment is `Active` (pinned or not) until it is deleted, and deletion
//! is terminal. Deleted comments stay in storage so reply trees keep their
//! shape; only the listing hides them.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{DatabaseConnection, Set};
use serde::Deserialize;
use tracing::{debug, info};
use validator::Validate;
use videotube_common::{AppError, AppResult, IdGenerator};
use videotube_db::entities::comment;
use videotube_db::repositories::{CommentRepository, CounterField};
use videotube_db::ThreadScope;

use crate::services::counter_sync::CounterSync;
use crate::services::feed::FeedService;
use crate::services::registry::TargetRegistry;
use crate::views::{CommentNode, CommentView, FeedItem, Page, PageRequest};

/// Maximum comment length, in characters.
pub const MAX_COMMENT_LENGTH: u64 = 10_000;

/// Comment body as submitted.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CommentInput {
    #[validate(length(min = 1, max = MAX_COMMENT_LENGTH, message = "Content must be 1 to 10000 characters"))]
    pub content: String,
}

impl CommentInput {
    /// Trim and validate raw content.
    pub fn parse(raw: &str) -> AppResult<String> {
        let input = Self {
            content: raw.trim().to_string(),
        };
        input.validate()?;
        Ok(input.content)
    }
}

/// Thread service for comment operations.
#[derive(Clone)]
pub struct ThreadService {
    registry: TargetRegistry,
    comments: CommentRepository,
    counters: CounterSync,
    feed: FeedService,
    id_gen: IdGenerator,
}

impl ThreadService {
    /// Create a new thread service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        registry: TargetRegistry,
        counters: CounterSync,
        feed: FeedService,
    ) -> Self {
        Self {
            registry,
            comments: CommentRepository::new(db),
            counters,
            feed,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a root comment to a video or post.
    pub async fn add_comment(
        &self,
        author_id: &str,
        scope: &ThreadScope,
        content: &str,
    ) -> AppResult<CommentView> {
        IdGenerator::validate_named("user id", author_id)?;
        scope.validate()?;
        let content = CommentInput::parse(content)?;

        self.registry.require_eligible(&scope.as_target()).await?;

        let created = self.insert(author_id, scope, None, content).await?;
        Ok(created.into())
    }

    /// Reply to an existing comment, inheriting its scope.
    pub async fn reply(
        &self,
        author_id: &str,
        parent_id: &str,
        content: &str,
    ) -> AppResult<CommentView> {
        IdGenerator::validate_named("user id", author_id)?;
        IdGenerator::validate_named("comment id", parent_id)?;
        let content = CommentInput::parse(content)?;

        let parent = self.find(parent_id).await?;
        if parent.is_deleted {
            return Err(AppError::Conflict(
                "Cannot reply to a deleted comment".to_string(),
            ));
        }

        let scope = parent.scope()?;
        let created = self
            .insert(author_id, &scope, Some(parent.id), content)
            .await?;
        Ok(created.into())
    }

    async fn insert(
        &self,
        author_id: &str,
        scope: &ThreadScope,
        parent_id: Option<String>,
        content: String,
    ) -> AppResult<comment::Model> {
        let (video_id, post_id) = scope.columns();
        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            content: Set(content),
            author_id: Set(author_id.to_string()),
            video_id: Set(video_id),
            post_id: Set(post_id),
            parent_id: Set(parent_id),
            is_deleted: Set(false),
            is_pinned: Set(false),
            likes_count: Set(0),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.comments.create(model).await?;

        self.counters
            .increment(scope.kind(), CounterField::Comments, scope.id())
            .await;

        Ok(created)
    }

    /// Replace the content of a comment. Only its author may edit it.
    pub async fn edit(
        &self,
        user_id: &str,
        comment_id: &str,
        content: &str,
    ) -> AppResult<CommentView> {
        IdGenerator::validate_named("user id", user_id)?;
        IdGenerator::validate_named("comment id", comment_id)?;
        let content = CommentInput::parse(content)?;

        let comment = self.find(comment_id).await?;
        if comment.is_deleted {
            return Err(AppError::NotFound(format!("comment {comment_id} not found")));
        }
        if comment.author_id != user_id {
            return Err(AppError::Forbidden(
                "You cannot edit this comment".to_string(),
            ));
        }

        let updated = self.comments.update_content(comment, content).await?;
        Ok(updated.into())
    }

    /// Soft-delete a comment. Allowed for its author and for the owner of
    /// the channel the thread belongs to.
    ///
    /// Replies and counters are left untouched. Deleting twice is a no-op.
    pub async fn delete(&self, user_id: &str, comment_id: &str) -> AppResult<()> {
        IdGenerator::validate_named("user id", user_id)?;
        IdGenerator::validate_named("comment id", comment_id)?;

        let comment = self.find(comment_id).await?;

        let is_author = comment.author_id == user_id;
        let is_channel_owner = !is_author
            && self
                .registry
                .is_owner_of(user_id, &comment.scope()?.as_target())
                .await?;

        if !is_author && !is_channel_owner {
            return Err(AppError::Forbidden(
                "Unauthorized to delete this comment".to_string(),
            ));
        }

        if !self.comments.soft_delete(comment_id).await? {
            debug!(comment_id = %comment_id, "Comment already deleted");
        }

        Ok(())
    }

    /// Pin a comment, unpinning whichever comment was pinned in the same
    /// thread. Only the owner of the thread's channel may pin.
    pub async fn pin(&self, user_id: &str, comment_id: &str) -> AppResult<CommentView> {
        IdGenerator::validate_named("user id", user_id)?;
        IdGenerator::validate_named("comment id", comment_id)?;

        let comment = self.find(comment_id).await?;
        if comment.is_deleted {
            return Err(AppError::NotFound(format!("comment {comment_id} not found")));
        }

        let scope = comment.scope()?;
        if !self
            .registry
            .is_owner_of(user_id, &scope.as_target())
            .await?
        {
            return Err(AppError::Forbidden(
                "Only the channel owner can pin a comment".to_string(),
            ));
        }

        let pinned = match self.comments.pin(comment_id, &scope).await {
            Err(AppError::Conflict(msg)) => {
                debug!(comment_id = %comment_id, %msg, "Concurrent pin, retrying");
                self.comments.pin(comment_id, &scope).await?
            }
            other => other?,
        };

        if !pinned {
            // Deleted between the read and the pin
            return Err(AppError::NotFound(format!("comment {comment_id} not found")));
        }

        info!(comment_id = %comment_id, scope_id = %scope.id(), "Comment pinned");

        self.get(comment_id).await
    }

    /// Fetch a single comment.
    pub async fn get(&self, comment_id: &str) -> AppResult<CommentView> {
        IdGenerator::validate_named("comment id", comment_id)?;
        Ok(self.find(comment_id).await?.into())
    }

    /// Rendered comment tree of a video or post.
    pub async fn list(
        &self,
        scope: &ThreadScope,
        page: PageRequest,
    ) -> AppResult<Page<FeedItem<CommentNode>>> {
        self.feed.comment_tree(scope, page).await
    }

    async fn find(&self, comment_id: &str) -> AppResult<comment::Model> {
        self.comments
            .find_by_id(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("comment {comment_id} not found")))
    }
}
