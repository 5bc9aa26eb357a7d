//! Activity log service.
//!
//! Append-only record of what a user did: watched a video, liked something,
//! commented, published a post. Entries are never updated or deleted, and
//! the records they point at may disappear later.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{DatabaseConnection, Set};
use tracing::debug;
use videotube_common::{AppError, AppResult, IdGenerator};
use videotube_db::entities::activity::{self, ActivityKind};
use videotube_db::repositories::{
    ActivityRepository, CommentRepository, CounterField, LikeRepository, PostRepository,
    VideoRepository,
};
use videotube_db::{TargetKind, TargetRef, ThreadScope};

use crate::services::counter_sync::CounterSync;
use crate::services::feed::FeedService;
use crate::services::registry::TargetRegistry;
use crate::views::{ActivityView, FeedItem, Page, PageRequest};

/// Records an activity points at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityRefs {
    pub video_id: Option<String>,
    pub post_id: Option<String>,
    pub comment_id: Option<String>,
    pub like_id: Option<String>,
}

impl ActivityRefs {
    #[must_use]
    pub fn video(id: impl Into<String>) -> Self {
        Self {
            video_id: Some(id.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn post(id: impl Into<String>) -> Self {
        Self {
            post_id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Whether no reference is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.video_id.is_none()
            && self.post_id.is_none()
            && self.comment_id.is_none()
            && self.like_id.is_none()
    }

    fn validate(&self) -> AppResult<()> {
        if self.is_empty() {
            return Err(AppError::Validation(
                "An activity must reference at least one record".to_string(),
            ));
        }

        let refs = [
            ("video id", &self.video_id),
            ("post id", &self.post_id),
            ("comment id", &self.comment_id),
            ("like id", &self.like_id),
        ];
        for (field, id) in refs {
            if let Some(id) = id {
                IdGenerator::validate_named(field, id)?;
            }
        }

        Ok(())
    }
}

/// Activity log service.
#[derive(Clone)]
pub struct ActivityLogService {
    registry: TargetRegistry,
    activities: ActivityRepository,
    videos: VideoRepository,
    posts: PostRepository,
    comments: CommentRepository,
    likes: LikeRepository,
    counters: CounterSync,
    feed: FeedService,
    id_gen: IdGenerator,
}

impl ActivityLogService {
    /// Create a new activity log service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        registry: TargetRegistry,
        counters: CounterSync,
        feed: FeedService,
    ) -> Self {
        Self {
            registry,
            activities: ActivityRepository::new(Arc::clone(&db)),
            videos: VideoRepository::new(Arc::clone(&db)),
            posts: PostRepository::new(Arc::clone(&db)),
            comments: CommentRepository::new(Arc::clone(&db)),
            likes: LikeRepository::new(db),
            counters,
            feed,
            id_gen: IdGenerator::new(),
        }
    }

    /// Append an activity without checking what it points at.
    pub async fn append(
        &self,
        user_id: &str,
        kind: ActivityKind,
        refs: ActivityRefs,
    ) -> AppResult<activity::Model> {
        IdGenerator::validate_named("user id", user_id)?;
        refs.validate()?;

        let model = activity::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            kind: Set(kind),
            video_id: Set(refs.video_id),
            post_id: Set(refs.post_id),
            comment_id: Set(refs.comment_id),
            like_id: Set(refs.like_id),
            created_at: Set(Utc::now().into()),
        };

        let created = self.activities.create(model).await?;
        debug!(user_id = %user_id, activity_id = %created.id, kind = ?kind, "Activity recorded");

        Ok(created)
    }

    /// Record a watch and count the view.
    pub async fn log_watch(&self, user_id: &str, video_id: &str) -> AppResult<activity::Model> {
        IdGenerator::validate_named("user id", user_id)?;
        IdGenerator::validate_named("video id", video_id)?;

        let video = self
            .videos
            .find_by_id(video_id)
            .await?
            .filter(|v| v.is_published)
            .ok_or_else(|| AppError::NotFound(format!("video {video_id} not found")))?;

        let created = self
            .append(user_id, ActivityKind::Watch, ActivityRefs::video(&video.id))
            .await?;

        self.counters
            .increment(TargetKind::Video, CounterField::Views, &video.id)
            .await;

        Ok(created)
    }

    /// Record a like on `target`, attaching the like relation when one
    /// currently exists.
    pub async fn log_like(&self, user_id: &str, target: &TargetRef) -> AppResult<activity::Model> {
        IdGenerator::validate_named("user id", user_id)?;
        target.validate()?;

        if !target.kind().is_likeable() {
            return Err(AppError::Validation(format!(
                "A {} cannot be liked",
                target.kind()
            )));
        }
        if !self.registry.exists(target).await? {
            return Err(AppError::NotFound(format!(
                "{} {} not found",
                target.kind(),
                target.id()
            )));
        }

        let like_id = self
            .likes
            .find_by_user_and_target(user_id, target)
            .await?
            .map(|like| like.id);

        let mut refs = ActivityRefs {
            like_id,
            ..ActivityRefs::default()
        };
        match target {
            TargetRef::Video(id) => refs.video_id = Some(id.clone()),
            TargetRef::Post(id) => refs.post_id = Some(id.clone()),
            TargetRef::Comment(id) => refs.comment_id = Some(id.clone()),
            TargetRef::Channel(_) => {}
        }

        self.append(user_id, ActivityKind::Like, refs).await
    }

    /// Record a comment together with the thread it belongs to.
    pub async fn log_comment(
        &self,
        user_id: &str,
        comment_id: &str,
    ) -> AppResult<activity::Model> {
        IdGenerator::validate_named("user id", user_id)?;
        IdGenerator::validate_named("comment id", comment_id)?;

        let comment = self
            .comments
            .find_by_id(comment_id)
            .await?
            .filter(|c| !c.is_deleted)
            .ok_or_else(|| AppError::NotFound(format!("comment {comment_id} not found")))?;

        let mut refs = match comment.scope()? {
            ThreadScope::Video(id) => ActivityRefs::video(id),
            ThreadScope::Post(id) => ActivityRefs::post(id),
        };
        refs.comment_id = Some(comment.id);

        self.append(user_id, ActivityKind::Comment, refs).await
    }

    /// Record a published post.
    pub async fn log_post(&self, user_id: &str, post_id: &str) -> AppResult<activity::Model> {
        IdGenerator::validate_named("user id", user_id)?;
        IdGenerator::validate_named("post id", post_id)?;

        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {post_id} not found")))?;

        self.append(user_id, ActivityKind::Post, ActivityRefs::post(post.id))
            .await
    }

    /// A user's activity feed.
    pub async fn activity_for(
        &self,
        user_id: &str,
        kind: Option<ActivityKind>,
        page: PageRequest,
    ) -> AppResult<Page<FeedItem<ActivityView>>> {
        self.feed.activity_for(user_id, kind, page).await
    }
}
