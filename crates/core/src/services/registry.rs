//! Target registry.
//!
//! Every kind of record that can be engaged with (video, post, comment,
//! channel) answers the same three questions: does it exist, does it accept
//! engagement right now, and which channel owns it. The engagement and
//! thread services only ever ask through this registry, so they never see
//! content-specific rules.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use videotube_common::{AppError, AppResult};
use videotube_db::repositories::{
    ChannelRepository, CommentRepository, PostRepository, VideoRepository,
};
use videotube_db::{TargetKind, TargetRef, ThreadScope};

/// Capabilities one target kind exposes to the engagement layer.
#[async_trait]
pub trait EngagementTarget: Send + Sync {
    /// Whether a record with this id exists.
    async fn exists(&self, id: &str) -> AppResult<bool>;

    /// Whether the record currently accepts likes and comments.
    ///
    /// A missing record is never eligible.
    async fn is_eligible_for_engagement(&self, id: &str) -> AppResult<bool>;

    /// The channel that owns the record, if it resolves.
    async fn owning_channel(&self, id: &str) -> AppResult<Option<String>>;
}

/// Resolves the user owning a channel.
#[async_trait]
pub trait ChannelOwnership: Send + Sync {
    async fn channel_owner(&self, channel_id: &str) -> AppResult<Option<String>>;
}

/// Shared engagement target implementation.
pub type EngagementTargetService = Arc<dyn EngagementTarget>;

/// Shared channel ownership resolver.
pub type ChannelOwnershipService = Arc<dyn ChannelOwnership>;

/// One [`EngagementTarget`] per [`TargetKind`] plus the ownership resolver.
#[derive(Clone)]
pub struct TargetRegistry {
    videos: EngagementTargetService,
    posts: EngagementTargetService,
    comments: EngagementTargetService,
    channels: EngagementTargetService,
    ownership: ChannelOwnershipService,
}

impl TargetRegistry {
    /// Create a registry from arbitrary implementations.
    #[must_use]
    pub fn new(
        videos: EngagementTargetService,
        posts: EngagementTargetService,
        comments: EngagementTargetService,
        channels: EngagementTargetService,
        ownership: ChannelOwnershipService,
    ) -> Self {
        Self {
            videos,
            posts,
            comments,
            channels,
            ownership,
        }
    }

    /// Create a registry backed by the database.
    #[must_use]
    pub fn from_db(db: Arc<DatabaseConnection>) -> Self {
        let videos = VideoRepository::new(Arc::clone(&db));
        let posts = PostRepository::new(Arc::clone(&db));
        let channels = Arc::new(DbChannelTarget {
            channels: ChannelRepository::new(Arc::clone(&db)),
        });

        Self {
            videos: Arc::new(DbVideoTarget {
                videos: videos.clone(),
            }),
            posts: Arc::new(DbPostTarget {
                posts: posts.clone(),
            }),
            comments: Arc::new(DbCommentTarget {
                comments: CommentRepository::new(db),
                videos,
                posts,
            }),
            channels: channels.clone(),
            ownership: channels,
        }
    }

    /// The implementation registered for `kind`.
    #[must_use]
    pub fn target(&self, kind: TargetKind) -> &dyn EngagementTarget {
        match kind {
            TargetKind::Video => self.videos.as_ref(),
            TargetKind::Post => self.posts.as_ref(),
            TargetKind::Comment => self.comments.as_ref(),
            TargetKind::Channel => self.channels.as_ref(),
        }
    }

    pub async fn exists(&self, target: &TargetRef) -> AppResult<bool> {
        self.target(target.kind()).exists(target.id()).await
    }

    pub async fn is_eligible(&self, target: &TargetRef) -> AppResult<bool> {
        self.target(target.kind())
            .is_eligible_for_engagement(target.id())
            .await
    }

    pub async fn owning_channel(&self, target: &TargetRef) -> AppResult<Option<String>> {
        self.target(target.kind()).owning_channel(target.id()).await
    }

    pub async fn channel_owner(&self, channel_id: &str) -> AppResult<Option<String>> {
        self.ownership.channel_owner(channel_id).await
    }

    /// Fail with `NotFound` unless the target exists and accepts engagement.
    pub async fn require_eligible(&self, target: &TargetRef) -> AppResult<()> {
        if self.is_eligible(target).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!(
                "{} {} not found or not available",
                target.kind(),
                target.id()
            )))
        }
    }

    /// Whether `user_id` owns the channel that owns `target`.
    pub async fn is_owner_of(&self, user_id: &str, target: &TargetRef) -> AppResult<bool> {
        let Some(channel_id) = self.owning_channel(target).await? else {
            return Ok(false);
        };

        Ok(self.channel_owner(&channel_id).await?.as_deref() == Some(user_id))
    }
}

// === Database-backed implementations ===

struct DbVideoTarget {
    videos: VideoRepository,
}

#[async_trait]
impl EngagementTarget for DbVideoTarget {
    async fn exists(&self, id: &str) -> AppResult<bool> {
        Ok(self.videos.find_by_id(id).await?.is_some())
    }

    async fn is_eligible_for_engagement(&self, id: &str) -> AppResult<bool> {
        Ok(self
            .videos
            .find_by_id(id)
            .await?
            .is_some_and(|video| video.is_engageable()))
    }

    async fn owning_channel(&self, id: &str) -> AppResult<Option<String>> {
        Ok(self.videos.find_by_id(id).await?.map(|video| video.channel_id))
    }
}

struct DbPostTarget {
    posts: PostRepository,
}

#[async_trait]
impl EngagementTarget for DbPostTarget {
    async fn exists(&self, id: &str) -> AppResult<bool> {
        Ok(self.posts.find_by_id(id).await?.is_some())
    }

    async fn is_eligible_for_engagement(&self, id: &str) -> AppResult<bool> {
        Ok(self
            .posts
            .find_by_id(id)
            .await?
            .is_some_and(|post| post.is_engageable()))
    }

    async fn owning_channel(&self, id: &str) -> AppResult<Option<String>> {
        Ok(self.posts.find_by_id(id).await?.map(|post| post.channel_id))
    }
}

struct DbCommentTarget {
    comments: CommentRepository,
    videos: VideoRepository,
    posts: PostRepository,
}

#[async_trait]
impl EngagementTarget for DbCommentTarget {
    async fn exists(&self, id: &str) -> AppResult<bool> {
        Ok(self.comments.find_by_id(id).await?.is_some())
    }

    async fn is_eligible_for_engagement(&self, id: &str) -> AppResult<bool> {
        Ok(self
            .comments
            .find_by_id(id)
            .await?
            .is_some_and(|comment| !comment.is_deleted))
    }

    async fn owning_channel(&self, id: &str) -> AppResult<Option<String>> {
        let Some(comment) = self.comments.find_by_id(id).await? else {
            return Ok(None);
        };

        match comment.scope()? {
            ThreadScope::Video(video_id) => Ok(self
                .videos
                .find_by_id(&video_id)
                .await?
                .map(|video| video.channel_id)),
            ThreadScope::Post(post_id) => Ok(self
                .posts
                .find_by_id(&post_id)
                .await?
                .map(|post| post.channel_id)),
        }
    }
}

struct DbChannelTarget {
    channels: ChannelRepository,
}

#[async_trait]
impl EngagementTarget for DbChannelTarget {
    async fn exists(&self, id: &str) -> AppResult<bool> {
        Ok(self.channels.find_by_id(id).await?.is_some())
    }

    async fn is_eligible_for_engagement(&self, id: &str) -> AppResult<bool> {
        self.exists(id).await
    }

    async fn owning_channel(&self, id: &str) -> AppResult<Option<String>> {
        Ok(self.channels.find_by_id(id).await?.map(|channel| channel.id))
    }
}

#[async_trait]
impl ChannelOwnership for DbChannelTarget {
    async fn channel_owner(&self, channel_id: &str) -> AppResult<Option<String>> {
        Ok(self
            .channels
            .find_by_id(channel_id)
            .await?
            .map(|channel| channel.owner_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory target: id -> (eligible, owning channel).
    #[derive(Default)]
    pub struct FakeTargets {
        pub entries: HashMap<String, (bool, String)>,
    }

    impl FakeTargets {
        pub fn with(entries: &[(&str, bool, &str)]) -> Arc<Self> {
            Arc::new(Self {
                entries: entries
                    .iter()
                    .map(|(id, eligible, channel)| {
                        ((*id).to_string(), (*eligible, (*channel).to_string()))
                    })
                    .collect(),
            })
        }
    }

    #[async_trait]
    impl EngagementTarget for FakeTargets {
        async fn exists(&self, id: &str) -> AppResult<bool> {
            Ok(self.entries.contains_key(id))
        }

        async fn is_eligible_for_engagement(&self, id: &str) -> AppResult<bool> {
            Ok(self.entries.get(id).is_some_and(|(eligible, _)| *eligible))
        }

        async fn owning_channel(&self, id: &str) -> AppResult<Option<String>> {
            Ok(self.entries.get(id).map(|(_, channel)| channel.clone()))
        }
    }

    /// In-memory ownership: channel id -> owner id.
    pub struct FakeOwners(pub HashMap<String, String>);

    #[async_trait]
    impl ChannelOwnership for FakeOwners {
        async fn channel_owner(&self, channel_id: &str) -> AppResult<Option<String>> {
            Ok(self.0.get(channel_id).cloned())
        }
    }

    fn registry() -> TargetRegistry {
        TargetRegistry::new(
            FakeTargets::with(&[("v-live", true, "ch1"), ("v-draft", false, "ch1")]),
            FakeTargets::with(&[("p1", true, "ch2")]),
            FakeTargets::with(&[("c1", true, "ch1")]),
            FakeTargets::with(&[("ch1", true, "ch1"), ("ch2", true, "ch2")]),
            Arc::new(FakeOwners(HashMap::from([
                ("ch1".to_string(), "alice".to_string()),
                ("ch2".to_string(), "bob".to_string()),
            ]))),
        )
    }

    #[tokio::test]
    async fn test_dispatches_by_kind() {
        let registry = registry();

        assert!(registry.exists(&TargetRef::Post("p1".into())).await.unwrap());
        assert!(!registry.exists(&TargetRef::Video("p1".into())).await.unwrap());
        assert_eq!(
            registry
                .owning_channel(&TargetRef::Comment("c1".into()))
                .await
                .unwrap()
                .as_deref(),
            Some("ch1")
        );
    }

    #[tokio::test]
    async fn test_require_eligible_maps_to_not_found() {
        let registry = registry();

        assert!(
            registry
                .require_eligible(&TargetRef::Video("v-live".into()))
                .await
                .is_ok()
        );

        for target in [
            TargetRef::Video("v-draft".into()),
            TargetRef::Video("missing".into()),
        ] {
            let result = registry.require_eligible(&target).await;
            assert!(matches!(result, Err(AppError::NotFound(_))));
        }
    }

    #[tokio::test]
    async fn test_is_owner_of_resolves_through_channel() {
        let registry = registry();

        let comment = TargetRef::Comment("c1".into());
        assert!(registry.is_owner_of("alice", &comment).await.unwrap());
        assert!(!registry.is_owner_of("bob", &comment).await.unwrap());

        let missing = TargetRef::Comment("gone".into());
        assert!(!registry.is_owner_of("alice", &missing).await.unwrap());
    }
}
