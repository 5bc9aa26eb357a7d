//! Feed aggregator.
//!
//! Read-only views built by loading a page of relation or activity rows and
//! then batch-loading what they point at. Nothing here mutates state.

use std::collections::HashMap;
use std::sync::Arc;

use sea_orm::DatabaseConnection;
use videotube_common::config::FeedConfig;
use videotube_common::{AppResult, IdGenerator};
use videotube_db::entities::activity::ActivityKind;
use videotube_db::entities::{comment, user};
use videotube_db::repositories::{
    ActivityRepository, ChannelRepository, CommentRepository, LikeRepository, PostRepository,
    SubscriptionRepository, UserRepository, VideoRepository,
};
use videotube_db::{TargetKind, ThreadScope};

use crate::views::{
    ActivityCommentView, ActivityLikeView, ActivityPostView, ActivityVideoView, ActivityView,
    AuthorView, CommentNode, FeedItem, LikedCommentView, LikedPostView, LikedVideoView, Page,
    PageRequest, ReplyView, SubscribedChannelView, SubscriberView, activity_label, target_label,
};

/// Index models by id.
fn by_id<T>(rows: Vec<T>, id: impl Fn(&T) -> String) -> HashMap<String, T> {
    rows.into_iter().map(|row| (id(&row), row)).collect()
}

/// Collect the distinct non-empty values of an optional reference.
fn distinct_ids<'a>(refs: impl Iterator<Item = Option<&'a String>>) -> Vec<String> {
    let mut ids: Vec<String> = refs.flatten().cloned().collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Feed service for hydrated read views.
#[derive(Clone)]
pub struct FeedService {
    users: UserRepository,
    channels: ChannelRepository,
    videos: VideoRepository,
    posts: PostRepository,
    comments: CommentRepository,
    likes: LikeRepository,
    subscriptions: SubscriptionRepository,
    activities: ActivityRepository,
    config: FeedConfig,
}

impl FeedService {
    /// Create a new feed service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, config: FeedConfig) -> Self {
        Self {
            users: UserRepository::new(Arc::clone(&db)),
            channels: ChannelRepository::new(Arc::clone(&db)),
            videos: VideoRepository::new(Arc::clone(&db)),
            posts: PostRepository::new(Arc::clone(&db)),
            comments: CommentRepository::new(Arc::clone(&db)),
            likes: LikeRepository::new(Arc::clone(&db)),
            subscriptions: SubscriptionRepository::new(Arc::clone(&db)),
            activities: ActivityRepository::new(db),
            config,
        }
    }

    /// Build a page request with this feed's limits applied.
    #[must_use]
    pub fn page(&self, offset: Option<u64>, limit: Option<u64>) -> PageRequest {
        PageRequest::new(offset, limit, &self.config)
    }

    // === Comment tree ===

    /// Visible root comments of a scope, each with its visible direct
    /// replies. Deeper replies are stored but not rendered.
    pub async fn comment_tree(
        &self,
        scope: &ThreadScope,
        page: PageRequest,
    ) -> AppResult<Page<FeedItem<CommentNode>>> {
        scope.validate()?;

        let roots = self
            .comments
            .find_roots(scope, page.offset, page.fetch_limit())
            .await?;
        let roots = Page::from_rows(roots, page);

        let root_ids: Vec<String> = roots.items.iter().map(|c| c.id.clone()).collect();
        let replies = self.comments.find_replies(&root_ids).await?;

        let author_ids = distinct_ids(
            roots
                .items
                .iter()
                .chain(replies.iter())
                .map(|c| Some(&c.author_id)),
        );
        let authors = by_id(self.users.find_by_ids(&author_ids).await?, |u| {
            u.id.clone()
        });

        let mut replies_by_parent: HashMap<String, Vec<ReplyView>> = HashMap::new();
        for reply in replies {
            let (Some(parent_id), Some(author)) =
                (reply.parent_id.clone(), authors.get(&reply.author_id))
            else {
                continue;
            };
            replies_by_parent
                .entry(parent_id)
                .or_default()
                .push(reply_view(reply, author));
        }

        Ok(roots.filter_map(|root| {
            let author = authors.get(&root.author_id)?;
            let replies = replies_by_parent.remove(&root.id).unwrap_or_default();
            Some(FeedItem {
                target_type: target_label(TargetKind::Comment),
                created_at: root.created_at,
                payload: CommentNode {
                    id: root.id,
                    content: root.content,
                    likes_count: root.likes_count,
                    is_pinned: root.is_pinned,
                    created_at: root.created_at,
                    author: AuthorView::from(author),
                    replies,
                },
            })
        }))
    }

    // === Liked items ===

    /// Videos the user likes, most recently liked first.
    pub async fn liked_videos(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> AppResult<Page<FeedItem<LikedVideoView>>> {
        IdGenerator::validate_named("user id", user_id)?;

        let likes = self
            .likes
            .find_by_user_and_kind(user_id, TargetKind::Video, page.offset, page.fetch_limit())
            .await?;
        let likes = Page::from_rows(likes, page);

        let ids = distinct_ids(likes.items.iter().map(|l| Some(&l.target_id)));
        let mut videos = by_id(self.videos.find_by_ids(&ids).await?, |v| v.id.clone());

        Ok(likes.filter_map(|like| {
            let video = videos.remove(&like.target_id)?;
            Some(FeedItem {
                target_type: target_label(TargetKind::Video),
                created_at: like.created_at,
                payload: LikedVideoView::from(video),
            })
        }))
    }

    /// Posts the user likes, most recently liked first.
    pub async fn liked_posts(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> AppResult<Page<FeedItem<LikedPostView>>> {
        IdGenerator::validate_named("user id", user_id)?;

        let likes = self
            .likes
            .find_by_user_and_kind(user_id, TargetKind::Post, page.offset, page.fetch_limit())
            .await?;
        let likes = Page::from_rows(likes, page);

        let ids = distinct_ids(likes.items.iter().map(|l| Some(&l.target_id)));
        let mut posts = by_id(self.posts.find_by_ids(&ids).await?, |p| p.id.clone());

        Ok(likes.filter_map(|like| {
            let post = posts.remove(&like.target_id)?;
            Some(FeedItem {
                target_type: target_label(TargetKind::Post),
                created_at: like.created_at,
                payload: LikedPostView::from(post),
            })
        }))
    }

    /// Comments the user likes, most recently liked first.
    pub async fn liked_comments(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> AppResult<Page<FeedItem<LikedCommentView>>> {
        IdGenerator::validate_named("user id", user_id)?;

        let likes = self
            .likes
            .find_by_user_and_kind(
                user_id,
                TargetKind::Comment,
                page.offset,
                page.fetch_limit(),
            )
            .await?;
        let likes = Page::from_rows(likes, page);

        let ids = distinct_ids(likes.items.iter().map(|l| Some(&l.target_id)));
        let mut comments = by_id(self.comments.find_by_ids(&ids).await?, |c| c.id.clone());

        Ok(likes.filter_map(|like| {
            let comment = comments.remove(&like.target_id)?;
            Some(FeedItem {
                target_type: target_label(TargetKind::Comment),
                created_at: like.created_at,
                payload: LikedCommentView::from(comment),
            })
        }))
    }

    // === Subscriptions ===

    /// Users subscribed to a channel, newest subscription first.
    pub async fn subscribers(
        &self,
        channel_id: &str,
        page: PageRequest,
    ) -> AppResult<Page<FeedItem<SubscriberView>>> {
        IdGenerator::validate_named("channel id", channel_id)?;

        let rows = self
            .subscriptions
            .find_by_channel(channel_id, page.offset, page.fetch_limit())
            .await?;
        let rows = Page::from_rows(rows, page);

        let ids = distinct_ids(rows.items.iter().map(|s| Some(&s.subscriber_id)));
        let mut users = by_id(self.users.find_by_ids(&ids).await?, |u| u.id.clone());

        Ok(rows.filter_map(|subscription| {
            let user = users.remove(&subscription.subscriber_id)?;
            Some(FeedItem {
                target_type: target_label(TargetKind::Channel),
                created_at: subscription.created_at,
                payload: SubscriberView::from(user),
            })
        }))
    }

    /// Channels a user subscribes to, newest subscription first.
    pub async fn subscriptions(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> AppResult<Page<FeedItem<SubscribedChannelView>>> {
        IdGenerator::validate_named("user id", user_id)?;

        let rows = self
            .subscriptions
            .find_by_subscriber(user_id, page.offset, page.fetch_limit())
            .await?;
        let rows = Page::from_rows(rows, page);

        let ids = distinct_ids(rows.items.iter().map(|s| Some(&s.channel_id)));
        let mut channels = by_id(self.channels.find_by_ids(&ids).await?, |c| c.id.clone());

        Ok(rows.filter_map(|subscription| {
            let channel = channels.remove(&subscription.channel_id)?;
            Some(FeedItem {
                target_type: target_label(TargetKind::Channel),
                created_at: subscription.created_at,
                payload: SubscribedChannelView::from(channel),
            })
        }))
    }

    // === Activity ===

    /// A user's activity, newest first, optionally of one kind.
    ///
    /// References that no longer resolve are rendered as `None`.
    pub async fn activity_for(
        &self,
        user_id: &str,
        kind: Option<ActivityKind>,
        page: PageRequest,
    ) -> AppResult<Page<FeedItem<ActivityView>>> {
        IdGenerator::validate_named("user id", user_id)?;

        let rows = self
            .activities
            .find_by_user(user_id, kind, page.offset, page.fetch_limit())
            .await?;
        let rows = Page::from_rows(rows, page);

        let video_ids = distinct_ids(rows.items.iter().map(|a| a.video_id.as_ref()));
        let post_ids = distinct_ids(rows.items.iter().map(|a| a.post_id.as_ref()));
        let comment_ids = distinct_ids(rows.items.iter().map(|a| a.comment_id.as_ref()));
        let like_ids = distinct_ids(rows.items.iter().map(|a| a.like_id.as_ref()));

        let videos = by_id(self.videos.find_by_ids(&video_ids).await?, |v| v.id.clone());
        let posts = by_id(self.posts.find_by_ids(&post_ids).await?, |p| p.id.clone());
        let comments = by_id(self.comments.find_by_ids(&comment_ids).await?, |c| {
            c.id.clone()
        });
        let likes = by_id(self.likes.find_by_ids(&like_ids).await?, |l| l.id.clone());

        Ok(rows.map(|activity| FeedItem {
            target_type: activity_label(activity.kind),
            created_at: activity.created_at,
            payload: ActivityView {
                video: activity
                    .video_id
                    .as_ref()
                    .and_then(|id| videos.get(id))
                    .map(ActivityVideoView::from),
                post: activity
                    .post_id
                    .as_ref()
                    .and_then(|id| posts.get(id))
                    .map(ActivityPostView::from),
                comment: activity
                    .comment_id
                    .as_ref()
                    .and_then(|id| comments.get(id))
                    .map(ActivityCommentView::from),
                like: activity
                    .like_id
                    .as_ref()
                    .and_then(|id| likes.get(id))
                    .map(ActivityLikeView::from),
                id: activity.id,
            },
        }))
    }
}

fn reply_view(reply: comment::Model, author: &user::Model) -> ReplyView {
    ReplyView {
        id: reply.id,
        content: reply.content,
        likes_count: reply.likes_count,
        created_at: reply.created_at,
        author: AuthorView::from(author),
    }
}
