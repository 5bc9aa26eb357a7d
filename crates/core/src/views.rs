//! Output projections.
//!
//! Storage models never leave the core directly. Each view below is the
//! fixed field subset returned to the API layer, serialized in camelCase.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use videotube_common::config::FeedConfig;
use videotube_db::entities::{activity, channel, comment, like, post, user, video};
use videotube_db::{TargetKind, TargetRef};

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeToggle {
    pub liked: bool,
}

/// Result of a subscription toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubscriptionToggle {
    pub subscribed: bool,
}

// === Pagination ===

/// Offset pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: u64,
    pub limit: u64,
}

impl PageRequest {
    /// Build a request, applying the configured default and upper bound.
    #[must_use]
    pub fn new(offset: Option<u64>, limit: Option<u64>, config: &FeedConfig) -> Self {
        let max = config.max_limit.max(1);
        Self {
            offset: offset.unwrap_or(0),
            limit: limit.unwrap_or(config.default_limit).clamp(1, max),
        }
    }

    /// The first page with the default size.
    #[must_use]
    pub fn first(config: &FeedConfig) -> Self {
        Self::new(None, None, config)
    }

    /// Rows to fetch so that one extra row reveals whether more exist.
    #[must_use]
    pub const fn fetch_limit(&self) -> u64 {
        self.limit.saturating_add(1)
    }
}

/// One page of a feed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub offset: u64,
    pub limit: u64,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Trim `rows` fetched with [`PageRequest::fetch_limit`] into a page.
    #[must_use]
    pub fn from_rows(mut rows: Vec<T>, request: PageRequest) -> Self {
        let has_more = rows.len() as u64 > request.limit;
        rows.truncate(request.limit as usize);
        Self {
            items: rows,
            offset: request.offset,
            limit: request.limit,
            has_more,
        }
    }

    /// Map the items, keeping the page position.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            offset: self.offset,
            limit: self.limit,
            has_more: self.has_more,
        }
    }

    /// Map the items, dropping the ones that map to `None`.
    ///
    /// `has_more` still reflects the underlying rows, so skipping unresolved
    /// entries never hides a following page.
    #[must_use]
    pub fn filter_map<U>(self, f: impl FnMut(T) -> Option<U>) -> Page<U> {
        Page {
            items: self.items.into_iter().filter_map(f).collect(),
            offset: self.offset,
            limit: self.limit,
            has_more: self.has_more,
        }
    }
}

/// A feed entry: what kind of thing it is, when it happened, and the
/// projected record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem<T> {
    pub target_type: &'static str,
    pub created_at: DateTime<FixedOffset>,
    pub payload: T,
}

/// Upper-case label used as `targetType` for relation targets.
#[must_use]
pub const fn target_label(kind: TargetKind) -> &'static str {
    match kind {
        TargetKind::Video => "VIDEO",
        TargetKind::Post => "POST",
        TargetKind::Comment => "COMMENT",
        TargetKind::Channel => "CHANNEL",
    }
}

/// Upper-case label used as `targetType` for activity rows.
#[must_use]
pub const fn activity_label(kind: activity::ActivityKind) -> &'static str {
    match kind {
        activity::ActivityKind::Watch => "WATCH",
        activity::ActivityKind::Like => "LIKE",
        activity::ActivityKind::Comment => "COMMENT",
        activity::ActivityKind::Post => "POST",
    }
}

// === Users and channels ===

/// Author of a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    pub id: String,
    pub username: String,
    pub full_name: String,
}

impl From<&user::Model> for AuthorView {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
        }
    }
}

/// A user subscribed to a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberView {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar: Option<String>,
}

impl From<user::Model> for SubscriberView {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            avatar: user.avatar,
        }
    }
}

/// A channel a user subscribes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribedChannelView {
    pub id: String,
    pub name: String,
    pub handle: Option<String>,
    pub banner_image: Option<String>,
    pub subscriber_count: i64,
}

impl From<channel::Model> for SubscribedChannelView {
    fn from(channel: channel::Model) -> Self {
        Self {
            id: channel.id,
            name: channel.name,
            handle: channel.handle,
            banner_image: channel.banner_image,
            subscriber_count: channel.subscriber_count,
        }
    }
}

// === Comments ===

/// A single comment as returned by write operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub content: String,
    pub author_id: String,
    pub video_id: Option<String>,
    pub post_id: Option<String>,
    pub parent_id: Option<String>,
    pub is_pinned: bool,
    pub is_deleted: bool,
    pub likes_count: i64,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
}

impl From<comment::Model> for CommentView {
    fn from(comment: comment::Model) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            author_id: comment.author_id,
            video_id: comment.video_id,
            post_id: comment.post_id,
            parent_id: comment.parent_id,
            is_pinned: comment.is_pinned,
            is_deleted: comment.is_deleted,
            likes_count: comment.likes_count,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

/// A visible reply under a root comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyView {
    pub id: String,
    pub content: String,
    pub likes_count: i64,
    pub created_at: DateTime<FixedOffset>,
    pub author: AuthorView,
}

/// A root comment with its direct replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub id: String,
    pub content: String,
    pub likes_count: i64,
    pub is_pinned: bool,
    pub created_at: DateTime<FixedOffset>,
    pub author: AuthorView,
    pub replies: Vec<ReplyView>,
}

// === Liked items ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedVideoView {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub duration: i32,
    pub views_count: i64,
    pub likes_count: i64,
    pub created_at: DateTime<FixedOffset>,
}

impl From<video::Model> for LikedVideoView {
    fn from(video: video::Model) -> Self {
        Self {
            id: video.id,
            title: video.title,
            thumbnail: video.thumbnail,
            duration: video.duration,
            views_count: video.views_count,
            likes_count: video.likes_count,
            created_at: video.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedPostView {
    pub id: String,
    pub content: String,
    pub media: serde_json::Value,
    pub likes_count: i64,
    pub comments_count: i64,
    pub created_at: DateTime<FixedOffset>,
}

impl From<post::Model> for LikedPostView {
    fn from(post: post::Model) -> Self {
        Self {
            id: post.id,
            content: post.content,
            media: post.media,
            likes_count: post.likes_count,
            comments_count: post.comments_count,
            created_at: post.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedCommentView {
    pub id: String,
    pub content: String,
    pub likes_count: i64,
    pub created_at: DateTime<FixedOffset>,
}

impl From<comment::Model> for LikedCommentView {
    fn from(comment: comment::Model) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            likes_count: comment.likes_count,
            created_at: comment.created_at,
        }
    }
}

// === Activity ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityVideoView {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub duration: i32,
}

impl From<&video::Model> for ActivityVideoView {
    fn from(video: &video::Model) -> Self {
        Self {
            id: video.id.clone(),
            title: video.title.clone(),
            thumbnail: video.thumbnail.clone(),
            duration: video.duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPostView {
    pub id: String,
    pub content: String,
    pub media: serde_json::Value,
}

impl From<&post::Model> for ActivityPostView {
    fn from(post: &post::Model) -> Self {
        Self {
            id: post.id.clone(),
            content: post.content.clone(),
            media: post.media.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCommentView {
    pub id: String,
    pub content: String,
    pub likes_count: i64,
}

impl From<&comment::Model> for ActivityCommentView {
    fn from(comment: &comment::Model) -> Self {
        Self {
            id: comment.id.clone(),
            content: comment.content.clone(),
            likes_count: comment.likes_count,
        }
    }
}

/// The like an activity refers to, with its tagged target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLikeView {
    pub id: String,
    #[serde(flatten)]
    pub target: TargetRef,
}

impl From<&like::Model> for ActivityLikeView {
    fn from(like: &like::Model) -> Self {
        Self {
            id: like.id.clone(),
            target: like.target(),
        }
    }
}

/// An activity with each reference resolved, or `null` when it no longer
/// resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityView {
    pub id: String,
    pub video: Option<ActivityVideoView>,
    pub post: Option<ActivityPostView>,
    pub comment: Option<ActivityCommentView>,
    pub like: Option<ActivityLikeView>,
}
