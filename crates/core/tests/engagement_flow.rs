//! End-to-end engagement flows against an in-memory database with the real
//! migrations applied.

#![allow(clippy::unwrap_used)]

use chrono::Utc;
use futures::future::join_all;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use videotube_common::config::{CounterConfig, DatabaseConfig, FeedConfig, ReconcileConfig};
use videotube_common::{AppError, Config, IdGenerator};
use videotube_core::views::{CommentNode, FeedItem, Page, PageRequest};
use videotube_core::{sweep_once, ActivityRefs, Engagement};
use videotube_db::entities::activity::ActivityKind;
use videotube_db::entities::{
    channel, comment, like, user, video, Channel, Comment, Like, Video,
};
use videotube_db::repositories::CounterField;
use videotube_db::test_utils::TestDatabase;
use videotube_db::{TargetKind, TargetRef, ThreadScope};

fn config() -> Config {
    Config {
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        counters: CounterConfig { retry_delay_ms: 1 },
        reconcile: ReconcileConfig::default(),
        feed: FeedConfig::default(),
    }
}

struct Fixture {
    db: TestDatabase,
    app: Engagement,
    owner: user::Model,
    viewer: user::Model,
    channel: channel::Model,
    video: video::Model,
}

async fn setup() -> Fixture {
    let db = TestDatabase::in_memory().await.unwrap();
    let app = Engagement::new(db.connection(), &config());

    let owner = db.insert_user("owner").await.unwrap();
    let viewer = db.insert_user("viewer").await.unwrap();
    let channel = db.insert_channel(&owner.id).await.unwrap();
    let video = db
        .insert_video(&channel.id, true, video::Visibility::Public)
        .await
        .unwrap();

    Fixture {
        db,
        app,
        owner,
        viewer,
        channel,
        video,
    }
}

fn page() -> PageRequest {
    PageRequest::first(&FeedConfig::default())
}

async fn video_row(f: &Fixture) -> video::Model {
    Video::find_by_id(&f.video.id)
        .one(f.db.conn.as_ref())
        .await
        .unwrap()
        .unwrap()
}

// === Likes ===

#[tokio::test]
async fn test_like_toggle_round_trip() {
    let f = setup().await;
    let target = TargetRef::Video(f.video.id.clone());

    let first = f.app.engagement.toggle_like(&f.viewer.id, &target).await.unwrap();
    assert!(first.liked);
    assert_eq!(video_row(&f).await.likes_count, 1);
    assert!(f.app.engagement.is_liked(&f.viewer.id, &target).await.unwrap());

    let second = f.app.engagement.toggle_like(&f.viewer.id, &target).await.unwrap();
    assert!(!second.liked);
    assert_eq!(video_row(&f).await.likes_count, 0);
    assert!(!f.app.engagement.is_liked(&f.viewer.id, &target).await.unwrap());
}

#[tokio::test]
async fn test_concurrent_toggles_keep_counter_equal_to_rows() {
    let f = setup().await;
    let target = TargetRef::Video(f.video.id.clone());

    let toggles = (0..8).map(|_| f.app.engagement.toggle_like(&f.viewer.id, &target));
    let results: Vec<bool> = join_all(toggles)
        .await
        .into_iter()
        .map(|r| r.unwrap().liked)
        .collect();

    let rows = Like::find().all(f.db.conn.as_ref()).await.unwrap();
    assert!(rows.len() <= 1);
    assert_eq!(video_row(&f).await.likes_count, rows.len() as i64);

    // The caller whose write landed last reported the state that stuck
    let liked = rows.len() == 1;
    assert!(results.contains(&liked), "{results:?} never reported {liked}");
    assert_eq!(
        f.app.engagement.is_liked(&f.viewer.id, &target).await.unwrap(),
        liked
    );

    // A later toggle flips from the settled state
    let next = f.app.engagement.toggle_like(&f.viewer.id, &target).await.unwrap();
    assert_eq!(next.liked, !liked);

    let rows = Like::find().all(f.db.conn.as_ref()).await.unwrap();
    assert_eq!(rows.len(), usize::from(next.liked));
    assert_eq!(video_row(&f).await.likes_count, rows.len() as i64);
}

#[tokio::test]
async fn test_concurrent_likes_from_many_users() {
    let f = setup().await;
    let target = TargetRef::Video(f.video.id.clone());

    let mut users = Vec::new();
    for i in 0..5 {
        users.push(f.db.insert_user(&format!("fan{i}")).await.unwrap());
    }

    let toggles = users
        .iter()
        .map(|u| f.app.engagement.toggle_like(&u.id, &target));
    for result in join_all(toggles).await {
        assert!(result.unwrap().liked);
    }

    assert_eq!(video_row(&f).await.likes_count, 5);
}

#[tokio::test]
async fn test_unpublished_video_cannot_be_liked() {
    let f = setup().await;
    let draft = f
        .db
        .insert_video(&f.channel.id, false, video::Visibility::Public)
        .await
        .unwrap();

    let result = f
        .app
        .engagement
        .toggle_like(&f.viewer.id, &TargetRef::Video(draft.id))
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_private_post_cannot_be_liked() {
    let f = setup().await;
    let post = f
        .db
        .insert_post(&f.channel.id, video::Visibility::Private)
        .await
        .unwrap();

    let result = f
        .app
        .engagement
        .toggle_like(&f.viewer.id, &TargetRef::Post(post.id))
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

// === Subscriptions ===

#[tokio::test]
async fn test_subscription_toggle_and_lists() {
    let f = setup().await;

    let on = f
        .app
        .engagement
        .toggle_subscription(&f.viewer.id, &f.channel.id)
        .await
        .unwrap();
    assert!(on.subscribed);

    let subscribers = f
        .app
        .engagement
        .list_subscribers(&f.channel.id, page())
        .await
        .unwrap();
    assert_eq!(subscribers.items.len(), 1);
    assert_eq!(subscribers.items[0].payload.id, f.viewer.id);
    assert_eq!(subscribers.items[0].target_type, "CHANNEL");

    let subscriptions = f
        .app
        .engagement
        .list_subscriptions(&f.viewer.id, page())
        .await
        .unwrap();
    assert_eq!(subscriptions.items.len(), 1);
    assert_eq!(subscriptions.items[0].payload.id, f.channel.id);
    assert_eq!(subscriptions.items[0].payload.subscriber_count, 1);

    let off = f
        .app
        .engagement
        .toggle_subscription(&f.viewer.id, &f.channel.id)
        .await
        .unwrap();
    assert!(!off.subscribed);

    let channel = Channel::find_by_id(&f.channel.id)
        .one(f.db.conn.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(channel.subscriber_count, 0);
}

#[tokio::test]
async fn test_self_subscription_is_conflict() {
    let f = setup().await;

    let result = f
        .app
        .engagement
        .toggle_subscription(&f.owner.id, &f.channel.id)
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert!(!f
        .app
        .engagement
        .is_subscribed(&f.owner.id, &f.channel.id)
        .await
        .unwrap());
}

// === Threads ===

#[tokio::test]
async fn test_comment_and_reply_share_scope_and_count() {
    let f = setup().await;
    let scope = ThreadScope::Video(f.video.id.clone());

    let root = f
        .app
        .threads
        .add_comment(&f.viewer.id, &scope, "  first!  ")
        .await
        .unwrap();
    assert_eq!(root.content, "first!");

    let reply = f
        .app
        .threads
        .reply(&f.owner.id, &root.id, "thanks")
        .await
        .unwrap();
    assert_eq!(reply.video_id.as_deref(), Some(f.video.id.as_str()));
    assert_eq!(reply.parent_id.as_deref(), Some(root.id.as_str()));

    assert_eq!(video_row(&f).await.comments_count, 2);

    let tree = f.app.threads.list(&scope, page()).await.unwrap();
    assert_eq!(tree.items.len(), 1);
    assert_eq!(tree.items[0].payload.author.username, "viewer");
    assert_eq!(tree.items[0].payload.replies.len(), 1);
    assert_eq!(tree.items[0].payload.replies[0].id, reply.id);
}

#[tokio::test]
async fn test_nested_replies_are_stored_but_not_listed() {
    let f = setup().await;
    let scope = ThreadScope::Video(f.video.id.clone());

    let root = f
        .app
        .threads
        .add_comment(&f.viewer.id, &scope, "root")
        .await
        .unwrap();
    let child = f
        .app
        .threads
        .reply(&f.owner.id, &root.id, "child")
        .await
        .unwrap();
    let grandchild = f
        .app
        .threads
        .reply(&f.viewer.id, &child.id, "grandchild")
        .await
        .unwrap();
    assert_eq!(grandchild.parent_id.as_deref(), Some(child.id.as_str()));
    assert_eq!(grandchild.video_id.as_deref(), Some(f.video.id.as_str()));

    let tree = f.app.threads.list(&scope, page()).await.unwrap();
    assert_eq!(tree.items.len(), 1);
    assert_eq!(tree.items[0].payload.id, root.id);
    let replies: Vec<&str> = tree.items[0]
        .payload
        .replies
        .iter()
        .map(|r| r.id.as_str())
        .collect();
    assert_eq!(replies, vec![child.id.as_str()]);

    let stored = f.app.threads.get(&grandchild.id).await.unwrap();
    assert_eq!(stored.content, "grandchild");
    assert!(!stored.is_deleted);

    assert_eq!(video_row(&f).await.comments_count, 3);
}

#[tokio::test]
async fn test_reply_to_deleted_comment_conflicts() {
    let f = setup().await;
    let scope = ThreadScope::Video(f.video.id.clone());

    let root = f
        .app
        .threads
        .add_comment(&f.viewer.id, &scope, "hello")
        .await
        .unwrap();
    f.app.threads.delete(&f.viewer.id, &root.id).await.unwrap();

    let result = f.app.threads.reply(&f.owner.id, &root.id, "late").await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_delete_keeps_replies_and_counters() {
    let f = setup().await;
    let scope = ThreadScope::Video(f.video.id.clone());

    let root = f
        .app
        .threads
        .add_comment(&f.viewer.id, &scope, "root")
        .await
        .unwrap();
    let reply = f
        .app
        .threads
        .reply(&f.viewer.id, &root.id, "reply")
        .await
        .unwrap();

    // The channel owner may delete someone else's comment
    f.app.threads.delete(&f.owner.id, &root.id).await.unwrap();
    // Deleting twice is a no-op
    f.app.threads.delete(&f.owner.id, &root.id).await.unwrap();

    let kept = f.app.threads.get(&reply.id).await.unwrap();
    assert!(!kept.is_deleted);
    assert_eq!(kept.parent_id.as_deref(), Some(root.id.as_str()));
    assert!(f.app.threads.get(&root.id).await.unwrap().is_deleted);

    assert_eq!(video_row(&f).await.comments_count, 2);

    let tree = f.app.threads.list(&scope, page()).await.unwrap();
    assert!(tree.items.is_empty());
}

#[tokio::test]
async fn test_stranger_cannot_delete_or_edit() {
    let f = setup().await;
    let stranger = f.db.insert_user("stranger").await.unwrap();
    let scope = ThreadScope::Video(f.video.id.clone());

    let root = f
        .app
        .threads
        .add_comment(&f.viewer.id, &scope, "mine")
        .await
        .unwrap();

    let deleted = f.app.threads.delete(&stranger.id, &root.id).await;
    assert!(matches!(deleted, Err(AppError::Forbidden(_))));

    let edited = f.app.threads.edit(&f.owner.id, &root.id, "not yours").await;
    assert!(matches!(edited, Err(AppError::Forbidden(_))));

    let edited = f
        .app
        .threads
        .edit(&f.viewer.id, &root.id, "mine, edited")
        .await
        .unwrap();
    assert_eq!(edited.content, "mine, edited");
    assert!(edited.updated_at.is_some());
}

#[tokio::test]
async fn test_pin_moves_between_comments() {
    let f = setup().await;
    let scope = ThreadScope::Video(f.video.id.clone());

    let c1 = f
        .app
        .threads
        .add_comment(&f.viewer.id, &scope, "one")
        .await
        .unwrap();
    let c2 = f
        .app
        .threads
        .add_comment(&f.viewer.id, &scope, "two")
        .await
        .unwrap();

    assert!(f.app.threads.pin(&f.owner.id, &c1.id).await.unwrap().is_pinned);
    assert!(f.app.threads.pin(&f.owner.id, &c2.id).await.unwrap().is_pinned);

    assert!(!f.app.threads.get(&c1.id).await.unwrap().is_pinned);
    assert!(f.app.threads.get(&c2.id).await.unwrap().is_pinned);

    let pinned: Vec<comment::Model> = Comment::find()
        .all(f.db.conn.as_ref())
        .await
        .unwrap()
        .into_iter()
        .filter(|c| c.is_pinned)
        .collect();
    assert_eq!(pinned.len(), 1);

    // The pinned comment leads the listing
    let tree = f.app.threads.list(&scope, page()).await.unwrap();
    assert_eq!(tree.items[0].payload.id, c2.id);
}

#[tokio::test]
async fn test_concurrent_pins_leave_one_pinned() {
    let f = setup().await;
    let scope = ThreadScope::Video(f.video.id.clone());

    let mut ids = Vec::new();
    for i in 0..4 {
        let c = f
            .app
            .threads
            .add_comment(&f.viewer.id, &scope, &format!("c{i}"))
            .await
            .unwrap();
        ids.push(c.id);
    }

    let pins = ids.iter().map(|id| f.app.threads.pin(&f.owner.id, id));
    let _ = join_all(pins).await;

    let pinned = Comment::find()
        .all(f.db.conn.as_ref())
        .await
        .unwrap()
        .into_iter()
        .filter(|c| c.is_pinned)
        .count();
    assert_eq!(pinned, 1);
}

#[tokio::test]
async fn test_only_channel_owner_pins() {
    let f = setup().await;
    let scope = ThreadScope::Video(f.video.id.clone());

    let c = f
        .app
        .threads
        .add_comment(&f.viewer.id, &scope, "pin me")
        .await
        .unwrap();

    let result = f.app.threads.pin(&f.viewer.id, &c.id).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    f.app.threads.delete(&f.viewer.id, &c.id).await.unwrap();
    let result = f.app.threads.pin(&f.owner.id, &c.id).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

// === Counters ===

#[tokio::test]
async fn test_reconcile_repairs_drift() {
    let f = setup().await;
    let target = TargetRef::Video(f.video.id.clone());

    f.app
        .engagement
        .toggle_like(&f.viewer.id, &target)
        .await
        .unwrap();

    let mut drifted: video::ActiveModel = video_row(&f).await.into();
    drifted.likes_count = Set(42);
    drifted.comments_count = Set(-3);
    drifted.update(f.db.conn.as_ref()).await.unwrap();

    let report = f.app.counters.reconcile(&target).await.unwrap();
    assert_eq!(report.corrections.len(), 2);

    let row = video_row(&f).await;
    assert_eq!(row.likes_count, 1);
    assert_eq!(row.comments_count, 0);

    // Idempotent
    let again = f.app.counters.reconcile(&target).await.unwrap();
    assert!(again.is_consistent());
}

#[tokio::test]
async fn test_sweep_reconciles_every_kind() {
    let f = setup().await;

    let mut drifted: channel::ActiveModel = f.channel.clone().into();
    drifted.subscriber_count = Set(7);
    drifted.update(f.db.conn.as_ref()).await.unwrap();

    let mut drifted: video::ActiveModel = video_row(&f).await.into();
    drifted.likes_count = Set(3);
    drifted.update(f.db.conn.as_ref()).await.unwrap();

    assert_eq!(sweep_once(&f.app.counters, 1).await, 2);
    assert_eq!(sweep_once(&f.app.counters, 1).await, 0);

    assert_eq!(
        f.app
            .counters
            .get(TargetKind::Channel, CounterField::Subscribers, &f.channel.id)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_decrement_never_goes_negative() {
    let f = setup().await;

    f.app
        .counters
        .decrement(TargetKind::Video, CounterField::Likes, &f.video.id)
        .await;

    assert_eq!(video_row(&f).await.likes_count, 0);
}

// === Activity and feeds ===

#[tokio::test]
async fn test_activity_feed_resolves_references() {
    let f = setup().await;
    let scope = ThreadScope::Video(f.video.id.clone());
    let target = TargetRef::Video(f.video.id.clone());

    f.app.activity.log_watch(&f.viewer.id, &f.video.id).await.unwrap();
    assert_eq!(video_row(&f).await.views_count, 1);

    f.app
        .engagement
        .toggle_like(&f.viewer.id, &target)
        .await
        .unwrap();
    let liked = f.app.activity.log_like(&f.viewer.id, &target).await.unwrap();
    assert!(liked.like_id.is_some());

    let c = f
        .app
        .threads
        .add_comment(&f.viewer.id, &scope, "nice")
        .await
        .unwrap();
    let commented = f.app.activity.log_comment(&f.viewer.id, &c.id).await.unwrap();
    assert_eq!(commented.video_id.as_deref(), Some(f.video.id.as_str()));

    let feed = f
        .app
        .activity
        .activity_for(&f.viewer.id, None, page())
        .await
        .unwrap();
    assert_eq!(feed.items.len(), 3);
    assert!(!feed.has_more);
    assert!(feed.items.iter().all(|i| i.payload.video.is_some()));

    let likes_only = f
        .app
        .activity
        .activity_for(&f.viewer.id, Some(ActivityKind::Like), page())
        .await
        .unwrap();
    assert_eq!(likes_only.items.len(), 1);
    assert_eq!(likes_only.items[0].target_type, "LIKE");
    assert!(likes_only.items[0].payload.like.is_some());
}

#[tokio::test]
async fn test_dangling_activity_renders_null() {
    let f = setup().await;
    let gone = "01j00000000000000000000zzz";

    f.app
        .activity
        .append(&f.viewer.id, ActivityKind::Watch, ActivityRefs::video(gone))
        .await
        .unwrap();

    let feed = f
        .app
        .activity
        .activity_for(&f.viewer.id, None, page())
        .await
        .unwrap();
    assert_eq!(feed.items.len(), 1);
    assert!(feed.items[0].payload.video.is_none());
}

#[tokio::test]
async fn test_liked_feeds_paginate() {
    let f = setup().await;

    for _ in 0..3 {
        let v = f
            .db
            .insert_video(&f.channel.id, true, video::Visibility::Public)
            .await
            .unwrap();
        f.app
            .engagement
            .toggle_like(&f.viewer.id, &TargetRef::Video(v.id))
            .await
            .unwrap();
    }

    let request = f.app.feed.page(Some(0), Some(2));
    let first = f
        .app
        .engagement
        .list_liked_videos(&f.viewer.id, request)
        .await
        .unwrap();
    assert_eq!(first.items.len(), 2);
    assert!(first.has_more);
    assert_eq!(first.items[0].target_type, "VIDEO");

    let request = f.app.feed.page(Some(2), Some(2));
    let rest = f
        .app
        .engagement
        .list_liked_videos(&f.viewer.id, request)
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 1);
    assert!(!rest.has_more);

    let posts = f
        .app
        .engagement
        .list_liked_posts(&f.viewer.id, page())
        .await
        .unwrap();
    assert!(posts.items.is_empty());
}

async fn liked_video_ids(f: &Fixture) -> Vec<String> {
    f.app
        .engagement
        .list_liked_videos(&f.viewer.id, page())
        .await
        .unwrap()
        .items
        .into_iter()
        .map(|i| i.payload.id)
        .collect()
}

#[tokio::test]
async fn test_liked_order_is_stable_when_timestamps_tie() {
    let f = setup().await;
    let at: DateTimeWithTimeZone = Utc::now().into();

    for _ in 0..4 {
        let v = f
            .db
            .insert_video(&f.channel.id, true, video::Visibility::Public)
            .await
            .unwrap();
        like::ActiveModel {
            id: Set(IdGenerator::new().generate()),
            user_id: Set(f.viewer.id.clone()),
            target_type: Set(TargetKind::Video),
            target_id: Set(v.id),
            created_at: Set(at),
        }
        .insert(f.db.conn.as_ref())
        .await
        .unwrap();
    }

    let first = liked_video_ids(&f).await;
    assert_eq!(first.len(), 4);
    assert_eq!(first, liked_video_ids(&f).await);

    // Pages split the same sequence without overlap
    let head = f
        .app
        .engagement
        .list_liked_videos(&f.viewer.id, f.app.feed.page(Some(0), Some(2)))
        .await
        .unwrap();
    let tail = f
        .app
        .engagement
        .list_liked_videos(&f.viewer.id, f.app.feed.page(Some(2), Some(2)))
        .await
        .unwrap();
    let paged: Vec<String> = head
        .items
        .into_iter()
        .chain(tail.items)
        .map(|i| i.payload.id)
        .collect();
    assert_eq!(paged, first);
}

#[tokio::test]
async fn test_comment_order_is_stable_when_timestamps_tie() {
    let f = setup().await;
    let scope = ThreadScope::Video(f.video.id.clone());
    let at: DateTimeWithTimeZone = Utc::now().into();

    let root = f.db.insert_comment(&f.viewer.id, &scope, None).await.unwrap();
    let mut tied = vec![root.clone()];
    for _ in 0..3 {
        tied.push(f.db.insert_comment(&f.viewer.id, &scope, None).await.unwrap());
    }
    for _ in 0..3 {
        tied.push(
            f.db
                .insert_comment(&f.owner.id, &scope, Some(&root.id))
                .await
                .unwrap(),
        );
    }
    for c in tied {
        let mut row: comment::ActiveModel = c.into();
        row.created_at = Set(at);
        row.update(f.db.conn.as_ref()).await.unwrap();
    }

    let shape = |tree: Page<FeedItem<CommentNode>>| {
        tree.items
            .into_iter()
            .map(|i| {
                let replies: Vec<String> =
                    i.payload.replies.into_iter().map(|r| r.id).collect();
                (i.payload.id, replies)
            })
            .collect::<Vec<_>>()
    };

    let first = shape(f.app.threads.list(&scope, page()).await.unwrap());
    let second = shape(f.app.threads.list(&scope, page()).await.unwrap());
    assert_eq!(first.len(), 4);
    assert_eq!(first, second);

    let with_replies = first.iter().find(|(id, _)| *id == root.id).unwrap();
    assert_eq!(with_replies.1.len(), 3);
}

#[tokio::test]
async fn test_full_scenario() {
    let f = setup().await;
    let scope = ThreadScope::Video(f.video.id.clone());

    f.app
        .engagement
        .toggle_subscription(&f.viewer.id, &f.channel.id)
        .await
        .unwrap();
    f.app.activity.log_watch(&f.viewer.id, &f.video.id).await.unwrap();

    let c = f
        .app
        .threads
        .add_comment(&f.viewer.id, &scope, "great video")
        .await
        .unwrap();
    f.app
        .engagement
        .toggle_like(&f.owner.id, &TargetRef::Comment(c.id.clone()))
        .await
        .unwrap();
    f.app.threads.pin(&f.owner.id, &c.id).await.unwrap();

    let liked = f
        .app
        .engagement
        .list_liked_comments(&f.owner.id, page())
        .await
        .unwrap();
    assert_eq!(liked.items.len(), 1);
    assert_eq!(liked.items[0].payload.likes_count, 1);

    let tree = f.app.threads.list(&scope, page()).await.unwrap();
    assert!(tree.items[0].payload.is_pinned);
    assert_eq!(tree.items[0].payload.likes_count, 1);

    for kind in [TargetKind::Video, TargetKind::Comment, TargetKind::Channel] {
        let id = match kind {
            TargetKind::Video => f.video.id.clone(),
            TargetKind::Comment => c.id.clone(),
            _ => f.channel.id.clone(),
        };
        let report = f
            .app
            .counters
            .reconcile(&TargetRef::new(kind, id))
            .await
            .unwrap();
        assert!(report.is_consistent(), "{kind} drifted: {report:?}");
    }
}
