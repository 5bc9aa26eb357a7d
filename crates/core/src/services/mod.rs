//! Engagement services.

#![allow(missing_docs)]

pub mod activity_log;
pub mod counter_sync;
pub mod engagement;
pub mod feed;
pub mod reconciler;
pub mod registry;
pub mod thread;

pub use activity_log::{ActivityLogService, ActivityRefs};
pub use counter_sync::{reconcilable_fields, CounterCorrection, CounterSync, ReconcileReport};
pub use engagement::EngagementService;
pub use feed::FeedService;
pub use reconciler::{run_reconciler, sweep_once};
pub use registry::{
    ChannelOwnership, ChannelOwnershipService, EngagementTarget, EngagementTargetService,
    TargetRegistry,
};
pub use thread::{CommentInput, ThreadService};
