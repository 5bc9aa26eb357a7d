//! Engagement core for videotube: likes, subscriptions, comment threads,
//! activity history and the counters derived from them.

pub mod services;
pub mod views;

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use videotube_common::Config;

pub use services::*;

/// Every service, wired against one database connection.
#[derive(Clone)]
pub struct Engagement {
    pub registry: TargetRegistry,
    pub counters: CounterSync,
    pub feed: FeedService,
    pub engagement: EngagementService,
    pub threads: ThreadService,
    pub activity: ActivityLogService,
}

impl Engagement {
    /// Build the service graph from configuration.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, config: &Config) -> Self {
        let registry = TargetRegistry::from_db(Arc::clone(&db));
        let counters = CounterSync::new(Arc::clone(&db), &config.counters);
        let feed = FeedService::new(Arc::clone(&db), config.feed.clone());

        Self {
            engagement: EngagementService::new(
                Arc::clone(&db),
                registry.clone(),
                counters.clone(),
                feed.clone(),
            ),
            threads: ThreadService::new(
                Arc::clone(&db),
                registry.clone(),
                counters.clone(),
                feed.clone(),
            ),
            activity: ActivityLogService::new(db, registry.clone(), counters.clone(), feed.clone()),
            registry,
            counters,
            feed,
        }
    }
}
