//! Periodic counter reconciliation.

use std::future::Future;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use videotube_common::config::ReconcileConfig;
use videotube_common::AppResult;
use videotube_db::TargetKind;

use crate::services::counter_sync::CounterSync;

/// Kinds swept on every tick, in order.
pub const RECONCILED_KINDS: [TargetKind; 4] = [
    TargetKind::Video,
    TargetKind::Post,
    TargetKind::Comment,
    TargetKind::Channel,
];

/// Sweep every kind once. Returns the total number of counters corrected.
///
/// A failing kind is logged and does not stop the others.
pub async fn sweep_once(counters: &CounterSync, batch_size: u64) -> u64 {
    let mut total = 0;

    for kind in RECONCILED_KINDS {
        match counters.reconcile_all(kind, batch_size).await {
            Ok(corrected) => {
                if corrected > 0 {
                    tracing::info!(target_type = %kind, corrected, "Reconciled counters");
                }
                total += corrected;
            }
            Err(e) => {
                tracing::error!(error = %e, target_type = %kind, "Counter reconciliation failed");
            }
        }
    }

    total
}

/// Run reconciliation every `config.interval_secs` until `shutdown` resolves.
pub async fn run_reconciler<F>(
    config: &ReconcileConfig,
    counters: CounterSync,
    shutdown: F,
) -> AppResult<()>
where
    F: Future<Output = ()> + Send,
{
    if !config.enabled {
        tracing::info!("Counter reconciliation disabled");
        shutdown.await;
        return Ok(());
    }

    let period = Duration::from_secs(config.interval_secs.max(1));
    let batch_size = config.batch_size;

    tracing::info!(
        interval_secs = period.as_secs(),
        batch_size,
        "Starting counter reconciler"
    );

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                tracing::info!("Counter reconciler stopped");
                return Ok(());
            }
            _ = ticker.tick() => {
                let corrected = sweep_once(&counters, batch_size).await;
                tracing::debug!(corrected, "Reconciliation sweep finished");
            }
        }
    }
}
