//! Counter reconciliation background job
//!
//! Counter updates that lose every compare-and-swap round, or fail after the
//! relation already changed, leave the blog aggregates off by a few. This
//! job periodically recounts the relations of every blog and rewrites the
//! aggregates that drifted.

use crate::services::CounterMaintainer;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

/// How often to sweep all blogs (every 5 minutes)
const RECONCILE_INTERVAL: Duration = Duration::from_secs(300);

/// Configuration for the reconciler
#[derive(Clone, Debug)]
pub struct ReconcilerConfig {
    pub enabled: bool,
    pub interval: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: RECONCILE_INTERVAL,
        }
    }
}

/// Run sweeps until `shutdown` flips to `true`. The first sweep runs
/// immediately.
pub async fn start_reconciler(
    counters: CounterMaintainer,
    config: ReconcilerConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    if !config.enabled {
        tracing::info!("Counter reconciler disabled by configuration");
        return;
    }

    tracing::info!(
        interval_secs = config.interval.as_secs(),
        "Starting counter reconciler"
    );

    let mut ticker = interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        match counters.reconcile_all().await {
            Ok(report) if report.repaired > 0 || report.failed > 0 => {
                tracing::warn!(
                    scanned = report.scanned,
                    repaired = report.repaired,
                    failed = report.failed,
                    "Counter reconciliation found drift"
                );
            }
            Ok(report) => {
                tracing::debug!(scanned = report.scanned, "Counter reconciliation: no drift");
            }
            Err(e) => {
                tracing::error!(error = %e, "Counter reconciliation sweep failed");
            }
        }
    }

    tracing::info!("Counter reconciler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use document_store::{DocumentStore, MemoryStore, StorePath};
    use resilience::RetryConfig;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_sweep_repairs_and_stops() {
        let store = MemoryStore::from_snapshot(json!({
            "blogs": {"b1": {"likes": 4}},
            "likes": {"b1": {"u1": {"userId": "u1", "createdAt": 1}}}
        }))
        .unwrap();
        let counters = CounterMaintainer::new(Arc::new(store.clone()), RetryConfig::default());
        let (tx, rx) = watch::channel(false);

        let worker = tokio::spawn(start_reconciler(
            counters,
            ReconcilerConfig {
                enabled: true,
                interval: Duration::from_millis(10),
            },
            rx,
        ));

        let likes = StorePath::parse("blogs/b1/likes").unwrap();
        for _ in 0..50 {
            if store.read(&likes).await.unwrap() == Some(json!(1)) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.read(&likes).await.unwrap(), Some(json!(1)));

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), worker)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_disabled_returns_immediately() {
        let counters = CounterMaintainer::new(Arc::new(MemoryStore::new()), RetryConfig::default());
        let (_tx, rx) = watch::channel(false);
        start_reconciler(counters, ReconcilerConfig::default(), rx).await;
    }
}
