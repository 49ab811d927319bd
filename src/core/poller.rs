//! Periodic refresh of a remote release document.

use crate::core::release::RemoteSource;
use crate::model::ReleaseConfig;
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Background task refreshing the shared document on a fixed interval.
///
/// The task only touches the engine through the shared `ArcSwap`. A failed
/// tick is logged and the previous document stays in place; the next attempt
/// happens on the next tick, with no backoff. Dropping the poller aborts the
/// task, so it never outlives the last engine handle.
pub(crate) struct Poller {
    handle: JoinHandle<()>,
    interval: Duration,
}

impl Poller {
    /// Spawn the refresh loop. The first refresh happens one full `interval`
    /// after spawning.
    pub(crate) fn spawn(
        runtime: &Handle,
        source: Arc<RemoteSource>,
        current: Arc<ArcSwap<ReleaseConfig>>,
        interval: Duration,
    ) -> Self {
        tracing::info!(
            url = %source.url(),
            interval_secs = interval.as_secs(),
            "release config polling started"
        );

        let handle = runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match source.refresh_into(&current).await {
                    Ok(()) => tracing::debug!(url = %source.url(), "release config refreshed"),
                    Err(err) => tracing::warn!(
                        url = %source.url(),
                        error = %err,
                        "release config refresh failed, keeping the previous config"
                    ),
                }
            }
        });

        Self { handle, interval }
    }

    /// Whether the task has exited.
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Polling interval of this task.
    pub(crate) fn interval(&self) -> Duration {
        self.interval
    }

    /// Cancel the task and wait until it is gone.
    ///
    /// A swap that was already executing completes before this returns; none
    /// happen afterwards.
    pub(crate) async fn stop(mut self) {
        self.handle.abort();
        // Cancellation is the expected outcome here.
        let _ = (&mut self.handle).await;
        tracing::info!("release config polling stopped");
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if !self.handle.is_finished() {
            self.handle.abort();
            tracing::debug!("release engine dropped, config polling aborted");
        }
    }
}
