//! Periodic widget poller

use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Spawns the per-widget refresh loops
pub struct WidgetPoller;

impl WidgetPoller {
    /// Spawn a periodic task for one widget.
    ///
    /// The first tick lands one full period out; the mount-time refresh has
    /// already run by the time a poller starts. A result arriving after
    /// [`PollerHandle::stop`] is discarded, never applied.
    pub fn spawn<F, Fut>(widget_id: &'static str, period: Duration, task: F) -> PollerHandle
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send,
    {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                "Poller for '{}' started ({}s period)",
                widget_id,
                period.as_secs()
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let result = task().await;

                        if *shutdown_rx.borrow() {
                            debug!(
                                "Poller for '{}' stopped mid-tick; discarding result",
                                widget_id
                            );
                            break;
                        }
                        if let Err(e) = result {
                            warn!("Scheduled refresh for '{}' failed: {}", widget_id, e);
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        info!("Poller for '{}' stopped", widget_id);
                        break;
                    }
                }
            }
        });

        PollerHandle {
            shutdown: shutdown_tx,
            join,
        }
    }
}

/// Handle to a running poller
pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl PollerHandle {
    /// Signal the poller to stop; a tick already running finishes but its
    /// result is discarded
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
