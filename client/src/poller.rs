//! Per-screen periodic refresh
//!
//! A poller re-fetches one dataset on a fixed interval and merges it into a
//! [`SharedCache`]. Dropping the handle, or calling [`Poller::stop`], aborts
//! the task together with any fetch it has in flight.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use shared::Versioned;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::cache::{MergeOutcome, SharedCache};
use crate::error::ClientResult;

/// Dashboard screens with their own refresh cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Overview,
    Outbound,
    Quality,
    Inbound,
    Inventory,
    Analytics,
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::Overview => "overview",
            Screen::Outbound => "outbound",
            Screen::Quality => "quality",
            Screen::Inbound => "inbound",
            Screen::Inventory => "inventory",
            Screen::Analytics => "analytics",
        }
    }
}

pub struct Poller {
    screen: Screen,
    refresh: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Start polling. The first fetch happens immediately.
    pub fn spawn<T, F, Fut>(screen: Screen, every: Duration, cache: SharedCache<T>, fetch: F) -> Self
    where
        T: Versioned + Send + 'static,
        T::Key: Send,
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ClientResult<Vec<T>>> + Send,
    {
        let refresh = Arc::new(Notify::new());
        let notified = refresh.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = notified.notified() => interval.reset(),
                }

                let ticket = cache.lock().await.begin_fetch();
                match fetch().await {
                    Ok(snapshot) => {
                        if let MergeOutcome::Applied(report) =
                            cache.lock().await.apply_snapshot(ticket, snapshot)
                        {
                            tracing::debug!(
                                screen = screen.name(),
                                inserted = report.inserted,
                                updated = report.updated,
                                removed = report.removed,
                                "Refreshed"
                            );
                        }
                    }
                    // The screen keeps what it has; the next tick retries
                    Err(e) => tracing::warn!(screen = screen.name(), error = %e, "Refresh failed"),
                }
            }
        });

        Self {
            screen,
            refresh,
            handle,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Fetch again without waiting for the next tick
    pub fn refresh_now(&self) {
        self.refresh.notify_one();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
