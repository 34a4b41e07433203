//! The polling loop.
//!
//! Every interval the poller fetches the followed feed, compares the result
//! with what it applied last and dispatches the side effects of a change.
//! Fetch failures and empty feeds are logged and retried on the next tick with
//! the same fixed interval, both before the first wallpaper is applied
//! ([`Phase::Bootstrap`]) and after ([`Phase::Steady`]).

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::agent::dispatch::{DispatchReport, Dispatcher};
use crate::agent::state::{Detection, PollingState, RuntimeConfig};
use crate::feed::{Classification, FeedClient, classify};

/// Whether a first wallpaper has been applied yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Bootstrap,
    Steady,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Bootstrap => "bootstrap",
            Self::Steady => "steady",
        })
    }
}

/// Result of a single poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Applied(DispatchReport),
    Unchanged,
    NoAssignment,
    FetchFailed,
}

/// Last wallpaper the poller applied, published to the control task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedWallpaper {
    pub media_url: String,
    pub attribution: Option<String>,
    pub feed: u64,
    pub applied_at: DateTime<Utc>,
}

/// Fetches, detects and dispatches. Owns the [`PollingState`].
pub struct Poller {
    client: FeedClient,
    config: Arc<RuntimeConfig>,
    dispatcher: Dispatcher,
    state: PollingState,
    applied: watch::Sender<Option<AppliedWallpaper>>,
}

impl Poller {
    #[must_use]
    pub fn new(client: FeedClient, config: Arc<RuntimeConfig>, dispatcher: Dispatcher) -> Self {
        let (applied, _) = watch::channel(None);
        Self { client, config, dispatcher, state: PollingState::new(), applied }
    }

    /// Receiver that sees every applied wallpaper.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<AppliedWallpaper>> { self.applied.subscribe() }

    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.state.is_bootstrapping() { Phase::Bootstrap } else { Phase::Steady }
    }

    #[must_use]
    pub const fn state(&self) -> &PollingState { &self.state }

    /// Runs one fetch-detect-dispatch cycle.
    ///
    /// The feed id and preferences are read once at the start, so a change
    /// made by the operator mid-cycle takes effect on the next one.
    pub async fn poll_once(&mut self) -> PollOutcome {
        let settings = self.config.snapshot();
        let feed = settings.feed;
        let retry_in = self.config.interval().as_secs();
        let phase = self.phase();

        let assignment = match self.client.fetch(feed).await {
            Ok(assignment) => assignment,
            Err(err) => {
                tracing::warn!(
                    feed,
                    %phase,
                    error = %err,
                    "could not fetch assignment, retrying in {retry_in} seconds"
                );
                return PollOutcome::FetchFailed;
            }
        };

        let item = match classify(assignment) {
            Classification::Actionable(item) => item,
            Classification::NoAssignment { .. } => {
                tracing::info!(feed, %phase, "no data for ID {feed}, trying again in {retry_in} seconds");
                return PollOutcome::NoAssignment;
            }
        };

        if self.state.detect(&item) == Detection::Unchanged {
            tracing::info!(feed, "nothing new yet");
            return PollOutcome::Unchanged;
        }

        let setter = item.attribution().unwrap_or("anonymous");
        match phase {
            Phase::Bootstrap => {
                tracing::info!(feed, setter, url = item.media_url(), "setting initial wallpaper");
            }
            Phase::Steady => {
                tracing::info!(feed, setter, url = item.media_url(), "new wallpaper assigned");
            }
        }

        let report = self.dispatcher.dispatch(&item, settings).await;
        self.state.record(&item);
        self.applied.send_replace(Some(AppliedWallpaper {
            media_url: item.media_url().to_string(),
            attribution: item.attribution().map(str::to_string),
            feed,
            applied_at: Utc::now(),
        }));

        if report.is_clean() {
            tracing::info!(feed, "wallpaper changed");
        } else {
            let failed: Vec<_> = report.failed().iter().map(|step| step.name()).collect();
            tracing::warn!(feed, ?failed, "wallpaper changed with failed steps");
        }

        PollOutcome::Applied(report)
    }

    /// Polls until `shutdown` is cancelled. Returns the final state.
    ///
    /// Cycles start on a fixed period measured from the first one. Cancellation
    /// interrupts the wait between cycles but never a cycle in progress.
    pub async fn run(mut self, shutdown: CancellationToken) -> PollingState {
        let interval = self.config.interval();
        let secs = interval.as_secs();
        tracing::info!(interval_secs = secs, "checking for new wallpaper every {secs} seconds");

        let mut ticks = cycle_ticker(interval);
        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                _ = ticks.tick() => {}
            }

            self.poll_once().await;
        }

        tracing::debug!(phase = %self.phase(), "poller stopped");
        self.state
    }
}

/// First tick is immediate. A cycle that overruns the period pushes the next
/// one back instead of queueing a burst.
fn cycle_ticker(period: Duration) -> Interval {
    // `interval` panics on a zero period.
    let mut ticks = tokio::time::interval(period.max(Duration::from_millis(1)));
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticks
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_cycles_keep_a_fixed_period() {
        let start = Instant::now();
        let mut ticks = cycle_ticker(Duration::from_secs(1));

        ticks.tick().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        // A slow cycle does not push the next one back.
        tokio::time::sleep(Duration::from_millis(400)).await;
        ticks.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(1));

        // An overrunning cycle is followed at once, then by one full period.
        tokio::time::sleep(Duration::from_millis(2500)).await;
        ticks.tick().await;
        assert_eq!(start.elapsed(), Duration::from_millis(3500));
        ticks.tick().await;
        assert_eq!(start.elapsed(), Duration::from_millis(4500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_does_not_panic() {
        let mut ticks = cycle_ticker(Duration::ZERO);
        ticks.tick().await;
        ticks.tick().await;
    }
}
