use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::ports::out_::{AsyncTimer, DeliveryError, FetchError, MatchFetcher, Notifier};
use domain::{Alert, ChangeDetector, Match, Profile};

/// Type aliases for the dynamic trait objects
pub type DynFetcher = Arc<dyn MatchFetcher>;
pub type DynNotifier = Arc<dyn Notifier>;
pub type DynTimer = Arc<dyn AsyncTimer>;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// What a worker does when a fetch or a delivery fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Log the failure and try again next cycle.
    #[default]
    Continue,
    /// Stop the worker with the error; the supervisor then stops everything.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub on_error: ErrorPolicy,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            on_error: ErrorPolicy::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("fetching matches for {profile} failed: {source}")]
    Fetch {
        profile: String,
        #[source]
        source: FetchError,
    },

    #[error("notifying about {profile} failed: {source}")]
    Delivery {
        profile: String,
        #[source]
        source: DeliveryError,
    },

    #[error("poll worker stopped unexpectedly: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Notified(Match),
    Unchanged,
    /// The history was empty; nothing was compared and the state is untouched.
    NoMatches,
}

/// Polls a single profile: fetch, compare, notify on change, sleep, repeat.
///
/// The worker owns its [`ChangeDetector`], so no other worker can observe or
/// overwrite the last match it has seen.
pub struct PollWorker {
    profile: Profile,
    fetcher: DynFetcher,
    notifier: DynNotifier,
    timer: DynTimer,
    settings: PollSettings,
    detector: ChangeDetector,
}

impl PollWorker {
    pub fn new(
        profile: Profile,
        fetcher: DynFetcher,
        notifier: DynNotifier,
        timer: DynTimer,
        settings: PollSettings,
    ) -> Self {
        Self {
            profile,
            fetcher,
            notifier,
            timer,
            settings,
            detector: ChangeDetector::new(),
        }
    }

    pub fn last_seen(&self) -> Option<i64> {
        self.detector.last_seen(self.profile.id)
    }

    /// Runs one fetch, compare and notify pass.
    ///
    /// The last-seen state only advances after the notification went out, so
    /// a failed delivery is retried on the next cycle.
    pub async fn poll_once(&mut self) -> Result<CycleOutcome, PollError> {
        let matches = self
            .fetcher
            .fetch(self.profile.id, &self.profile.name)
            .await
            .map_err(|source| PollError::Fetch {
                profile: self.profile.name.clone(),
                source,
            })?;

        let Some(latest) = matches.into_iter().next() else {
            debug!(profile = %self.profile.name, "match history is empty, skipping cycle");
            return Ok(CycleOutcome::NoMatches);
        };

        if !self.detector.has_changed(self.profile.id, &latest) {
            info!(profile = %self.profile.name, "No new matches detected");
            return Ok(CycleOutcome::Unchanged);
        }

        let alert = Alert::new(&self.profile, &latest);
        self.notifier
            .send(&alert.message())
            .await
            .map_err(|source| PollError::Delivery {
                profile: self.profile.name.clone(),
                source,
            })?;
        self.detector.record_seen(self.profile.id, &latest);

        info!(
            profile = %self.profile.name,
            played_at = %alert.played_at(),
            map = %latest.map,
            kind = %latest.kind,
            decision = %latest.decision,
            "New match detected"
        );
        Ok(CycleOutcome::Notified(latest))
    }

    /// Polls until `shutdown` turns `true` (or its sender goes away).
    ///
    /// Shutdown is only observed between cycles, never during a fetch or a send.
    pub async fn run(
        mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), PollError> {
        info!(
            profile = %self.profile.name,
            profile_id = %self.profile.id,
            interval_secs = self.settings.interval.as_secs(),
            "Poll worker started"
        );

        loop {
            if let Err(err) = self.poll_once().await {
                match self.settings.on_error {
                    ErrorPolicy::Abort => return Err(err),
                    ErrorPolicy::Continue => {
                        warn!(profile = %self.profile.name, error = %err, "Poll cycle failed, retrying next cycle");
                    }
                }
            }

            if !self.sleep_unless_stopped(&mut shutdown).await {
                break;
            }
        }

        info!(profile = %self.profile.name, "Poll worker stopped");
        Ok(())
    }

    /// Returns `false` when shutdown was requested before or during the sleep.
    async fn sleep_unless_stopped(
        &self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> bool {
        if *shutdown.borrow_and_update() {
            return false;
        }

        let sender_alive = tokio::select! {
            () = self.timer.sleep(self.settings.interval) => true,
            changed = shutdown.changed() => changed.is_ok(),
        };

        sender_alive && !*shutdown.borrow_and_update()
    }
}
