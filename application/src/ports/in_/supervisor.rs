use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use super::poll_worker::{DynFetcher, DynNotifier, DynTimer, PollError, PollSettings, PollWorker};
use domain::Profile;

/// Launches one [`PollWorker`] per profile and waits for all of them.
///
/// Workers only return once shutdown is requested, so under normal operation
/// [`Supervisor::run_all`] never completes. A worker that fails takes the
/// others down with it.
pub struct Supervisor {
    fetcher: DynFetcher,
    notifier: DynNotifier,
    timer: DynTimer,
    settings: PollSettings,
}

impl Supervisor {
    pub fn new(
        fetcher: DynFetcher,
        notifier: DynNotifier,
        timer: DynTimer,
        settings: PollSettings,
    ) -> Self {
        Self {
            fetcher,
            notifier,
            timer,
            settings,
        }
    }

    pub fn worker(
        &self,
        profile: Profile,
    ) -> PollWorker {
        PollWorker::new(
            profile,
            self.fetcher.clone(),
            self.notifier.clone(),
            self.timer.clone(),
            self.settings,
        )
    }

    pub async fn run_all(
        &self,
        profiles: &[Profile],
        shutdown: watch::Receiver<bool>,
    ) -> Result<(), PollError> {
        if profiles.is_empty() {
            warn!("No profiles configured, nothing to poll");
            return Ok(());
        }

        let mut workers = JoinSet::new();
        for profile in profiles {
            workers.spawn(self.worker(profile.clone()).run(shutdown.clone()));
        }
        info!(workers = profiles.len(), "Poll workers launched");

        while let Some(joined) = workers.join_next().await {
            let failure = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err,
                Err(join_err) => PollError::Worker(join_err.to_string()),
            };
            error!(error = %failure, "Poll worker failed, stopping all workers");
            workers.abort_all();
            return Err(failure);
        }

        info!("All poll workers stopped");
        Ok(())
    }
}
