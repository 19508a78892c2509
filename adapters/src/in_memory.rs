use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use application::ports::out_::{AsyncTimer, DeliveryError, FetchError, MatchFetcher, Notifier};
use domain::{Match, ProfileId};

type FetchResult = Result<Vec<Match>, FetchError>;

#[derive(Default)]
struct Script {
    responses: Vec<FetchResult>,
    calls: usize,
}

/// In-process stand-in for every outbound port, used by the tests.
///
/// Each profile replays its scripted responses in order and then keeps
/// returning the last one. Unscripted profiles see an empty history.
pub struct InMemory {
    scripts: Mutex<HashMap<ProfileId, Script>>,
    sent: Mutex<Vec<String>>,
    delivery_attempts: AtomicUsize,
    failing_deliveries: AtomicUsize,
    sleeps: AtomicUsize,
    stop_after: Mutex<Option<(usize, watch::Sender<bool>)>>,
}

impl InMemory {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            delivery_attempts: AtomicUsize::new(0),
            failing_deliveries: AtomicUsize::new(0),
            sleeps: AtomicUsize::new(0),
            stop_after: Mutex::new(None),
        }
    }

    pub fn script(
        &self,
        profile: ProfileId,
        responses: impl IntoIterator<Item = Result<Vec<Match>, FetchError>>,
    ) {
        let mut scripts = self.scripts.lock().unwrap_or_else(PoisonError::into_inner);
        scripts.entry(profile).or_default().responses.extend(responses);
    }

    /// Shorthand for scripting successful fetches given as lists of match dates.
    pub fn script_dates(
        &self,
        profile: ProfileId,
        fetches: &[&[i64]],
    ) {
        self.script(
            profile,
            fetches
                .iter()
                .map(|dates| Ok(dates.iter().map(|&date| Match::at(date)).collect())),
        );
    }

    /// Makes the next `count` deliveries fail.
    pub fn fail_next_deliveries(
        &self,
        count: usize,
    ) {
        self.failing_deliveries.store(count, Ordering::SeqCst);
    }

    /// Requests shutdown once `sleeps` sleeps have been taken across all workers.
    pub fn stop_after_sleeps(
        &self,
        sleeps: usize,
        shutdown: watch::Sender<bool>,
    ) {
        *self.stop_after.lock().unwrap_or_else(PoisonError::into_inner) = Some((sleeps, shutdown));
    }

    pub fn sent_messages(&self) -> Vec<String> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn delivery_attempts(&self) -> usize {
        self.delivery_attempts.load(Ordering::SeqCst)
    }

    pub fn fetch_count(
        &self,
        profile: ProfileId,
    ) -> usize {
        let scripts = self.scripts.lock().unwrap_or_else(PoisonError::into_inner);
        scripts.get(&profile).map_or(0, |script| script.calls)
    }

    pub fn sleep_count(&self) -> usize {
        self.sleeps.load(Ordering::SeqCst)
    }
}

impl Default for InMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MatchFetcher for InMemory {
    async fn fetch(
        &self,
        profile: ProfileId,
        _name: &str,
    ) -> Result<Vec<Match>, FetchError> {
        let mut scripts = self.scripts.lock().unwrap_or_else(PoisonError::into_inner);
        let script = scripts.entry(profile).or_default();
        let response = match script.responses.len() {
            0 => Ok(Vec::new()),
            len => script.responses[script.calls.min(len - 1)].clone(),
        };
        script.calls += 1;
        response
    }
}

#[async_trait]
impl Notifier for InMemory {
    async fn send(
        &self,
        message: &str,
    ) -> Result<(), DeliveryError> {
        self.delivery_attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing_deliveries
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1));
        if failing.is_ok() {
            return Err(DeliveryError::Transport("simulated outage".to_string()));
        }
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).push(message.to_string());
        Ok(())
    }
}

#[async_trait]
impl AsyncTimer for InMemory {
    async fn sleep(
        &self,
        _duration: Duration,
    ) {
        // No real delay, but let the other workers run.
        tokio::task::yield_now().await;
        let taken = self.sleeps.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((limit, shutdown)) = self.stop_after.lock().unwrap_or_else(PoisonError::into_inner).as_ref()
            && taken >= *limit
        {
            shutdown.send_replace(true);
        }
    }
}
