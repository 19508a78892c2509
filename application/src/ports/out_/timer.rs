use std::time::Duration;

use async_trait::async_trait;

/// The pause between two poll cycles of one worker.
///
/// Workers race this against their shutdown signal, so implementations must
/// be cancel-safe: dropping the future ends the wait and nothing else.
#[async_trait]
pub trait AsyncTimer: Send + Sync {
    async fn sleep(
        &self,
        interval: Duration,
    );
}
