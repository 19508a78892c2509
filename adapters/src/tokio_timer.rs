use std::time::Duration;

use async_trait::async_trait;

use application::ports::out_::AsyncTimer;

/// Waits out the poll interval on the tokio clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioTimer;

#[async_trait]
impl AsyncTimer for TokioTimer {
    async fn sleep(
        &self,
        interval: Duration,
    ) {
        tokio::time::sleep(interval).await;
    }
}
