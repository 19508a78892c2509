use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("could not build message: {0}")]
    Message(String),

    #[error("mail delivery failed: {0}")]
    Transport(String),
}

/// Delivers a plain-text alert to the configured recipient. Implementations never retry.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        message: &str,
    ) -> Result<(), DeliveryError>;
}
