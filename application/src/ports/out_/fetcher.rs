use async_trait::async_trait;
use thiserror::Error;

use domain::{Match, ProfileId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("malformed match history from {url}: {reason}")]
    Parse { url: String, reason: String },
}

/// Source of a player's recent matches.
#[async_trait]
pub trait MatchFetcher: Send + Sync {
    /// Returns the player's matches, most recent first. An empty list is a valid answer.
    async fn fetch(
        &self,
        profile: ProfileId,
        name: &str,
    ) -> Result<Vec<Match>, FetchError>;
}
