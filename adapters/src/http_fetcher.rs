use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use crate::config::{ApiConfig, ConfigError};
use application::ports::out_::{FetchError, MatchFetcher};
use domain::{Match, MatchHistory, ProfileId};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Reads match histories from the community profile API:
/// `<host>/api/sc2/profile/<id>/<realm>/<name>/matches`.
pub struct HttpMatchFetcher {
    client: Client,
    host: Url,
    realm: u32,
}

impl HttpMatchFetcher {
    pub fn new(api: &ApiConfig) -> Result<Self, ConfigError> {
        let host = parse_api_host(&api.host)?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("sc2alert/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| ConfigError::Invalid(format!("cannot build HTTP client: {err}")))?;

        Ok(Self {
            client,
            host,
            realm: api.realm,
        })
    }

    pub fn matches_url(
        &self,
        profile: ProfileId,
        name: &str,
    ) -> Url {
        let id = profile.to_string();
        let realm = self.realm.to_string();
        let mut url = self.host.clone();
        // `new` rejects hosts that cannot be a base, so the segments are always available.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "sc2", "profile", id.as_str(), realm.as_str(), name, "matches"]);
        }
        url
    }
}

/// Parses `Api.Host`, which must be able to take the profile path appended.
pub(crate) fn parse_api_host(host: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(host).map_err(|err| ConfigError::Invalid(format!("Api.Host {host:?}: {err}")))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::Invalid(format!("Api.Host {host:?} is not a base URL")));
    }
    Ok(url)
}

#[async_trait]
impl MatchFetcher for HttpMatchFetcher {
    async fn fetch(
        &self,
        profile: ProfileId,
        name: &str,
    ) -> Result<Vec<Match>, FetchError> {
        let url = self.matches_url(profile, name);
        debug!(%url, "Fetching match history");

        let transport = |err: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            reason: err.to_string(),
        };

        let response = self.client.get(url.clone()).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        let history: MatchHistory = serde_json::from_slice(&body).map_err(|err| FetchError::Parse {
            url: url.to_string(),
            reason: err.to_string(),
        })?;

        debug!(%url, matches = history.matches.len(), "Fetched match history");
        Ok(history.matches)
    }
}
