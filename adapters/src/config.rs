use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::http_fetcher::parse_api_host;
use application::ports::in_::{DEFAULT_POLL_INTERVAL, ErrorPolicy, PollSettings};
use domain::Profile;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
/// Overrides [`DEFAULT_CONFIG_PATH`].
pub const CONFIG_PATH_ENV: &str = "SC2ALERT_CONFIG";
pub const DEFAULT_API_HOST: &str = "http://us.battle.net";
pub const DEFAULT_REALM: u32 = 1;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration document, read once at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Configuration {
    pub users: Vec<UserConfig>,
    /// Reserved; nothing reads it yet.
    #[serde(default)]
    pub groups: Vec<String>,
    pub mailer: MailerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserConfig {
    pub id: u64,
    pub name: String,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MailerConfig {
    /// `host:port` of the submission server.
    pub smtp_server: String,
    pub auth_username: String,
    pub auth_password: String,
    /// Host name the server's TLS certificate is checked against.
    pub auth_host: String,
    pub address_from: String,
    pub address_to: String,
}

impl fmt::Debug for MailerConfig {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("MailerConfig")
            .field("smtp_server", &self.smtp_server)
            .field("auth_username", &self.auth_username)
            .field("auth_password", &"<redacted>")
            .field("auth_host", &self.auth_host)
            .field("address_from", &self.address_from)
            .field("address_to", &self.address_to)
            .finish()
    }
}

impl MailerConfig {
    pub fn server_address(&self) -> Result<(&str, u16), ConfigError> {
        let invalid = || ConfigError::Invalid(format!("SmtpServer {:?} is not of the form host:port", self.smtp_server));
        let (host, port) = self.smtp_server.rsplit_once(':').ok_or_else(invalid)?;
        let port = port.parse::<u16>().map_err(|_| invalid())?;
        if host.is_empty() {
            return Err(invalid());
        }
        Ok((host, port))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_realm")]
    pub realm: u32,
}

fn default_api_host() -> String {
    DEFAULT_API_HOST.to_string()
}

fn default_realm() -> u32 {
    DEFAULT_REALM
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            realm: DEFAULT_REALM,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    #[default]
    Continue,
    Abort,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PollingConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default)]
    pub on_error: OnError,
}

fn default_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            on_error: OnError::default(),
        }
    }
}

/// Path of the configuration file: `$SC2ALERT_CONFIG`, or `config.json` in the working directory.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

impl Configuration {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut ids = HashSet::new();
        for user in &self.users {
            if user.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("user {} has an empty name", user.id)));
            }
            if !ids.insert(user.id) {
                return Err(ConfigError::Invalid(format!("user id {} is listed twice", user.id)));
            }
        }

        let mailer = &self.mailer;
        for (field, value) in [
            ("AuthHost", &mailer.auth_host),
            ("AddressFrom", &mailer.address_from),
            ("AddressTo", &mailer.address_to),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("Mailer.{field} is empty")));
            }
        }
        mailer.server_address()?;

        parse_api_host(&self.api.host)?;

        if self.polling.interval_secs == 0 {
            return Err(ConfigError::Invalid("Polling.IntervalSecs must be positive".to_string()));
        }
        Ok(())
    }

    pub fn profiles(&self) -> Vec<Profile> {
        self.users.iter().map(|user| Profile::new(user.id, user.name.clone())).collect()
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(self.polling.interval_secs),
            on_error: match self.polling.on_error {
                OnError::Continue => ErrorPolicy::Continue,
                OnError::Abort => ErrorPolicy::Abort,
            },
        }
    }
}
