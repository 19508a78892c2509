mod config;
mod http_fetcher;
mod in_memory;
mod smtp_notifier;
mod tokio_timer;

pub use config::{
    ApiConfig, CONFIG_PATH_ENV, ConfigError, Configuration, DEFAULT_API_HOST, DEFAULT_CONFIG_PATH, DEFAULT_REALM,
    MailerConfig, OnError, PollingConfig, UserConfig, config_path,
};
pub use http_fetcher::HttpMatchFetcher;
pub use in_memory::InMemory;
pub use smtp_notifier::SmtpNotifier;
pub use tokio_timer::TokioTimer;
