mod fetcher;
mod notifier;
mod timer;

pub use fetcher::{FetchError, MatchFetcher};
pub use notifier::{DeliveryError, Notifier};
pub use timer::AsyncTimer;
