mod alert;
mod detector;
mod types;

pub use alert::{ALERT_SUBJECT, Alert};
pub use detector::ChangeDetector;
pub use types::{Match, MatchHistory, Profile, ProfileId};
