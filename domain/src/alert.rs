use chrono::DateTime;

use crate::{Match, Profile};

pub const ALERT_SUBJECT: &str = "Starcraft Alert";

const PLAYED_AT_FORMAT: &str = "%b %-d, %Y %-I:%M%P";

/// The notification raised when a profile shows a new most recent match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub profile_name: String,
    pub played: Match,
}

impl Alert {
    pub fn new(
        profile: &Profile,
        played: &Match,
    ) -> Self {
        Self {
            profile_name: profile.name.clone(),
            played: played.clone(),
        }
    }

    /// Match time in UTC, e.g. `Jan 1, 1970 12:16am UTC`.
    #[must_use]
    pub fn played_at(&self) -> String {
        match DateTime::from_timestamp(self.played.timestamp, 0) {
            Some(at) => format!("{} UTC", at.format(PLAYED_AT_FORMAT)),
            None => format!("@{}", self.played.timestamp),
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        format!("{} was last seen playing at {}\n", self.profile_name, self.played_at())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_player_and_time() {
        let profile = Profile::new(693604, "IdrA");
        let alert = Alert::new(&profile, &Match::at(1000));

        assert_eq!(alert.played_at(), "Jan 1, 1970 12:16am UTC");
        assert_eq!(alert.message(), "IdrA was last seen playing at Jan 1, 1970 12:16am UTC\n");
    }

    #[test]
    fn afternoon_times_use_pm() {
        let profile = Profile::new(1, "Bomber");
        // 2014-05-13 16:53:20 UTC
        let alert = Alert::new(&profile, &Match::at(1_400_000_000));
        assert_eq!(alert.played_at(), "May 13, 2014 4:53pm UTC");
    }

    #[test]
    fn out_of_range_timestamp_falls_back_to_raw_value() {
        let profile = Profile::new(1, "Bomber");
        let alert = Alert::new(&profile, &Match::at(i64::MAX));
        assert_eq!(alert.played_at(), format!("@{}", i64::MAX));
    }
}
