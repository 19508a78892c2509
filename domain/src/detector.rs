use std::collections::HashMap;

use crate::{Match, ProfileId};

/// Remembers the timestamp of the last match each profile was notified about.
///
/// A profile with no entry has never been seen, so any match counts as new.
/// The comparison is strict equality on the timestamp: a reordered history
/// that surfaces an older match first is still reported as a change.
#[derive(Debug, Default, Clone)]
pub struct ChangeDetector {
    last_seen: HashMap<ProfileId, i64>,
}

impl ChangeDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_changed(
        &self,
        profile: ProfileId,
        candidate: &Match,
    ) -> bool {
        self.last_seen.get(&profile) != Some(&candidate.timestamp)
    }

    pub fn record_seen(
        &mut self,
        profile: ProfileId,
        seen: &Match,
    ) {
        self.last_seen.insert(profile, seen.timestamp);
    }

    #[must_use]
    pub fn last_seen(
        &self,
        profile: ProfileId,
    ) -> Option<i64> {
        self.last_seen.get(&profile).copied()
    }
}
