use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub u64);

impl fmt::Display for ProfileId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A monitored player, as listed in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
}

impl Profile {
    pub fn new(
        id: u64,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: ProfileId(id),
            name: name.into(),
        }
    }
}

/// One completed game as reported by the match-history service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    #[serde(default)]
    pub map: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub decision: String,
    /// Epoch seconds.
    #[serde(rename = "date")]
    pub timestamp: i64,
}

impl Match {
    pub fn at(timestamp: i64) -> Self {
        Self {
            map: String::new(),
            kind: String::new(),
            decision: String::new(),
            timestamp,
        }
    }
}

/// Response body of the match-history endpoint. Matches are ordered most recent first.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct MatchHistory {
    #[serde(default)]
    pub matches: Vec<Match>,
}

impl MatchHistory {
    #[must_use]
    pub fn latest(&self) -> Option<&Match> {
        self.matches.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_match_history_payload() {
        let body = r#"{
            "matches": [
                {"map": "Daybreak LE", "type": "SOLO", "decision": "WIN", "speed": "FASTER", "date": 1400000000},
                {"map": "Akilon Wastes", "type": "SOLO", "decision": "LOSS", "speed": "FASTER", "date": 1399990000}
            ]
        }"#;

        let history: MatchHistory = serde_json::from_str(body).unwrap();

        assert_eq!(history.matches.len(), 2);
        let latest = history.latest().unwrap();
        assert_eq!(latest.map, "Daybreak LE");
        assert_eq!(latest.kind, "SOLO");
        assert_eq!(latest.decision, "WIN");
        assert_eq!(latest.timestamp, 1_400_000_000);
    }

    #[test]
    fn missing_matches_key_is_empty_history() {
        let history: MatchHistory = serde_json::from_str("{}").unwrap();
        assert!(history.latest().is_none());
    }

    #[test]
    fn match_without_date_is_rejected() {
        let result = serde_json::from_str::<MatchHistory>(r#"{"matches": [{"map": "X"}]}"#);
        assert!(result.is_err());
    }
}
