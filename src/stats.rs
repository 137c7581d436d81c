use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::progression::{experience_required, Achievement, Rank};
use crate::util::{mean, percentage};

/// Result of one finished session, kept in the lifetime history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub date: NaiveDate,
    #[serde(rename = "study")]
    pub study_hours: u32,
    #[serde(rename = "game")]
    pub game_hours: u32,
}

impl SessionRecord {
    pub fn total_hours(&self) -> u32 {
        self.study_hours.saturating_add(self.game_hours)
    }
}

/// Lifetime statistics, persisted as a single record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    pub total_study_hours: u32,
    pub total_game_hours: u32,
    pub total_sessions_completed: u32,
    pub session_history: Vec<SessionRecord>,
    pub level: u32,
    pub current_exp: u64,
    pub longest_session: u32,
    #[serde(with = "achievement_flags")]
    pub achievements: BTreeSet<String>,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            total_study_hours: 0,
            total_game_hours: 0,
            total_sessions_completed: 0,
            session_history: Vec::new(),
            level: 1,
            current_exp: 0,
            longest_session: 0,
            achievements: BTreeSet::new(),
        }
    }
}

impl Stats {
    /// Decode a stored record without ever failing.
    ///
    /// Unparseable input yields defaults; within an object each field that is
    /// missing or has the wrong shape falls back to its own default.
    pub fn from_json_lenient(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Self::from_value_lenient(&value),
            Err(err) => {
                tracing::warn!(error = %err, "stored stats are not valid JSON, using defaults");
                Self::default()
            }
        }
    }

    pub fn from_value_lenient(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            tracing::warn!("stored stats are not an object, using defaults");
            return Self::default();
        };

        let session_history = obj
            .get("sessionHistory")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| SessionRecord::deserialize(entry).ok())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            total_study_hours: field(obj, "totalStudyHours"),
            total_game_hours: field(obj, "totalGameHours"),
            total_sessions_completed: field(obj, "totalSessionsCompleted"),
            session_history,
            level: field::<u32>(obj, "level").max(1),
            current_exp: field(obj, "currentExp"),
            longest_session: field(obj, "longestSession"),
            achievements: obj
                .get("achievements")
                .map(achievement_flags::from_value)
                .unwrap_or_default(),
        }
    }

    pub fn total_hours(&self) -> u32 {
        self.total_study_hours.saturating_add(self.total_game_hours)
    }

    /// Share of all logged hours that were game hours, to one decimal place.
    pub fn game_percentage(&self) -> f64 {
        percentage(self.total_game_hours, self.total_hours())
    }

    pub fn exp_to_next_level(&self) -> u64 {
        experience_required(self.level)
    }

    /// Fraction of the current level already earned, in `[0, 1)`.
    pub fn exp_progress(&self) -> f64 {
        self.current_exp as f64 / self.exp_to_next_level() as f64
    }

    pub fn rank(&self) -> Rank {
        Rank::for_level(self.level)
    }

    pub fn has_achievement(&self, achievement: Achievement) -> bool {
        self.achievements.contains(achievement.id())
    }

    /// History, most recent session first.
    pub fn recent_history(&self) -> impl Iterator<Item = &SessionRecord> {
        self.session_history.iter().rev()
    }

    pub fn average_session_hours(&self) -> Option<f64> {
        let totals: Vec<f64> = self
            .session_history
            .iter()
            .map(|r| f64::from(r.total_hours()))
            .collect();
        mean(&totals)
    }
}

fn field<T: DeserializeOwned + Default>(obj: &Map<String, Value>, key: &str) -> T {
    obj.get(key)
        .and_then(|v| T::deserialize(v).ok())
        .unwrap_or_default()
}

/// Achievements are stored as `{"id": true}` flags; a plain list of ids is
/// also accepted on the way in.
mod achievement_flags {
    use std::collections::BTreeSet;

    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(set: &BTreeSet<String>, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(set.len()))?;
        for id in set {
            map.serialize_entry(id, &true)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeSet<String>, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(from_value(&value))
    }

    pub fn from_value(value: &Value) -> BTreeSet<String> {
        match value {
            Value::Object(flags) => flags
                .iter()
                .filter(|(_, unlocked)| unlocked.as_bool() == Some(true))
                .map(|(id, _)| id.clone())
                .collect(),
            Value::Array(ids) => ids
                .iter()
                .filter_map(|id| id.as_str().map(str::to_string))
                .collect(),
            _ => BTreeSet::new(),
        }
    }
}
