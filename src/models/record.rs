// SPDX-License-Identifier: MIT

//! The per-user remote record and its wire conversions.
//!
//! A user document has one `profile` field plus one top-level field per
//! game category. Each category sub-record carries the personal bests
//! and a bounded, newest-first session history.

use crate::models::GameCategory;
use crate::store::codec::{self, CodecError, TaggedValue, Value};
use crate::store::Document;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Session history bound per category. Oldest entries are dropped first.
pub const MAX_SESSIONS: usize = 30;

/// Personal-bests key seeded on record creation.
const SESSIONS_PLAYED: &str = "sessionsPlayed";

/// Reserved key inside a session's wire map.
const TIMESTAMP_FIELD: &str = "timestamp";

/// A single game metric: numeric or textual.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl MetricValue {
    fn to_value(&self) -> Value {
        match self {
            MetricValue::Number(n) => Value::Number(*n),
            MetricValue::Text(s) => Value::Text(s.clone()),
        }
    }

    /// Metrics are numeric or textual; anything else in the store is
    /// ignored rather than failing the whole record.
    fn from_value(value: &Value) -> Option<MetricValue> {
        match value {
            Value::Number(n) => Some(MetricValue::Number(*n)),
            Value::Text(s) => Some(MetricValue::Text(s.clone())),
            _ => None,
        }
    }
}

/// An immutable snapshot of one completed game session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEntry {
    pub timestamp: DateTime<Utc>,
    pub metrics: BTreeMap<String, MetricValue>,
}

impl SessionEntry {
    pub fn new(timestamp: DateTime<Utc>, metrics: BTreeMap<String, MetricValue>) -> Self {
        Self { timestamp, metrics }
    }

    /// Wire form: a flat map with the reserved `timestamp` key next to
    /// the game-specific metrics.
    fn to_value(&self) -> Value {
        let mut entries = BTreeMap::new();
        entries.insert(TIMESTAMP_FIELD.to_string(), Value::Timestamp(self.timestamp));
        for (key, metric) in &self.metrics {
            entries.insert(key.clone(), metric.to_value());
        }
        Value::Map(entries)
    }

    fn from_value(value: &Value) -> Result<Self, CodecError> {
        let entries = value
            .as_map()
            .ok_or_else(|| CodecError::Malformed("session entry is not a map".to_string()))?;

        let timestamp = entries
            .get(TIMESTAMP_FIELD)
            .and_then(Value::as_timestamp)
            .ok_or_else(|| CodecError::Malformed("session entry has no timestamp".to_string()))?;

        let mut metrics = BTreeMap::new();
        for (key, item) in entries {
            if key == TIMESTAMP_FIELD {
                continue;
            }
            if let Some(metric) = MetricValue::from_value(item) {
                metrics.insert(key.clone(), metric);
            }
        }

        Ok(Self { timestamp, metrics })
    }
}

/// One game category's slice of the user record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameRecord {
    /// Metric name → best value. Replaced wholesale on every write.
    pub personal_bests: BTreeMap<String, MetricValue>,
    /// Session history, newest first, at most [`MAX_SESSIONS`] entries.
    pub sessions: Vec<SessionEntry>,
}

impl GameRecord {
    /// Fresh sub-record as written by the lazy create.
    pub fn empty() -> Self {
        Self {
            personal_bests: BTreeMap::from([(
                SESSIONS_PLAYED.to_string(),
                MetricValue::Number(0.0),
            )]),
            sessions: Vec::new(),
        }
    }

    /// Apply one completed session: prepend, truncate to the bound, and
    /// replace the personal bests wholesale. The caller has already
    /// computed the superseding bests.
    pub fn record_session(&mut self, entry: SessionEntry, bests: BTreeMap<String, MetricValue>) {
        self.sessions.insert(0, entry);
        self.sessions.truncate(MAX_SESSIONS);
        self.personal_bests = bests;
    }

    pub(crate) fn to_value(&self) -> Value {
        let bests = self
            .personal_bests
            .iter()
            .map(|(k, v)| (k.clone(), v.to_value()))
            .collect();
        let sessions = self.sessions.iter().map(SessionEntry::to_value).collect();

        Value::Map(BTreeMap::from([
            ("personalBests".to_string(), Value::Map(bests)),
            ("sessions".to_string(), Value::Array(sessions)),
        ]))
    }

    /// Wire form of this sub-record, ready for a field-masked write.
    pub(crate) fn to_tagged(&self) -> Result<TaggedValue, CodecError> {
        codec::encode(&self.to_value())
    }

    fn from_value(value: &Value) -> Result<Self, CodecError> {
        let entries = value
            .as_map()
            .ok_or_else(|| CodecError::Malformed("game sub-record is not a map".to_string()))?;

        let mut personal_bests = BTreeMap::new();
        if let Some(bests) = entries.get("personalBests").and_then(Value::as_map) {
            for (key, item) in bests {
                if let Some(metric) = MetricValue::from_value(item) {
                    personal_bests.insert(key.clone(), metric);
                }
            }
        }

        let mut sessions = Vec::new();
        match entries.get("sessions") {
            Some(Value::Array(items)) => {
                for item in items {
                    sessions.push(SessionEntry::from_value(item)?);
                }
            }
            Some(other) if !other.is_absent() => {
                return Err(CodecError::Malformed(
                    "session history is not an array".to_string(),
                ));
            }
            _ => {}
        }

        Ok(Self {
            personal_bests,
            sessions,
        })
    }
}

/// Profile view carried by auth-state notifications.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub user_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Profile slice of the remote record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileRecord {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl ProfileRecord {
    fn to_value(&self) -> Value {
        let mut entries = BTreeMap::new();
        if let Some(email) = &self.email {
            entries.insert("email".to_string(), Value::Text(email.clone()));
        }
        if let Some(name) = &self.display_name {
            entries.insert("displayName".to_string(), Value::Text(name.clone()));
        }
        if let Some(url) = &self.photo_url {
            entries.insert("photoUrl".to_string(), Value::Text(url.clone()));
        }
        if let Some(ts) = self.created_at {
            entries.insert("createdAt".to_string(), Value::Timestamp(ts));
        }
        Value::Map(entries)
    }

    fn from_value(value: &Value) -> Result<Self, CodecError> {
        let entries = match value {
            Value::Absent => return Ok(Self::default()),
            Value::Map(entries) => entries,
            _ => {
                return Err(CodecError::Malformed(
                    "profile field is not a map".to_string(),
                ))
            }
        };

        let text = |name: &str| {
            entries
                .get(name)
                .and_then(Value::as_text)
                .map(str::to_string)
        };

        Ok(Self {
            email: text("email"),
            display_name: text("displayName"),
            photo_url: text("photoUrl"),
            created_at: entries.get("createdAt").and_then(Value::as_timestamp),
        })
    }
}

/// The remote, durable representation of one user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    /// Opaque identifier issued by the identity provider; also the
    /// document id.
    pub user_id: String,
    pub profile: ProfileRecord,
    pub games: BTreeMap<GameCategory, GameRecord>,
}

impl UserRecord {
    /// Fresh record for a first-time user: profile plus one empty
    /// sub-record per known category.
    pub fn new(user_id: String, profile: ProfileRecord) -> Self {
        let games = GameCategory::ALL
            .into_iter()
            .map(|category| (category, GameRecord::empty()))
            .collect();

        Self {
            user_id,
            profile,
            games,
        }
    }

    /// The sub-record for a category, empty if the store holds none.
    pub fn game(&self, category: GameCategory) -> GameRecord {
        self.games.get(&category).cloned().unwrap_or_default()
    }

    /// Full wire field map, for the lazy create.
    pub fn to_fields(&self) -> Result<BTreeMap<String, TaggedValue>, CodecError> {
        let mut entries = BTreeMap::new();
        entries.insert("profile".to_string(), self.profile.to_value());
        for (category, game) in &self.games {
            entries.insert(category.field_name().to_string(), game.to_value());
        }
        codec::encode_fields(&entries)
    }

    /// Decode a store document. Categories the document omits decode to
    /// empty sub-records; unknown top-level fields are ignored.
    pub fn from_document(user_id: &str, document: &Document) -> Result<Self, CodecError> {
        let profile = ProfileRecord::from_value(&codec::field(&document.fields, "profile")?)?;

        let mut games = BTreeMap::new();
        for category in GameCategory::ALL {
            let value = codec::field(&document.fields, category.field_name())?;
            let game = if value.is_absent() {
                GameRecord::default()
            } else {
                GameRecord::from_value(&value)?
            };
            games.insert(category, game);
        }

        Ok(Self {
            user_id: user_id.to_string(),
            profile,
            games,
        })
    }
}
