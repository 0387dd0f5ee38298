// SPDX-License-Identifier: MIT

//! One-shot migration of legacy locally-stored game records into the
//! remote document.
//!
//! Best-effort and rollback-free: a legacy record is deleted only after
//! the remote write is confirmed, so a failed migration is safely
//! retriable later. Personal bests are merged with whatever the remote
//! record already holds rather than blindly overwritten.

use crate::models::{GameCategory, GameRecord, MetricValue, SessionEntry};
use crate::storage::KeyValueStorage;
use crate::sync::DocumentSync;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Legacy field holding the last-played timestamp.
const LAST_PLAYED: &str = "lastPlayed";

/// A legacy record detected in local storage.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyRecordRef {
    pub category: GameCategory,
    pub source_key: String,
}

/// Migration runner over the legacy local storage area.
pub struct MigrationRunner {
    sync: DocumentSync,
    local: Arc<dyn KeyValueStorage>,
}

impl MigrationRunner {
    pub fn new(sync: DocumentSync, local: Arc<dyn KeyValueStorage>) -> Self {
        Self { sync, local }
    }

    /// Scan the fixed set of legacy keys, yielding one entry per key
    /// present. Lazy, finite, and restartable.
    pub fn detect_legacy_records(&self) -> impl Iterator<Item = LegacyRecordRef> + '_ {
        GameCategory::ALL.into_iter().filter_map(move |category| {
            let source_key = category.legacy_key();
            self.local.get(&source_key).map(|_| LegacyRecordRef {
                category,
                source_key,
            })
        })
    }

    /// Migrate one legacy record into the remote document.
    ///
    /// Returns `false` without raising on any parse or sync failure,
    /// leaving the legacy record intact for a future retry. A missing
    /// key returns `false` without any network call.
    pub async fn migrate_one(&self, category: GameCategory, source_key: &str) -> bool {
        let Some(raw) = self.local.get(source_key) else {
            tracing::debug!(key = source_key, "No legacy record to migrate");
            return false;
        };

        let Some((entry, legacy_values)) = parse_legacy_record(&raw) else {
            tracing::warn!(key = source_key, "Legacy record is unparsable, leaving in place");
            return false;
        };

        // Read the current remote state so existing bests survive the
        // wholesale replacement update_game_record performs.
        let record = match self.sync.read_user_record().await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(key = source_key, error = %e, "Migration read failed");
                return false;
            }
        };

        let bests = merge_bests(&legacy_values, &record.game(category));

        match self.sync.update_game_record(category, entry, bests).await {
            Ok(()) => {
                self.local.remove(source_key);
                tracing::info!(key = source_key, category = %category, "Legacy record migrated");
                true
            }
            Err(e) => {
                tracing::warn!(key = source_key, error = %e, "Migration write failed");
                false
            }
        }
    }

    /// Detect and migrate every legacy record, returning the number of
    /// successful migrations.
    pub async fn migrate_all(&self) -> usize {
        let detected: Vec<LegacyRecordRef> = self.detect_legacy_records().collect();

        let mut migrated = 0;
        for legacy in detected {
            if self.migrate_one(legacy.category, &legacy.source_key).await {
                migrated += 1;
            }
        }
        migrated
    }
}

/// Parse a legacy record into a session entry plus its best-value fields.
///
/// The timestamp comes from the `lastPlayed` field; the remaining scalar
/// fields are copied verbatim as both session metrics and candidate
/// bests. A record with no parsable `lastPlayed` is rejected.
fn parse_legacy_record(raw: &str) -> Option<(SessionEntry, BTreeMap<String, MetricValue>)> {
    let parsed: serde_json::Value = serde_json::from_str(raw).ok()?;
    let object = parsed.as_object()?;

    let timestamp = object.get(LAST_PLAYED).and_then(parse_legacy_timestamp)?;

    let mut values = BTreeMap::new();
    for (key, item) in object {
        if key == LAST_PLAYED {
            continue;
        }
        match item {
            serde_json::Value::Number(n) => {
                if let Some(n) = n.as_f64() {
                    values.insert(key.clone(), MetricValue::Number(n));
                }
            }
            serde_json::Value::String(s) => {
                values.insert(key.clone(), MetricValue::Text(s.clone()));
            }
            _ => {}
        }
    }

    let entry = SessionEntry::new(timestamp, values.clone());
    Some((entry, values))
}

/// Legacy timestamps appear as RFC 3339 strings, bare dates, or Unix
/// epoch milliseconds depending on which game wrote them.
fn parse_legacy_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => {
            if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                return Some(ts.with_timezone(&Utc));
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()?
                .and_hms_opt(0, 0, 0)
                .map(|naive| naive.and_utc())
        }
        serde_json::Value::Number(n) => DateTime::from_timestamp_millis(n.as_i64()?),
        _ => None,
    }
}

/// Overlay legacy values onto the remote bests; a numeric conflict keeps
/// the larger value so neither side's best regresses.
fn merge_bests(
    legacy: &BTreeMap<String, MetricValue>,
    remote: &GameRecord,
) -> BTreeMap<String, MetricValue> {
    let mut merged = remote.personal_bests.clone();
    for (key, value) in legacy {
        match (merged.get(key), value) {
            (Some(MetricValue::Number(current)), MetricValue::Number(candidate))
                if candidate <= current => {}
            _ => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}
