//! Bounded, newest-first activity log

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::ledger::Asset;

/// Entries kept in the vault; older ones are evicted
pub const ACTIVITY_CAPACITY: usize = 100;

/// Entries returned when the caller gives no limit
pub const DEFAULT_READ_LIMIT: usize = 40;

/// Largest read limit honoured
pub const MAX_READ_LIMIT: usize = 200;

/// Status recorded on every local send
pub const SEND_STATUS: &str = "broadcasted";

/// Kind-specific fields of an activity entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ActivityKind {
    Bootstrap {
        message: String,
    },
    Import {
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    Send {
        asset: Asset,
        amount: Decimal,
        to: String,
        memo: String,
        tx_ref: String,
        status: String,
    },
    #[serde(rename_all = "camelCase")]
    Swap {
        from_asset: Asset,
        to_asset: Asset,
        amount: Decimal,
        receive: Decimal,
        fee: Decimal,
        rate: Decimal,
        swap_ref: String,
    },
}

impl ActivityKind {
    pub fn name(&self) -> &'static str {
        match self {
            ActivityKind::Bootstrap { .. } => "bootstrap",
            ActivityKind::Import { .. } => "import",
            ActivityKind::Send { .. } => "send",
            ActivityKind::Swap { .. } => "swap",
        }
    }
}

/// Immutable record of a completed operation
///
/// Written with a `kind` tag; entries from older vaults tagged `type` are
/// accepted on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct ActivityEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: ActivityKind,
}

#[derive(Deserialize)]
struct StoredEntry {
    id: Uuid,
    timestamp: DateTime<Utc>,
    #[serde(flatten)]
    kind: ActivityKind,
}

impl TryFrom<Map<String, Value>> for ActivityEntry {
    type Error = serde_json::Error;

    fn try_from(mut raw: Map<String, Value>) -> Result<Self, Self::Error> {
        if !raw.contains_key("kind") {
            if let Some(tag) = raw.remove("type") {
                raw.insert("kind".to_string(), tag);
            }
        }

        let stored: StoredEntry = serde_json::from_value(Value::Object(raw))?;
        Ok(Self {
            id: stored.id,
            timestamp: stored.timestamp,
            kind: stored.kind,
        })
    }
}

/// Activity entries, newest first, never longer than [`ACTIVITY_CAPACITY`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityLog {
    entries: VecDeque<ActivityEntry>,
}

impl ActivityLog {
    /// Prepend a fresh entry and evict anything past capacity
    pub fn record(&mut self, kind: ActivityKind, timestamp: DateTime<Utc>) -> &ActivityEntry {
        self.entries.push_front(ActivityEntry {
            id: Uuid::new_v4(),
            timestamp,
            kind,
        });
        self.entries.truncate(ACTIVITY_CAPACITY);
        &self.entries[0]
    }

    /// Up to `limit` newest entries; `limit` is clamped to `1..=200`
    pub fn recent(&self, limit: usize) -> Vec<ActivityEntry> {
        let limit = limit.clamp(1, MAX_READ_LIMIT);
        self.entries.iter().take(limit).cloned().collect()
    }

    pub fn latest(&self) -> Option<&ActivityEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter()
    }
}
