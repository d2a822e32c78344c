//! Event log fingerprints.
//!
//! A `LogSnapshot` identifies the exact log a derived table was computed
//! from. Two logs holding the same rows produce the same `snapshot_id`
//! regardless of the order the rows were supplied in, as long as ties within
//! an entity keep their relative order.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use crate::types::EventLog;
use crate::TRAJECTORY_KERNEL_SCHEMA_VERSION;

/// A deterministic fingerprint of an event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSnapshot {
    /// xxh64 over all components below.
    pub snapshot_id: String,
    /// Number of rows.
    pub row_count: u64,
    /// Number of distinct entities.
    pub entity_count: u64,
    /// Number of distinct event names.
    pub event_count: u64,
    /// Latest timestamp in milliseconds since the epoch, 0 for an empty log.
    pub max_timestamp_ms: i64,
    /// Schema version of the row types.
    pub schema_version: String,
    /// Hash of the rows in chronological order.
    pub row_hash: String,
}

/// Internal struct for computing the snapshot_id hash.
#[derive(Serialize)]
struct SnapshotIdInput<'a> {
    row_count: u64,
    entity_count: u64,
    event_count: u64,
    max_timestamp_ms: i64,
    schema_version: &'a str,
    row_hash: &'a str,
}

#[derive(Serialize)]
struct CanonicalRow<'a> {
    entity_id: &'a str,
    event: &'a str,
    timestamp_us: i64,
    attrs: &'a std::collections::BTreeMap<String, String>,
}

impl LogSnapshot {
    /// Compute the snapshot of a log.
    pub fn compute(log: &EventLog) -> Self {
        let rows: Vec<CanonicalRow<'_>> = log
            .chronological()
            .into_iter()
            .map(|r| CanonicalRow {
                entity_id: &r.entity_id,
                event: &r.event,
                timestamp_us: r.timestamp.timestamp_micros(),
                attrs: &r.attrs,
            })
            .collect();
        let row_hash = canonical_hash_hex(&rows);

        let row_count = rows.len() as u64;
        let entity_count = rows.iter().map(|r| r.entity_id).collect::<BTreeSet<_>>().len() as u64;
        let event_count = log.event_names().len() as u64;
        let max_timestamp_ms = rows
            .iter()
            .map(|r| r.timestamp_us.div_euclid(1_000))
            .max()
            .unwrap_or(0);

        let snapshot_id = canonical_hash_hex(&SnapshotIdInput {
            row_count,
            entity_count,
            event_count,
            max_timestamp_ms,
            schema_version: TRAJECTORY_KERNEL_SCHEMA_VERSION,
            row_hash: &row_hash,
        });

        Self {
            snapshot_id,
            row_count,
            entity_count,
            event_count,
            max_timestamp_ms,
            schema_version: TRAJECTORY_KERNEL_SCHEMA_VERSION.to_string(),
            row_hash,
        }
    }

    /// Whether this snapshot was taken from `log`.
    pub fn verify(&self, log: &EventLog) -> bool {
        Self::compute(log).snapshot_id == self.snapshot_id
    }
}
