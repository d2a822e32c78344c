//! The immutable event log.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::config::RoleConfig;
use super::event::{Column, EventRecord};
use crate::error::{Result, TrajectoryError};

/// An owned, immutable table of events.
///
/// Rows keep their insertion order; operations that need chronology work on
/// [`EventLog::chronological`], which is stable with respect to that order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<EventRecord>", into = "Vec<EventRecord>")]
pub struct EventLog {
    records: Vec<EventRecord>,
    attr_columns: BTreeSet<String>,
}

impl EventLog {
    /// Build a log from records.
    pub fn new(records: Vec<EventRecord>) -> Self {
        let attr_columns = records
            .iter()
            .flat_map(|r| r.attrs.keys().cloned())
            .collect();
        Self {
            records,
            attr_columns,
        }
    }

    /// All rows in insertion order.
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Names of auxiliary columns seen on any row.
    pub fn attr_columns(&self) -> &BTreeSet<String> {
        &self.attr_columns
    }

    /// Resolve a column name through the role config.
    pub fn resolve_column(&self, name: &str, config: &RoleConfig) -> Result<Column> {
        if name == config.index_col {
            Ok(Column::Entity)
        } else if name == config.event_col {
            Ok(Column::Event)
        } else if name == config.event_time_col {
            Ok(Column::Timestamp)
        } else if self.attr_columns.contains(name) {
            Ok(Column::Attr(name.to_string()))
        } else {
            Err(TrajectoryError::UnknownColumn(name.to_string()))
        }
    }

    /// Rows sorted by (entity, timestamp), ties kept in insertion order.
    pub fn chronological(&self) -> Vec<&EventRecord> {
        let mut rows: Vec<&EventRecord> = self.records.iter().collect();
        rows.sort_by(|a, b| {
            a.entity_id
                .cmp(&b.entity_id)
                .then_with(|| a.timestamp.cmp(&b.timestamp))
        });
        rows
    }

    /// Occurrence count per event name.
    pub fn event_counts(&self) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.event.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Distinct event names, sorted.
    pub fn event_names(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.event.as_str()).collect()
    }

    /// Number of distinct non-missing values of a column.
    pub fn distinct_count(&self, column: &Column) -> usize {
        self.records
            .iter()
            .filter_map(|r| r.value(column))
            .collect::<BTreeSet<_>>()
            .len()
    }
}

impl From<Vec<EventRecord>> for EventLog {
    fn from(records: Vec<EventRecord>) -> Self {
        Self::new(records)
    }
}

impl From<EventLog> for Vec<EventRecord> {
    fn from(log: EventLog) -> Self {
        log.records
    }
}

impl FromIterator<EventRecord> for EventLog {
    fn from_iter<I: IntoIterator<Item = EventRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
