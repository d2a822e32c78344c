//! Event rows and column resolution.

use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One row of an event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Entity the event belongs to (user, device, ...).
    pub entity_id: String,
    /// Event name.
    pub event: String,
    /// When the event happened.
    pub timestamp: DateTime<Utc>,
    /// Auxiliary columns (secondary grouping keys and the like).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
}

impl EventRecord {
    /// Create a new record without auxiliary columns.
    pub fn new(
        entity_id: impl Into<String>,
        event: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            event: event.into(),
            timestamp,
            attrs: BTreeMap::new(),
        }
    }

    /// Set an auxiliary column.
    pub fn with_attr(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(column.into(), value.into());
        self
    }

    /// Value of a resolved column, `None` when an auxiliary value is absent.
    pub fn value<'a>(&'a self, column: &Column) -> Option<Cow<'a, str>> {
        match column {
            Column::Entity => Some(Cow::Borrowed(self.entity_id.as_str())),
            Column::Event => Some(Cow::Borrowed(self.event.as_str())),
            Column::Timestamp => Some(Cow::Owned(
                self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            )),
            Column::Attr(name) => self.attrs.get(name).map(|v| Cow::Borrowed(v.as_str())),
        }
    }
}

/// A column name resolved against a role config and log schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Column {
    /// The `index_col` role.
    Entity,
    /// The `event_col` role.
    Event,
    /// The `event_time_col` role.
    Timestamp,
    /// An auxiliary column.
    Attr(String),
}
