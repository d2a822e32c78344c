//! Role mapping configuration.
//!
//! A `RoleConfig` tells every operation which column plays which role and
//! which event names are targets. It is a plain value passed into each call;
//! nothing in the crate holds configuration as ambient state.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrajectoryError};

/// Default entity column name.
pub const DEFAULT_INDEX_COL: &str = "user_pseudo_id";
/// Default event column name.
pub const DEFAULT_EVENT_COL: &str = "event_name";
/// Default timestamp column name.
pub const DEFAULT_EVENT_TIME_COL: &str = "event_timestamp";

/// Mapping from logical roles to column names and event values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Entity identifier column.
    #[serde(default = "default_index_col")]
    pub index_col: String,
    /// Event name column.
    #[serde(default = "default_event_col")]
    pub event_col: String,
    /// Event timestamp column.
    #[serde(default = "default_event_time_col")]
    pub event_time_col: String,
    /// Event counted as a positive outcome.
    #[serde(default)]
    pub positive_target_event: Option<String>,
    /// Event counted as a negative outcome.
    #[serde(default)]
    pub negative_target_event: Option<String>,
    /// Events treated as terminal for accumulation and pruning.
    #[serde(default)]
    pub target_event_list: Vec<String>,
    /// Event where trajectories usually start.
    #[serde(default)]
    pub source_event: Option<String>,
}

fn default_index_col() -> String {
    DEFAULT_INDEX_COL.to_string()
}

fn default_event_col() -> String {
    DEFAULT_EVENT_COL.to_string()
}

fn default_event_time_col() -> String {
    DEFAULT_EVENT_TIME_COL.to_string()
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            index_col: default_index_col(),
            event_col: default_event_col(),
            event_time_col: default_event_time_col(),
            positive_target_event: None,
            negative_target_event: None,
            target_event_list: Vec::new(),
            source_event: None,
        }
    }
}

impl RoleConfig {
    /// Create a config with explicit column roles and no targets.
    pub fn new(
        index_col: impl Into<String>,
        event_col: impl Into<String>,
        event_time_col: impl Into<String>,
    ) -> Self {
        Self {
            index_col: index_col.into(),
            event_col: event_col.into(),
            event_time_col: event_time_col.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a config from JSON.
    pub fn from_json_str(s: &str) -> std::result::Result<Self, ConfigParseError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the positive target event.
    pub fn with_positive_target(mut self, event: impl Into<String>) -> Self {
        self.positive_target_event = Some(event.into());
        self
    }

    /// Set the negative target event.
    pub fn with_negative_target(mut self, event: impl Into<String>) -> Self {
        self.negative_target_event = Some(event.into());
        self
    }

    /// Set the source event.
    pub fn with_source_event(mut self, event: impl Into<String>) -> Self {
        self.source_event = Some(event.into());
        self
    }

    /// Set the target event list.
    pub fn with_target_events(mut self, events: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.target_event_list = events.into_iter().map(|e| e.into()).collect();
        self
    }

    /// Check that every column role is mapped.
    pub fn validate(&self) -> Result<()> {
        if self.index_col.is_empty() {
            return Err(TrajectoryError::MissingRole("index_col"));
        }
        if self.event_col.is_empty() {
            return Err(TrajectoryError::MissingRole("event_col"));
        }
        if self.event_time_col.is_empty() {
            return Err(TrajectoryError::MissingRole("event_time_col"));
        }
        Ok(())
    }

    /// Positive target, or a configuration error when unset.
    pub fn require_positive_target(&self) -> Result<&str> {
        self.positive_target_event
            .as_deref()
            .ok_or(TrajectoryError::MissingRole("positive_target_event"))
    }

    /// Negative target, or a configuration error when unset.
    pub fn require_negative_target(&self) -> Result<&str> {
        self.negative_target_event
            .as_deref()
            .ok_or(TrajectoryError::MissingRole("negative_target_event"))
    }

    /// Whether `event` is listed in `target_event_list`.
    pub fn is_listed_target(&self, event: &str) -> bool {
        self.target_event_list.iter().any(|t| t == event)
    }
}

/// Error when parsing a config document.
#[derive(Debug, thiserror::Error)]
pub enum ConfigParseError {
    /// Malformed JSON.
    #[error("invalid role config JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Parsed but incomplete.
    #[error(transparent)]
    Invalid(#[from] TrajectoryError),
}
