//! Session segmentation.
//!
//! Splits each entity's chronological stream into sessions, either by an
//! inactivity gap or by a marker event, and labels every row
//! `<entity_id>_<ordinal>`.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrajectoryError};
use crate::shift::shift_rows;
use crate::types::{EventLog, EventRecord, RoleConfig};

/// Default inactivity gap, in seconds, that ends a session.
pub const DEFAULT_SESSION_GAP_SECS: f64 = 1800.0;

/// Default name of the session label column.
pub const DEFAULT_SESSION_COL: &str = "session_id";

/// Parameters for [`sessions`].
///
/// `by_event` selects marker mode and takes precedence over `thresh`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionParams {
    /// Event that opens a new session.
    pub by_event: Option<String>,
    /// Gap in seconds strictly above which a new session starts.
    pub thresh: Option<f64>,
    /// Synthetic event appended at the end of each gap-closed session.
    pub eos_event: Option<String>,
    /// Name of the label column.
    pub session_col: String,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            by_event: None,
            thresh: Some(DEFAULT_SESSION_GAP_SECS),
            eos_event: None,
            session_col: DEFAULT_SESSION_COL.to_string(),
        }
    }
}

impl SessionParams {
    /// Gap mode with the given threshold in seconds.
    pub fn by_gap(thresh_secs: f64) -> Self {
        Self {
            thresh: Some(thresh_secs),
            ..Self::default()
        }
    }

    /// Marker mode on `event`.
    pub fn by_event(event: impl Into<String>) -> Self {
        Self {
            by_event: Some(event.into()),
            thresh: None,
            ..Self::default()
        }
    }

    /// Append an end-of-session event in gap mode.
    pub fn with_eos_event(mut self, event: impl Into<String>) -> Self {
        self.eos_event = Some(event.into());
        self
    }

    /// Name the label column.
    pub fn with_session_col(mut self, column: impl Into<String>) -> Self {
        self.session_col = column.into();
        self
    }
}

/// A row with its session label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// The row; a copy of the closing row for synthetic end-of-session rows.
    pub record: EventRecord,
    /// Zero-based session ordinal within the entity.
    pub ordinal: u32,
    /// `<entity_id>_<ordinal>`.
    pub session_id: String,
    /// Whether the row was synthesized as an end-of-session marker.
    pub synthetic: bool,
}

/// A session-labeled event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLog {
    /// Name of the label column.
    pub session_col: String,
    /// Rows in (entity, session, time) order.
    pub rows: Vec<SessionEvent>,
}

impl SessionLog {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct session labels in row order.
    pub fn session_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for row in &self.rows {
            if ids.last() != Some(&row.session_id.as_str()) {
                ids.push(&row.session_id);
            }
        }
        ids
    }

    /// Event names of one session, in order.
    pub fn session_events(&self, session_id: &str) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|r| r.session_id == session_id)
            .map(|r| r.record.event.as_str())
            .collect()
    }

    /// Fold the label into an auxiliary column named `session_col`.
    pub fn into_event_log(self) -> EventLog {
        let column = self.session_col;
        self.rows
            .into_iter()
            .map(|row| row.record.with_attr(column.clone(), row.session_id))
            .collect()
    }
}

/// Label every row of `log` with its session.
///
/// Gap mode: the first row of an entity is in session 0; a gap strictly
/// above `thresh` to the next row starts a new session at that next row.
/// With `eos_event` set, existing rows of that event are dropped first and a
/// copy of each session's last row, renamed to `eos_event` and moved one
/// second later, closes every gap-ended session.
///
/// Marker mode: the ordinal is the running count of `by_event` rows,
/// including the current one, so a marker opens its session.
pub fn sessions(log: &EventLog, config: &RoleConfig, params: &SessionParams) -> Result<SessionLog> {
    config.validate()?;

    let rows = match (&params.by_event, params.thresh) {
        (Some(marker), _) => split_by_event(log, marker),
        (None, Some(thresh)) => split_by_gap(log, thresh, params.eos_event.as_deref()),
        (None, None) => return Err(TrajectoryError::MissingSessionRule),
    };

    tracing::debug!(
        rows = rows.len(),
        synthetic = rows.iter().filter(|r| r.synthetic).count(),
        mode = if params.by_event.is_some() { "event" } else { "gap" },
        "split sessions"
    );

    Ok(SessionLog {
        session_col: params.session_col.clone(),
        rows,
    })
}

fn label(record: EventRecord, ordinal: u32, synthetic: bool) -> SessionEvent {
    let session_id = format!("{}_{}", record.entity_id, ordinal);
    SessionEvent {
        record,
        ordinal,
        session_id,
        synthetic,
    }
}

fn split_by_event(log: &EventLog, marker: &str) -> Vec<SessionEvent> {
    let mut out = Vec::with_capacity(log.len());
    let mut entity: Option<&str> = None;
    let mut ordinal = 0;

    for record in log.chronological() {
        if entity != Some(record.entity_id.as_str()) {
            entity = Some(&record.entity_id);
            ordinal = 0;
        }
        if record.event == marker {
            ordinal += 1;
        }
        out.push(label(record.clone(), ordinal, false));
    }
    out
}

fn split_by_gap(log: &EventLog, thresh: f64, eos_event: Option<&str>) -> Vec<SessionEvent> {
    let rows: Vec<&EventRecord> = log
        .chronological()
        .into_iter()
        .filter(|r| eos_event != Some(r.event.as_str()))
        .collect();

    let mut out = Vec::with_capacity(rows.len());
    let mut eos_rows = Vec::new();
    let mut ordinal = 0;
    let mut previous_closed = false;

    for (i, row) in shift_rows(&rows).into_iter().enumerate() {
        let first_of_entity = i == 0 || rows[i - 1].entity_id != row.record.entity_id;
        if first_of_entity {
            ordinal = 0;
        } else if previous_closed {
            ordinal += 1;
        }

        let closes = row.gap_seconds().is_some_and(|gap| gap > thresh);
        if closes {
            if let Some(eos) = eos_event {
                let mut marker = row.record.clone();
                marker.event = eos.to_string();
                marker.timestamp += Duration::seconds(1);
                eos_rows.push(label(marker, ordinal, true));
            }
        }
        previous_closed = closes;
        out.push(label(row.record.clone(), ordinal, false));
    }

    if !eos_rows.is_empty() {
        out.extend(eos_rows);
        // A synthetic row stays in the session it closes even when the next
        // session starts within a second; stable on equal timestamps.
        out.sort_by(|a, b| {
            a.record
                .entity_id
                .cmp(&b.record.entity_id)
                .then_with(|| a.ordinal.cmp(&b.ordinal))
                .then_with(|| a.record.timestamp.cmp(&b.record.timestamp))
        });
    }
    out
}
