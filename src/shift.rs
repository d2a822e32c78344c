//! Pairs every event with its chronological successor.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::types::{EventLog, EventRecord, RoleConfig};

/// An event row together with the next row of the same entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftedEvent<'a> {
    /// The original row.
    pub record: &'a EventRecord,
    /// Event name of the next row, `None` for the entity's last row.
    pub next_event: Option<&'a str>,
    /// Timestamp of the next row.
    pub next_timestamp: Option<DateTime<Utc>>,
}

impl ShiftedEvent<'_> {
    /// Seconds until the next event, if any, at microsecond resolution.
    pub fn gap_seconds(&self) -> Option<f64> {
        self.next_timestamp.map(|next| {
            let gap = next - self.record.timestamp;
            match gap.num_microseconds() {
                Some(us) => us as f64 / 1_000_000.0,
                None => gap.num_milliseconds() as f64 / 1_000.0,
            }
        })
    }
}

/// Shift every row of `log` against its successor.
///
/// Rows come back in (entity, time) order. Fails only when the config leaves
/// a column role unmapped.
pub fn shifted<'a>(log: &'a EventLog, config: &RoleConfig) -> Result<Vec<ShiftedEvent<'a>>> {
    config.validate()?;
    Ok(shift_rows(&log.chronological()))
}

/// Shift rows that are already in (entity, time) order.
pub(crate) fn shift_rows<'a>(rows: &[&'a EventRecord]) -> Vec<ShiftedEvent<'a>> {
    rows.iter()
        .copied()
        .enumerate()
        .map(|(i, record)| {
            let next = rows
                .get(i + 1)
                .copied()
                .filter(|next| next.entity_id == record.entity_id);
            ShiftedEvent {
                record,
                next_event: next.map(|n| n.event.as_str()),
                next_timestamp: next.map(|n| n.timestamp),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_next_event_within_entity() {
        let log = EventLog::new(vec![
            EventRecord::new("u1", "b", at(20)),
            EventRecord::new("u2", "x", at(0)),
            EventRecord::new("u1", "a", at(10)),
        ]);
        let rows = shifted(&log, &RoleConfig::default()).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].record.event, "a");
        assert_eq!(rows[0].next_event, Some("b"));
        assert_eq!(rows[0].gap_seconds(), Some(10.0));
        assert_eq!(rows[1].next_event, None);
        assert_eq!(rows[2].record.entity_id, "u2");
        assert_eq!(rows[2].next_timestamp, None);
    }

    #[test]
    fn test_gap_keeps_microseconds() {
        let start = at(0);
        let log = EventLog::new(vec![
            EventRecord::new("u1", "a", start),
            EventRecord::new("u1", "b", start + chrono::Duration::microseconds(1_500)),
        ]);
        let rows = shifted(&log, &RoleConfig::default()).unwrap();
        assert_eq!(rows[0].gap_seconds(), Some(0.0015));
    }

    #[test]
    fn test_empty_log() {
        assert!(shifted(&EventLog::default(), &RoleConfig::default()).unwrap().is_empty());
    }
}
