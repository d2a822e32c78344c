//! Rank assignment for forward and target-conditioned reverse alignment.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::error::{Result, TrajectoryError};
use crate::shift::ShiftedEvent;
use crate::types::Column;

/// An event row with its cohort key and ordinal rank.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEvent<'a> {
    /// Event name.
    pub event: &'a str,
    /// Value of the weighting column.
    pub key: Cow<'a, str>,
    /// 1-based rank; distance to the target in reverse mode.
    pub rank: u32,
    /// Seconds to the entity's next event, if any.
    pub gap_seconds: Option<f64>,
}

/// Rank rows by their position within their key's chronological stream.
///
/// `rows` must be in (entity, time) order. Rows without a key value are
/// dropped.
pub fn rank_forward<'a>(rows: &[ShiftedEvent<'a>], key_col: &Column) -> Vec<RankedEvent<'a>> {
    let mut seen: BTreeMap<Cow<'a, str>, u32> = BTreeMap::new();
    rows.iter()
        .filter_map(|row| {
            let key = row.record.value(key_col)?;
            let rank = seen.entry(key.clone()).or_insert(0);
            *rank += 1;
            Some(RankedEvent {
                event: row.record.event.as_str(),
                key,
                rank: *rank,
                gap_seconds: row.gap_seconds(),
            })
        })
        .collect()
}

/// Re-rank forward-ranked rows backwards from target occurrences.
///
/// Each key's stream is cut right after every target occurrence, so a target
/// row closes the segment it belongs to. Segments whose last row is not a
/// target are dropped. Within a kept segment the target row gets rank 1 and
/// ranks grow towards the segment start.
///
/// Fails with [`TrajectoryError::MissingTarget`] when no segment is kept.
pub fn align_reverse<'a>(ranked: Vec<RankedEvent<'a>>, targets: &[&str]) -> Result<Vec<RankedEvent<'a>>> {
    let mut by_key: BTreeMap<Cow<'a, str>, Vec<RankedEvent<'a>>> = BTreeMap::new();
    for row in ranked {
        by_key.entry(row.key.clone()).or_default().push(row);
    }

    let mut aligned = Vec::new();
    for (_, stream) in by_key {
        let mut segment: Vec<RankedEvent<'a>> = Vec::new();
        for row in stream {
            let is_target = targets.contains(&row.event);
            segment.push(row);
            if is_target {
                close_segment(&mut segment, &mut aligned);
            }
        }
        // Trailing rows never reached a target and are dropped.
    }

    if aligned.is_empty() {
        return Err(TrajectoryError::MissingTarget(targets.join(", ")));
    }
    Ok(aligned)
}

fn close_segment<'a>(segment: &mut Vec<RankedEvent<'a>>, out: &mut Vec<RankedEvent<'a>>) {
    let max_rank = segment.iter().map(|r| r.rank).max().unwrap_or(0);
    out.extend(segment.drain(..).map(|mut row| {
        row.rank = max_rank - row.rank + 1;
        row
    }));
}
