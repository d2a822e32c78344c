//! Step matrix: cohort occupancy by ordinal step.
//!
//! A step matrix answers "what share of the cohort was at event X on step k".
//! It comes in two alignments:
//!
//! - **Forward**: steps count from the start of each trajectory.
//! - **Reverse**: steps count backwards from a positive and/or negative
//!   target event, using only trajectory segments that end in that target.
//!
//! Forward matrices also carry one `"Accumulated <target>"` row per listed
//! target, holding the share that had already reached it before each step.

pub mod alignment;
pub mod engine;
pub mod matrix;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrajectoryError};
use crate::types::RoleConfig;

pub use engine::step_matrix;
pub use matrix::{StepMatrix, ACCUMULATED_PREFIX, ACCUMULATED_WORD};

/// Default cap on the number of step columns.
pub const DEFAULT_MAX_STEPS: usize = 30;

/// Which configured target a reverse matrix aligns on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    /// `positive_target_event`.
    #[serde(rename = "pos")]
    Positive,
    /// `negative_target_event`.
    #[serde(rename = "neg")]
    Negative,
}

impl TargetKind {
    /// Event name this kind maps to under `config`.
    pub fn resolve(self, config: &RoleConfig) -> Result<&str> {
        match self {
            Self::Positive => config.require_positive_target(),
            Self::Negative => config.require_negative_target(),
        }
    }
}

impl FromStr for TargetKind {
    type Err = TrajectoryError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pos" => Ok(Self::Positive),
            "neg" => Ok(Self::Negative),
            other => Err(TrajectoryError::UnknownReverseTarget(other.to_string())),
        }
    }
}

/// Parameters for [`step_matrix`].
///
/// ## Parameters
///
/// - `max_steps`: highest rank kept as a column; 0 keeps all
/// - `weight_col`: cohort key; falls back to `index_col`, then to the
///   config's `index_col`
/// - `reverse`: targets to align on; empty means forward alignment
/// - `sorting`: apply the dominance ordering to rows
/// - `thr`: prune rows whose values all fall below it (0 disables)
/// - `with_dt_means`: also report mean seconds to the next event per column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepMatrixParams {
    /// Highest rank kept as a column.
    pub max_steps: usize,
    /// Column whose distinct values form the cohort.
    pub weight_col: Option<String>,
    /// Cohort column used when `weight_col` is unset.
    pub index_col: Option<String>,
    /// Targets for reverse alignment.
    #[serde(default)]
    pub reverse: Vec<TargetKind>,
    /// Whether to sort rows by dominance.
    pub sorting: bool,
    /// Pruning threshold.
    pub thr: f64,
    /// Whether to compute per-column mean gaps.
    #[serde(default)]
    pub with_dt_means: bool,
}

impl Default for StepMatrixParams {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            weight_col: None,
            index_col: None,
            reverse: Vec::new(),
            sorting: true,
            thr: 0.0,
            with_dt_means: false,
        }
    }
}

impl StepMatrixParams {
    /// Forward alignment with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the column cap.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the cohort column.
    pub fn with_weight_col(mut self, column: impl Into<String>) -> Self {
        self.weight_col = Some(column.into());
        self
    }

    /// Set the fallback cohort column.
    pub fn with_index_col(mut self, column: impl Into<String>) -> Self {
        self.index_col = Some(column.into());
        self
    }

    /// Align backwards on the given targets.
    pub fn reversed(mut self, targets: impl IntoIterator<Item = TargetKind>) -> Self {
        self.reverse = targets.into_iter().collect();
        self
    }

    /// Align backwards on targets given as `"pos"` / `"neg"`.
    pub fn with_reverse_str<'s>(mut self, targets: impl IntoIterator<Item = &'s str>) -> Result<Self> {
        self.reverse = targets
            .into_iter()
            .map(str::parse)
            .collect::<Result<Vec<TargetKind>>>()?;
        Ok(self)
    }

    /// Enable or disable dominance sorting.
    pub fn with_sorting(mut self, sorting: bool) -> Self {
        self.sorting = sorting;
        self
    }

    /// Set the pruning threshold.
    pub fn with_thr(mut self, thr: f64) -> Self {
        self.thr = thr;
        self
    }

    /// Also compute mean gaps per column.
    pub fn with_dt_means(mut self) -> Self {
        self.with_dt_means = true;
        self
    }

    /// Whether the matrix will be aligned backwards.
    pub fn is_reverse(&self) -> bool {
        !self.reverse.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventLog, EventRecord};
    use chrono::{TimeZone, Utc};

    fn log(rows: &[(&str, &str, i64)]) -> EventLog {
        rows.iter()
            .map(|(e, ev, t)| EventRecord::new(*e, *ev, Utc.timestamp_opt(*t, 0).unwrap()))
            .collect()
    }

    fn assert_columns_sum_to_one(m: &StepMatrix) {
        for (j, sum) in m.column_sums().into_iter().enumerate() {
            assert!((sum - 1.0).abs() < 1e-9, "column {j} sums to {sum}");
        }
    }

    #[test]
    fn test_target_kind_parse() {
        assert_eq!("pos".parse::<TargetKind>().unwrap(), TargetKind::Positive);
        assert_eq!(
            "both".parse::<TargetKind>(),
            Err(TrajectoryError::UnknownReverseTarget("both".into()))
        );
    }

    #[test]
    fn test_forward_shares() {
        // u1: a b c, u2: a c
        let log = log(&[
            ("u1", "a", 1),
            ("u1", "b", 2),
            ("u1", "c", 3),
            ("u2", "a", 1),
            ("u2", "c", 2),
        ]);
        let params = StepMatrixParams::new().with_sorting(false);
        let m = step_matrix(&log, &RoleConfig::default(), &params).unwrap();

        assert_eq!(m.row_names(), &["a", "b", "c"]);
        assert_eq!(m.columns(), &[1, 2, 3]);
        assert_eq!(m.get("a", 1), Some(1.0));
        assert_eq!(m.get("b", 2), Some(0.5));
        assert_eq!(m.get("c", 2), Some(0.5));
        assert_eq!(m.get("c", 3), Some(1.0));
        assert_columns_sum_to_one(&m);
    }

    #[test]
    fn test_max_steps_cuts_columns() {
        let log = log(&[("u1", "a", 1), ("u1", "b", 2), ("u1", "c", 3)]);
        let params = StepMatrixParams::new().with_max_steps(2);
        let m = step_matrix(&log, &RoleConfig::default(), &params).unwrap();

        assert_eq!(m.columns(), &[1, 2]);
        assert!(m.row("c").is_none());
    }

    #[test]
    fn test_accumulated_rows_dilute_columns() {
        // u1: a T, u2: a b
        let log = log(&[("u1", "a", 1), ("u1", "T", 2), ("u2", "a", 1), ("u2", "b", 2)]);
        let config = RoleConfig::default().with_target_events(["T"]);
        let params = StepMatrixParams::new().with_sorting(false);
        let m = step_matrix(&log, &config, &params).unwrap();

        assert_eq!(m.row_names(), &["T", "a", "b", "Accumulated T"]);
        assert_eq!(m.row("Accumulated T"), Some(&[0.0, 0.0][..]));
        assert_eq!(m.get("T", 2), Some(0.5));
        assert_columns_sum_to_one(&m);
    }

    #[test]
    fn test_accumulated_row_counts_earlier_steps() {
        // u1: T a, u2: a b -> 50% reached T at step 1
        let log = log(&[("u1", "T", 1), ("u1", "a", 2), ("u2", "a", 1), ("u2", "b", 2)]);
        let config = RoleConfig::default().with_target_events(["T"]);
        let params = StepMatrixParams::new().with_sorting(false);
        let m = step_matrix(&log, &config, &params).unwrap();

        // Column 2 before normalization: a 0.5, b 0.5, Accumulated T 0.5.
        let acc = m.row("Accumulated T").unwrap();
        assert_eq!(acc[0], 0.0);
        assert!((acc[1] - 1.0 / 3.0).abs() < 1e-12);
        assert_columns_sum_to_one(&m);
    }

    #[test]
    fn test_reverse_aligns_on_positive_target() {
        let log = log(&[
            ("u1", "a", 1),
            ("u1", "b", 2),
            ("u1", "buy", 3),
            ("u2", "b", 1),
            ("u2", "buy", 2),
            ("u3", "a", 1),
        ]);
        let config = RoleConfig::default()
            .with_positive_target("buy")
            .with_target_events(["buy"]);
        let params = StepMatrixParams::new().reversed([TargetKind::Positive]);
        let m = step_matrix(&log, &config, &params).unwrap();

        assert!(m.is_reversed());
        assert_eq!(m.labels(), vec!["n", "n - 1", "n - 2"]);
        assert_eq!(m.get_labeled("buy", "n"), Some(1.0));
        assert_eq!(m.get_labeled("b", "n - 1"), Some(1.0));
        assert_eq!(m.get_labeled("a", "n - 2"), Some(1.0));
        // No accumulation rows in reverse mode.
        assert!(m.row("Accumulated buy").is_none());
    }

    #[test]
    fn test_reverse_unmapped_role_is_config_error() {
        let log = log(&[("u1", "a", 1)]);
        let params = StepMatrixParams::new().reversed([TargetKind::Negative]);
        let err = step_matrix(&log, &RoleConfig::default(), &params).unwrap_err();
        assert_eq!(err, TrajectoryError::MissingRole("negative_target_event"));
    }

    #[test]
    fn test_reverse_both_targets() {
        let log = log(&[
            ("u1", "a", 1),
            ("u1", "buy", 2),
            ("u2", "a", 1),
            ("u2", "lost", 2),
        ]);
        let config = RoleConfig::default()
            .with_positive_target("buy")
            .with_negative_target("lost");
        let params = StepMatrixParams::new()
            .with_reverse_str(["pos", "neg"])
            .unwrap()
            .with_sorting(false);
        let m = step_matrix(&log, &config, &params).unwrap();

        assert_eq!(m.get_labeled("buy", "n"), Some(0.5));
        assert_eq!(m.get_labeled("lost", "n"), Some(0.5));
        assert_eq!(m.get_labeled("a", "n - 1"), Some(1.0));
    }

    #[test]
    fn test_thr_prunes_rare_rows() {
        let mut rows = vec![("u0", "rare", 1), ("u0", "a", 2)];
        let users: Vec<String> = (1..=20).map(|i| format!("u{i}")).collect();
        for u in &users {
            rows.push((u.as_str(), "a", 1));
            rows.push((u.as_str(), "b", 2));
        }
        let log = log(&rows);
        let params = StepMatrixParams::new().with_thr(0.1);
        let m = step_matrix(&log, &RoleConfig::default(), &params).unwrap();

        assert!(m.row("rare").is_none());
        assert!(m.row("a").is_some());
    }

    #[test]
    fn test_sorting_puts_dominant_path_on_diagonal() {
        let log = log(&[
            ("u1", "start", 1),
            ("u1", "mid", 2),
            ("u1", "end", 3),
            ("u2", "start", 1),
            ("u2", "mid", 2),
            ("u2", "end", 3),
        ]);
        let m = step_matrix(&log, &RoleConfig::default(), &StepMatrixParams::new()).unwrap();
        assert_eq!(m.row_names(), &["start", "mid", "end"]);
    }

    #[test]
    fn test_weight_col_by_attr() {
        let log: EventLog = vec![
            EventRecord::new("u1", "a", Utc.timestamp_opt(1, 0).unwrap()).with_attr("session_id", "u1_0"),
            EventRecord::new("u1", "b", Utc.timestamp_opt(2, 0).unwrap()).with_attr("session_id", "u1_0"),
            EventRecord::new("u1", "b", Utc.timestamp_opt(9, 0).unwrap()).with_attr("session_id", "u1_1"),
        ]
        .into();
        let params = StepMatrixParams::new()
            .with_weight_col("session_id")
            .with_sorting(false);
        let m = step_matrix(&log, &RoleConfig::default(), &params).unwrap();

        // Two sessions; step 1 is "a" in one and "b" in the other.
        assert_eq!(m.get("a", 1), Some(0.5));
        assert_eq!(m.get("b", 1), Some(0.5));
        assert_eq!(m.get("b", 2), Some(1.0));
    }

    #[test]
    fn test_dt_means() {
        let log = log(&[("u1", "a", 0), ("u1", "b", 10), ("u2", "a", 0), ("u2", "b", 20)]);
        let params = StepMatrixParams::new().with_dt_means();
        let m = step_matrix(&log, &RoleConfig::default(), &params).unwrap();

        assert_eq!(m.dt_means(), Some(&[Some(15.0), None][..]));
    }
}
