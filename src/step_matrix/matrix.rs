//! The step matrix table.

use serde::{Deserialize, Serialize};

use crate::canonical::{canonical_hash_hex, quantize};

/// Leading word of synthetic accumulation rows.
pub const ACCUMULATED_WORD: &str = "Accumulated";

/// Prefix of synthetic accumulation rows.
pub const ACCUMULATED_PREFIX: &str = "Accumulated ";

/// Event-by-step occupancy table.
///
/// Rows are event names (plus `"Accumulated <target>"` rows), columns are
/// ranks. In reverse mode the first column is the target step and later
/// columns count steps before it; [`StepMatrix::labels`] renders them as
/// `"n"`, `"n - 1"`, and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepMatrix {
    pub(crate) rows: Vec<String>,
    pub(crate) columns: Vec<u32>,
    pub(crate) values: Vec<Vec<f64>>,
    pub(crate) reversed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) dt_means: Option<Vec<Option<f64>>>,
}

impl StepMatrix {
    /// Build a matrix from parts. Every row of `values` must have one cell
    /// per column.
    pub fn new(rows: Vec<String>, columns: Vec<u32>, values: Vec<Vec<f64>>, reversed: bool) -> Self {
        debug_assert_eq!(rows.len(), values.len());
        debug_assert!(values.iter().all(|r| r.len() == columns.len()));
        Self {
            rows,
            columns,
            values,
            reversed,
            dt_means: None,
        }
    }

    /// Row names in display order.
    pub fn row_names(&self) -> &[String] {
        &self.rows
    }

    /// Numeric ranks of the columns.
    pub fn columns(&self) -> &[u32] {
        &self.columns
    }

    /// Display labels of the columns.
    pub fn labels(&self) -> Vec<String> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, rank)| match (self.reversed, i) {
                (true, 0) => "n".to_string(),
                (true, _) => format!("n - {}", rank - 1),
                (false, _) => rank.to_string(),
            })
            .collect()
    }

    /// Cell values, one inner vector per row.
    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Whether the matrix is aligned backwards from a target.
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Mean seconds to the next event per column, when requested.
    pub fn dt_means(&self) -> Option<&[Option<f64>]> {
        self.dt_means.as_deref()
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Values of a named row.
    pub fn row(&self, name: &str) -> Option<&[f64]> {
        self.rows
            .iter()
            .position(|r| r == name)
            .map(|i| self.values[i].as_slice())
    }

    /// Cell at a named row and rank.
    pub fn get(&self, name: &str, rank: u32) -> Option<f64> {
        let j = self.columns.iter().position(|c| *c == rank)?;
        self.row(name).map(|row| row[j])
    }

    /// Cell at a named row and display label.
    pub fn get_labeled(&self, name: &str, label: &str) -> Option<f64> {
        let j = self.labels().iter().position(|l| l == label)?;
        self.row(name).map(|row| row[j])
    }

    /// Sum of each column.
    pub fn column_sums(&self) -> Vec<f64> {
        (0..self.columns.len())
            .map(|j| self.values.iter().map(|row| row[j]).sum())
            .collect()
    }

    /// Copy with every cell rounded to `decimals` places.
    pub fn rounded(&self, decimals: i32) -> Self {
        let scale = 10f64.powi(decimals);
        let mut out = self.clone();
        for cell in out.values.iter_mut().flatten() {
            *cell = (*cell * scale).round() / scale;
        }
        out
    }

    /// Cell-wise `self - other` over the union of rows and ranks.
    ///
    /// Rows keep `self`'s order followed by rows only `other` has; missing
    /// cells count as 0.
    pub fn diff(&self, other: &Self) -> Self {
        let mut rows = self.rows.clone();
        rows.extend(other.rows.iter().filter(|r| !self.rows.contains(r)).cloned());

        let mut columns: Vec<u32> = self.columns.iter().chain(&other.columns).copied().collect();
        columns.sort_unstable();
        columns.dedup();

        let values = rows
            .iter()
            .map(|name| {
                columns
                    .iter()
                    .map(|&rank| {
                        self.get(name, rank).unwrap_or(0.0) - other.get(name, rank).unwrap_or(0.0)
                    })
                    .collect()
            })
            .collect();

        Self::new(rows, columns, values, self.reversed)
    }

    /// Fingerprint over quantized cells.
    pub fn fingerprint(&self) -> String {
        let cells: Vec<Vec<i64>> = self
            .values
            .iter()
            .map(|row| row.iter().copied().map(quantize).collect())
            .collect();
        canonical_hash_hex(&(&self.rows, &self.columns, self.reversed, cells))
    }
}
