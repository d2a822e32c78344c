//! Step matrix assembly.
//!
//! ## Pipeline
//!
//! ```text
//! shifted rows → ranks (forward | reverse) → cohort shares
//!     → accumulation rows → pruning → dominance sort → column normalization
//! ```
//!
//! The last stage divides every column by its own sum even though the
//! shares are already fractions of the cohort. Accumulation and target rows
//! therefore dilute the ordinary rows in the displayed numbers. Downstream
//! consumers depend on these exact values.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use super::alignment::{align_reverse, rank_forward, RankedEvent};
use super::matrix::{StepMatrix, ACCUMULATED_PREFIX, ACCUMULATED_WORD};
use super::StepMatrixParams;
use crate::error::Result;
use crate::shift::shifted;
use crate::types::{EventLog, RoleConfig};

/// Compute the step matrix of `log`.
///
/// See [`StepMatrixParams`] for the knobs. Fails on an unknown weighting
/// column, an unmapped target role in reverse mode, or when no trajectory in
/// the log ends in the requested target.
pub fn step_matrix(log: &EventLog, config: &RoleConfig, params: &StepMatrixParams) -> Result<StepMatrix> {
    let weight_col = params
        .weight_col
        .as_deref()
        .or(params.index_col.as_deref())
        .unwrap_or(config.index_col.as_str());
    let key_col = log.resolve_column(weight_col, config)?;

    let rows = shifted(log, config)?;
    let mut ranked = rank_forward(&rows, &key_col);

    let reversed = !params.reverse.is_empty();
    if reversed {
        let targets = params
            .reverse
            .iter()
            .map(|kind| kind.resolve(config))
            .collect::<Result<Vec<&str>>>()?;
        let before = distinct_keys(&ranked);
        ranked = align_reverse(ranked, &targets)?;
        tracing::debug!(
            targets = ?targets,
            keys_before = before,
            keys_kept = distinct_keys(&ranked),
            "aligned step matrix on targets"
        );
    }

    let (mut row_names, columns, mut values) = cohort_shares(&ranked, params.max_steps);

    if !reversed {
        for target in &config.target_event_list {
            let accumulated = accumulate(&row_names, &values, target, columns.len());
            row_names.push(format!("{ACCUMULATED_PREFIX}{target}"));
            values.push(accumulated);
        }
    }

    if params.thr != 0.0 {
        prune(&mut row_names, &mut values, params.thr, config);
    }

    if params.sorting {
        let order = dominance_order(&values, columns.len());
        row_names = order.iter().map(|&i| row_names[i].clone()).collect();
        values = order.iter().map(|&i| values[i].clone()).collect();
    }

    normalize_columns(&mut values, &columns);

    let mut matrix = StepMatrix::new(row_names, columns, values, reversed);
    if params.with_dt_means {
        let means = dt_means(&ranked, matrix.columns());
        matrix.dt_means = Some(means);
    }

    tracing::debug!(
        rows = matrix.num_rows(),
        columns = matrix.num_columns(),
        reversed,
        "computed step matrix"
    );
    Ok(matrix)
}

fn distinct_keys(ranked: &[RankedEvent<'_>]) -> usize {
    ranked.iter().map(|r| &r.key).collect::<BTreeSet<_>>().len()
}

/// Share of distinct keys at every (event, rank), pivoted to rows by event.
///
/// The denominator counts keys over all ranked rows, before `max_steps`
/// cuts columns off. Rows and columns only cover pairs that survive the cut.
fn cohort_shares(ranked: &[RankedEvent<'_>], max_steps: usize) -> (Vec<String>, Vec<u32>, Vec<Vec<f64>>) {
    let total = distinct_keys(ranked) as f64;

    let mut cells: BTreeMap<(&str, u32), BTreeSet<&Cow<'_, str>>> = BTreeMap::new();
    for row in ranked {
        if max_steps > 0 && row.rank as usize > max_steps {
            continue;
        }
        cells.entry((row.event, row.rank)).or_default().insert(&row.key);
    }

    let row_names: Vec<&str> = cells
        .keys()
        .map(|(event, _)| *event)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let columns: Vec<u32> = cells
        .keys()
        .map(|(_, rank)| *rank)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut values = vec![vec![0.0; columns.len()]; row_names.len()];
    for ((event, rank), keys) in &cells {
        if let (Ok(i), Ok(j)) = (row_names.binary_search(event), columns.binary_search(rank)) {
            values[i][j] = keys.len() as f64 / total;
        }
    }

    (row_names.into_iter().map(str::to_string).collect(), columns, values)
}

/// Share that reached `target` strictly before each column.
fn accumulate(row_names: &[String], values: &[Vec<f64>], target: &str, width: usize) -> Vec<f64> {
    let Some(i) = row_names.iter().position(|r| r == target) else {
        return vec![0.0; width];
    };
    let mut running = 0.0;
    values[i]
        .iter()
        .map(|v| {
            let before = running;
            running += v;
            before
        })
        .collect()
}

/// Drop rows whose every value is below `thr`, keeping listed targets and
/// any row whose name starts with [`ACCUMULATED_WORD`].
fn prune(row_names: &mut Vec<String>, values: &mut Vec<Vec<f64>>, thr: f64, config: &RoleConfig) {
    let keep: Vec<bool> = row_names
        .iter()
        .zip(values.iter())
        .map(|(name, row)| {
            name.starts_with(ACCUMULATED_WORD)
                || config.is_listed_target(name)
                || row.iter().any(|v| *v >= thr)
        })
        .collect();

    let mut flags = keep.iter();
    row_names.retain(|_| *flags.next().unwrap_or(&true));
    let mut flags = keep.iter();
    values.retain(|_| *flags.next().unwrap_or(&true));
}

/// Greedy ordering that puts the largest remaining row of each column next,
/// giving a roughly diagonal matrix along the dominant path.
///
/// Ties go to the earlier row. Rows left once the columns run out follow in
/// their original order.
fn dominance_order(values: &[Vec<f64>], width: usize) -> Vec<usize> {
    let mut remaining: Vec<usize> = (0..values.len()).collect();
    let mut order = Vec::with_capacity(values.len());

    for j in 0..width {
        if remaining.is_empty() {
            break;
        }
        let mut best = 0;
        for (pos, &i) in remaining.iter().enumerate() {
            if values[i][j] > values[remaining[best]][j] {
                best = pos;
            }
        }
        order.push(remaining.remove(best));
    }

    order.extend(remaining);
    order
}

fn normalize_columns(values: &mut [Vec<f64>], columns: &[u32]) {
    for (j, rank) in columns.iter().enumerate() {
        let sum: f64 = values.iter().map(|row| row[j]).sum();
        if sum == 0.0 {
            tracing::warn!(column = *rank, "step matrix column sums to zero; cells become NaN");
        }
        for row in values.iter_mut() {
            row[j] /= sum;
        }
    }
}

/// Mean seconds from an event at each rank to its successor.
fn dt_means(ranked: &[RankedEvent<'_>], columns: &[u32]) -> Vec<Option<f64>> {
    let mut sums: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for row in ranked {
        if let Some(gap) = row.gap_seconds {
            let entry = sums.entry(row.rank).or_insert((0.0, 0));
            entry.0 += gap;
            entry.1 += 1;
        }
    }
    columns
        .iter()
        .map(|rank| sums.get(rank).map(|(sum, n)| sum / *n as f64))
        .collect()
}
