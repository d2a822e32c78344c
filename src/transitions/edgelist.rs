//! Weighted transition lists.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::canonical::{canonical_hash_hex, quantize};
use crate::error::Result;
use crate::shift::shifted;
use crate::types::{Edge, EventLog, NormType, RoleConfig};

/// Default name of the weight attribute.
pub const DEFAULT_EDGE_ATTR: &str = "edge_weight";

/// Parameters for [`edge_list`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeListParams {
    /// Count distinct values of this column instead of occurrences.
    pub weight_col: Option<String>,
    /// Normalization of the aggregated weights.
    pub norm_type: Option<NormType>,
    /// Name of the weight attribute in exported rows.
    pub edge_attr_name: Option<String>,
}

impl EdgeListParams {
    /// Plain occurrence counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Weight by distinct values of `column`.
    pub fn with_weight_col(mut self, column: impl Into<String>) -> Self {
        self.weight_col = Some(column.into());
        self
    }

    /// Set the normalization.
    pub fn with_norm(mut self, norm_type: NormType) -> Self {
        self.norm_type = Some(norm_type);
        self
    }

    /// Set the normalization from its textual name.
    pub fn with_norm_str(mut self, norm_type: &str) -> Result<Self> {
        self.norm_type = Some(norm_type.parse()?);
        Ok(self)
    }

    /// Set the weight attribute name.
    pub fn with_edge_attr_name(mut self, name: impl Into<String>) -> Self {
        self.edge_attr_name = Some(name.into());
        self
    }
}

/// Transitions between events, one edge per observed ordered pair.
///
/// Edges are sorted by (source, target).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeList {
    /// Name of the weight attribute.
    pub weight_attr: String,
    /// The edges.
    pub edges: Vec<Edge>,
}

impl EdgeList {
    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether there are no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Iterate over the edges.
    pub fn iter(&self) -> std::slice::Iter<'_, Edge> {
        self.edges.iter()
    }

    /// Weight of the `source -> target` edge, if observed.
    pub fn weight(&self, source: &str, target: &str) -> Option<f64> {
        self.edges
            .iter()
            .find(|e| e.source == source && e.target == target)
            .map(|e| e.weight)
    }

    /// Sum of all weights.
    pub fn total_weight(&self) -> f64 {
        self.edges.iter().map(|e| e.weight).sum()
    }

    /// Sum of weights leaving `source`.
    pub fn outgoing_weight(&self, source: &str) -> f64 {
        self.edges
            .iter()
            .filter(|e| e.source == source)
            .map(|e| e.weight)
            .sum()
    }

    /// Every event name appearing as source or target.
    pub fn node_names(&self) -> BTreeSet<&str> {
        self.edges
            .iter()
            .flat_map(|e| [e.source.as_str(), e.target.as_str()])
            .collect()
    }

    /// Fingerprint over quantized weights.
    pub fn fingerprint(&self) -> String {
        let rows: Vec<(&str, &str, i64)> = self
            .edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str(), quantize(e.weight)))
            .collect();
        canonical_hash_hex(&rows)
    }

    /// Rows keyed by `event_col`, `next_<event_col>` and the weight attribute.
    pub fn to_json_rows(&self, config: &RoleConfig) -> Vec<Map<String, Value>> {
        let next_col = format!("next_{}", config.event_col);
        self.edges
            .iter()
            .map(|e| {
                let mut row = Map::new();
                row.insert(config.event_col.clone(), Value::from(e.source.clone()));
                row.insert(next_col.clone(), Value::from(e.target.clone()));
                row.insert(self.weight_attr.clone(), Value::from(e.weight));
                row
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a EdgeList {
    type Item = &'a Edge;
    type IntoIter = std::slice::Iter<'a, Edge>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}

/// Aggregate chronological successor pairs into weighted transitions.
///
/// Without `weight_col` an edge weighs its occurrence count; with it, the
/// number of distinct values of that column seen on the transition.
///
/// Normalization:
///
/// | `norm_type` | no `weight_col` | with `weight_col` |
/// |-------------|-----------------|-------------------|
/// | `Full` | sum of all weights | distinct values in the log |
/// | `Node` | transitions leaving the source | distinct values on rows of the source event |
pub fn edge_list(log: &EventLog, config: &RoleConfig, params: &EdgeListParams) -> Result<EdgeList> {
    let rows = shifted(log, config)?;
    let weight_col = params
        .weight_col
        .as_deref()
        .map(|c| log.resolve_column(c, config))
        .transpose()?;

    let mut weights: BTreeMap<(&str, &str), f64> = BTreeMap::new();
    match &weight_col {
        None => {
            for row in &rows {
                if let Some(next) = row.next_event {
                    *weights.entry((row.record.event.as_str(), next)).or_insert(0.0) += 1.0;
                }
            }
        }
        Some(column) => {
            let mut distinct: BTreeMap<(&str, &str), BTreeSet<Cow<'_, str>>> = BTreeMap::new();
            for row in &rows {
                if let (Some(next), Some(value)) = (row.next_event, row.record.value(column)) {
                    distinct
                        .entry((row.record.event.as_str(), next))
                        .or_default()
                        .insert(value);
                }
            }
            weights.extend(distinct.into_iter().map(|(pair, set)| (pair, set.len() as f64)));
        }
    }
    weights.retain(|_, w| *w > 0.0);

    match (params.norm_type, &weight_col) {
        (None, _) => {}
        (Some(NormType::Full), None) => {
            let total: f64 = weights.values().sum();
            for w in weights.values_mut() {
                *w /= total;
            }
        }
        (Some(NormType::Full), Some(column)) => {
            let total = log.distinct_count(column) as f64;
            for w in weights.values_mut() {
                *w /= total;
            }
        }
        (Some(NormType::Node), None) => {
            let mut outgoing: BTreeMap<&str, f64> = BTreeMap::new();
            for (&(source, _), w) in &weights {
                *outgoing.entry(source).or_insert(0.0) += *w;
            }
            for (&(source, _), w) in weights.iter_mut() {
                *w /= outgoing[source];
            }
        }
        (Some(NormType::Node), Some(column)) => {
            let mut per_source: BTreeMap<&str, BTreeSet<Cow<'_, str>>> = BTreeMap::new();
            for row in &rows {
                if let Some(value) = row.record.value(column) {
                    per_source
                        .entry(row.record.event.as_str())
                        .or_default()
                        .insert(value);
                }
            }
            for (&(source, _), w) in weights.iter_mut() {
                *w /= per_source.get(source).map_or(0, BTreeSet::len) as f64;
            }
        }
    }

    let edges: Vec<Edge> = weights
        .into_iter()
        .map(|((source, target), weight)| Edge::new(source, target, weight))
        .collect();

    tracing::debug!(
        rows = rows.len(),
        edges = edges.len(),
        weight_col = ?params.weight_col,
        norm_type = ?params.norm_type,
        "built edge list"
    );

    Ok(EdgeList {
        weight_attr: params
            .edge_attr_name
            .clone()
            .unwrap_or_else(|| DEFAULT_EDGE_ATTR.to_string()),
        edges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrajectoryError;
    use crate::types::EventRecord;
    use chrono::{TimeZone, Utc};

    fn row(entity: &str, event: &str, secs: i64) -> EventRecord {
        EventRecord::new(entity, event, Utc.timestamp_opt(secs, 0).unwrap())
    }

    /// u1: a b a b, u2: a b c
    fn sample_log() -> EventLog {
        EventLog::new(vec![
            row("u1", "a", 1),
            row("u1", "b", 2),
            row("u1", "a", 3),
            row("u1", "b", 4),
            row("u2", "a", 1),
            row("u2", "b", 2),
            row("u2", "c", 3),
        ])
    }

    #[test]
    fn test_raw_counts() {
        let edges = edge_list(&sample_log(), &RoleConfig::default(), &EdgeListParams::new()).unwrap();

        assert_eq!(edges.len(), 3);
        assert_eq!(edges.weight("a", "b"), Some(3.0));
        assert_eq!(edges.weight("b", "a"), Some(1.0));
        assert_eq!(edges.weight("b", "c"), Some(1.0));
        assert_eq!(edges.weight("c", "a"), None);
        assert_eq!(edges.weight_attr, "edge_weight");
    }

    #[test]
    fn test_distinct_weight_col() {
        let params = EdgeListParams::new().with_weight_col("user_pseudo_id");
        let edges = edge_list(&sample_log(), &RoleConfig::default(), &params).unwrap();

        assert_eq!(edges.weight("a", "b"), Some(2.0));
        assert_eq!(edges.weight("b", "a"), Some(1.0));
    }

    #[test]
    fn test_full_normalization() {
        let params = EdgeListParams::new().with_norm(NormType::Full);
        let edges = edge_list(&sample_log(), &RoleConfig::default(), &params).unwrap();

        assert!((edges.total_weight() - 1.0).abs() < 1e-12);
        assert!((edges.weight("a", "b").unwrap() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_full_normalization_by_users() {
        let params = EdgeListParams::new()
            .with_weight_col("user_pseudo_id")
            .with_norm(NormType::Full);
        let edges = edge_list(&sample_log(), &RoleConfig::default(), &params).unwrap();

        assert_eq!(edges.weight("a", "b"), Some(1.0));
        assert_eq!(edges.weight("b", "c"), Some(0.5));
    }

    #[test]
    fn test_node_normalization() {
        let params = EdgeListParams::new().with_norm(NormType::Node);
        let edges = edge_list(&sample_log(), &RoleConfig::default(), &params).unwrap();

        for source in ["a", "b"] {
            assert!((edges.outgoing_weight(source) - 1.0).abs() < 1e-12);
        }
        assert_eq!(edges.weight("b", "a"), Some(0.5));
    }

    #[test]
    fn test_node_normalization_by_users_counts_all_source_rows() {
        // Both users are seen on "b", so each edge leaving it is divided by two.
        let params = EdgeListParams::new()
            .with_weight_col("user_pseudo_id")
            .with_norm(NormType::Node);
        let edges = edge_list(&sample_log(), &RoleConfig::default(), &params).unwrap();

        assert_eq!(edges.weight("b", "a"), Some(0.5));
        assert_eq!(edges.weight("b", "c"), Some(0.5));
        assert_eq!(edges.weight("a", "b"), Some(1.0));
    }

    #[test]
    fn test_unknown_norm_rejected() {
        let err = EdgeListParams::new().with_norm_str("rows").unwrap_err();
        assert_eq!(err, TrajectoryError::UnknownNormalization("rows".into()));
    }

    #[test]
    fn test_unknown_weight_col_rejected() {
        let params = EdgeListParams::new().with_weight_col("session_id");
        let err = edge_list(&sample_log(), &RoleConfig::default(), &params).unwrap_err();
        assert_eq!(err, TrajectoryError::UnknownColumn("session_id".into()));
    }

    #[test]
    fn test_json_rows_use_role_names() {
        let params = EdgeListParams::new().with_edge_attr_name("users");
        let edges = edge_list(&sample_log(), &RoleConfig::default(), &params).unwrap();
        let rows = edges.to_json_rows(&RoleConfig::default());

        assert_eq!(rows[0]["event_name"], "a");
        assert_eq!(rows[0]["next_event_name"], "b");
        assert_eq!(rows[0]["users"], 3.0);
    }
}
