//! Dense adjacency projection of an edge list.

use serde::{Deserialize, Serialize};

use super::edgelist::{edge_list, EdgeList, EdgeListParams};
use crate::canonical::{canonical_hash_hex, quantize};
use crate::error::Result;
use crate::types::{EventLog, NormType, RoleConfig};

/// Square transition matrix; rows are sources, columns are targets.
///
/// Rows and columns share the same sorted index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyMatrix {
    labels: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl AdjacencyMatrix {
    /// Project `edges` onto an index of `labels` plus every edge endpoint.
    pub fn from_edges<'a>(labels: impl IntoIterator<Item = &'a str>, edges: &EdgeList) -> Self {
        let mut labels: Vec<String> = labels.into_iter().map(str::to_string).collect();
        labels.extend(edges.node_names().into_iter().map(str::to_string));
        labels.sort();
        labels.dedup();

        let n = labels.len();
        let mut values = vec![vec![0.0; n]; n];
        for edge in edges {
            if let (Ok(i), Ok(j)) = (
                labels.binary_search(&edge.source),
                labels.binary_search(&edge.target),
            ) {
                values[i][j] = edge.weight;
            }
        }

        Self { labels, values }
    }

    /// Index shared by rows and columns.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Matrix rows.
    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Number of rows (and columns).
    pub fn size(&self) -> usize {
        self.labels.len()
    }

    /// Cell for `source -> target`, `None` when either name is not indexed.
    pub fn get(&self, source: &str, target: &str) -> Option<f64> {
        let i = self.position(source)?;
        let j = self.position(target)?;
        Some(self.values[i][j])
    }

    /// Row of outgoing weights for `source`.
    pub fn row(&self, source: &str) -> Option<&[f64]> {
        self.position(source).map(|i| self.values[i].as_slice())
    }

    /// Fingerprint over quantized cells.
    pub fn fingerprint(&self) -> String {
        let cells: Vec<Vec<i64>> = self
            .values
            .iter()
            .map(|row| row.iter().copied().map(quantize).collect())
            .collect();
        canonical_hash_hex(&(&self.labels, cells))
    }

    fn position(&self, label: &str) -> Option<usize> {
        self.labels.binary_search_by(|l| l.as_str().cmp(label)).ok()
    }
}

/// Build the adjacency matrix of the log's transitions.
///
/// The index covers every event name in the log, so an event that never takes
/// part in a transition still gets an all-zero row and column.
pub fn adjacency(
    log: &EventLog,
    config: &RoleConfig,
    weight_col: Option<&str>,
    norm_type: Option<NormType>,
) -> Result<AdjacencyMatrix> {
    let params = EdgeListParams {
        weight_col: weight_col.map(str::to_string),
        norm_type,
        edge_attr_name: None,
    };
    let edges = edge_list(log, config, &params)?;
    let matrix = AdjacencyMatrix::from_edges(log.event_names(), &edges);

    tracing::debug!(size = matrix.size(), edges = edges.len(), "projected adjacency matrix");
    Ok(matrix)
}
