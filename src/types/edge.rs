//! Transition edge types.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TrajectoryError;

/// Normalization applied to transition weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormType {
    /// Divide by the grand total: a distribution over all transitions.
    Full,
    /// Divide by the outgoing mass of the source node.
    Node,
}

impl FromStr for NormType {
    type Err = TrajectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(Self::Full),
            "node" => Ok(Self::Node),
            other => Err(TrajectoryError::UnknownNormalization(other.to_string())),
        }
    }
}

impl std::fmt::Display for NormType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Node => write!(f, "node"),
        }
    }
}

/// Weighted directed transition between two event names.
///
/// Ordering is canonical on (source, target); the weight does not take part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Event the transition starts from.
    pub source: String,
    /// Event that followed.
    pub target: String,
    /// Aggregated (and possibly normalized) weight.
    pub weight: f64,
}

impl Edge {
    /// Create a new edge.
    pub fn new(source: impl Into<String>, target: impl Into<String>, weight: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight,
        }
    }

    /// Whether the edge starts and ends on the same event.
    pub fn is_loop(&self) -> bool {
        self.source == self.target
    }

    /// Canonical comparison on (source, target).
    pub fn cmp_pair(&self, other: &Self) -> Ordering {
        self.source
            .cmp(&other.source)
            .then_with(|| self.target.cmp(&other.target))
    }
}
