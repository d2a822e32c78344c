//! # trajectory-kernel
//!
//! Deterministic trajectory analytics over per-entity event logs.
//!
//! The kernel answers one question:
//!
//! > Given who did what and when, how do entities **move between events**?
//!
//! ## Core Contract
//!
//! 1. Pair every event with the entity's next event (shift)
//! 2. Aggregate pairs into weighted transitions and a square adjacency matrix
//! 3. Build event-by-step occupancy tables, optionally aligned backwards on a target
//! 4. Split entity streams into sessions by inactivity gap or marker event
//! 5. Hand graphs and tables to a pluggable renderer
//!
//! ## Architecture
//!
//! ```text
//! EventLog + RoleConfig → shift → EdgeList → AdjacencyMatrix
//!                           │        ↓
//!                           │    GraphBundle → Renderer
//!                           ├→ StepMatrix ──→ Renderer
//!                           └→ SessionLog → EventLog
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Rows are processed in (entity, timestamp) order; ties keep input order
//! - Edge lists are sorted by (source, target)
//! - Adjacency labels and unsorted step matrix rows are in lexicographic order
//! - Fingerprints hash quantized weights, so equal inputs give equal ids

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analyzer;
pub mod canonical;
pub mod error;
pub mod export;
pub mod sessions;
pub mod shift;
pub mod snapshot;
pub mod step_matrix;
pub mod telemetry;
pub mod transitions;
pub mod types;

// Re-exports
pub use analyzer::TrajectoryAnalyzer;
pub use canonical::{canonical_hash, canonical_hash_hex, to_canonical_bytes};
pub use error::{ErrorKind, Result, TrajectoryError};
pub use export::{
    default_node_params, graph_bundle, plot_graph, plot_step_matrix, GraphBundle, GraphParams,
    GraphRenderOptions, JsonRenderer, NodeHighlight, Renderer,
};
pub use sessions::{sessions, SessionEvent, SessionLog, SessionParams};
pub use shift::{shifted, ShiftedEvent};
pub use snapshot::LogSnapshot;
pub use step_matrix::{step_matrix, StepMatrix, StepMatrixParams, TargetKind};
pub use telemetry::{init_tracing, LogFormat};
pub use transitions::{adjacency, edge_list, AdjacencyMatrix, EdgeList, EdgeListParams};
pub use types::{Column, ConfigParseError, Edge, EventLog, EventRecord, NormType, RoleConfig};

/// Schema version for all serialized kernel types.
/// Increment on breaking changes to any schema type.
pub const TRAJECTORY_KERNEL_SCHEMA_VERSION: &str = "1.0.0";
