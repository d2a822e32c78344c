//! First-order transition aggregation.
//!
//! ```text
//! EventLog → shifted pairs → EdgeList → AdjacencyMatrix
//! ```

pub mod adjacency;
pub mod edgelist;

pub use adjacency::{adjacency, AdjacencyMatrix};
pub use edgelist::{edge_list, EdgeList, EdgeListParams, DEFAULT_EDGE_ATTR};
