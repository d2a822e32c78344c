//! Hand-off of transition graphs and step matrices to a renderer.
//!
//! The crate never draws anything itself. A [`Renderer`] receives a
//! [`GraphBundle`] (edges, node highlights, node weights, render options)
//! or a rounded [`StepMatrix`] and returns whatever handle it produces.
//!
//! ## Node highlights
//!
//! | Role in [`RoleConfig`] | Highlight |
//! |------------------------|-----------|
//! | `positive_target_event` | [`NodeHighlight::NiceTarget`] |
//! | `negative_target_event` | [`NodeHighlight::BadTarget`] |
//! | `source_event` | [`NodeHighlight::Source`] |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrajectoryError};
use crate::step_matrix::StepMatrix;
use crate::transitions::{edge_list, EdgeList, EdgeListParams};
use crate::types::{EventLog, NormType, RoleConfig};

/// Decimal places of step matrix cells handed to a renderer.
pub const STEP_MATRIX_DECIMALS: i32 = 2;

/// How a node is highlighted in a graph rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeHighlight {
    /// Node and incoming edges in the success color.
    NiceTarget,
    /// Node and incoming edges in the failure color.
    BadTarget,
    /// Node only, success color.
    NiceNode,
    /// Node only, failure color.
    BadNode,
    /// Node and outgoing edges in the source color.
    Source,
}

/// Options passed through to the renderer untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphRenderOptions {
    /// Minimal edge weight to draw.
    pub thresh: f64,
    /// Nodes drawn regardless of `thresh`.
    pub targets: Vec<String>,
    /// Show weights as percentages.
    pub show_percent: bool,
    /// Interactive output.
    pub interactive: bool,
    /// Saved layout to reuse.
    pub layout_dump: Option<String>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Default for GraphRenderOptions {
    fn default() -> Self {
        Self {
            thresh: 0.05,
            targets: Vec::new(),
            show_percent: true,
            interactive: true,
            layout_dump: None,
            width: 500,
            height: 500,
        }
    }
}

/// Parameters for [`graph_bundle`] and [`plot_graph`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphParams {
    /// Explicit highlights; derived from the role config when `None`.
    pub node_params: Option<BTreeMap<String, NodeHighlight>>,
    /// Weighting column for the edge list.
    pub weight_col: Option<String>,
    /// Explicit node sizes; per-event occurrence counts when `None`.
    pub node_weights: Option<BTreeMap<String, u64>>,
    /// Edge list normalization.
    pub norm_type: Option<NormType>,
    /// Render options.
    pub options: GraphRenderOptions,
}

impl Default for GraphParams {
    fn default() -> Self {
        Self {
            node_params: None,
            weight_col: None,
            node_weights: None,
            norm_type: Some(NormType::Full),
            options: GraphRenderOptions::default(),
        }
    }
}

impl GraphParams {
    /// Defaults: full normalization, derived highlights and weights.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use explicit highlights.
    pub fn with_node_params(mut self, node_params: BTreeMap<String, NodeHighlight>) -> Self {
        self.node_params = Some(node_params);
        self
    }

    /// Weight edges by distinct values of `column`.
    pub fn with_weight_col(mut self, column: impl Into<String>) -> Self {
        self.weight_col = Some(column.into());
        self
    }

    /// Use explicit node sizes.
    pub fn with_node_weights(mut self, node_weights: BTreeMap<String, u64>) -> Self {
        self.node_weights = Some(node_weights);
        self
    }

    /// Set or clear the normalization.
    pub fn with_norm(mut self, norm_type: Option<NormType>) -> Self {
        self.norm_type = norm_type;
        self
    }

    /// Set the render options.
    pub fn with_options(mut self, options: GraphRenderOptions) -> Self {
        self.options = options;
        self
    }
}

/// Everything a renderer needs to draw a transition graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphBundle {
    /// Weighted transitions.
    pub edges: EdgeList,
    /// Highlighted nodes.
    pub node_params: BTreeMap<String, NodeHighlight>,
    /// Node sizes.
    pub node_weights: BTreeMap<String, u64>,
    /// Render options.
    pub options: GraphRenderOptions,
}

/// Rendering backend.
///
/// Implementations decide what a rendering is (a file path, a document, a
/// widget id) and report it as [`Renderer::Handle`].
pub trait Renderer {
    /// What a successful rendering returns.
    type Handle;

    /// Error type for rendering.
    type Error: std::error::Error;

    /// Draw a transition graph.
    fn render_graph(&mut self, bundle: &GraphBundle) -> std::result::Result<Self::Handle, Self::Error>;

    /// Draw a step matrix under `title`.
    fn render_step_matrix(
        &mut self,
        matrix: &StepMatrix,
        title: &str,
    ) -> std::result::Result<Self::Handle, Self::Error>;
}

/// Highlights derived from the target and source roles that are set.
pub fn default_node_params(config: &RoleConfig) -> BTreeMap<String, NodeHighlight> {
    [
        (&config.positive_target_event, NodeHighlight::NiceTarget),
        (&config.negative_target_event, NodeHighlight::BadTarget),
        (&config.source_event, NodeHighlight::Source),
    ]
    .into_iter()
    .filter_map(|(event, highlight)| event.clone().map(|e| (e, highlight)))
    .collect()
}

/// Assemble the graph hand-off for `log`.
pub fn graph_bundle(log: &EventLog, config: &RoleConfig, params: &GraphParams) -> Result<GraphBundle> {
    let edge_params = EdgeListParams {
        weight_col: params.weight_col.clone(),
        norm_type: params.norm_type,
        edge_attr_name: None,
    };
    let edges = edge_list(log, config, &edge_params)?;

    let node_params = params
        .node_params
        .clone()
        .unwrap_or_else(|| default_node_params(config));
    let node_weights = params
        .node_weights
        .clone()
        .unwrap_or_else(|| log.event_counts());

    Ok(GraphBundle {
        edges,
        node_params,
        node_weights,
        options: params.options.clone(),
    })
}

/// Build the graph hand-off and pass it to `renderer`.
pub fn plot_graph<R: Renderer>(
    log: &EventLog,
    config: &RoleConfig,
    params: &GraphParams,
    renderer: &mut R,
) -> Result<R::Handle> {
    let bundle = graph_bundle(log, config, params)?;
    tracing::debug!(
        edges = bundle.edges.len(),
        highlighted = bundle.node_params.len(),
        "rendering transition graph"
    );
    renderer
        .render_graph(&bundle)
        .map_err(TrajectoryError::from_renderer)
}

/// Title used for a step matrix rendering.
pub fn step_matrix_title(matrix: &StepMatrix) -> &'static str {
    if matrix.is_reversed() {
        "Step matrix reversed"
    } else {
        "Step matrix"
    }
}

/// Pass `matrix`, rounded to two decimals, to `renderer`.
pub fn plot_step_matrix<R: Renderer>(matrix: &StepMatrix, renderer: &mut R) -> Result<R::Handle> {
    let rounded = matrix.rounded(STEP_MATRIX_DECIMALS);
    renderer
        .render_step_matrix(&rounded, step_matrix_title(matrix))
        .map_err(TrajectoryError::from_renderer)
}

/// Renderer that serializes every hand-off to JSON and keeps it.
///
/// Useful for tests and for shipping the bundle to an external drawing tool.
#[derive(Debug, Clone, Default)]
pub struct JsonRenderer {
    rendered: Vec<serde_json::Value>,
}

impl JsonRenderer {
    /// Create an empty renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents rendered so far, oldest first.
    pub fn rendered(&self) -> &[serde_json::Value] {
        &self.rendered
    }
}

impl Renderer for JsonRenderer {
    type Handle = usize;
    type Error = serde_json::Error;

    fn render_graph(&mut self, bundle: &GraphBundle) -> std::result::Result<usize, Self::Error> {
        self.rendered.push(serde_json::to_value(bundle)?);
        Ok(self.rendered.len() - 1)
    }

    fn render_step_matrix(&mut self, matrix: &StepMatrix, title: &str) -> std::result::Result<usize, Self::Error> {
        self.rendered.push(serde_json::json!({
            "title": title,
            "index": matrix.row_names(),
            "columns": matrix.labels(),
            "values": matrix.values(),
        }));
        Ok(self.rendered.len() - 1)
    }
}
