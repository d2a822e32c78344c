//! Log-bound facade over every analysis operation.

use crate::error::Result;
use crate::export::{self, GraphBundle, GraphParams, Renderer};
use crate::sessions::{self, SessionLog, SessionParams};
use crate::shift::{self, ShiftedEvent};
use crate::snapshot::LogSnapshot;
use crate::step_matrix::{self, StepMatrix, StepMatrixParams};
use crate::transitions::{self, AdjacencyMatrix, EdgeList, EdgeListParams};
use crate::types::{EventLog, NormType, RoleConfig};

/// An event log paired with its role configuration.
///
/// The config is validated once in [`TrajectoryAnalyzer::new`]; every method
/// is then a pure function of the borrowed log.
///
/// ## Example
///
/// ```
/// use trajectory_kernel::{EventLog, EventRecord, RoleConfig, TrajectoryAnalyzer};
/// use chrono::{TimeZone, Utc};
///
/// let log: EventLog = vec![
///     EventRecord::new("u1", "open", Utc.timestamp_opt(0, 0).unwrap()),
///     EventRecord::new("u1", "buy", Utc.timestamp_opt(60, 0).unwrap()),
/// ]
/// .into();
/// let analyzer = TrajectoryAnalyzer::new(&log, RoleConfig::default()).unwrap();
/// let edges = analyzer.edge_list(&Default::default()).unwrap();
/// assert_eq!(edges.weight("open", "buy"), Some(1.0));
/// ```
#[derive(Debug, Clone)]
pub struct TrajectoryAnalyzer<'a> {
    log: &'a EventLog,
    config: RoleConfig,
}

impl<'a> TrajectoryAnalyzer<'a> {
    /// Bind `config` to `log`.
    pub fn new(log: &'a EventLog, config: RoleConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { log, config })
    }

    /// The analyzed log.
    pub fn log(&self) -> &'a EventLog {
        self.log
    }

    /// The role configuration.
    pub fn config(&self) -> &RoleConfig {
        &self.config
    }

    /// Fingerprint of the analyzed log.
    pub fn snapshot(&self) -> LogSnapshot {
        LogSnapshot::compute(self.log)
    }

    /// Every row with its successor.
    pub fn shifted(&self) -> Result<Vec<ShiftedEvent<'a>>> {
        shift::shifted(self.log, &self.config)
    }

    /// Weighted transitions.
    pub fn edge_list(&self, params: &EdgeListParams) -> Result<EdgeList> {
        transitions::edge_list(self.log, &self.config, params)
    }

    /// Square transition matrix over every event of the log.
    pub fn adjacency(&self, weight_col: Option<&str>, norm_type: Option<NormType>) -> Result<AdjacencyMatrix> {
        transitions::adjacency(self.log, &self.config, weight_col, norm_type)
    }

    /// Event-by-step occupancy.
    pub fn step_matrix(&self, params: &StepMatrixParams) -> Result<StepMatrix> {
        step_matrix::step_matrix(self.log, &self.config, params)
    }

    /// Session labels.
    pub fn sessions(&self, params: &SessionParams) -> Result<SessionLog> {
        sessions::sessions(self.log, &self.config, params)
    }

    /// Graph hand-off without rendering.
    pub fn graph_bundle(&self, params: &GraphParams) -> Result<GraphBundle> {
        export::graph_bundle(self.log, &self.config, params)
    }

    /// Render the transition graph.
    pub fn plot_graph<R: Renderer>(&self, params: &GraphParams, renderer: &mut R) -> Result<R::Handle> {
        export::plot_graph(self.log, &self.config, params, renderer)
    }

    /// Compute and render the step matrix.
    pub fn plot_step_matrix<R: Renderer>(&self, params: &StepMatrixParams, renderer: &mut R) -> Result<R::Handle> {
        let matrix = self.step_matrix(params)?;
        export::plot_step_matrix(&matrix, renderer)
    }
}
