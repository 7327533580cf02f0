use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use armature_graph::{ancestors, descendants, EdgeType, Graph, NodeId};

use crate::{CheckpointError, GenerationState, GenerationStatus, NodeProgress};

pub const CHECKPOINT_FILE_NAME: &str = "checkpoint.json";

/// Edge types whose closure gates resuming: a unit cannot restart before
/// its containers and data providers have passed, and resetting it
/// invalidates everything those edges feed downstream.
const RESUME_EDGE_TYPES: [EdgeType; 2] = [EdgeType::Hierarchy, EdgeType::DataFlow];

/// Composes the graph (topology) with generation state (progress) to decide
/// what needs work and to validate resume points. Single-writer: callers
/// needing concurrent access must serialize around save/resume themselves.
#[derive(Clone, Debug)]
pub struct CheckpointManager {
    graph: Graph,
    state: GenerationState,
    checkpoint_path: PathBuf,
}

impl CheckpointManager {
    /// Starts a fresh plan: every node pending.
    pub fn new(graph: Graph, max_retries: u32, checkpoint_path: impl Into<PathBuf>) -> Self {
        let state = GenerationState::for_graph(&graph, max_retries);
        Self {
            graph,
            state,
            checkpoint_path: checkpoint_path.into(),
        }
    }

    /// Restores state from a checkpoint file, re-associating it with the
    /// caller-supplied graph. Records for nodes no longer planned are
    /// dropped; newly planned nodes are seeded pending.
    pub fn load_checkpoint(
        path: impl Into<PathBuf>,
        graph: Graph,
    ) -> Result<Self, CheckpointError> {
        let path = path.into();
        let bytes = fs::read(&path).map_err(|error| {
            if error.kind() == ErrorKind::NotFound {
                CheckpointError::FileNotFound(path.clone())
            } else {
                CheckpointError::Io {
                    path: path.clone(),
                    message: error.to_string(),
                }
            }
        })?;
        let mut state: GenerationState =
            serde_json::from_slice(&bytes).map_err(|error| CheckpointError::Malformed {
                path: path.clone(),
                message: error.to_string(),
            })?;

        let stale: Vec<NodeId> = state
            .nodes
            .keys()
            .filter(|id| !graph.contains_node(**id))
            .copied()
            .collect();
        for id in &stale {
            state.nodes.remove(id);
        }
        if !stale.is_empty() {
            tracing::warn!(count = stale.len(), "dropped checkpoint records for unplanned nodes");
        }
        for id in graph.nodes.keys() {
            state.nodes.entry(*id).or_default();
        }

        tracing::debug!(path = %path.display(), nodes = state.nodes.len(), "checkpoint loaded");
        Ok(Self {
            graph,
            state,
            checkpoint_path: path,
        })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }

    /// Status report for one node, for the execution layer.
    pub fn progress(&self, node_id: NodeId) -> Result<NodeProgress, CheckpointError> {
        self.require_node(node_id)?;
        Ok(self.state.progress(node_id).cloned().unwrap_or_default())
    }

    /// Everything still owed work: pending nodes, interrupted in-progress
    /// nodes (always retried, never silently dropped), and failed nodes
    /// with retry budget left. Sorted by node id.
    pub fn nodes_to_process(&self) -> Vec<NodeId> {
        self.state
            .nodes
            .iter()
            .filter(|(_, record)| match record.status {
                GenerationStatus::Pending | GenerationStatus::InProgress => true,
                GenerationStatus::Failed => record.retry_count < self.state.max_retries,
                GenerationStatus::Passed | GenerationStatus::Skipped => false,
            })
            .map(|(id, _)| *id)
            .collect()
    }

    /// Ancestors (hierarchy + data-flow closure) that have not passed yet,
    /// sorted. Empty means the node is eligible to (re)start.
    pub fn validate_start_from(&self, node_id: NodeId) -> Result<Vec<NodeId>, CheckpointError> {
        self.require_node(node_id)?;
        let upstream = ancestors(&self.graph, node_id, &RESUME_EDGE_TYPES)?;
        Ok(upstream
            .into_iter()
            .filter(|id| self.state.status(*id) != GenerationStatus::Passed)
            .collect())
    }

    /// Resets the node and its hierarchy + data-flow descendants to pending
    /// and persists the checkpoint. Fails with the blocking ancestors when
    /// any of them has not passed. Returns the sorted reset set.
    pub fn resume_from_node(&mut self, node_id: NodeId) -> Result<Vec<NodeId>, CheckpointError> {
        let blockers = self.validate_start_from(node_id)?;
        if !blockers.is_empty() {
            return Err(CheckpointError::Blocked {
                node: node_id,
                blockers,
            });
        }

        let mut reset: Vec<NodeId> = descendants(&self.graph, node_id, &RESUME_EDGE_TYPES)?
            .into_iter()
            .collect();
        reset.insert(0, node_id);
        reset.sort();
        reset.dedup();
        for id in &reset {
            self.state.reset(*id);
        }
        self.save_checkpoint(None)?;
        tracing::debug!(node = %node_id, reset = reset.len(), "resume point applied");
        Ok(reset)
    }

    /// A node is safe to blindly re-execute only when no partial side
    /// effects can linger: passed, pending or skipped. In-progress and
    /// failed nodes require an explicit reset first.
    pub fn is_idempotent_safe(&self, node_id: NodeId) -> Result<bool, CheckpointError> {
        self.require_node(node_id)?;
        Ok(matches!(
            self.state.status(node_id),
            GenerationStatus::Passed | GenerationStatus::Pending | GenerationStatus::Skipped
        ))
    }

    pub fn record_in_progress(&mut self, node_id: NodeId) -> Result<(), CheckpointError> {
        self.require_node(node_id)?;
        self.state.mark_in_progress(node_id);
        self.save_checkpoint(None).map(|_| ())
    }

    pub fn record_passed(&mut self, node_id: NodeId) -> Result<(), CheckpointError> {
        self.require_node(node_id)?;
        self.state.mark_passed(node_id);
        self.save_checkpoint(None).map(|_| ())
    }

    pub fn record_failed(
        &mut self,
        node_id: NodeId,
        reason: impl Into<String>,
    ) -> Result<(), CheckpointError> {
        self.require_node(node_id)?;
        self.state.mark_failed(node_id, reason);
        self.save_checkpoint(None).map(|_| ())
    }

    pub fn record_skipped(&mut self, node_id: NodeId) -> Result<(), CheckpointError> {
        self.require_node(node_id)?;
        self.state.mark_skipped(node_id);
        self.save_checkpoint(None).map(|_| ())
    }

    /// Persists the state as pretty JSON. The write goes to a sibling
    /// `.tmp` file first and is renamed into place, so readers never see a
    /// partial checkpoint.
    pub fn save_checkpoint(&self, path: Option<&Path>) -> Result<PathBuf, CheckpointError> {
        let target = path.unwrap_or(&self.checkpoint_path).to_path_buf();
        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|error| CheckpointError::Io {
                    path: parent.to_path_buf(),
                    message: error.to_string(),
                })?;
            }
        }

        let bytes =
            serde_json::to_vec_pretty(&self.state).map_err(|error| CheckpointError::Io {
                path: target.clone(),
                message: format!("failed to serialize checkpoint: {error}"),
            })?;

        let tmp = target.with_extension("json.tmp");
        fs::write(&tmp, bytes).map_err(|error| CheckpointError::Io {
            path: tmp.clone(),
            message: error.to_string(),
        })?;
        fs::rename(&tmp, &target).map_err(|error| CheckpointError::Io {
            path: target.clone(),
            message: error.to_string(),
        })?;

        tracing::debug!(path = %target.display(), "checkpoint saved");
        Ok(target)
    }

    fn require_node(&self, node_id: NodeId) -> Result<(), CheckpointError> {
        if self.graph.contains_node(node_id) {
            Ok(())
        } else {
            Err(CheckpointError::NodeNotFound(node_id))
        }
    }
}

pub fn checkpoint_file_path(root: &Path) -> PathBuf {
    root.join(CHECKPOINT_FILE_NAME)
}
