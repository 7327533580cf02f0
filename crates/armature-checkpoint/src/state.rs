use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use armature_graph::{Graph, NodeId};

pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    #[default]
    Pending,
    InProgress,
    Passed,
    Failed,
    Skipped,
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        };
        write!(f, "{label}")
    }
}

/// Per-node progress record. Also the status-report object handed to
/// execution layers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeProgress {
    pub status: GenerationStatus,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

/// Progress for every planned node plus the retry budget. Holds no
/// topology: the graph can be re-planned without touching this state, and
/// this state checkpoints without serializing the graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationState {
    pub max_retries: u32,
    pub nodes: BTreeMap<NodeId, NodeProgress>,
}

impl GenerationState {
    /// Seeds a pending record for every node in the graph.
    pub fn for_graph(graph: &Graph, max_retries: u32) -> Self {
        Self {
            max_retries,
            nodes: graph
                .nodes
                .keys()
                .map(|id| (*id, NodeProgress::default()))
                .collect(),
        }
    }

    pub fn progress(&self, node_id: NodeId) -> Option<&NodeProgress> {
        self.nodes.get(&node_id)
    }

    pub fn status(&self, node_id: NodeId) -> GenerationStatus {
        self.nodes
            .get(&node_id)
            .map(|record| record.status)
            .unwrap_or_default()
    }

    pub fn mark_in_progress(&mut self, node_id: NodeId) {
        self.nodes.entry(node_id).or_default().status = GenerationStatus::InProgress;
    }

    pub fn mark_passed(&mut self, node_id: NodeId) {
        let record = self.nodes.entry(node_id).or_default();
        record.status = GenerationStatus::Passed;
        record.failure_reason = None;
    }

    /// Records a failure and charges one retry.
    pub fn mark_failed(&mut self, node_id: NodeId, reason: impl Into<String>) {
        let record = self.nodes.entry(node_id).or_default();
        record.status = GenerationStatus::Failed;
        record.retry_count += 1;
        record.failure_reason = Some(reason.into());
    }

    pub fn mark_skipped(&mut self, node_id: NodeId) {
        self.nodes.entry(node_id).or_default().status = GenerationStatus::Skipped;
    }

    /// Returns the record to pending with a clean retry budget.
    pub fn reset(&mut self, node_id: NodeId) {
        *self.nodes.entry(node_id).or_default() = NodeProgress::default();
    }

    pub fn can_retry(&self, node_id: NodeId) -> bool {
        self.nodes
            .get(&node_id)
            .map(|record| record.retry_count < self.max_retries)
            .unwrap_or(true)
    }
}

impl Default for GenerationState {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            nodes: BTreeMap::new(),
        }
    }
}
