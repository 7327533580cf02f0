use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("node '{0}' not found in graph")]
    NodeNotFound(Uuid),
    #[error("cannot resume from '{node}': ancestors not passed: {}", format_blockers(.blockers))]
    Blocked { node: Uuid, blockers: Vec<Uuid> },
    #[error("checkpoint file '{0}' not found")]
    FileNotFound(PathBuf),
    #[error("checkpoint file '{path}' is malformed: {message}")]
    Malformed { path: PathBuf, message: String },
    #[error("io error on '{path}': {message}")]
    Io { path: PathBuf, message: String },
    #[error(transparent)]
    Graph(#[from] armature_graph::GraphError),
}

fn format_blockers(blockers: &[Uuid]) -> String {
    blockers
        .iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
