use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node '{0}' not found in graph")]
    NodeNotFound(Uuid),
    #[error("cycle detected among ordering edges: {}", format_id_list(.cycle))]
    CycleDetected { cycle: Vec<Uuid> },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("graph file '{0}' not found")]
    FileNotFound(PathBuf),
    #[error("graph file '{path}' is malformed: {message}")]
    Malformed { path: PathBuf, message: String },
    #[error("io error on '{path}': {message}")]
    Io { path: PathBuf, message: String },
}

pub(crate) fn format_id_list(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
