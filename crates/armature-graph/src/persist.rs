use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::{Graph, GraphError};

/// Writes the graph as pretty-printed JSON, creating parent directories as
/// needed.
pub fn save_graph(graph: &Graph, path: &Path) -> Result<(), GraphError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|error| GraphError::Io {
            path: parent.to_path_buf(),
            message: error.to_string(),
        })?;
    }

    let bytes = serde_json::to_vec_pretty(graph).map_err(|error| GraphError::Io {
        path: path.to_path_buf(),
        message: format!("failed to serialize graph: {error}"),
    })?;

    fs::write(path, bytes).map_err(|error| GraphError::Io {
        path: path.to_path_buf(),
        message: error.to_string(),
    })
}

/// Reads a graph back from disk. A missing file and a malformed file are
/// distinct failures.
pub fn load_graph(path: &Path) -> Result<Graph, GraphError> {
    let bytes = fs::read(path).map_err(|error| {
        if error.kind() == ErrorKind::NotFound {
            GraphError::FileNotFound(path.to_path_buf())
        } else {
            GraphError::Io {
                path: path.to_path_buf(),
                message: error.to_string(),
            }
        }
    })?;

    serde_json::from_slice(&bytes).map_err(|error| GraphError::Malformed {
        path: path.to_path_buf(),
        message: error.to_string(),
    })
}
