//! Durable generation progress for a planned dependency graph.
//!
//! Generation state (per-node status, retry accounting) lives apart from
//! the graph so either can be replaced without the other. The checkpoint
//! manager composes the two to answer "what still needs work" and to
//! validate resume points.

pub mod errors;
pub mod manager;
pub mod state;

pub use errors::*;
pub use manager::*;
pub use state::*;
