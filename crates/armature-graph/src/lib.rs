//! Dependency graph model and algorithms for planned code generation.
//!
//! The graph is the single source of topology: typed nodes (module /
//! component / feature units) connected by typed edges, with pure
//! algorithms for ordering, traversal, extraction, drift diffing,
//! validation and JSON persistence.

pub mod algorithms;
pub mod errors;
pub mod filter;
pub mod model;
pub mod persist;
pub mod subgraph;
pub mod validate;

pub use algorithms::*;
pub use errors::*;
pub use filter::*;
pub use model::*;
pub use persist::*;
pub use subgraph::*;
pub use validate::*;
