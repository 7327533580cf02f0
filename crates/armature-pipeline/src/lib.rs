//! Compiles a delta-annotated dependency graph into a workflow document:
//! a Graphviz-style directed graph of implementation, validation and
//! decision stages with retry loops, consumed by an external execution
//! layer. Compilation is defensive and deterministic; it never fails.

pub mod compile;
pub mod delta;
pub mod roles;
pub mod text;

pub use compile::*;
pub use delta::*;
pub use roles::*;
pub use text::*;
