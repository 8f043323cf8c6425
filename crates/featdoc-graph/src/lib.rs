//! featdoc Dependency Graph
//!
//! OutList/InList bookkeeping and ordering for document objects. Edges point
//! from an object to what it references; execution runs in the reverse of the
//! topological order so dependencies are computed first.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod graph;
mod types;

pub use error::GraphError;
pub use graph::DependencyGraph;
pub use types::ObjectId;
