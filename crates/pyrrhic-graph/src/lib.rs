#![deny(missing_docs)]

//! The dependency DAG itself: construction from a resolved rule stream,
//! the text serialization format persisted between runs, and the
//! mtime-driven diff/plan algorithm that decides what to delete and
//! rebuild.

mod build;
mod model;
mod plan;
mod serialization;

pub use build::{to_dag, ResolvedOutput};
pub use model::{Dag, Link, Node};
pub use plan::{plan, MapMtimeOracle, MtimeOracle, Plan, RealMtimeOracle};
pub use serialization::{deserialize, serialize};
