//! Error taxonomy shared across the pyrrhic build engine crates.

use std::path::PathBuf;

use thiserror::Error;

/// Canonical error type for the pyrrhic engine.
///
/// Every fatal condition named by the engine's contract gets its own
/// variant, carrying the fields a caller needs to report or recover from the
/// failure. `MalformedDag` and `UnknownFormat` are not fatal in the sense
/// the others are: a caller loading a previous run's DAG may treat either as
/// "no previous run" and proceed, per the deserialization contract.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum PyrrhicError {
    /// A rule set would introduce a directed cycle into the dependency graph.
    #[error("cycle detected at node {node} via link to {link_dest}")]
    CycleDetected {
        /// Path of the node at which the back-edge was discovered.
        node: PathBuf,
        /// Destination path of the offending link.
        link_dest: PathBuf,
    },
    /// Two rules produced the same output path.
    #[error("output {path} is produced by more than one rule")]
    DuplicateOutput {
        /// The output path produced twice.
        path: PathBuf,
    },
    /// A command received an input count its contract forbids.
    #[error("bad command usage: {details}")]
    BadCommandUsage {
        /// Human-readable description of the violated contract.
        details: String,
    },
    /// A source node has no on-disk file and no producer in the current DAG.
    #[error("missing input {path}")]
    MissingInput {
        /// Path of the missing source file.
        path: PathBuf,
    },
    /// Deserialization of a persisted DAG failed to parse.
    #[error("malformed DAG at line {line}: {details}")]
    MalformedDag {
        /// 1-indexed line number where parsing failed.
        line: usize,
        /// Description of what went wrong.
        details: String,
    },
    /// Deserialization encountered a format version this engine does not support.
    #[error("unsupported DAG format {format}")]
    UnknownFormat {
        /// The unsupported format version found in the header line.
        format: i64,
    },
}
