#![deny(missing_docs)]

//! Core command contract, error taxonomy, path canonicalization and
//! identity hashing shared by every `pyrrhic` crate.

pub mod command;
pub mod errors;
pub mod hash;
pub mod path;

pub use command::{Command, ExpandedInput, OutputDescriptor, Producer};
pub use errors::PyrrhicError;
pub use hash::ParamHasher;
