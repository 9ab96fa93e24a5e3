//! The command contract (§4.1): a command turns expanded inputs into a lazy
//! sequence of output descriptors.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::errors::PyrrhicError;

/// One `(base_dir, relative_path)` pair after glob expansion.
pub type ExpandedInput = (PathBuf, PathBuf);

/// What a command emits for one of its outputs.
///
/// `direct_inputs` is the subset of `all_sources` the user explicitly listed
/// in the rule; `all_sources` additionally includes anything the command
/// discovered on its own (an `@import` target, a referenced template, ...).
#[derive(Clone)]
pub struct OutputDescriptor {
    /// The artifact this descriptor produces.
    pub output_path: PathBuf,
    /// Inputs explicitly listed by the rule.
    pub direct_inputs: Vec<ExpandedInput>,
    /// `direct_inputs` plus any transitively discovered dependencies.
    pub all_sources: Vec<ExpandedInput>,
    /// Nullary callable returning the output bytes. Never invoked by the
    /// core engine itself — only by an external applier via `Node::apply`.
    pub deferred_writer: Arc<dyn Fn() -> Vec<u8> + Send + Sync>,
}

impl fmt::Debug for OutputDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputDescriptor")
            .field("output_path", &self.output_path)
            .field("direct_inputs", &self.direct_inputs)
            .field("all_sources", &self.all_sources)
            .finish_non_exhaustive()
    }
}

/// A command's producer: given glob-expanded inputs for one rule, yields the
/// output descriptors for that rule.
pub trait Producer: Send + Sync {
    /// Produces output descriptors for the given expanded inputs.
    fn produce(&self, inputs: &[ExpandedInput]) -> Result<Vec<OutputDescriptor>, PyrrhicError>;
}

impl<F> Producer for F
where
    F: Fn(&[ExpandedInput]) -> Result<Vec<OutputDescriptor>, PyrrhicError> + Send + Sync,
{
    fn produce(&self, inputs: &[ExpandedInput]) -> Result<Vec<OutputDescriptor>, PyrrhicError> {
        self(inputs)
    }
}

/// A parameterized, hashable unit of work (§3 `Command`).
///
/// `identity_hash` must be deterministic across process runs for
/// semantically identical commands, and distinct for different
/// parameterizations (§4.8). `human_name` is retained for debugging only and
/// carries no identity weight: two commands with the same hash but
/// different names are a permitted rename (§3).
#[derive(Clone)]
pub struct Command {
    producer: Arc<dyn Producer>,
    human_name: String,
    identity_hash: [u8; 32],
}

impl Command {
    /// Builds a command from a producer, a human-readable name and its
    /// precomputed identity hash.
    pub fn new(
        producer: Arc<dyn Producer>,
        human_name: impl Into<String>,
        identity_hash: [u8; 32],
    ) -> Self {
        Self {
            producer,
            human_name: human_name.into(),
            identity_hash,
        }
    }

    /// Builds a do-not-call stub for a command whose producer is unknown —
    /// the state after deserializing a persisted DAG, where only the name
    /// and hash survive (§4.6).
    pub fn stub(human_name: impl Into<String>, identity_hash: [u8; 32]) -> Self {
        let name = human_name.into();
        let producer_name = name.clone();
        Self::new(
            Arc::new(move |_: &[ExpandedInput]| {
                Err(PyrrhicError::BadCommandUsage {
                    details: format!(
                        "command '{producer_name}' was deserialized from a persisted DAG and has no live producer"
                    ),
                })
            }),
            name,
            identity_hash,
        )
    }

    /// Invokes the producer over the given expanded inputs.
    pub fn produce(
        &self,
        inputs: &[ExpandedInput],
    ) -> Result<Vec<OutputDescriptor>, PyrrhicError> {
        self.producer.produce(inputs)
    }

    /// The human-readable, non-load-bearing label for this command.
    pub fn human_name(&self) -> &str {
        &self.human_name
    }

    /// The fixed-width identity fingerprint for this command (§4.8).
    pub fn identity_hash(&self) -> [u8; 32] {
        self.identity_hash
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("human_name", &self.human_name)
            .field("identity_hash", &hex_prefix(&self.identity_hash))
            .finish_non_exhaustive()
    }
}

fn hex_prefix(bytes: &[u8; 32]) -> String {
    bytes[..4].iter().map(|b| format!("{b:02x}")).collect()
}
