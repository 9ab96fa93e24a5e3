//! `cat`: concatenates a sequence of inputs into a single output (§4.1,
//! Design Note on source-embedded closures).

use std::path::PathBuf;
use std::sync::Arc;

use pyrrhic_core::hash::ParamHasher;
use pyrrhic_core::{Command, ExpandedInput, OutputDescriptor};

use crate::transform::{identity, Transform};

/// Builds a `cat` command writing the concatenation of every input to
/// `dest`, applying `trans` to each input's bytes as it is read and
/// `trans_final` to the joined result.
///
/// Multi-input semantics (§4.1): exactly one `OutputDescriptor` is emitted,
/// whose `direct_inputs` lists every input the rule was given.
pub fn cat_with(
    dest: impl Into<PathBuf>,
    name: impl Into<String>,
    trans: Transform,
    trans_final: Transform,
    has_custom_transform: bool,
) -> Command {
    let dest = dest.into();
    let name = name.into();
    let identity_hash = ParamHasher::new("cat")
        .write_path(&dest)
        .write_bool(has_custom_transform)
        .finish();

    let producer_dest = dest.clone();
    Command::new(
        Arc::new(move |inputs: &[ExpandedInput]| {
            let inputs = inputs.to_vec();
            let trans = trans.clone();
            let trans_final = trans_final.clone();
            let dest = producer_dest.clone();
            let read_inputs = inputs.clone();
            Ok(vec![OutputDescriptor {
                output_path: dest,
                direct_inputs: inputs.clone(),
                all_sources: inputs,
                deferred_writer: Arc::new(move || {
                    let mut joined = Vec::new();
                    for (base, path) in &read_inputs {
                        let bytes = std::fs::read(base.join(path)).unwrap_or_default();
                        joined.extend(trans(bytes));
                    }
                    trans_final(joined)
                }),
            }])
        }),
        name,
        identity_hash,
    )
}

/// Builds a `cat` command with identity transforms — the common case.
pub fn cat(dest: impl Into<PathBuf>, name: impl Into<String>) -> Command {
    cat_with(dest, name, identity(), identity(), false)
}
