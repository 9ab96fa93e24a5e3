//! `copy`: copies each input to a corresponding path under a destination
//! directory, one output per input (§4.1).

use std::path::PathBuf;
use std::sync::Arc;

use pyrrhic_core::hash::ParamHasher;
use pyrrhic_core::{Command, ExpandedInput, OutputDescriptor};

use crate::transform::{identity, Transform};

/// Builds a `copy` command that, for every input `(base, path)`, writes
/// `trans(read(base/path))` to `dest_dir/path`.
///
/// Per-input semantics (§4.1): one descriptor is emitted per input, each
/// with a single-element `direct_inputs`.
pub fn copy_with(
    dest_dir: impl Into<PathBuf>,
    name: impl Into<String>,
    trans: Transform,
    has_custom_transform: bool,
) -> Command {
    let dest_dir = dest_dir.into();
    let name = name.into();
    let identity_hash = ParamHasher::new("copy")
        .write_path(&dest_dir)
        .write_bool(has_custom_transform)
        .finish();

    let producer_dest_dir = dest_dir.clone();
    Command::new(
        Arc::new(move |inputs: &[ExpandedInput]| {
            let dest_dir = producer_dest_dir.clone();
            let trans = trans.clone();
            Ok(inputs
                .iter()
                .map(|(base, path)| {
                    let output_path = dest_dir.join(path);
                    let input = (base.clone(), path.clone());
                    let trans = trans.clone();
                    let source = base.join(path);
                    OutputDescriptor {
                        output_path,
                        direct_inputs: vec![input.clone()],
                        all_sources: vec![input],
                        deferred_writer: Arc::new(move || {
                            trans(std::fs::read(&source).unwrap_or_default())
                        }),
                    }
                })
                .collect())
        }),
        name,
        identity_hash,
    )
}

/// Builds a `copy` command with an identity transform.
pub fn copy(dest_dir: impl Into<PathBuf>, name: impl Into<String>) -> Command {
    copy_with(dest_dir, name, identity(), false)
}
