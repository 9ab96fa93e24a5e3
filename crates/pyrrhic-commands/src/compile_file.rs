//! `compile_file`: compiles a single file, tracking discovered imports as
//! additional dependencies (§4.1; grounds the website example's SCSS/page
//! compiler pattern).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pyrrhic_core::hash::ParamHasher;
use pyrrhic_core::{Command, ExpandedInput, OutputDescriptor, PyrrhicError};

/// Compiles a file's bytes given its base directory and relative path.
pub type CompileFn = Arc<dyn Fn(&Path, &Path) -> Vec<u8> + Send + Sync>;

/// Scans a file for further dependencies it references (e.g. `@import`
/// targets), returning them as additional `(base, path)` pairs.
pub type ScanFn = Arc<dyn Fn(&Path, &Path) -> Vec<ExpandedInput> + Send + Sync>;

/// Builds a single-input compiler command. `kind` is a short, stable label
/// (e.g. `"scss"`, `"markdown"`) mixed into the identity hash alongside
/// `dest`, standing in for the otherwise-opaque `compile_fn`/`scan_fn`
/// closures (§4.8: identity must depend on human-visible configuration,
/// not on closure identity).
///
/// Per §4.1 this command's contract requires exactly one input; violating
/// that fails with `BadCommandUsage`.
pub fn compile_file(
    dest: impl Into<PathBuf>,
    name: impl Into<String>,
    kind: &str,
    compile_fn: CompileFn,
    scan_fn: ScanFn,
) -> Command {
    let dest = dest.into();
    let name = name.into();
    let identity_hash = ParamHasher::new("compile_file")
        .write_path(&dest)
        .write_str(kind)
        .finish();

    let producer_dest = dest.clone();
    Command::new(
        Arc::new(move |inputs: &[ExpandedInput]| {
            if inputs.len() != 1 {
                return Err(PyrrhicError::BadCommandUsage {
                    details: format!(
                        "compile_file takes exactly one input, got {}",
                        inputs.len()
                    ),
                });
            }
            let (base, path) = inputs[0].clone();
            let mut all_sources = vec![(base.clone(), path.clone())];
            all_sources.extend(scan_fn(&base, &path));

            let compile_fn = compile_fn.clone();
            let compile_base = base.clone();
            let compile_path = path.clone();
            Ok(vec![OutputDescriptor {
                output_path: producer_dest.clone(),
                direct_inputs: vec![(base, path)],
                all_sources,
                deferred_writer: Arc::new(move || compile_fn(&compile_base, &compile_path)),
            }])
        }),
        name,
        identity_hash,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn rejects_more_than_one_input() {
        let command = compile_file(
            "out.css",
            "compile_file",
            "scss",
            Arc::new(|_, _| Vec::new()),
            Arc::new(|_, _| Vec::new()),
        );
        let inputs = vec![
            (PathBuf::from("."), PathBuf::from("a.scss")),
            (PathBuf::from("."), PathBuf::from("b.scss")),
        ];
        let err = command.produce(&inputs).unwrap_err();
        assert!(matches!(err, PyrrhicError::BadCommandUsage { .. }));
    }

    #[test]
    fn all_sources_includes_scanned_imports() {
        let dir = tempdir().unwrap();
        let base = dir.path().to_path_buf();
        let scan_base = base.clone();

        let command = compile_file(
            "out.css",
            "compile_file",
            "scss",
            Arc::new(|_, _| b"compiled".to_vec()),
            Arc::new(move |_, _| vec![(scan_base.clone(), PathBuf::from("_partial.scss"))]),
        );
        let inputs = vec![(base.clone(), PathBuf::from("main.scss"))];
        let descriptors = command.produce(&inputs).unwrap();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].all_sources.len(), 2);
        assert_eq!((descriptors[0].deferred_writer)(), b"compiled");
    }
}
