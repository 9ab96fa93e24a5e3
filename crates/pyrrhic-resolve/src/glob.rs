//! Glob resolution against both the filesystem and not-yet-materialized
//! declared outputs of earlier rules (§4.2, C2).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use globset::GlobBuilder;
use walkdir::WalkDir;

use pyrrhic_core::{ExpandedInput, PyrrhicError};

/// Expands glob patterns against the filesystem and against outputs
/// declared by rules resolved earlier in the same run.
///
/// `declared_outputs` is append-only for the lifetime of one resolve pass
/// (§4.2): nothing ever removes from it, and it is never shared across
/// runs — a fresh `Globber` is built per invocation of [`crate::resolve`].
#[derive(Default)]
pub struct Globber {
    seen_outputs: HashSet<String>,
    declared_outputs: Vec<String>,
}

impl Globber {
    /// Creates an empty globber with no declared outputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `path` as an output a rule has produced so far this run, so
    /// later rules' glob patterns can match it even before it exists on
    /// disk.
    pub fn declare_output(&mut self, path: &Path) {
        let key = display_key(path);
        if self.seen_outputs.insert(key.clone()) {
            self.declared_outputs.push(key);
        }
    }

    /// Expands every `(base, path)` pair: patterns without `*` pass through
    /// unchanged; patterns with `*` are matched against the filesystem
    /// under `base` first, then against declared outputs, each match
    /// yielded exactly once (§4.2 ordering: filesystem before declared,
    /// duplicates suppressed).
    pub fn glob(&self, inputs: &[ExpandedInput]) -> Result<Vec<ExpandedInput>, PyrrhicError> {
        let mut out = Vec::new();
        for (base, path) in inputs {
            let pattern_text = path.to_string_lossy();
            if !pattern_text.contains('*') {
                out.push((base.clone(), path.clone()));
                continue;
            }

            let full_pattern = display_key(&base.join(path));
            let matcher = GlobBuilder::new(&full_pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| PyrrhicError::BadCommandUsage {
                    details: format!("invalid glob pattern '{full_pattern}': {e}"),
                })?
                .compile_matcher();

            let mut local_seen: HashSet<String> = HashSet::new();

            for entry in WalkDir::new(base)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
            {
                let candidate = display_key(entry.path());
                if matcher.is_match(&candidate) && local_seen.insert(candidate) {
                    let relative = entry
                        .path()
                        .strip_prefix(base)
                        .unwrap_or(entry.path())
                        .to_path_buf();
                    out.push((base.clone(), relative));
                }
            }

            for candidate in &self.declared_outputs {
                if matcher.is_match(candidate.as_str()) && local_seen.insert(candidate.clone()) {
                    let full = PathBuf::from(candidate);
                    let relative = full.strip_prefix(base).unwrap_or(&full).to_path_buf();
                    out.push((base.clone(), relative));
                }
            }
        }
        Ok(out)
    }
}

fn display_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_wildcard_paths_pass_through_unchanged() {
        let globber = Globber::new();
        let input = vec![(PathBuf::from("src"), PathBuf::from("a.txt"))];
        let result = globber.glob(&input).unwrap();
        assert_eq!(result, input);
    }

    #[test]
    fn matches_declared_outputs_even_before_they_exist_on_disk() {
        let mut globber = Globber::new();
        globber.declare_output(&PathBuf::from("out/generated.html"));
        let input = vec![(PathBuf::from("out"), PathBuf::from("*.html"))];
        let result = globber.glob(&input).unwrap();
        assert_eq!(result, vec![(PathBuf::from("out"), PathBuf::from("generated.html"))]);
    }

    #[test]
    fn declared_output_matches_are_deduplicated() {
        let mut globber = Globber::new();
        globber.declare_output(&PathBuf::from("out/a.html"));
        globber.declare_output(&PathBuf::from("out/a.html"));
        let input = vec![(PathBuf::from("out"), PathBuf::from("*.html"))];
        let result = globber.glob(&input).unwrap();
        assert_eq!(result.len(), 1);
    }
}
