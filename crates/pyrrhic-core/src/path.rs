//! Canonical path handling (§3 invariant 6).
//!
//! Node identity is path identity: two paths must compare string-equal
//! after normalization for the DAG to treat them as the same node. This
//! module does a purely lexical normalization (no filesystem access, since
//! an output path may not exist yet) — it collapses `.` and resolvable `..`
//! components and joins with `/` regardless of platform.

use std::path::{Component, Path, PathBuf};

/// Joins `base` and `relative`, then lexically normalizes the result so
/// that equivalent paths are string-equal.
pub fn canonical_join(base: &Path, relative: &Path) -> PathBuf {
    normalize(&base.join(relative))
}

/// Lexically normalizes a path: resolves `.` and `..` components without
/// touching the filesystem, and drops repeated separators.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                match out.last() {
                    Some(Component::Normal(_)) => {
                        out.pop();
                    }
                    _ => out.push(component),
                }
            }
            other => out.push(other),
        }
    }
    out.into_iter().collect()
}
