//! Declarative TOML manifest naming `cat`/`copy` rules (§6.6, ambient).
//!
//! This is intentionally minimal — a demo driver's build-file format, not a
//! general-purpose build language. A real user of this engine is expected
//! to write Rust, composing `pyrrhic-resolve::Rule`s directly, the way
//! `examples/website/build.py` composed Python rule tuples.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level manifest: an ordered list of rules, evaluated in declaration
/// order (§4.3).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Manifest {
    /// The rules this manifest declares.
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleSpec>,
}

/// One declarative rule. `kind` selects which built-in command
/// (`pyrrhic-commands::cat`/`copy`) is constructed.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleSpec {
    /// A `cat` rule: concatenates `inputs` into `dest`.
    Cat {
        /// Output path.
        dest: PathBuf,
        /// Human-readable label, defaulted to `"cat"`.
        #[serde(default = "default_cat_name")]
        name: String,
        /// Ordered `(base_dir, path_or_pattern)` input pairs.
        inputs: Vec<(PathBuf, PathBuf)>,
    },
    /// A `copy` rule: copies each input under `dest_dir`.
    Copy {
        /// Destination directory.
        dest_dir: PathBuf,
        /// Human-readable label, defaulted to `"copy"`.
        #[serde(default = "default_copy_name")]
        name: String,
        /// Ordered `(base_dir, path_or_pattern)` input pairs.
        inputs: Vec<(PathBuf, PathBuf)>,
    },
}

fn default_cat_name() -> String {
    "cat".to_string()
}

fn default_copy_name() -> String {
    "copy".to_string()
}
