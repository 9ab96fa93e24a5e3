//! Build driver: loads a manifest, resolves it into a DAG, diffs it against
//! the previous run's persisted DAG and applies the resulting plan.
//!
//! Grounded in `examples/website/build.py`'s driver loop: load rules, build
//! the DAG, load the last run (a missing or malformed file just means "no
//! previous run"), compute the plan, prompt before each deletion, apply
//! writes, then persist the new DAG.

use std::error::Error;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use pyrrhic_core::path::normalize;
use pyrrhic_core::ExpandedInput;
use pyrrhic_graph::{plan, Dag, Node, Plan, RealMtimeOracle};
use pyrrhic_resolve::{resolve, Rule};

use crate::manifest::{Manifest, RuleSpec};

/// Arguments for the `build` subcommand.
pub struct BuildArgs {
    /// Path to the TOML manifest naming this build's rules.
    pub manifest: PathBuf,
    /// Path the DAG from the previous run is read from and the new one is
    /// written to.
    pub lastrun: PathBuf,
    /// Skip the interactive confirmation before each deletion.
    pub yes: bool,
}

/// Arguments for the `clean` subcommand.
pub struct CleanArgs {
    /// Path to the persisted DAG whose artifacts should be removed.
    pub lastrun: PathBuf,
}

/// Runs `pyrrhic build`.
pub fn build(args: BuildArgs) -> Result<(), Box<dyn Error>> {
    let manifest_text = std::fs::read_to_string(&args.manifest)?;
    let manifest: Manifest = toml::from_str(&manifest_text)?;

    let rules = manifest.rules.into_iter().map(rule_from_spec);
    let resolved = resolve(rules)?;
    let current = pyrrhic_graph::to_dag(resolved)?;
    let previous = load_previous(&args.lastrun);

    let steps = plan(&current, &previous, &RealMtimeOracle)?;
    for step in steps {
        match step {
            Plan::Delete(path) => {
                println!("delete {}", path.display());
                if args.yes || yes_or_no(&format!("Delete {}", path.display()))? {
                    match std::fs::remove_file(&path) {
                        Ok(()) => {}
                        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                        Err(err) => return Err(err.into()),
                    }
                }
            }
            Plan::Write(path) => {
                println!("write {}", path.display());
                let node = current
                    .pick(&path)
                    .expect("plan only names paths present in the current DAG");
                apply_node(node)?;
            }
        }
    }

    if let Some(parent) = args.lastrun.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&args.lastrun, pyrrhic_graph::serialize(&current))?;
    Ok(())
}

/// Runs `pyrrhic clean`: removes every artifact the last persisted DAG
/// recorded a producer for, then discards the persisted DAG itself.
pub fn clean(args: CleanArgs) -> Result<(), Box<dyn Error>> {
    let dag = load_previous(&args.lastrun);
    for node in dag.nodes() {
        if node.is_source() {
            continue;
        }
        println!("delete {}", node.path.display());
        match std::fs::remove_file(&node.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
    }
    match std::fs::remove_file(&args.lastrun) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

fn rule_from_spec(spec: RuleSpec) -> Rule {
    match spec {
        RuleSpec::Cat { dest, name, inputs } => Rule::new(pyrrhic_commands::cat(dest, name), inputs),
        RuleSpec::Copy {
            dest_dir,
            name,
            inputs,
        } => Rule::new(pyrrhic_commands::copy(dest_dir, name), inputs),
    }
}

/// Loads the DAG persisted at `path`. A missing file, or one that fails to
/// parse, is treated as "no previous run" rather than a fatal error — the
/// same leniency `build.py` affords `FileNotFoundError`.
fn load_previous(path: &Path) -> Dag {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(_) => return Dag::new(),
    };
    match pyrrhic_graph::deserialize(&text) {
        Ok(dag) => dag,
        Err(err) => {
            tracing::warn!(%err, path = %path.display(), "previous DAG unreadable, starting from empty");
            Dag::new()
        }
    }
}

/// Invokes a node's producing command and writes its output, reconstructing
/// the command's direct inputs from `direct_rlinks` (§6.2: the writer side
/// of a DAG is only ever invoked by an external caller, never the engine).
fn apply_node(node: &Node) -> Result<(), Box<dyn Error>> {
    let command = node.production.as_ref().ok_or_else(|| {
        format!(
            "{} has no producing command recorded in the current DAG",
            node.path.display()
        )
    })?;

    let inputs: Vec<ExpandedInput> = node
        .direct_rlinks
        .iter()
        .map(|link| {
            let base = normalize(&link.base_dir);
            let relative = link
                .src
                .strip_prefix(&base)
                .unwrap_or(&link.src)
                .to_path_buf();
            (link.base_dir.clone(), relative)
        })
        .collect();

    let descriptors = command.produce(&inputs)?;
    for descriptor in descriptors {
        if descriptor.output_path != node.path {
            return Err(pyrrhic_core::PyrrhicError::BadCommandUsage {
                details: format!(
                    "producer for {} emitted a descriptor for {} instead",
                    node.path.display(),
                    descriptor.output_path.display()
                ),
            }
            .into());
        }
        if let Some(parent) = descriptor.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&descriptor.output_path, (descriptor.deferred_writer)())?;
    }
    Ok(())
}

fn yes_or_no(question: &str) -> Result<bool, std::io::Error> {
    let mut input = String::new();
    loop {
        print!("{question}? [y/n] ");
        std::io::stdout().flush()?;
        input.clear();
        std::io::stdin().read_line(&mut input)?;
        match input.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => println!("please answer y or n"),
        }
    }
}
