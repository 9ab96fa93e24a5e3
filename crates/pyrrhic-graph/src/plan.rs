//! Diff & plan (§4.7, C7): compares the freshly built DAG against the one
//! persisted from the previous run and produces an ordered delete/write
//! plan driven by an mtime oracle.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use pyrrhic_core::PyrrhicError;

use crate::model::Dag;

/// Queries modification times, returning `-1.0` for a path that does not
/// exist. Implementations must be monotonic within a single run (§6.1).
pub trait MtimeOracle {
    /// Returns the modification time of `path` in seconds, or `-1.0` if it
    /// is absent.
    fn mtime(&self, path: &Path) -> f64;
}

/// An `MtimeOracle` backed by real filesystem metadata.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealMtimeOracle;

impl MtimeOracle for RealMtimeOracle {
    fn mtime(&self, path: &Path) -> f64 {
        let Ok(meta) = std::fs::metadata(path) else {
            return -1.0;
        };
        let Ok(modified) = meta.modified() else {
            return -1.0;
        };
        match modified.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(duration) => duration.as_secs_f64(),
            Err(_) => -1.0,
        }
    }
}

/// A test-injected `MtimeOracle` backed by an explicit path → seconds map.
/// Paths absent from the map report `-1.0`, matching a missing file.
#[derive(Debug, Default, Clone)]
pub struct MapMtimeOracle {
    times: HashMap<PathBuf, f64>,
}

impl MapMtimeOracle {
    /// Builds an oracle from an iterator of `(path, seconds)` pairs.
    pub fn new(entries: impl IntoIterator<Item = (PathBuf, f64)>) -> Self {
        Self {
            times: entries.into_iter().collect(),
        }
    }

    /// Records or overwrites the mtime of `path`.
    pub fn set(&mut self, path: impl Into<PathBuf>, seconds: f64) {
        self.times.insert(path.into(), seconds);
    }
}

impl MtimeOracle for MapMtimeOracle {
    fn mtime(&self, path: &Path) -> f64 {
        self.times.get(path).copied().unwrap_or(-1.0)
    }
}

/// One operation in a plan: delete or (re)write the artifact at `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Remove the file at `path`; a missing file is a silent no-op when
    /// applied.
    Delete(PathBuf),
    /// (Re)build the artifact at `path` by invoking its producing command.
    Write(PathBuf),
}

/// Computes the ordered delete/write plan for moving from `previous` (the
/// DAG persisted by the prior run, possibly empty) to `current` (the DAG
/// just built from this run's rules), consulting `oracle` for freshness.
///
/// Deletions are emitted before writes, sorted by path. Writes are emitted
/// in the order Stage 2's change-propagation DFS schedules them — starting
/// from each source node (in DAG build order) and descending through its
/// children in sorted-path order, which is what makes a rebuilt node's own
/// dependents rebuild immediately after it rather than being interleaved
/// with unrelated siblings (§4.7).
pub fn plan(current: &Dag, previous: &Dag, oracle: &dyn MtimeOracle) -> Result<Vec<Plan>, PyrrhicError> {
    let deletions = stage1_deletions(current, previous);
    let writes = stage2_change_propagation(current, previous, oracle)?;

    let mut out = Vec::with_capacity(deletions.len() + writes.len());
    out.extend(deletions.into_iter().map(Plan::Delete));
    out.extend(writes.into_iter().map(Plan::Write));
    Ok(out)
}

fn stage1_deletions(current: &Dag, previous: &Dag) -> Vec<PathBuf> {
    let mut previous_nodes: Vec<_> = previous.nodes().collect();
    previous_nodes.sort_by(|a, b| a.path.cmp(&b.path));

    previous_nodes
        .into_iter()
        .filter(|node| !node.rlinks.is_empty() && current.pick(&node.path).is_none())
        .map(|node| node.path.clone())
        .collect()
}

fn stage2_change_propagation(
    current: &Dag,
    previous: &Dag,
    oracle: &dyn MtimeOracle,
) -> Result<Vec<PathBuf>, PyrrhicError> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut scheduled: Vec<PathBuf> = Vec::new();
    let mut mtime_cache: HashMap<PathBuf, f64> = HashMap::new();

    // Source nodes are walked in DAG build order, not sorted by path: the
    // traversal below already sorts every node's *children* by path, which
    // is what makes the resulting schedule deterministic. Re-sorting here,
    // or re-sorting the finished `scheduled` list by `order_index`
    // afterwards, changes the emitted order for graphs with nested
    // producers (a source feeding a node that itself feeds further nodes)
    // and stops matching the scheduling DFS itself produces.
    for source in current.source_nodes() {
        search(
            &source.path,
            current,
            previous,
            oracle,
            &mut seen,
            &mut scheduled,
            &mut mtime_cache,
        )?;
    }

    Ok(scheduled)
}

fn cached_mtime(
    path: &Path,
    oracle: &dyn MtimeOracle,
    cache: &HashMap<PathBuf, f64>,
) -> f64 {
    cache
        .get(path)
        .copied()
        .unwrap_or_else(|| oracle.mtime(path))
}

fn search(
    node_path: &Path,
    current: &Dag,
    previous: &Dag,
    oracle: &dyn MtimeOracle,
    seen: &mut HashSet<PathBuf>,
    scheduled: &mut Vec<PathBuf>,
    mtime_cache: &mut HashMap<PathBuf, f64>,
) -> Result<(), PyrrhicError> {
    let node = current
        .pick(node_path)
        .expect("search is only ever called with paths present in the current DAG");

    let mut children: Vec<_> = node.links.iter().map(|link| link.dest.clone()).collect();
    children.sort();
    children.dedup();

    for dest_path in children {
        if seen.contains(&dest_path) {
            continue;
        }

        let dest = current
            .pick(&dest_path)
            .expect("link destination always has a node in the current DAG");
        let previous_node = previous.pick(&dest_path);

        match previous_node {
            None => {
                visit(&dest_path, current, seen, scheduled);
            }
            Some(pnode) => {
                if dest.links != pnode.links || dest.rlinks != pnode.rlinks {
                    visit(&dest_path, current, seen, scheduled);
                } else {
                    let m_src = cached_mtime(node_path, oracle, mtime_cache);
                    if m_src < 0.0 {
                        return Err(PyrrhicError::MissingInput {
                            path: node_path.to_path_buf(),
                        });
                    }
                    let m_dest = cached_mtime(&dest_path, oracle, mtime_cache);
                    if m_dest < 0.0 || m_src > m_dest {
                        visit(&dest_path, current, seen, scheduled);
                        mtime_cache.insert(dest_path.clone(), m_src);
                    } else {
                        search(
                            &dest_path,
                            current,
                            previous,
                            oracle,
                            seen,
                            scheduled,
                            mtime_cache,
                        )?;
                        continue;
                    }
                }
            }
        }
    }

    Ok(())
}

fn visit(node_path: &Path, current: &Dag, seen: &mut HashSet<PathBuf>, scheduled: &mut Vec<PathBuf>) {
    if seen.contains(node_path) {
        return;
    }
    seen.insert(node_path.to_path_buf());
    scheduled.push(node_path.to_path_buf());

    let node = current
        .pick(node_path)
        .expect("visit is only ever called with paths present in the current DAG");
    let mut children: Vec<_> = node.links.iter().map(|link| link.dest.clone()).collect();
    children.sort();
    children.dedup();
    for child in children {
        visit(&child, current, seen, scheduled);
    }
}
