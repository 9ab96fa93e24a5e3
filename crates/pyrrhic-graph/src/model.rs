//! DAG model (§3, §4.5): `Node`, `Link` and the `Dag` container itself.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use pyrrhic_core::Command;

/// A directed edge from `src` to `dest`, labeled with the command
/// responsible for it.
///
/// Equality and ordering deliberately ignore `base_dir`: it is bookkeeping
/// needed to reconstruct `(base_dir, relative_path)` pairs when
/// re-invoking a command's producer during [`crate::model::Node::apply`],
/// not part of the edge's identity (§3, §4.5). Ordering is a proper
/// lexicographic tuple order over `(command_name, command_hash, src, dest)`
/// — the source `Link.__lt__` was a disjunctive, non-total order; Design
/// Note 2 calls for fixing that here.
#[derive(Debug, Clone)]
pub struct Link {
    /// Human-readable name of the producing command.
    pub command_name: String,
    /// Identity hash of the producing command.
    pub command_hash: [u8; 32],
    /// Source node path.
    pub src: PathBuf,
    /// Destination node path.
    pub dest: PathBuf,
    /// Base directory the source was resolved under; used only to
    /// reconstruct inputs for `apply()`.
    pub base_dir: PathBuf,
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.command_name == other.command_name
            && self.command_hash == other.command_hash
            && self.src == other.src
            && self.dest == other.dest
    }
}

impl Eq for Link {}

impl PartialOrd for Link {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Link {
    fn cmp(&self, other: &Self) -> Ordering {
        (
            &self.command_name,
            &self.command_hash,
            &self.src,
            &self.dest,
        )
            .cmp(&(
                &other.command_name,
                &other.command_hash,
                &other.src,
                &other.dest,
            ))
    }
}

/// A vertex in the DAG, identified by its canonical path.
pub struct Node {
    /// Canonical path of the artifact this node represents.
    pub path: PathBuf,
    /// Outgoing edges: nodes that depend on this one.
    pub links: BTreeSet<Link>,
    /// Subset of `links` the user explicitly listed as an input.
    pub direct_links: BTreeSet<Link>,
    /// Inverse of `links`: nodes this one depends on.
    pub rlinks: BTreeSet<Link>,
    /// Subset of `rlinks` the user explicitly listed as an input.
    pub direct_rlinks: BTreeSet<Link>,
    /// The command that produces this node, or `None` for a source node.
    pub production: Option<Command>,
    /// Insertion order at DAG build time; used to order writes in the
    /// final plan (§4.7).
    pub order_index: usize,
}

impl Node {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            links: BTreeSet::new(),
            direct_links: BTreeSet::new(),
            rlinks: BTreeSet::new(),
            direct_rlinks: BTreeSet::new(),
            production: None,
            order_index: 0,
        }
    }

    /// Whether this node has no producer recorded.
    pub fn is_source(&self) -> bool {
        self.rlinks.is_empty()
    }
}

impl PartialEq for Node {
    /// Structural equality (§4.5): path plus all four link sets. Production
    /// and order_index are deliberately excluded — a node's links already
    /// encode every command identity touching it.
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.links == other.links
            && self.direct_links == other.direct_links
            && self.rlinks == other.rlinks
            && self.direct_rlinks == other.direct_rlinks
    }
}

impl Eq for Node {}

/// Ordered mapping path → Node (§3).
#[derive(Default)]
pub struct Dag {
    nodes: Vec<Node>,
    by_path: HashMap<PathBuf, usize>,
}

impl Dag {
    /// Creates an empty DAG.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of the node for `path`, inserting a fresh one if
    /// absent (`DAG.get`, §4.5).
    pub fn get_or_insert(&mut self, path: &Path) -> usize {
        if let Some(&idx) = self.by_path.get(path) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(Node::new(path.to_path_buf()));
        self.by_path.insert(path.to_path_buf(), idx);
        idx
    }

    /// Looks up a node without inserting (`DAG.pick`, §4.5).
    pub fn pick(&self, path: &Path) -> Option<&Node> {
        self.by_path.get(path).map(|&idx| &self.nodes[idx])
    }

    /// Index of the node for `path`, if present.
    pub(crate) fn index_of(&self, path: &Path) -> Option<usize> {
        self.by_path.get(path).copied()
    }

    /// Node at a given build-time index.
    pub(crate) fn node_at(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    /// Mutable node at a given build-time index.
    pub(crate) fn node_at_mut(&mut self, idx: usize) -> &mut Node {
        &mut self.nodes[idx]
    }

    /// Number of nodes in the DAG.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the DAG has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates all nodes in build (insertion) order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Iterates nodes with no producer dependents recorded against them,
    /// i.e. with empty `rlinks` (`DAG.source_nodes`, §4.5).
    pub fn source_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_source())
    }
}

impl PartialEq for Dag {
    /// Structural equality (§4.5): same set of path keys, and for each path
    /// an equal `Node`.
    fn eq(&self, other: &Self) -> bool {
        if self.nodes.len() != other.nodes.len() {
            return false;
        }
        self.nodes
            .iter()
            .all(|node| matches!(other.pick(&node.path), Some(other_node) if other_node == node))
    }
}

impl Eq for Dag {}
