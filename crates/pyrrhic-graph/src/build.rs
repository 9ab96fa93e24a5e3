//! DAG construction (§4.4, C4): turns a resolved rule stream into a `Dag`,
//! enforcing unique production and acyclicity.

use std::path::PathBuf;

use pyrrhic_core::{Command, ExpandedInput, PyrrhicError};

use crate::model::{Dag, Link};

/// One resolved rule application: a command paired with the output it
/// produces and the inputs it was given, ready to become DAG edges.
///
/// This is the boundary type between the rule resolver and the DAG builder
/// (§4.2 → §4.4): the resolver walks rule declarations and globs, the
/// builder only ever sees this flattened, order-preserving stream.
pub struct ResolvedOutput {
    /// The command that produced `output_path`.
    pub command: Command,
    /// Canonical path of the produced artifact.
    pub output_path: PathBuf,
    /// `(base_dir, path)` pairs explicitly listed as inputs by the rule.
    pub direct_inputs: Vec<ExpandedInput>,
    /// `direct_inputs` plus anything the command discovered on its own.
    pub all_sources: Vec<ExpandedInput>,
}

/// Builds a `Dag` from a resolved rule stream, in declaration order.
///
/// Declaration order becomes `order_index` (§4.7): the first rule to
/// declare an output gets the lowest index, which is what makes the write
/// phase of a plan deterministic. A second rule declaring the same output
/// is a `DuplicateOutput` error; a source reachable from itself through any
/// chain of links is a `CycleDetected` error.
pub fn to_dag(resolved: impl IntoIterator<Item = ResolvedOutput>) -> Result<Dag, PyrrhicError> {
    let mut dag = Dag::new();
    let mut next_order_index = 0usize;

    for output in resolved {
        // Normalized the same way every source path is (below), so an output
        // later referenced as a source under an equivalent-but-differently-
        // spelled path resolves to the same node (invariant 6).
        let dest_path = pyrrhic_core::path::normalize(&output.output_path);
        let dest_idx = dag.get_or_insert(&dest_path);
        if dag.node_at(dest_idx).production.is_some() {
            return Err(PyrrhicError::DuplicateOutput { path: dest_path });
        }

        let direct: std::collections::HashSet<ExpandedInput> =
            output.direct_inputs.iter().cloned().collect();

        for (base_dir, relative) in &output.all_sources {
            let src_path = pyrrhic_core::path::canonical_join(base_dir, relative);
            if src_path == dest_path {
                return Err(PyrrhicError::CycleDetected {
                    node: dest_path.clone(),
                    link_dest: dest_path,
                });
            }

            let src_idx = dag.get_or_insert(&src_path);
            let link = Link {
                command_name: output.command.human_name().to_string(),
                command_hash: output.command.identity_hash(),
                src: src_path,
                dest: dest_path.clone(),
                base_dir: base_dir.clone(),
            };

            dag.node_at_mut(src_idx).links.insert(link.clone());
            dag.node_at_mut(dest_idx).rlinks.insert(link.clone());

            if direct.contains(&(base_dir.clone(), relative.clone())) {
                dag.node_at_mut(src_idx).direct_links.insert(link.clone());
                dag.node_at_mut(dest_idx).direct_rlinks.insert(link);
            }
        }

        let dest = dag.node_at_mut(dest_idx);
        dest.production = Some(output.command);
        dest.order_index = next_order_index;
        next_order_index += 1;
    }

    if let Some((node, link_dest)) = find_cycle(&dag) {
        return Err(PyrrhicError::CycleDetected { node, link_dest });
    }

    Ok(dag)
}

/// Three-color DFS cycle detection (§4.4): white/grey/black, reporting the
/// back-edge that closes the first cycle found in node-declaration order.
fn find_cycle(dag: &Dag) -> Option<(PathBuf, PathBuf)> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Grey,
        Black,
    }

    let n = dag.len();
    let mut colors = vec![Color::White; n];

    fn visit(
        dag: &Dag,
        idx: usize,
        colors: &mut [Color],
    ) -> Option<(PathBuf, PathBuf)> {
        colors[idx] = Color::Grey;
        let node = dag.node_at(idx);
        for link in &node.links {
            let dest_idx = dag
                .index_of(&link.dest)
                .expect("link destination always has a node");
            match colors[dest_idx] {
                Color::White => {
                    if let Some(found) = visit(dag, dest_idx, colors) {
                        return Some(found);
                    }
                }
                Color::Grey => {
                    return Some((node.path.clone(), link.dest.clone()));
                }
                Color::Black => {}
            }
        }
        colors[idx] = Color::Black;
        None
    }

    for start in 0..n {
        if colors[start] == Color::White {
            if let Some(found) = visit(dag, start, &mut colors) {
                return Some(found);
            }
        }
    }
    None
}
