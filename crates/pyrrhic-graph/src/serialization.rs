//! Text serialization of a `Dag` (§4.6, C6): a line-oriented, comment
//! tolerant, versioned format designed to be diffable and to round-trip
//! exactly through `deserialize(serialize(dag)).equals(dag)`.
//!
//! ```text
//! format 2
//! node <num_links> <path-escaped>
//! func <name> <hex-hash>
//! link  <src_index> <dest_index> <func_index>
//! dlink <src_index> <dest_index> <func_index>
//! ```
//!
//! Nodes are emitted in sorted-by-path order; that order position is the
//! index used by `link`/`dlink` records. Funcs are emitted in
//! first-encountered order over the same traversal. `dlink` marks edges
//! that also belong to `direct_links`/`direct_rlinks`.

use std::collections::HashMap;
use std::fmt::Write as _;

use pyrrhic_core::hash::{from_hex, to_hex};
use pyrrhic_core::{Command, PyrrhicError};

use crate::model::{Dag, Link};

const FORMAT_VERSION: u32 = 2;

/// Serializes a DAG to the text format described in the module docs.
///
/// Output is deterministic: two equal DAGs always serialize to the same
/// bytes, since node order (sorted by path) and func order
/// (first-encountered over that traversal) do not depend on anything but
/// the DAG's own structural content.
pub fn serialize(dag: &Dag) -> String {
    let mut nodes: Vec<&crate::model::Node> = dag.nodes().collect();
    nodes.sort_by(|a, b| a.path.cmp(&b.path));

    let mut index_of_path: HashMap<&std::path::Path, usize> = HashMap::new();
    for (idx, node) in nodes.iter().enumerate() {
        index_of_path.insert(node.path.as_path(), idx);
    }

    let mut out = String::new();
    writeln!(out, "format {FORMAT_VERSION}").unwrap();
    for node in &nodes {
        writeln!(
            out,
            "node {} {}",
            node.links.len(),
            encode_path(&node.path)
        )
        .unwrap();
    }

    let mut func_index: HashMap<(String, [u8; 32]), usize> = HashMap::new();
    let mut func_lines = Vec::new();
    let mut link_lines = Vec::new();

    for (src_idx, node) in nodes.iter().enumerate() {
        for link in &node.links {
            let key = (link.command_name.clone(), link.command_hash);
            let fidx = *func_index.entry(key.clone()).or_insert_with(|| {
                func_lines.push(format!(
                    "func {} {}",
                    encode_path_component(&link.command_name),
                    to_hex(&link.command_hash)
                ));
                func_lines.len() - 1
            });
            let dest_idx = index_of_path[link.dest.as_path()];
            let tag = if node.direct_links.contains(link) {
                "dlink"
            } else {
                "link"
            };
            link_lines.push(format!("{tag} {src_idx} {dest_idx} {fidx}"));
        }
    }

    for line in &func_lines {
        out.push_str(line);
        out.push('\n');
    }
    for line in &link_lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Parses a DAG from its serialized text form.
///
/// Every link's command becomes a do-not-call stub carrying only the name
/// and identity hash recorded at serialization time (§4.6) — reconstructing
/// the original producer is out of scope for a persisted run record.
///
/// An unrecognized format header is never a hard error: it deserializes to
/// an empty DAG with a `tracing::warn!`, on the theory that the caller
/// should treat it as "no usable previous run" rather than abort. Any other
/// structural problem fails with `PyrrhicError::MalformedDag`.
pub fn deserialize(text: &str) -> Result<Dag, PyrrhicError> {
    let mut paths: Vec<std::path::PathBuf> = Vec::new();
    let mut link_counts: Vec<usize> = Vec::new();
    let mut funcs: Vec<(String, [u8; 32])> = Vec::new();
    let mut link_records: Vec<(usize, usize, usize, bool)> = Vec::new();
    let mut saw_format = false;

    for (line_no, raw_line) in text.lines().enumerate() {
        let line_no = line_no + 1;
        let line = raw_line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let tag = parts.next().unwrap_or_default();
        match tag {
            "format" => {
                let version: i64 = parts
                    .next()
                    .and_then(|v| v.parse().ok())
                    .ok_or_else(|| malformed(line_no, "format line missing version"))?;
                if version != FORMAT_VERSION as i64 {
                    tracing::warn!(version, "unrecognized DAG format, treating as empty");
                    return Ok(Dag::default());
                }
                saw_format = true;
            }
            "node" => {
                let num_links: usize = parts
                    .next()
                    .and_then(|v| v.parse().ok())
                    .ok_or_else(|| malformed(line_no, "node line missing link count"))?;
                let rest: Vec<&str> = parts.collect();
                if rest.is_empty() {
                    return Err(malformed(line_no, "node line missing path"));
                }
                let escaped = rest.join(" ");
                let path = decode_path(&escaped)
                    .ok_or_else(|| malformed(line_no, "node path has invalid escape"))?;
                paths.push(path);
                link_counts.push(num_links);
            }
            "func" => {
                let name_field = parts
                    .next()
                    .ok_or_else(|| malformed(line_no, "func line missing name"))?;
                let hash_field = parts
                    .next()
                    .ok_or_else(|| malformed(line_no, "func line missing hash"))?;
                let name = decode_path(name_field)
                    .and_then(|p| p.into_os_string().into_string().ok())
                    .ok_or_else(|| malformed(line_no, "func name has invalid escape"))?;
                let hash = from_hex(hash_field)
                    .ok_or_else(|| malformed(line_no, "func hash is not valid hex"))?;
                funcs.push((name, hash));
            }
            "link" | "dlink" => {
                let src: usize = parts
                    .next()
                    .and_then(|v| v.parse().ok())
                    .ok_or_else(|| malformed(line_no, "link line missing src index"))?;
                let dest: usize = parts
                    .next()
                    .and_then(|v| v.parse().ok())
                    .ok_or_else(|| malformed(line_no, "link line missing dest index"))?;
                let func: usize = parts
                    .next()
                    .and_then(|v| v.parse().ok())
                    .ok_or_else(|| malformed(line_no, "link line missing func index"))?;
                link_records.push((src, dest, func, tag == "dlink"));
            }
            other => {
                return Err(malformed(line_no, &format!("unrecognized record '{other}'")));
            }
        }
    }

    if !saw_format {
        return Err(malformed(0, "missing format header"));
    }

    let mut dag = Dag::new();
    let mut indices = Vec::with_capacity(paths.len());
    for path in &paths {
        indices.push(dag.get_or_insert(path));
    }
    let _ = &link_counts;

    for (src, dest, func, is_direct) in link_records {
        let src_idx = *indices
            .get(src)
            .ok_or_else(|| malformed(0, "link references out-of-range src index"))?;
        let dest_idx = *indices
            .get(dest)
            .ok_or_else(|| malformed(0, "link references out-of-range dest index"))?;
        let (name, hash) = funcs
            .get(func)
            .cloned()
            .ok_or_else(|| malformed(0, "link references out-of-range func index"))?;

        let link = Link {
            command_name: name,
            command_hash: hash,
            src: paths[src].clone(),
            dest: paths[dest].clone(),
            base_dir: std::path::PathBuf::new(),
        };

        dag.node_at_mut(src_idx).links.insert(link.clone());
        dag.node_at_mut(dest_idx).rlinks.insert(link.clone());
        if is_direct {
            dag.node_at_mut(src_idx).direct_links.insert(link.clone());
            dag.node_at_mut(dest_idx).direct_rlinks.insert(link);
        }
    }

    for (order_index, &idx) in indices.iter().enumerate() {
        let node = dag.node_at_mut(idx);
        node.order_index = order_index;
        if let Some(rlink) = node.rlinks.iter().next() {
            node.production = Some(Command::stub(rlink.command_name.clone(), rlink.command_hash));
        }
    }

    Ok(dag)
}

fn malformed(line: usize, details: &str) -> PyrrhicError {
    PyrrhicError::MalformedDag {
        line,
        details: details.to_string(),
    }
}

fn needs_escape(byte: u8) -> bool {
    byte < 0x21 || byte == 0x7f || byte == b'%' || byte == b'#'
}

fn encode_path_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for &byte in value.as_bytes() {
        if needs_escape(byte) {
            let _ = write!(out, "%{byte:02x}");
        } else {
            out.push(byte as char);
        }
    }
    out
}

fn encode_path(path: &std::path::Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    encode_path_component(&normalized)
}

fn decode_path(escaped: &str) -> Option<std::path::PathBuf> {
    let bytes = escaped.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = escaped.get(i + 1..i + 3)?;
            let value = u8::from_str_radix(hex, 16).ok()?;
            out.push(value);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok().map(std::path::PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{to_dag, ResolvedOutput};
    use pyrrhic_core::hash::ParamHasher;
    use pyrrhic_core::ExpandedInput;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn no_op_command(name: &str) -> Command {
        Command::new(
            Arc::new(|_: &[ExpandedInput]| Ok(Vec::new())),
            name,
            ParamHasher::new(name).finish(),
        )
    }

    fn sample_dag() -> Dag {
        let resolved = vec![
            ResolvedOutput {
                command: no_op_command("cat"),
                output_path: PathBuf::from("out/combined.txt"),
                direct_inputs: vec![(PathBuf::from("."), PathBuf::from("a.txt"))],
                all_sources: vec![
                    (PathBuf::from("."), PathBuf::from("a.txt")),
                    (PathBuf::from("."), PathBuf::from("b.txt")),
                ],
            },
            ResolvedOutput {
                command: no_op_command("copy"),
                output_path: PathBuf::from("out/copy of a.txt"),
                direct_inputs: vec![(PathBuf::from("."), PathBuf::from("a.txt"))],
                all_sources: vec![(PathBuf::from("."), PathBuf::from("a.txt"))],
            },
        ];
        to_dag(resolved).unwrap()
    }

    #[test]
    fn round_trips_through_serialize_and_deserialize() {
        let dag = sample_dag();
        let text = serialize(&dag);
        let restored = deserialize(&text).unwrap();
        assert!(restored == dag);
    }

    #[test]
    fn serialization_is_deterministic() {
        let dag = sample_dag();
        assert_eq!(serialize(&dag), serialize(&dag));
    }

    #[test]
    fn unknown_format_yields_empty_dag_not_an_error() {
        let dag = deserialize("format 99\n").unwrap();
        assert!(dag.is_empty());
    }

    #[test]
    fn syntactic_garbage_fails_with_malformed_dag() {
        let err = deserialize("format 2\nnode not-a-number oops\n").unwrap_err();
        assert!(matches!(err, PyrrhicError::MalformedDag { .. }));
    }

    #[test]
    fn paths_with_spaces_round_trip() {
        let dag = sample_dag();
        let text = serialize(&dag);
        assert!(text.contains("copy%20of%20a.txt"));
        let restored = deserialize(&text).unwrap();
        assert!(restored.pick(&PathBuf::from("out/copy of a.txt")).is_some());
    }
}
