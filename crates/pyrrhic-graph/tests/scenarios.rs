//! Concrete build/diff/plan scenarios, mirroring the literal worked
//! examples used to pin down this engine's ordering and error behavior.

use std::path::PathBuf;
use std::sync::Arc;

use pyrrhic_core::hash::ParamHasher;
use pyrrhic_core::{Command, ExpandedInput, PyrrhicError};
use pyrrhic_graph::{plan, to_dag, MapMtimeOracle, Plan, ResolvedOutput};

fn cat(name: &str) -> Command {
    Command::new(
        Arc::new(|_: &[ExpandedInput]| Ok(Vec::new())),
        "cat",
        ParamHasher::new("cat").write_path(std::path::Path::new(name)).finish(),
    )
}

fn rule(output: &str, inputs: &[(&str, &str)]) -> ResolvedOutput {
    let sources: Vec<ExpandedInput> = inputs
        .iter()
        .map(|(base, path)| (PathBuf::from(base), PathBuf::from(path)))
        .collect();
    ResolvedOutput {
        command: cat(output),
        output_path: PathBuf::from(output),
        direct_inputs: sources.clone(),
        all_sources: sources,
    }
}

#[test]
fn scenario_a_self_cycle() {
    let rules = vec![rule("a", &[("", "a")])];
    let err = to_dag(rules).unwrap_err();
    assert!(matches!(err, PyrrhicError::CycleDetected { .. }));
}

#[test]
fn scenario_b_longer_cycle() {
    let rules = vec![
        rule("b", &[("", "a")]),
        rule("c", &[("", "b")]),
        rule("a", &[("", "c")]),
    ];
    let err = to_dag(rules).unwrap_err();
    assert!(matches!(err, PyrrhicError::CycleDetected { .. }));
}

#[test]
fn scenario_c_duplicate_output() {
    let rules = vec![
        rule("output", &[("", "a")]),
        rule("output", &[("", "b")]),
    ];
    let err = to_dag(rules).unwrap_err();
    assert!(matches!(
        err,
        PyrrhicError::DuplicateOutput { path } if path == PathBuf::from("output")
    ));
}

fn scenario_d_rules() -> Vec<ResolvedOutput> {
    vec![
        rule("dest/a", &[("src", "a")]),
        rule("dest/b", &[("src", "b")]),
        rule("dest/c", &[("src", "c")]),
        rule("dest/ab", &[("src", "a"), ("src", "b")]),
        rule("dest/abc", &[("src", "a"), ("src", "b"), ("src", "c")]),
        rule("dest/a2", &[("dest", "a")]),
        rule("dest/b2", &[("dest", "b")]),
        rule("dest/a2b2", &[("dest", "a"), ("dest", "b")]),
    ]
}

#[test]
fn scenario_d_mtime_driven_incremental_plan() {
    let current = to_dag(scenario_d_rules()).unwrap();
    let previous = to_dag(scenario_d_rules()).unwrap();

    let oracle = MapMtimeOracle::new([
        (PathBuf::from("src/a"), 1.0),
        (PathBuf::from("src/b"), 1.0),
        (PathBuf::from("src/c"), 1.0),
        (PathBuf::from("dest/a"), -1.0),
        (PathBuf::from("dest/b"), 2.0),
        (PathBuf::from("dest/c"), -1.0),
        (PathBuf::from("dest/ab"), -1.0),
        (PathBuf::from("dest/abc"), -1.0),
        (PathBuf::from("dest/a2"), 3.0),
        (PathBuf::from("dest/b2"), -1.0),
        (PathBuf::from("dest/a2b2"), 3.0),
    ]);

    let result = plan(&current, &previous, &oracle).unwrap();

    let expected = [
        "dest/a",
        "dest/a2",
        "dest/a2b2",
        "dest/ab",
        "dest/abc",
        "dest/b2",
        "dest/c",
    ];
    let writes: Vec<String> = result
        .iter()
        .map(|op| match op {
            Plan::Write(p) => p.to_string_lossy().replace('\\', "/"),
            Plan::Delete(p) => panic!("unexpected delete in scenario D: {p:?}"),
        })
        .collect();
    assert_eq!(writes, expected);
}

#[test]
fn scenario_e_structural_diff() {
    let previous = to_dag(vec![
        rule("dest/d", &[("src", "d")]),
        rule("dest/d2", &[("dest", "d")]),
    ])
    .unwrap();
    let current = to_dag(vec![
        rule("dest/e", &[("src", "e")]),
        rule("dest/e2", &[("dest", "e")]),
    ])
    .unwrap();

    let oracle = MapMtimeOracle::new([
        (PathBuf::from("src/d"), 1.0),
        (PathBuf::from("dest/d"), 2.0),
        (PathBuf::from("dest/d2"), 3.0),
        (PathBuf::from("src/e"), 1.0),
        (PathBuf::from("dest/e"), 2.0),
        (PathBuf::from("dest/e2"), 3.0),
    ]);

    let result = plan(&current, &previous, &oracle).unwrap();

    assert_eq!(
        result,
        vec![
            Plan::Delete(PathBuf::from("dest/d")),
            Plan::Delete(PathBuf::from("dest/d2")),
            Plan::Write(PathBuf::from("dest/e")),
            Plan::Write(PathBuf::from("dest/e2")),
        ]
    );
}

#[test]
fn scenario_f_no_op() {
    let current = to_dag(scenario_d_rules()).unwrap();
    let previous = to_dag(scenario_d_rules()).unwrap();

    let oracle = MapMtimeOracle::new([
        (PathBuf::from("src/a"), 1.0),
        (PathBuf::from("src/b"), 1.0),
        (PathBuf::from("src/c"), 1.0),
        (PathBuf::from("dest/a"), 2.0),
        (PathBuf::from("dest/b"), 2.0),
        (PathBuf::from("dest/c"), 2.0),
        (PathBuf::from("dest/ab"), 2.0),
        (PathBuf::from("dest/abc"), 2.0),
        (PathBuf::from("dest/a2"), 3.0),
        (PathBuf::from("dest/b2"), 3.0),
        (PathBuf::from("dest/a2b2"), 3.0),
    ]);

    let result = plan(&current, &previous, &oracle).unwrap();
    assert!(result.is_empty());
}

#[test]
fn dag_equality_is_structural_not_nominal() {
    let a = to_dag(scenario_d_rules()).unwrap();
    let b = to_dag(scenario_d_rules()).unwrap();
    assert!(a == b);

    let mut different_rules = scenario_d_rules();
    different_rules.pop();
    let c = to_dag(different_rules).unwrap();
    assert!(a != c);
}

#[test]
fn command_hash_is_deterministic_and_parameter_sensitive() {
    let a = cat("foo").identity_hash();
    let b = cat("foo").identity_hash();
    let c = cat("bar").identity_hash();
    assert_eq!(a, b);
    assert_ne!(a, c);
}
