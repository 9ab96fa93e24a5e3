//! Rule resolution (§4.3, C3): walks user-declared rules in order,
//! expanding their inputs and invoking their commands, yielding the flat
//! stream the DAG builder consumes.

use std::path::PathBuf;

use pyrrhic_core::{Command, ExpandedInput, PyrrhicError};
use pyrrhic_graph::ResolvedOutput;

use crate::glob::Globber;

/// One user-declared rule: a command plus the ordered `(base_dir,
/// path_or_pattern)` pairs it consumes (§3).
pub struct Rule {
    /// The command this rule invokes.
    pub command: Command,
    /// Ordered input pairs, possibly containing glob patterns.
    pub inputs: Vec<ExpandedInput>,
}

impl Rule {
    /// Builds a rule from a command and its input list.
    pub fn new(command: Command, inputs: Vec<(PathBuf, PathBuf)>) -> Self {
        Self { command, inputs }
    }
}

/// Resolves a rule list into a flat stream of `ResolvedOutput`s, in
/// declaration order, ready for [`pyrrhic_graph::to_dag`].
///
/// Each rule's inputs are glob-expanded against both the filesystem and
/// the outputs declared by earlier rules in this same call; every output a
/// rule produces is immediately declared back into the globber before the
/// next rule runs, so later rules can consume it by pattern (§4.2, §4.3).
pub fn resolve(rules: impl IntoIterator<Item = Rule>) -> Result<Vec<ResolvedOutput>, PyrrhicError> {
    let mut globber = Globber::new();
    let mut out = Vec::new();

    for rule in rules {
        let expanded = globber.glob(&rule.inputs)?;
        let descriptors = rule.command.produce(&expanded)?;

        for descriptor in descriptors {
            globber.declare_output(&descriptor.output_path);
            out.push(ResolvedOutput {
                command: rule.command.clone(),
                output_path: descriptor.output_path,
                direct_inputs: descriptor.direct_inputs,
                all_sources: descriptor.all_sources,
            });
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrrhic_core::hash::ParamHasher;
    use pyrrhic_core::OutputDescriptor;
    use std::sync::Arc;

    fn echo_command() -> Command {
        Command::new(
            Arc::new(|inputs: &[ExpandedInput]| {
                Ok(inputs
                    .iter()
                    .map(|(base, path)| OutputDescriptor {
                        output_path: PathBuf::from("out").join(path),
                        direct_inputs: vec![(base.clone(), path.clone())],
                        all_sources: vec![(base.clone(), path.clone())],
                        deferred_writer: Arc::new(|| Vec::new()),
                    })
                    .collect())
            }),
            "echo",
            ParamHasher::new("echo").finish(),
        )
    }

    #[test]
    fn resolves_rules_in_declaration_order() {
        let rules = vec![
            Rule::new(
                echo_command(),
                vec![(PathBuf::from("src"), PathBuf::from("a.txt"))],
            ),
            Rule::new(
                echo_command(),
                vec![(PathBuf::from("src"), PathBuf::from("b.txt"))],
            ),
        ];
        let resolved = resolve(rules).unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].output_path, PathBuf::from("out/a.txt"));
        assert_eq!(resolved[1].output_path, PathBuf::from("out/b.txt"));
    }

    #[test]
    fn later_rule_can_consume_earlier_rules_declared_output_by_pattern() {
        let rules = vec![
            Rule::new(
                echo_command(),
                vec![(PathBuf::from("src"), PathBuf::from("a.txt"))],
            ),
            Rule::new(echo_command(), vec![(PathBuf::from("out"), PathBuf::from("*.txt"))]),
        ];
        let resolved = resolve(rules).unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[1].output_path, PathBuf::from("out/a.txt"));
    }
}
