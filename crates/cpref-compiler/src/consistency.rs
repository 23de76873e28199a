use std::collections::{BTreeSet, HashSet};

use cpref_ir::{Formula, Interval};
use serde::Serialize;
use tracing::debug;

use crate::graph::ConsistencyGraph;
use crate::limits::{Limit, LimitExceeded, TheoryLimits};
use crate::rule::Rule;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inconsistency {
    #[error("global inconsistency: attribute '{attribute}' transitively determines a preference over itself")]
    Global { attribute: String },

    #[error("local inconsistency: rules over '{attribute}' prefer values in a cycle under a common context")]
    Local { attribute: String },
}

/// Runs the global check, then the local one. `Ok(None)` means consistent.
pub fn check_consistency(
    rules: &[Rule],
    limits: &TheoryLimits,
) -> Result<Option<Inconsistency>, LimitExceeded> {
    if let Some(inconsistency) = check_global(rules) {
        return Ok(Some(inconsistency));
    }
    check_local(rules, limits)
}

/// Attributes may not, even transitively, determine a preference over
/// themselves: antecedent attributes point at the rule attribute, which
/// points at every indifferent attribute.
pub fn check_global(rules: &[Rule]) -> Option<Inconsistency> {
    let mut graph = ConsistencyGraph::new();
    for rule in rules {
        for att in rule.antecedent().keys() {
            graph.add_edge(att, rule.attribute());
        }
        for att in rule.indifferent() {
            graph.add_edge(rule.attribute(), att.as_str());
        }
    }
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "global dependency graph"
    );
    graph.cyclic_vertex().map(|att| Inconsistency::Global {
        attribute: att.to_string(),
    })
}

/// No preference cycle may hold within any context where a set of rules
/// over the same attribute all apply together.
pub fn check_local(
    rules: &[Rule],
    limits: &TheoryLimits,
) -> Result<Option<Inconsistency>, LimitExceeded> {
    let attributes: BTreeSet<&str> = rules.iter().map(Rule::attribute).collect();
    for attribute in attributes {
        let group: Vec<&Rule> = rules.iter().filter(|r| r.attribute() == attribute).collect();
        for context in combined_contexts(&group, limits)? {
            let mut graph: ConsistencyGraph<&Interval> = ConsistencyGraph::new();
            for rule in group.iter().filter(|r| context.contains(r.antecedent())) {
                graph.add_edge(rule.preferred(), rule.not_preferred());
            }
            if !graph.is_acyclic() {
                return Ok(Some(Inconsistency::Local {
                    attribute: attribute.to_string(),
                }));
            }
        }
    }
    Ok(None)
}

/// Every set of antecedents that can hold at once, grown from single
/// antecedents by pairwise union until nothing new appears.
fn combined_contexts<'a>(
    rules: &[&'a Rule],
    limits: &TheoryLimits,
) -> Result<Vec<BTreeSet<&'a Formula>>, LimitExceeded> {
    let mut contexts: Vec<BTreeSet<&Formula>> = Vec::new();
    let mut seen: HashSet<BTreeSet<&Formula>> = HashSet::new();
    for rule in rules {
        let single = BTreeSet::from([rule.antecedent()]);
        if seen.insert(single.clone()) {
            contexts.push(single);
        }
    }

    let mut fresh_from = 0;
    while fresh_from < contexts.len() {
        let end = contexts.len();
        let mut added = Vec::new();
        for i in fresh_from..end {
            for j in 0..end {
                if i == j || !combinable(&contexts[i], &contexts[j]) {
                    continue;
                }
                let union: BTreeSet<&Formula> = contexts[i].union(&contexts[j]).copied().collect();
                if seen.insert(union.clone()) {
                    added.push(union);
                    limits.check(Limit::Contexts, end + added.len())?;
                }
            }
        }
        contexts.extend(added);
        fresh_from = end;
    }
    Ok(contexts)
}

/// No attribute is constrained differently by the two groups.
fn combinable(a: &BTreeSet<&Formula>, b: &BTreeSet<&Formula>) -> bool {
    a.iter().all(|fa| {
        b.iter().all(|fb| {
            fa.iter()
                .all(|(att, interval)| fb.get(att).map_or(true, |other| other == interval))
        })
    })
}
