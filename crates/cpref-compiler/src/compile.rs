//! Compilation of normalized rules into essential comparisons.
//!
//! 1. Collect the atomic formulas the rules mention.
//! 2. Combine them into the universe of formulas over the antecedent and
//!    preference attributes.
//! 3. Emit one comparison for every formula pair a single rule orders.
//! 4. Close under forward chaining, semi-naively.
//! 5. Drop comparisons implied by more general ones and sort the rest.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use cpref_ir::{Formula, Interval};
use tracing::debug;

use crate::comparison::Comparison;
use crate::limits::{Limit, LimitExceeded, TheoryLimits};
use crate::rule::Rule;

#[derive(Debug, Clone, Default)]
pub struct CompiledComparisons {
    pub formulas: Vec<Formula>,
    pub comparisons: Vec<Comparison>,
}

pub fn compile_comparisons(
    rules: &[Rule],
    limits: &TheoryLimits,
) -> Result<CompiledComparisons, LimitExceeded> {
    let formulas = build_formulas(rules, limits)?;
    let direct = direct_comparisons(rules, &formulas);
    debug!(formulas = formulas.len(), direct = direct.len(), "direct comparisons");

    let closed = close(rules, direct, limits)?;
    let comparisons = essential(&closed);
    debug!(
        closed = closed.len(),
        essential = comparisons.len(),
        "compiled comparisons"
    );
    Ok(CompiledComparisons {
        formulas,
        comparisons,
    })
}

// ── Formula universe ───────────────────────────────────────────

pub fn atomic_formulas(rules: &[Rule]) -> Vec<Formula> {
    let mut seen = HashSet::new();
    rules
        .iter()
        .flat_map(Rule::atomic_formulas)
        .filter(|f| seen.insert(f.clone()))
        .collect()
}

/// Atomic formulas extended, one attribute at a time, with every atomic
/// interval known for that attribute.
pub fn build_formulas(rules: &[Rule], limits: &TheoryLimits) -> Result<Vec<Formula>, LimitExceeded> {
    let mut formulas = atomic_formulas(rules);
    let mut seen: HashSet<Formula> = formulas.iter().cloned().collect();
    limits.check(Limit::Formulas, formulas.len())?;

    let mut intervals: BTreeMap<&str, Vec<&Interval>> = BTreeMap::new();
    let atomics = formulas.clone();
    for formula in &atomics {
        for (att, interval) in formula.iter() {
            intervals.entry(att).or_default().push(interval);
        }
    }

    let attributes: BTreeSet<&str> = rules
        .iter()
        .flat_map(|r| r.antecedent().keys().chain(std::iter::once(r.attribute())))
        .collect();

    for att in attributes {
        let Some(choices) = intervals.get(att) else {
            continue;
        };
        let mut added = Vec::new();
        for formula in formulas.iter().filter(|f| !f.contains_key(att)) {
            for interval in choices {
                let extended = formula.with(att, (*interval).clone());
                if seen.insert(extended.clone()) {
                    added.push(extended);
                }
            }
            limits.check(Limit::Formulas, formulas.len() + added.len())?;
        }
        formulas.extend(added);
    }
    Ok(formulas)
}

// ── Comparisons ────────────────────────────────────────────────

fn minus_keys(set: &BTreeSet<String>, formula: &Formula) -> BTreeSet<String> {
    set.iter()
        .filter(|att| !formula.contains_key(att))
        .cloned()
        .collect()
}

/// Every ordered formula pair some rule orders on its own.
pub fn direct_comparisons(rules: &[Rule], formulas: &[Formula]) -> Vec<Comparison> {
    let mut seen = HashSet::new();
    let mut direct = Vec::new();
    for rule in rules {
        let holds_context =
            |f: &Formula| rule.antecedent().iter().all(|(att, i)| f.get(att) == Some(i));
        let better: Vec<&Formula> = formulas
            .iter()
            .filter(|&f| f.get(rule.attribute()) == Some(rule.preferred()) && holds_context(f))
            .collect();
        let worse: Vec<&Formula> = formulas
            .iter()
            .filter(|&f| f.get(rule.attribute()) == Some(rule.not_preferred()) && holds_context(f))
            .collect();

        for f1 in &better {
            for f2 in &worse {
                if f1 == f2 || !rule.dominates_formula(f1, f2) {
                    continue;
                }
                let comparison = Comparison::new(
                    (*f1).clone(),
                    (*f2).clone(),
                    minus_keys(rule.indifferent(), f1),
                    minus_keys(rule.indifferent(), f2),
                );
                if seen.insert(comparison.clone()) {
                    direct.push(comparison);
                }
            }
        }
    }
    direct
}

/// Closes `direct` under chaining: a comparison `f1 > f2` and a rule
/// applicable to `f2` give `f1 > f2'`, free on the rule's indifferent
/// attributes. Whatever the chain had freed before stays free.
pub fn close(
    rules: &[Rule],
    direct: Vec<Comparison>,
    limits: &TheoryLimits,
) -> Result<Vec<Comparison>, LimitExceeded> {
    let mut seen: HashSet<Comparison> = direct.iter().cloned().collect();
    let mut all = direct.clone();
    let mut frontier = direct;
    let mut rounds = 0usize;

    while !frontier.is_empty() {
        rounds += 1;
        let mut next = Vec::new();
        for comparison in &frontier {
            for rule in rules {
                let Some(derived) = rule.apply_to_formula(comparison.not_preferred()) else {
                    continue;
                };
                let freed: Vec<String> = comparison
                    .exempt_attributes()
                    .into_iter()
                    .chain(std::iter::once(rule.attribute()))
                    .map(str::to_string)
                    .collect();
                let chained = Comparison::new(
                    comparison.preferred().clone(),
                    derived,
                    comparison.preferred_indifferent().clone(),
                    rule.indifferent().clone(),
                )
                .with_freed(freed);
                if seen.insert(chained.clone()) {
                    next.push(chained);
                }
            }
        }
        all.extend(next.iter().cloned());
        limits.check(Limit::Comparisons, all.len())?;
        frontier = next;
    }
    debug!(rounds, comparisons = all.len(), "closure reached fixpoint");
    Ok(all)
}

/// The comparisons no other comparison implies, in canonical order.
pub fn essential(comparisons: &[Comparison]) -> Vec<Comparison> {
    let mut kept: Vec<Comparison> = comparisons
        .iter()
        .filter(|c| c.is_essential(comparisons))
        .cloned()
        .collect();
    kept.sort();
    kept.dedup();
    kept
}
