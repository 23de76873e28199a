//! Interval splitting to a fixpoint.
//!
//! After normalization any two intervals the rules place on the same
//! attribute are either equal or disjoint, so formulas can be compared by
//! plain equality.

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use crate::limits::{Limit, LimitExceeded, TheoryLimits};
use crate::rule::Rule;

/// Splits rules against each other until no pair yields a cut.
///
/// Works through a queue of rule pairs that may still split. When a rule
/// is replaced by its fragments, only pairs involving the fragments are
/// queued again. Identical fragments are merged.
pub fn normalize(rules: Vec<Rule>, limits: &TheoryLimits) -> Result<Vec<Rule>, LimitExceeded> {
    let mut slots: Vec<Option<Rule>> = rules.into_iter().map(Some).collect();
    let mut live = slots.len();
    limits.check(Limit::Rules, live)?;

    let mut queue: VecDeque<(usize, usize)> = (0..slots.len())
        .flat_map(|i| (0..slots.len()).map(move |j| (i, j)))
        .collect();
    let mut splits = 0usize;

    while let Some((i, j)) = queue.pop_front() {
        let fragments = match (&slots[i], &slots[j]) {
            (Some(fixed), Some(target)) => fixed.split_against(target),
            _ => continue,
        };
        if fragments.is_empty() {
            continue;
        }
        splits += 1;
        slots[j] = None;
        live -= 1;

        let first_new = slots.len();
        for fragment in fragments {
            slots.push(Some(fragment));
            live += 1;
        }
        limits.check(Limit::Rules, live)?;

        for new in first_new..slots.len() {
            for k in 0..slots.len() {
                if slots[k].is_none() {
                    continue;
                }
                queue.push_back((new, k));
                if k != new {
                    queue.push_back((k, new));
                }
            }
        }
    }

    let mut seen = HashSet::new();
    let normalized: Vec<Rule> = slots
        .into_iter()
        .flatten()
        .filter(|rule| seen.insert(rule.clone()))
        .collect();
    debug!(splits, rules = normalized.len(), "normalized rules");
    Ok(normalized)
}

/// No two rules split each other.
pub fn is_normalized(rules: &[Rule]) -> bool {
    rules
        .iter()
        .all(|a| rules.iter().all(|b| a.split_against(b).is_empty()))
}
