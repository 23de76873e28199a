//! Grouping tuples that a single comparison can relate.
//!
//! A comparison only relates tuples that agree on every attribute it does
//! not exempt, so it never needs to look across groups. Groups are
//! independent and can be evaluated in parallel.

use std::collections::HashMap;

use cpref_compiler::Comparison;
use cpref_ir::{Tuple, Value};

/// Attribute names of the tuple, with values kept only where they must match.
type GroupKey<'a> = Vec<(&'a str, Option<&'a Value>)>;

/// Splits `indices` into groups of tuples with the same attribute names
/// and the same values outside the comparison's exempt attributes. Groups
/// and their members keep first-appearance order.
pub fn partition(indices: &[usize], tuples: &[Tuple], comparison: &Comparison) -> Vec<Vec<usize>> {
    let exempt = comparison.exempt_attributes();
    let mut slots: HashMap<GroupKey<'_>, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for &i in indices {
        let key: GroupKey<'_> = tuples[i]
            .iter()
            .map(|(att, value)| (att, (!exempt.contains(att)).then_some(value)))
            .collect();
        let slot = *slots.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(i);
    }
    groups
}

/// Members of `group` beaten under the comparison: they satisfy its
/// not-preferred side but not its preferred side, and some member of the
/// group satisfies the preferred side.
pub fn dominated_in(group: &[usize], tuples: &[Tuple], comparison: &Comparison) -> Vec<usize> {
    if !group.iter().any(|&i| comparison.is_preferred(&tuples[i])) {
        return Vec::new();
    }
    group
        .iter()
        .copied()
        .filter(|&i| !comparison.is_preferred(&tuples[i]) && comparison.is_not_preferred(&tuples[i]))
        .collect()
}
