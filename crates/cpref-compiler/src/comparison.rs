use std::collections::BTreeSet;
use std::fmt;

use cpref_ir::{Formula, Tuple};
use serde::Serialize;

/// A ground dominance fact: any tuple satisfying `preferred` beats any
/// tuple satisfying `not_preferred`, provided the two agree on every
/// attribute the comparison does not exempt.
///
/// An attribute both formulas constrain to the same interval is not
/// exempt: the tuples must hold the same value there. The exceptions are
/// kept in `freed`: attributes an earlier step of the chain behind this
/// comparison moved or dropped, which neither the formulas nor the
/// indifferent sets show any more.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Comparison {
    preferred: Formula,
    not_preferred: Formula,
    preferred_indifferent: BTreeSet<String>,
    not_preferred_indifferent: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    freed: BTreeSet<String>,
}

impl Comparison {
    pub fn new(
        preferred: Formula,
        not_preferred: Formula,
        preferred_indifferent: BTreeSet<String>,
        not_preferred_indifferent: BTreeSet<String>,
    ) -> Self {
        Comparison {
            preferred,
            not_preferred,
            preferred_indifferent,
            not_preferred_indifferent,
            freed: BTreeSet::new(),
        }
    }

    /// Records attributes the chain behind this comparison has already
    /// freed. Only those not exempt for another reason are kept.
    pub fn with_freed(mut self, freed: impl IntoIterator<Item = String>) -> Self {
        let freed: BTreeSet<String> = freed
            .into_iter()
            .filter(|att| {
                self.preferred.get(att) == self.not_preferred.get(att)
                    && !self.preferred_indifferent.contains(att)
                    && !self.not_preferred_indifferent.contains(att)
            })
            .collect();
        self.freed = freed;
        self
    }

    pub fn preferred(&self) -> &Formula {
        &self.preferred
    }

    pub fn not_preferred(&self) -> &Formula {
        &self.not_preferred
    }

    pub fn preferred_indifferent(&self) -> &BTreeSet<String> {
        &self.preferred_indifferent
    }

    pub fn not_preferred_indifferent(&self) -> &BTreeSet<String> {
        &self.not_preferred_indifferent
    }

    pub fn freed(&self) -> &BTreeSet<String> {
        &self.freed
    }

    /// Attributes a tuple pair may disagree on when this comparison
    /// relates them: those the two formulas constrain differently, the
    /// indifferent sets and the freed attributes. Tuples must match
    /// everywhere else, which is what ranking partitions on.
    pub fn exempt_attributes(&self) -> BTreeSet<&str> {
        let mut exempt: BTreeSet<&str> = self
            .preferred_indifferent
            .iter()
            .chain(&self.not_preferred_indifferent)
            .chain(&self.freed)
            .map(String::as_str)
            .collect();
        for (att, interval) in self.preferred.iter() {
            if self.not_preferred.get(att) != Some(interval) {
                exempt.insert(att);
            }
        }
        for att in self.not_preferred.keys() {
            if !self.preferred.contains_key(att) {
                exempt.insert(att);
            }
        }
        exempt
    }

    pub fn is_preferred(&self, tuple: &Tuple) -> bool {
        self.preferred.satisfied_by(tuple)
    }

    pub fn is_not_preferred(&self, tuple: &Tuple) -> bool {
        self.not_preferred.satisfied_by(tuple)
    }

    pub fn dominates(&self, t1: &Tuple, t2: &Tuple) -> bool {
        if !t1.same_attributes(t2) || !self.is_preferred(t1) || !self.is_not_preferred(t2) {
            return false;
        }
        let exempt = self.exempt_attributes();
        t1.iter()
            .filter(|(att, _)| !exempt.contains(att))
            .all(|(att, value)| t2.get(att) == Some(value))
    }

    /// Whether some other comparison in `all` already implies this one.
    ///
    /// `other` implies `self` when its formulas are sub-formulas of ours
    /// and the constraints we add are either identical on both sides or
    /// already free under its indifferent sets.
    pub fn is_essential(&self, all: &[Comparison]) -> bool {
        !all.iter().any(|other| other != self && other.subsumes(self))
    }

    fn subsumes(&self, specific: &Comparison) -> bool {
        if !self.preferred.is_subformula_of(&specific.preferred)
            || !self.not_preferred.is_subformula_of(&specific.not_preferred)
        {
            return false;
        }
        let exempt = self.exempt_attributes();
        if !specific.freed.iter().all(|att| exempt.contains(att.as_str())) {
            return false;
        }
        let preferred_extra = specific.preferred.difference(&self.preferred);
        let not_preferred_extra = specific.not_preferred.difference(&self.not_preferred);

        let same_extras = preferred_extra == not_preferred_extra
            && specific
                .preferred_indifferent
                .is_subset(&self.preferred_indifferent)
            && specific
                .not_preferred_indifferent
                .is_subset(&self.not_preferred_indifferent);
        if same_extras {
            return true;
        }

        let absorbed = |extra: &Formula, indifferent: &BTreeSet<String>, general: &BTreeSet<String>| {
            extra
                .keys()
                .chain(indifferent.iter().map(String::as_str))
                .all(|att| general.contains(att))
        };
        absorbed(
            &preferred_extra,
            &specific.preferred_indifferent,
            &self.preferred_indifferent,
        ) && absorbed(
            &not_preferred_extra,
            &specific.not_preferred_indifferent,
            &self.not_preferred_indifferent,
        )
    }
}

fn write_indifferent(f: &mut fmt::Formatter<'_>, set: &BTreeSet<String>) -> fmt::Result {
    if set.is_empty() {
        return Ok(());
    }
    let names: Vec<&str> = set.iter().map(String::as_str).collect();
    write!(f, "[{}]", names.join(", "))
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.preferred)?;
        write_indifferent(f, &self.preferred_indifferent)?;
        write!(f, " > {}", self.not_preferred)?;
        write_indifferent(f, &self.not_preferred_indifferent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpref_ir::Interval;

    fn formula(pairs: &[(&str, Interval)]) -> Formula {
        let mut formula = Formula::new();
        for (att, interval) in pairs {
            formula.insert(*att, interval.clone());
        }
        formula
    }

    fn restored() -> Comparison {
        Comparison::new(
            formula(&[("x", Interval::less_than(4)), ("y", Interval::point(1))]),
            formula(&[("x", Interval::less_than(4)), ("y", Interval::point(2))]),
            BTreeSet::new(),
            BTreeSet::new(),
        )
    }

    #[test]
    fn test_shared_interval_must_match() {
        let comparison = restored();
        assert_eq!(comparison.exempt_attributes(), BTreeSet::from(["y"]));
        let t1 = Tuple::new().with("x", 0).with("y", 1);
        assert!(comparison.dominates(&t1, &Tuple::new().with("x", 0).with("y", 2)));
        assert!(!comparison.dominates(&t1, &Tuple::new().with("x", 2).with("y", 2)));
    }

    #[test]
    fn test_freed_attribute_may_differ() {
        let comparison = restored().with_freed(["x".to_string()]);
        assert_eq!(comparison.exempt_attributes(), BTreeSet::from(["x", "y"]));
        let t1 = Tuple::new().with("x", 0).with("y", 1);
        assert!(comparison.dominates(&t1, &Tuple::new().with("x", 2).with("y", 2)));
    }

    #[test]
    fn test_freed_keeps_only_otherwise_bound_attributes() {
        let comparison = Comparison::new(
            formula(&[("x", Interval::point(1))]),
            formula(&[("x", Interval::point(2))]),
            BTreeSet::from(["c".to_string()]),
            BTreeSet::new(),
        )
        .with_freed(["x", "c", "d"].map(String::from));
        assert_eq!(comparison.freed(), &BTreeSet::from(["d".to_string()]));
    }

    #[test]
    fn test_freed_blocks_subsumption_by_a_stricter_comparison() {
        let strict = restored();
        let freed = restored().with_freed(["x".to_string()]);
        assert!(freed.subsumes(&strict));
        assert!(!strict.subsumes(&freed));
        assert!(freed.is_essential(&[strict.clone(), freed.clone()]));
        assert!(!strict.is_essential(&[strict.clone(), freed.clone()]));
    }
}
