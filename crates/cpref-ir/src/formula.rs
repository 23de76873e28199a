use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::interval::Interval;
use crate::tuple::Tuple;

/// A conjunction of `attribute ∈ interval` constraints, one per attribute.
///
/// Formulas are plain values: equality, ordering and hashing are
/// structural, so they can be deduplicated and used as map keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Formula(BTreeMap<String, Interval>);

impl Formula {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(attribute: impl Into<String>, interval: Interval) -> Self {
        let mut formula = Formula::new();
        formula.insert(attribute, interval);
        formula
    }

    /// Lifts every value of the tuple to a point interval.
    pub fn from_tuple(tuple: &Tuple) -> Self {
        tuple
            .iter()
            .map(|(attribute, value)| (attribute.to_string(), Interval::point(value.clone())))
            .collect()
    }

    pub fn insert(&mut self, attribute: impl Into<String>, interval: Interval) -> Option<Interval> {
        self.0.insert(attribute.into(), interval)
    }

    pub fn remove(&mut self, attribute: &str) -> Option<Interval> {
        self.0.remove(attribute)
    }

    /// A copy of this formula with `attribute` set to `interval`.
    pub fn with(&self, attribute: &str, interval: Interval) -> Formula {
        let mut extended = self.clone();
        extended.insert(attribute, interval);
        extended
    }

    pub fn get(&self, attribute: &str) -> Option<&Interval> {
        self.0.get(attribute)
    }

    pub fn contains_key(&self, attribute: &str) -> bool {
        self.0.contains_key(attribute)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Interval)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every constraint of `self` appears, identically, in `other`.
    pub fn is_subformula_of(&self, other: &Formula) -> bool {
        self.iter().all(|(att, interval)| other.get(att) == Some(interval))
    }

    /// The constraints of `self` on attributes `other` does not mention.
    pub fn difference(&self, other: &Formula) -> Formula {
        self.iter()
            .filter(|(att, _)| !other.contains_key(att))
            .map(|(att, interval)| (att.to_string(), interval.clone()))
            .collect()
    }

    /// The tuple carries every constrained attribute with a value inside
    /// its interval.
    pub fn satisfied_by(&self, tuple: &Tuple) -> bool {
        self.iter()
            .all(|(att, interval)| tuple.get(att).is_some_and(|v| interval.contains(v)))
    }
}

impl FromIterator<(String, Interval)> for Formula {
    fn from_iter<I: IntoIterator<Item = (String, Interval)>>(iter: I) -> Self {
        Formula(iter.into_iter().collect())
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "()");
        }
        for (i, (att, interval)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, "^")?;
            }
            write!(f, "({})", interval.on(att))?;
        }
        Ok(())
    }
}
