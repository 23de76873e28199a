use std::collections::BTreeSet;
use std::fmt;

use cpref_ir::ast::{Condition, RuleAst};
use cpref_ir::interval::{split, IntervalError};
use cpref_ir::{Formula, Interval, Tuple};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    #[error("consequent compares different attributes: '{preferred}' and '{not_preferred}'")]
    MismatchedConsequent {
        preferred: String,
        not_preferred: String,
    },
    #[error("preference attribute '{attribute}' also appears in the antecedent")]
    AttributeInAntecedent { attribute: String },
    #[error("preference attribute '{attribute}' is also declared indifferent")]
    AttributeIndifferent { attribute: String },
    #[error("attribute '{attribute}' is constrained twice in the antecedent")]
    DuplicateAntecedent { attribute: String },
    #[error("invalid interval on '{attribute}': {source}")]
    Interval {
        attribute: String,
        #[source]
        source: IntervalError,
    },
}

/// A preference rule: under `antecedent`, tuples whose `attribute` lies in
/// `preferred` are better than otherwise equal tuples whose `attribute`
/// lies in `not_preferred`. Attributes in `indifferent` may differ freely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Rule {
    antecedent: Formula,
    attribute: String,
    preferred: Interval,
    not_preferred: Interval,
    indifferent: BTreeSet<String>,
}

impl Rule {
    pub fn new(
        antecedent: Formula,
        attribute: impl Into<String>,
        preferred: Interval,
        not_preferred: Interval,
        indifferent: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, RuleError> {
        let attribute = attribute.into().to_lowercase();
        let indifferent: BTreeSet<String> = indifferent
            .into_iter()
            .map(|a| a.into().to_lowercase())
            .collect();

        if antecedent.contains_key(&attribute) {
            return Err(RuleError::AttributeInAntecedent { attribute });
        }
        if indifferent.contains(&attribute) {
            return Err(RuleError::AttributeIndifferent { attribute });
        }

        Ok(Rule {
            antecedent,
            attribute,
            preferred,
            not_preferred,
            indifferent,
        })
    }

    pub fn from_ast(ast: &RuleAst) -> Result<Self, RuleError> {
        let mut antecedent = Formula::new();
        for condition in &ast.antecedent {
            let (attribute, interval) = lower_condition(condition)?;
            if antecedent.contains_key(&attribute) {
                return Err(RuleError::DuplicateAntecedent { attribute });
            }
            antecedent.insert(attribute, interval);
        }

        let (attribute, preferred) = lower_condition(&ast.consequent.preferred)?;
        let (other, not_preferred) = lower_condition(&ast.consequent.not_preferred)?;
        if attribute != other {
            return Err(RuleError::MismatchedConsequent {
                preferred: attribute,
                not_preferred: other,
            });
        }

        Rule::new(
            antecedent,
            attribute,
            preferred,
            not_preferred,
            &ast.indifferent_attributes,
        )
    }

    pub fn antecedent(&self) -> &Formula {
        &self.antecedent
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn preferred(&self) -> &Interval {
        &self.preferred
    }

    pub fn not_preferred(&self) -> &Interval {
        &self.not_preferred
    }

    pub fn indifferent(&self) -> &BTreeSet<String> {
        &self.indifferent
    }

    /// Every single-attribute formula the rule mentions.
    pub fn atomic_formulas(&self) -> Vec<Formula> {
        let mut formulas: Vec<Formula> = self
            .antecedent
            .iter()
            .map(|(att, interval)| Formula::singleton(att, interval.clone()))
            .collect();
        formulas.push(Formula::singleton(&self.attribute, self.preferred.clone()));
        formulas.push(Formula::singleton(&self.attribute, self.not_preferred.clone()));
        formulas
    }

    // ── Splitting ──────────────────────────────────────────────

    /// Cuts `other` along the interval edges of `self`.
    ///
    /// Antecedent intervals of `self` are tried first, then its preferred
    /// and not-preferred intervals. The first attribute that yields a cut
    /// wins; the result holds the fragments replacing `other`, or nothing
    /// when `other` is already aligned with `self`.
    pub fn split_against(&self, other: &Rule) -> Vec<Rule> {
        for (att, fixed) in self.antecedent.iter() {
            let fragments = other.split_on(att, fixed);
            if !fragments.is_empty() {
                return fragments;
            }
        }
        let fragments = other.split_on(&self.attribute, &self.preferred);
        if !fragments.is_empty() {
            return fragments;
        }
        other.split_on(&self.attribute, &self.not_preferred)
    }

    fn split_on(&self, att: &str, fixed: &Interval) -> Vec<Rule> {
        if let Some(current) = self.antecedent.get(att) {
            let pieces = split(fixed, current);
            if !pieces.is_empty() {
                return pieces
                    .into_iter()
                    .map(|piece| Rule {
                        antecedent: self.antecedent.with(att, piece),
                        ..self.clone()
                    })
                    .collect();
            }
        }
        if self.attribute != att {
            return Vec::new();
        }
        let pieces = split(fixed, &self.preferred);
        if !pieces.is_empty() {
            return pieces
                .into_iter()
                .map(|piece| Rule {
                    preferred: piece,
                    ..self.clone()
                })
                .collect();
        }
        split(fixed, &self.not_preferred)
            .into_iter()
            .map(|piece| Rule {
                not_preferred: piece,
                ..self.clone()
            })
            .collect()
    }

    // ── Formula semantics ──────────────────────────────────────

    /// Whether this rule alone makes `f1` preferred to `f2`.
    pub fn dominates_formula(&self, f1: &Formula, f2: &Formula) -> bool {
        if f1.get(&self.attribute) != Some(&self.preferred)
            || f2.get(&self.attribute) != Some(&self.not_preferred)
        {
            return false;
        }
        let context_holds = self
            .antecedent
            .iter()
            .all(|(att, interval)| f1.get(att) == Some(interval) && f2.get(att) == Some(interval));
        if !context_holds {
            return false;
        }
        f1.keys()
            .chain(f2.keys())
            .filter(|att| self.is_free(att))
            .all(|att| matches!((f1.get(att), f2.get(att)), (Some(a), Some(b)) if a == b))
    }

    /// Attributes the rule places no requirement on.
    fn is_free(&self, att: &str) -> bool {
        att != self.attribute && !self.antecedent.contains_key(att) && !self.indifferent.contains(att)
    }

    /// One forward-chaining step over a formula: if `formula` holds the
    /// preferred interval and the whole antecedent, the result swaps in the
    /// not-preferred interval and forgets the indifferent attributes.
    pub fn apply_to_formula(&self, formula: &Formula) -> Option<Formula> {
        self.apply_with(formula, |required, held| required == held)
    }

    /// One forward-chaining step from a concrete tuple.
    pub fn apply_to_tuple(&self, tuple: &Tuple) -> Option<Formula> {
        self.apply_to_derived(&Formula::from_tuple(tuple))
    }

    /// One forward-chaining step over a tuple lifted to a formula, where
    /// point terms satisfy any interval that contains them.
    pub fn apply_to_derived(&self, derived: &Formula) -> Option<Formula> {
        self.apply_with(derived, Interval::admits)
    }

    fn apply_with(
        &self,
        formula: &Formula,
        holds: impl Fn(&Interval, &Interval) -> bool,
    ) -> Option<Formula> {
        let held = formula.get(&self.attribute)?;
        if !holds(&self.preferred, held) {
            return None;
        }
        for (att, required) in self.antecedent.iter() {
            let held = formula.get(att)?;
            if !holds(required, held) {
                return None;
            }
        }
        let mut derived = formula.with(&self.attribute, self.not_preferred.clone());
        for att in &self.indifferent {
            derived.remove(att);
        }
        Some(derived)
    }
}

fn lower_condition(condition: &Condition) -> Result<(String, Interval), RuleError> {
    let attribute = condition.attribute().to_lowercase();
    let interval = condition
        .to_interval()
        .map_err(|source| RuleError::Interval {
            attribute: attribute.clone(),
            source,
        })?;
    Ok((attribute, interval))
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.antecedent.is_empty() {
            write!(f, "IF ")?;
            for (i, (att, interval)) in self.antecedent.iter().enumerate() {
                if i > 0 {
                    write!(f, " AND ")?;
                }
                write!(f, "{}", interval.on(att))?;
            }
            write!(f, " THEN ")?;
        }
        write!(
            f,
            "{} > {}",
            self.preferred.on(&self.attribute),
            self.not_preferred.on(&self.attribute)
        )?;
        if !self.indifferent.is_empty() {
            let names: Vec<&str> = self.indifferent.iter().map(String::as_str).collect();
            write!(f, " [{}]", names.join(", "))?;
        }
        Ok(())
    }
}
