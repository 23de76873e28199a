use std::collections::{BTreeSet, HashSet};
use std::fmt;

use cpref_ir::ast::RuleAst;
use cpref_ir::parse::{parse_rules, parse_rules_json, ParseError};
use cpref_ir::{Formula, Tuple};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::comparison::Comparison;
use crate::compile::{compile_comparisons, CompiledComparisons};
use crate::consistency::{check_consistency, Inconsistency};
use crate::limits::{LimitExceeded, TheoryLimits};
use crate::normalize::normalize;
use crate::rule::{Rule, RuleError};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid rule #{index}: {source}")]
    Rule {
        index: usize,
        #[source]
        source: RuleError,
    },

    #[error("Theory too large: {0}")]
    LimitExceeded(#[from] LimitExceeded),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TheoryError {
    #[error("theory is inconsistent: {0}")]
    Inconsistent(Inconsistency),
}

/// A normalized, checked and compiled set of preference rules.
///
/// Built once, read-only afterwards. An inconsistent theory still builds
/// so its rules can be inspected, but it carries no comparisons and
/// refuses compiled queries.
#[derive(Debug, Clone, Serialize)]
pub struct Theory {
    rules: Vec<Rule>,
    antecedent_attributes: BTreeSet<String>,
    preference_attributes: BTreeSet<String>,
    indifferent_attributes: BTreeSet<String>,
    inconsistency: Option<Inconsistency>,
    formulas: Vec<Formula>,
    comparisons: Vec<Comparison>,
    #[serde(skip)]
    limits: TheoryLimits,
}

impl Theory {
    /// Builds a theory from rule-language text.
    pub fn parse(text: &str) -> Result<Self, BuildError> {
        Self::build(&parse_rules(text)?)
    }

    /// Builds a theory from a JSON array of rule records.
    pub fn from_json(json: &str) -> Result<Self, BuildError> {
        Self::build(&parse_rules_json(json)?)
    }

    pub fn build(rules: &[RuleAst]) -> Result<Self, BuildError> {
        Self::build_with_limits(rules, TheoryLimits::default())
    }

    pub fn build_with_limits(rules: &[RuleAst], limits: TheoryLimits) -> Result<Self, BuildError> {
        let rules = rules
            .iter()
            .enumerate()
            .map(|(index, ast)| Rule::from_ast(ast).map_err(|source| BuildError::Rule { index, source }))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_rules(rules, limits)
    }

    pub fn from_rules(rules: Vec<Rule>, limits: TheoryLimits) -> Result<Self, BuildError> {
        // 1. Normalize
        let given = rules.len();
        let rules = normalize(rules, &limits)?;
        debug!(given, normalized = rules.len(), "normalization done");

        // 2. Check consistency
        let inconsistency = check_consistency(&rules, &limits)?;

        // 3. Compile comparisons
        let compiled = match &inconsistency {
            None => compile_comparisons(&rules, &limits)?,
            Some(reason) => {
                warn!(%reason, "theory is inconsistent; skipping compilation");
                CompiledComparisons::default()
            }
        };

        let mut antecedent_attributes = BTreeSet::new();
        let mut preference_attributes = BTreeSet::new();
        let mut indifferent_attributes = BTreeSet::new();
        for rule in &rules {
            antecedent_attributes.extend(rule.antecedent().keys().map(str::to_string));
            preference_attributes.insert(rule.attribute().to_string());
            indifferent_attributes.extend(rule.indifferent().iter().cloned());
        }

        info!(
            rules = rules.len(),
            consistent = inconsistency.is_none(),
            formulas = compiled.formulas.len(),
            comparisons = compiled.comparisons.len(),
            "theory built"
        );

        Ok(Theory {
            rules,
            antecedent_attributes,
            preference_attributes,
            indifferent_attributes,
            inconsistency,
            formulas: compiled.formulas,
            comparisons: compiled.comparisons,
            limits,
        })
    }

    // ── Accessors ──────────────────────────────────────────────

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn comparisons(&self) -> &[Comparison] {
        &self.comparisons
    }

    pub fn formulas(&self) -> &[Formula] {
        &self.formulas
    }

    pub fn antecedent_attributes(&self) -> &BTreeSet<String> {
        &self.antecedent_attributes
    }

    pub fn preference_attributes(&self) -> &BTreeSet<String> {
        &self.preference_attributes
    }

    pub fn indifferent_attributes(&self) -> &BTreeSet<String> {
        &self.indifferent_attributes
    }

    pub fn limits(&self) -> &TheoryLimits {
        &self.limits
    }

    pub fn is_consistent(&self) -> bool {
        self.inconsistency.is_none()
    }

    pub fn inconsistency(&self) -> Option<&Inconsistency> {
        self.inconsistency.as_ref()
    }

    /// Fails when the theory cannot answer compiled queries.
    pub fn ensure_consistent(&self) -> Result<(), TheoryError> {
        match &self.inconsistency {
            Some(reason) => Err(TheoryError::Inconsistent(reason.clone())),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    // ── Dominance ──────────────────────────────────────────────

    /// Whether `t1` is preferred to `t2`, found by forward chaining from
    /// `t1` over the rules. Works on inconsistent theories too.
    ///
    /// Gives up and answers `false` once the search has derived more than
    /// `max_derived_tuples` states.
    pub fn naive_dominates(&self, t1: &Tuple, t2: &Tuple) -> bool {
        if t1 == t2 || !t1.same_attributes(t2) {
            return false;
        }
        let start = Formula::from_tuple(t1);
        let mut seen = HashSet::from([start.clone()]);
        let mut frontier = vec![start];

        while !frontier.is_empty() {
            let mut next = Vec::new();
            for state in &frontier {
                for rule in &self.rules {
                    let Some(derived) = rule.apply_to_derived(state) else {
                        continue;
                    };
                    if derived.satisfied_by(t2) {
                        return true;
                    }
                    if seen.insert(derived.clone()) {
                        if seen.len() > self.limits.max_derived_tuples {
                            warn!(
                                derived = seen.len(),
                                max = self.limits.max_derived_tuples,
                                "naive dominance search exhausted its budget"
                            );
                            return false;
                        }
                        next.push(derived);
                    }
                }
            }
            frontier = next;
        }
        false
    }

    /// Whether some compiled comparison relates `t1` over `t2`.
    pub fn compiled_dominates(&self, t1: &Tuple, t2: &Tuple) -> Result<bool, TheoryError> {
        self.ensure_consistent()?;
        if t1 == t2 {
            return Ok(false);
        }
        Ok(self.comparisons.iter().any(|c| c.dominates(t1, t2)))
    }
}

impl fmt::Display for Theory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rule) in self.rules.iter().enumerate() {
            if i > 0 {
                writeln!(f, " AND")?;
            }
            write!(f, "{rule}")?;
        }
        Ok(())
    }
}
