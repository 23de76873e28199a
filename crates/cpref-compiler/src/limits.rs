//! Caps on the combinatorial stages of theory construction and on the
//! naive dominance search.
//!
//! Every fixpoint loop checks its size against one of these limits.
//! Build stages fail with [`LimitExceeded`]; the naive search gives up
//! and answers "not dominated".

use std::fmt;

use serde::{Deserialize, Serialize};

/// Limits for building and querying a single theory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TheoryLimits {
    /// Maximum number of rules after interval splitting.
    pub max_rules: usize,
    /// Maximum combined antecedent contexts per preference attribute.
    pub max_contexts: usize,
    /// Maximum size of the formula universe.
    pub max_formulas: usize,
    /// Maximum size of the closed comparison set.
    pub max_comparisons: usize,
    /// Maximum tuples derived by one naive dominance search.
    pub max_derived_tuples: usize,
}

impl Default for TheoryLimits {
    fn default() -> Self {
        Self {
            max_rules: 4096,
            max_contexts: 4096,
            max_formulas: 65_536,
            max_comparisons: 65_536,
            max_derived_tuples: 100_000,
        }
    }
}

/// Which limit was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Limit {
    Rules,
    Contexts,
    Formulas,
    Comparisons,
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rules => write!(f, "normalized rule"),
            Self::Contexts => write!(f, "antecedent context"),
            Self::Formulas => write!(f, "formula"),
            Self::Comparisons => write!(f, "comparison"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{limit} limit exceeded ({count}, max {max})")]
pub struct LimitExceeded {
    pub limit: Limit,
    pub count: usize,
    pub max: usize,
}

impl TheoryLimits {
    fn max_for(&self, limit: Limit) -> usize {
        match limit {
            Limit::Rules => self.max_rules,
            Limit::Contexts => self.max_contexts,
            Limit::Formulas => self.max_formulas,
            Limit::Comparisons => self.max_comparisons,
        }
    }

    /// Fails once `count` items exceed the configured maximum for `limit`.
    pub fn check(&self, limit: Limit, count: usize) -> Result<(), LimitExceeded> {
        let max = self.max_for(limit);
        if count > max {
            return Err(LimitExceeded { limit, count, max });
        }
        Ok(())
    }
}
