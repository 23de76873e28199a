use serde::{Deserialize, Serialize};

use cpref_compiler::Theory;
use cpref_ir::Tuple;

use crate::skyline::{most_preferred_naive, most_preferred_partitioned};
use crate::topk::{top_k_naive, top_k_partitioned};
use crate::RankError;

/// How dominance is decided while ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Forward chaining over the rules for every tuple pair. Works on
    /// inconsistent theories.
    #[default]
    Naive,
    /// Compiled comparisons applied to groups of tuples. Requires a
    /// consistent theory.
    Partitioned,
}

pub fn most_preferred<'a>(
    theory: &Theory,
    tuples: &'a [Tuple],
    strategy: Strategy,
) -> Result<Vec<&'a Tuple>, RankError> {
    match strategy {
        Strategy::Naive => Ok(most_preferred_naive(theory, tuples)),
        Strategy::Partitioned => most_preferred_partitioned(theory, tuples),
    }
}

pub fn top_k<'a>(
    theory: &Theory,
    k: usize,
    tuples: &'a [Tuple],
    strategy: Strategy,
) -> Result<Vec<&'a Tuple>, RankError> {
    match strategy {
        Strategy::Naive => Ok(top_k_naive(theory, k, tuples)),
        Strategy::Partitioned => top_k_partitioned(theory, k, tuples),
    }
}
