use rayon::prelude::*;
use tracing::{debug, warn};

use cpref_compiler::Theory;
use cpref_ir::Tuple;

use crate::partition::{dominated_in, partition};
use crate::RankError;

/// Orders `(level, index)` pairs by level, then input order, and keeps
/// the first `k`.
fn assemble<'a>(tuples: &'a [Tuple], mut ranked: Vec<(usize, usize)>, k: usize) -> Vec<&'a Tuple> {
    ranked.sort_unstable();
    ranked.into_iter().take(k).map(|(_, i)| &tuples[i]).collect()
}

/// The `k` best tuples by dominance level, where a tuple's level is the
/// length of the longest dominance chain ending at it.
///
/// The pairwise dominance relation is computed once, in parallel by row,
/// then levels are relaxed to a fixpoint.
pub fn top_k_naive<'a>(theory: &Theory, k: usize, tuples: &'a [Tuple]) -> Vec<&'a Tuple> {
    if k == 0 || tuples.is_empty() {
        return Vec::new();
    }
    let n = tuples.len();
    let beats: Vec<Vec<usize>> = (0..n)
        .into_par_iter()
        .map(|i| {
            (0..n)
                .filter(|&j| i != j && theory.naive_dominates(&tuples[i], &tuples[j]))
                .collect()
        })
        .collect();

    let mut levels = vec![0usize; n];
    let mut rounds = 0;
    loop {
        let mut changed = false;
        for (i, beaten) in beats.iter().enumerate() {
            let next = levels[i] + 1;
            for &j in beaten {
                if levels[j] < next {
                    levels[j] = next;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
        rounds += 1;
        if rounds > n {
            warn!(rounds, "dominance cycle while leveling; levels are not final");
            break;
        }
    }

    let ranked = levels.into_iter().enumerate().map(|(i, level)| (level, i)).collect();
    assemble(tuples, ranked, k)
}

/// The `k` best tuples by dominance level, peeling one level per round
/// with the compiled comparisons.
///
/// Each round, every comparison is applied to groups of the remaining
/// tuples; a tuple beaten in a group has its pending level raised. Tuples
/// whose pending level still equals the round number are final.
pub fn top_k_partitioned<'a>(
    theory: &Theory,
    k: usize,
    tuples: &'a [Tuple],
) -> Result<Vec<&'a Tuple>, RankError> {
    theory.ensure_consistent()?;
    if k == 0 || tuples.is_empty() {
        return Ok(Vec::new());
    }

    let mut pending = vec![0usize; tuples.len()];
    let mut working: Vec<usize> = (0..tuples.len()).collect();
    let mut ranked: Vec<(usize, usize)> = Vec::new();
    let mut round = 0;

    while !working.is_empty() && ranked.len() < k {
        for comparison in theory.comparisons() {
            let groups = partition(&working, tuples, comparison);
            let beaten: Vec<usize> = groups
                .par_iter()
                .flat_map_iter(|group| dominated_in(group, tuples, comparison))
                .collect();
            for i in beaten {
                pending[i] += 1;
            }
        }

        let finalized_before = ranked.len();
        let mut remaining = Vec::new();
        for i in working {
            if pending[i] == round {
                ranked.push((round, i));
            } else {
                pending[i] = round + 1;
                remaining.push(i);
            }
        }
        if ranked.len() == finalized_before {
            warn!(round, remaining = remaining.len(), "every remaining tuple is beaten; closing ranking");
            ranked.extend(remaining.drain(..).map(|i| (round, i)));
        }
        debug!(round, finalized = ranked.len(), "top-k round");
        working = remaining;
        round += 1;
    }

    Ok(assemble(tuples, ranked, k))
}
