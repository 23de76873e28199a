use rayon::prelude::*;
use tracing::debug;

use cpref_compiler::Theory;
use cpref_ir::Tuple;

use crate::partition::{dominated_in, partition};
use crate::RankError;

fn survivors<'a>(tuples: &'a [Tuple], alive: &[bool]) -> Vec<&'a Tuple> {
    tuples
        .iter()
        .zip(alive)
        .filter(|(_, alive)| **alive)
        .map(|(tuple, _)| tuple)
        .collect()
}

/// The tuples no other tuple dominates, by pairwise naive dominance tests.
/// Input order is preserved.
pub fn most_preferred_naive<'a>(theory: &Theory, tuples: &'a [Tuple]) -> Vec<&'a Tuple> {
    let n = tuples.len();
    let mut alive = vec![true; n];
    for i in 0..n {
        if !alive[i] {
            continue;
        }
        for j in i + 1..n {
            if !alive[j] {
                continue;
            }
            if theory.naive_dominates(&tuples[j], &tuples[i]) {
                alive[i] = false;
                break;
            }
            if theory.naive_dominates(&tuples[i], &tuples[j]) {
                alive[j] = false;
            }
        }
    }
    survivors(tuples, &alive)
}

/// The tuples no other tuple dominates, found by applying each compiled
/// comparison to groups of tuples it can relate. Input order is preserved.
pub fn most_preferred_partitioned<'a>(
    theory: &Theory,
    tuples: &'a [Tuple],
) -> Result<Vec<&'a Tuple>, RankError> {
    theory.ensure_consistent()?;
    let mut alive = vec![true; tuples.len()];

    for comparison in theory.comparisons() {
        let live: Vec<usize> = (0..tuples.len()).filter(|&i| alive[i]).collect();
        if live.len() < 2 {
            break;
        }
        let groups = partition(&live, tuples, comparison);
        let dead: Vec<usize> = groups
            .par_iter()
            .flat_map_iter(|group| dominated_in(group, tuples, comparison))
            .collect();
        for i in dead {
            alive[i] = false;
        }
    }

    let skyline = survivors(tuples, &alive);
    debug!(input = tuples.len(), skyline = skyline.len(), "partitioned skyline");
    Ok(skyline)
}
