use float_ord::FloatOrd;
use log::trace;

use crate::ga::fitness;
use crate::solution::Solution;

/// Shrinks the working set down to `target` survivors, keeping the best
/// biased fitness and pushing exact duplicates out first.
///
/// Every solution is assigned its rank slot, duplicates of an earlier
/// solution get their biased fitness inflated far beyond the legitimate
/// range, and the set is sorted ascending and truncated. Evicted solutions
/// are dropped.
pub fn select_survivors(
    solutions: &mut Vec<Solution>,
    target: usize,
    n_close: usize,
    nb_elite: usize,
) {
    if solutions.len() <= target {
        return;
    }

    let mut biased = fitness::biased_fitness(solutions, n_close, nb_elite);
    for (i, solution) in solutions.iter_mut().enumerate() {
        solution.id = i;
    }

    // any clone sorts after every genuine solution; structural equality is
    // transitive, so each clone is penalized exactly once
    let penalty = (10 * solutions[0].instance().n_vertices()) as f64;
    let mut is_clone = vec![false; solutions.len()];
    for i in 0..solutions.len() {
        if is_clone[i] {
            continue;
        }
        for j in i + 1..solutions.len() {
            if solutions[i] == solutions[j] {
                is_clone[j] = true;
                biased[j] += penalty;
            }
        }
    }

    solutions.sort_by_key(|solution| FloatOrd(biased[solution.id]));
    trace!(
        "survival selection: keeping {} of {} solutions",
        target,
        solutions.len()
    );
    solutions.truncate(target);
}
