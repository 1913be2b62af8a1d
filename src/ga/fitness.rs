use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use float_ord::FloatOrd;
use itertools::Itertools;

use crate::solution::Solution;

/// Distance between two solutions in [0, 1], based on how many directed
/// client-to-client arcs their routes share: one minus the ratio between
/// the intersection and the union of the two arc sets.
///
/// Arcs leaving the depot are kept as a set of first clients per solution
/// (the depot has one outgoing arc per route); every other client has
/// exactly one successor, so those arcs are compared through a successor
/// table indexed by client id.
pub fn solution_distance(s1: &Solution, s2: &Solution) -> f64 {
    let n = s1.instance().n_vertices();
    let (succ1, depots1) = successors(s1, n);
    let (succ2, depots2) = successors(s2, n);

    let mut intersection = depots1.intersection(&depots2).count();
    let mut union = depots1.len() + depots2.len() - intersection;

    for client in 1..n {
        let equal = succ1[client] == succ2[client];
        intersection += usize::from(equal);
        // equal arcs add one element to the union, different arcs two
        union += 2 - usize::from(equal);
    }

    1.0 - intersection as f64 / union as f64
}

/// The successor of every client within its route, plus the set of clients
/// visited first after the depot. Clients that end a route keep successor 0.
fn successors(solution: &Solution, n: usize) -> (Vec<usize>, HashSet<usize>) {
    let mut succ = vec![0; n];
    let mut depots = HashSet::new();

    for route in solution.routes() {
        depots.insert(route[1]);
        for i in 2..route.len() - 1 {
            succ[route[i - 1]] = route[i];
        }
    }

    (succ, depots)
}

/// Mean distance from solution `i` to its `n_close` nearest neighbors,
/// keeping only the `n_close` smallest distances seen so far in a bounded
/// max-heap.
fn n_close_mean(distances: &[Vec<f64>], n_close: usize, i: usize) -> f64 {
    let k = n_close.min(distances.len().saturating_sub(1));
    let mut heap: BinaryHeap<FloatOrd<f64>> = BinaryHeap::with_capacity(k + 1);

    for (j, &d) in distances[i].iter().enumerate() {
        if j == i {
            continue;
        }
        if heap.len() < k {
            heap.push(FloatOrd(d));
        } else if let Some(worst) = heap.peek() {
            if d < worst.0 {
                heap.pop();
                heap.push(FloatOrd(d));
            }
        }
    }

    let len = heap.len().max(1);
    heap.into_iter().map(|d| d.0).sum::<f64>() / len as f64
}

/// The biased fitness of every solution: its rank by completion time plus
/// its rank by diversity contribution, the latter weighted by
/// `1 - nb_elite / N`. Lower is better; with `nb_elite == N` the ranking is
/// by quality alone.
pub fn biased_fitness(solutions: &[Solution], n_close: usize, nb_elite: usize) -> Vec<f64> {
    let n = solutions.len();

    let mut distances = vec![vec![0.0; n]; n];
    for (i, j) in (0..n).tuple_combinations() {
        let d = solution_distance(&solutions[i], &solutions[j]);
        distances[i][j] = d;
        distances[j][i] = d;
    }

    let mean: Vec<f64> = (0..n)
        .map(|i| n_close_mean(&distances, n_close, i))
        .collect();

    // the most diverse solution gets diversity rank 1
    let mut by_diversity: Vec<usize> = (0..n).collect();
    by_diversity.sort_by_key(|&i| Reverse(FloatOrd(mean[i])));
    let mut rank_diversity = vec![0; n];
    for (rank, &i) in by_diversity.iter().enumerate() {
        rank_diversity[i] = rank + 1;
    }

    // the best completion time gets fitness rank 1
    let mut by_time: Vec<usize> = (0..n).collect();
    by_time.sort_by_key(|&i| solutions[i].time());
    let mut rank_fitness = vec![0; n];
    for (rank, &i) in by_time.iter().enumerate() {
        rank_fitness[i] = rank + 1;
    }

    let weight = 1.0 - nb_elite as f64 / n as f64;
    (0..n)
        .map(|i| rank_fitness[i] as f64 + weight * rank_diversity[i] as f64)
        .collect()
}
