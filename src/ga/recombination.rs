use rand::prelude::*;

use crate::solution::Sequence;

/// Order crossover (OX) of two parent tours.
///
/// A random window of the first parent is copied verbatim into the child;
/// the remaining positions are filled left to right (first before the
/// window, then after it) with the clients outside the window, in the
/// order they appear in the second parent.
///
/// Tours shorter than four clients admit no window that is neither the
/// whole tour nor trivially small, so the child is a plain copy of the
/// first parent there.
pub fn order_crossover(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut impl Rng,
) -> Sequence {
    debug_assert_eq!(parent1.len(), parent2.len());
    let n = parent1.len();

    if n < 4 {
        return parent1.to_vec();
    }

    let (a, b) = choose_window(n, rng);
    cross(parent1, parent2, a, b)
}

/// A random window [a, b] over tour positions, redrawn until it is neither
/// the entire tour nor of length <= 2.
fn choose_window(n: usize, rng: &mut impl Rng) -> (usize, usize) {
    loop {
        let mut a = rng.gen_range(0..n);
        let mut b = rng.gen_range(0..n);
        if a > b {
            std::mem::swap(&mut a, &mut b);
        }

        if (a == 0 && b == n - 1) || b - a <= 1 {
            continue;
        }

        return (a, b);
    }
}

fn cross(parent1: &[usize], parent2: &[usize], a: usize, b: usize) -> Sequence {
    let n = parent1.len();
    let mut child = vec![0; n];
    let mut used = vec![false; n + 1];

    child[a..=b].copy_from_slice(&parent1[a..=b]);
    for &client in &parent1[a..=b] {
        used[client] = true;
    }

    // the second parent donates the rest, keeping its relative order
    let mut donor = parent2.iter().copied().filter(|&client| !used[client]);
    let (head, tail) = child.split_at_mut(b + 1);
    for slot in head[..a].iter_mut().chain(tail.iter_mut()) {
        *slot = donor
            .next()
            .expect("parents are permutations of the same client set");
    }

    child
}
