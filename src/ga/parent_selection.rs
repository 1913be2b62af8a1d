use rand::prelude::*;

/// Binary-tournament selection of two distinct parents.
///
/// Each parent is the better (lower biased fitness) of two indices drawn
/// uniformly from the best `mi` ranked slots; the second tournament is
/// re-run until it lands on a different slot than the first.
pub fn binary_tournament(biased_fitness: &[f64], mi: usize, rng: &mut impl Rng) -> [usize; 2] {
    debug_assert!(mi >= 2 && mi <= biased_fitness.len());

    let first = tournament(biased_fitness, mi, rng);
    let mut second = tournament(biased_fitness, mi, rng);
    while second == first {
        second = tournament(biased_fitness, mi, rng);
    }

    [first, second]
}

/// The better of two slots drawn uniformly from the first `mi`.
fn tournament(biased_fitness: &[f64], mi: usize, rng: &mut impl Rng) -> usize {
    let a = rng.gen_range(0..mi);
    let b = rng.gen_range(0..mi);
    if biased_fitness[b] < biased_fitness[a] {
        b
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parents_are_distinct_and_within_the_pool() {
        let biased = vec![3.0, 1.0, 2.0, 4.0, 5.0, 6.0];
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..200 {
            let [a, b] = binary_tournament(&biased, 4, &mut rng);
            assert_ne!(a, b);
            assert!(a < 4 && b < 4);
        }
    }

    #[test]
    fn favors_lower_biased_fitness() {
        // slot 0 is far better than every other slot, so it should win
        // most tournaments it takes part in
        let biased = vec![0.0, 10.0, 10.0, 10.0];
        let mut rng = StdRng::seed_from_u64(5);

        let wins = (0..500)
            .filter(|_| binary_tournament(&biased, 4, &mut rng).contains(&0))
            .count();

        assert!(wins > 300);
    }
}
