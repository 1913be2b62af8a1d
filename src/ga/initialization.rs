use rand::prelude::*;

use crate::instance::Instance;
use crate::solution::Sequence;

/// Generates `count` uniformly random big tours over all clients of the
/// instance. Used both for the initial population and for the fresh batch
/// injected by diversification.
pub fn random_population(
    instance: &Instance,
    count: usize,
    rng: &mut impl Rng,
) -> Vec<Sequence> {
    let base: Sequence = instance.clients().collect();

    (0..count)
        .map(|_| {
            let mut sequence = base.clone();
            sequence.shuffle(rng);
            sequence
        })
        .collect()
}
