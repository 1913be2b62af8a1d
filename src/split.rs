use std::collections::HashSet;

use crate::instance::{Instance, DEPOT};

/// Computes the completion-time-optimal partition of `sequence` into
/// depot-to-depot routes, under the constraint that routes run one after
/// another and no route may start before the latest release date among its
/// clients.
///
/// Returns the set of clients that end a route, together with the total
/// completion time of the partition. The last client of the sequence always
/// ends a route, so the boundary set is never empty for a non-empty
/// sequence.
///
/// Runs a dynamic program over break points: `delta[j]` is the optimal
/// completion time of the first `j` clients, and a route covering
/// `sequence[i..j]` starts at `max(delta[i], maxReleaseDate(i..j))`.
pub fn split(instance: &Instance, sequence: &[usize]) -> (HashSet<usize>, u32) {
    let n = sequence.len();
    debug_assert!(n > 0, "cannot split an empty sequence");

    let mut delta = vec![u32::MAX; n + 1];
    let mut pred = vec![0usize; n + 1];
    delta[0] = 0;

    for i in 0..n {
        let finish_before = delta[i];
        let mut release = 0;
        let mut duration = instance.time(DEPOT, sequence[i]);

        for j in i..n {
            let client = sequence[j];
            release = release.max(instance.release_date_of(client));
            if j > i {
                duration += instance.time(sequence[j - 1], client);
            }

            let completion =
                release.max(finish_before) + duration + instance.time(client, DEPOT);
            if completion < delta[j + 1] {
                delta[j + 1] = completion;
                pred[j + 1] = i;
            }
        }
    }

    // walk the predecessor chain to recover which clients end a route
    let mut boundaries = HashSet::new();
    let mut end = n;
    while end > 0 {
        boundaries.insert(sequence[end - 1]);
        end = pred[end];
    }

    (boundaries, delta[n])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// All travel times 1, release dates as given (depot prepended).
    fn unit_instance(release_dates: Vec<u32>) -> Arc<Instance> {
        let n = release_dates.len() + 1;
        let times = (0..n)
            .map(|i| (0..n).map(|j| u32::from(i != j)).collect())
            .collect();
        let mut rds = vec![0];
        rds.extend(release_dates);
        Arc::new(Instance::new("unit".to_string(), times, rds).unwrap())
    }

    #[test]
    fn keeps_a_single_route_when_nothing_is_released_late() {
        let instance = unit_instance(vec![0, 0, 0]);
        let (boundaries, time) = split(&instance, &[1, 2, 3]);

        // depot -> 1 -> 2 -> 3 -> depot
        assert_eq!(time, 4);
        assert_eq!(boundaries, HashSet::from([3]));
    }

    #[test]
    fn splits_before_a_late_release_date() {
        // a single route would wait for client 2's release date before
        // serving anyone; serving client 1 first is free
        let instance = unit_instance(vec![0, 10]);

        let (boundaries, time) = split(&instance, &[1, 2]);

        // route [1] finishes at 2, route [2] starts at 10 and finishes at 12,
        // while the single route [1, 2] would finish at 13
        assert_eq!(time, 12);
        assert_eq!(boundaries, HashSet::from([1, 2]));
    }

    #[test]
    fn boundary_set_is_never_empty() {
        let instance = unit_instance(vec![0]);
        let (boundaries, time) = split(&instance, &[1]);

        assert_eq!(boundaries, HashSet::from([1]));
        assert_eq!(time, 2);
    }

    #[test]
    fn is_deterministic() {
        let instance = unit_instance(vec![3, 0, 7, 1]);
        let sequence = [2, 4, 1, 3];

        assert_eq!(split(&instance, &sequence), split(&instance, &sequence));
    }

    #[test]
    fn waits_out_release_dates_sequentially() {
        // both clients released late: one route waiting once beats two
        // routes waiting twice
        let instance = unit_instance(vec![8, 8]);
        let (boundaries, time) = split(&instance, &[1, 2]);

        assert_eq!(time, 11);
        assert_eq!(boundaries, HashSet::from([2]));
    }
}
