use std::sync::Arc;

use log::{debug, trace};

use crate::instance::Instance;
use crate::solution::Solution;
use crate::split;
use crate::utils::pair_mut;

/// Local-search improvement ("education") of solutions. Alternates between
/// moves inside a single route, moves across route pairs, and re-splitting
/// the flattened tour, until none of them improves the solution.
pub struct NeighborSearch {
    instance: Arc<Instance>,
}

impl NeighborSearch {
    pub fn new(instance: Arc<Instance>) -> NeighborSearch {
        NeighborSearch { instance }
    }

    /// Improves `solution` in place. On return the solution's timing is
    /// internally consistent, as if fully recomputed.
    ///
    /// Intra-route moves are accepted on a strict route-duration decrease
    /// and inter-route moves on a strict completion-time decrease, so the
    /// descent terminates.
    pub fn educate(&self, solution: &mut Solution) {
        let before = solution.time();

        loop {
            let mut improved = self.intra_search(solution);
            improved |= self.inter_search(solution);
            improved |= self.split_search(solution);

            if !improved {
                break;
            }
        }

        debug!("education: {} -> {}", before, solution.time());
    }

    /// Relocation and exchange of clients within each route. Returns
    /// whether any route got shorter.
    fn intra_search(&self, solution: &mut Solution) -> bool {
        let mut any = false;

        for r in 0..solution.routes.len() {
            let mut improved = false;
            while self.improve_route(solution, r) {
                improved = true;
            }
            if improved {
                solution.update_starting_times(r);
                any = true;
            }
        }

        any
    }

    /// Applies the first duration-reducing relocation or exchange found in
    /// route `r`. Starting times are left to the caller.
    fn improve_route(&self, solution: &mut Solution, r: usize) -> bool {
        let t = |i: usize, j: usize| self.instance.time(i, j) as i64;
        let route = &solution.routes[r];
        let m = route.len();

        if m <= 3 {
            return false;
        }

        // relocate the client at p to come right after position q
        for p in 1..m - 1 {
            let (a, b, c) = (route[p - 1], route[p], route[p + 1]);
            let removal = t(a, b) + t(b, c) - t(a, c);

            for q in 0..m - 1 {
                if q == p || q + 1 == p {
                    continue;
                }
                let (x, y) = (route[q], route[q + 1]);
                let delta = t(x, b) + t(b, y) - t(x, y) - removal;

                if delta < 0 {
                    trace!("relocating {} after {} in route {} ({})", b, x, r, delta);
                    let route = &mut solution.routes[r];
                    let client = route.remove(p);
                    let q = if q < p { q } else { q - 1 };
                    route.insert(q + 1, client);
                    solution.route_time[r] = (solution.route_time[r] as i64 + delta) as u32;
                    return true;
                }
            }
        }

        // exchange the clients at p and q
        for p in 1..m - 2 {
            for q in p + 1..m - 1 {
                let (a, b) = (route[p - 1], route[p]);
                let (y, z) = (route[q], route[q + 1]);

                let delta = if q == p + 1 {
                    t(a, y) + t(y, b) + t(b, z) - t(a, b) - t(b, y) - t(y, z)
                } else {
                    let c = route[p + 1];
                    let x = route[q - 1];
                    t(a, y) + t(y, c) + t(x, b) + t(b, z)
                        - t(a, b)
                        - t(b, c)
                        - t(x, y)
                        - t(y, z)
                };

                if delta < 0 {
                    trace!("exchanging {} and {} in route {} ({})", b, y, r, delta);
                    solution.routes[r].swap(p, q);
                    solution.route_time[r] = (solution.route_time[r] as i64 + delta) as u32;
                    return true;
                }
            }
        }

        false
    }

    /// Relocation and exchange of clients across route pairs, accepted on a
    /// strict completion-time decrease.
    fn inter_search(&self, solution: &mut Solution) -> bool {
        let mut any = false;
        while self.relocate_between_routes(solution) || self.exchange_between_routes(solution) {
            any = true;
        }
        any
    }

    /// Moves one client into another route if that lowers the completion
    /// time. The donor route is dropped when it becomes empty.
    fn relocate_between_routes(&self, solution: &mut Solution) -> bool {
        let t = |i: usize, j: usize| self.instance.time(i, j) as i64;
        let n_routes = solution.routes.len();

        for r1 in 0..n_routes {
            for p in 1..solution.routes[r1].len() - 1 {
                let donor = &solution.routes[r1];
                let (a, b, c) = (donor[p - 1], donor[p], donor[p + 1]);
                let new_dur1 =
                    (solution.route_time[r1] as i64 - t(a, b) - t(b, c) + t(a, c)) as u32;
                let new_rd1 = self.max_release(donor, p, None);
                let empties_donor = donor.len() == 3;

                for r2 in (0..n_routes).filter(|&r2| r2 != r1) {
                    for q in 0..solution.routes[r2].len() - 1 {
                        let receiver = &solution.routes[r2];
                        let (x, y) = (receiver[q], receiver[q + 1]);
                        let new_dur2 = (solution.route_time[r2] as i64 + t(x, b) + t(b, y)
                            - t(x, y)) as u32;
                        let new_rd2 =
                            solution.route_rd[r2].max(self.instance.release_date_of(b));

                        let skip = empties_donor.then(|| r1);
                        let completion = self.chain_time(
                            solution,
                            skip,
                            &[(r1, new_rd1, new_dur1), (r2, new_rd2, new_dur2)],
                        );

                        if completion < solution.time {
                            trace!("moving {} from route {} to route {}", b, r1, r2);
                            let (donor, receiver) = pair_mut(&mut solution.routes, r1, r2);
                            let client = donor.remove(p);
                            receiver.insert(q + 1, client);
                            solution.route_rd[r1] = new_rd1;
                            solution.route_time[r1] = new_dur1;
                            solution.route_rd[r2] = new_rd2;
                            solution.route_time[r2] = new_dur2;

                            if solution.remove_empty_routes() {
                                solution.update_starting_times(0);
                            } else {
                                solution.update_starting_times(r1.min(r2));
                            }
                            return true;
                        }
                    }
                }
            }
        }

        false
    }

    /// Swaps one client of a route with one client of another route if that
    /// lowers the completion time.
    fn exchange_between_routes(&self, solution: &mut Solution) -> bool {
        let t = |i: usize, j: usize| self.instance.time(i, j) as i64;
        let n_routes = solution.routes.len();

        for r1 in 0..n_routes {
            for r2 in r1 + 1..n_routes {
                for p in 1..solution.routes[r1].len() - 1 {
                    for q in 1..solution.routes[r2].len() - 1 {
                        let (one, two) = (&solution.routes[r1], &solution.routes[r2]);
                        let (a, b, c) = (one[p - 1], one[p], one[p + 1]);
                        let (x, y, z) = (two[q - 1], two[q], two[q + 1]);

                        let new_dur1 = (solution.route_time[r1] as i64 - t(a, b) - t(b, c)
                            + t(a, y)
                            + t(y, c)) as u32;
                        let new_dur2 = (solution.route_time[r2] as i64 - t(x, y) - t(y, z)
                            + t(x, b)
                            + t(b, z)) as u32;
                        let new_rd1 = self.max_release(one, p, Some(y));
                        let new_rd2 = self.max_release(two, q, Some(b));

                        let completion = self.chain_time(
                            solution,
                            None,
                            &[(r1, new_rd1, new_dur1), (r2, new_rd2, new_dur2)],
                        );

                        if completion < solution.time {
                            trace!("exchanging {} (route {}) with {} (route {})", b, r1, y, r2);
                            let (one, two) = pair_mut(&mut solution.routes, r1, r2);
                            one[p] = y;
                            two[q] = b;
                            solution.route_rd[r1] = new_rd1;
                            solution.route_time[r1] = new_dur1;
                            solution.route_rd[r2] = new_rd2;
                            solution.route_time[r2] = new_dur2;
                            solution.update_starting_times(r1.min(r2));
                            return true;
                        }
                    }
                }
            }
        }

        false
    }

    /// Re-partitions the flattened tour through the split oracle, which
    /// captures route merges and splits no pairwise move can reach.
    fn split_search(&self, solution: &mut Solution) -> bool {
        let sequence = solution.to_sequence();
        let (_, time) = split::split(&self.instance, &sequence);

        if time < solution.time() {
            *solution = Solution::from_sequence(solution.instance_arc(), &sequence);
            true
        } else {
            false
        }
    }

    /// The max release date over a route with the client at index `skip`
    /// removed and, optionally, `extra` added.
    fn max_release(&self, route: &[usize], skip: usize, extra: Option<usize>) -> u32 {
        let mut release = extra.map_or(0, |c| self.instance.release_date_of(c));
        for (i, &v) in route.iter().enumerate() {
            if i != skip {
                release = release.max(self.instance.release_date_of(v));
            }
        }
        release
    }

    /// The completion time the solution would have with the release date
    /// and duration of a few routes overridden, and optionally one route
    /// removed entirely.
    fn chain_time(
        &self,
        solution: &Solution,
        skip: Option<usize>,
        overrides: &[(usize, u32, u32)],
    ) -> u32 {
        let mut finish = 0;

        for r in 0..solution.routes.len() {
            if skip == Some(r) {
                continue;
            }
            let (rd, duration) = overrides
                .iter()
                .find(|&&(route, _, _)| route == r)
                .map(|&(_, rd, duration)| (rd, duration))
                .unwrap_or((solution.route_rd[r], solution.route_time[r]));

            finish = rd.max(finish) + duration;
        }

        finish
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solution::Solution;
    use std::collections::HashSet;

    fn instance(times: Vec<Vec<u32>>, release_dates: Vec<u32>) -> Arc<Instance> {
        Arc::new(Instance::new("test".to_string(), times, release_dates).unwrap())
    }

    /// Vertices on a line at the given positions, travel time = distance.
    fn line_instance(positions: Vec<i64>, release_dates: Vec<u32>) -> Arc<Instance> {
        let times = positions
            .iter()
            .map(|&a| positions.iter().map(|&b| (a - b).unsigned_abs() as u32).collect())
            .collect();
        instance(times, release_dates)
    }

    #[test]
    fn untangles_a_route_with_an_exchange() {
        let instance = line_instance(vec![0, 1, 2, 5], vec![0, 0, 0, 0]);
        let boundaries = HashSet::from([3]);
        let mut solution = Solution::with_boundaries(instance.clone(), &[2, 1, 3], &boundaries);
        // depot -> 2 -> 1 -> 3 -> depot
        assert_eq!(solution.time(), 12);

        NeighborSearch::new(instance).educate(&mut solution);

        solution.validate();
        assert_eq!(solution.time(), 10);
    }

    #[test]
    fn moves_a_client_out_of_a_late_route() {
        // client 3 is released late and far from 1 and 2; client 2 should
        // not wait with it
        let instance = instance(
            vec![
                vec![0, 1, 1, 1],
                vec![1, 0, 1, 5],
                vec![1, 1, 0, 5],
                vec![1, 5, 5, 0],
            ],
            vec![0, 0, 0, 9],
        );
        let boundaries = HashSet::from([1, 3]);
        let mut solution = Solution::with_boundaries(instance.clone(), &[1, 2, 3], &boundaries);
        assert_eq!(solution.time(), 16);

        NeighborSearch::new(instance).educate(&mut solution);

        solution.validate();
        assert_eq!(solution.time(), 11);
    }

    #[test]
    fn merges_routes_through_the_split_oracle() {
        // nothing is released late, so one route dominates two
        let instance = line_instance(vec![0, 1, 2], vec![0, 0, 0]);
        let boundaries = HashSet::from([1, 2]);
        let mut solution = Solution::with_boundaries(instance.clone(), &[1, 2], &boundaries);
        assert_eq!(solution.routes().len(), 2);

        NeighborSearch::new(instance).educate(&mut solution);

        solution.validate();
        assert_eq!(solution.routes().len(), 1);
        assert_eq!(solution.time(), 4);
    }

    #[test]
    fn leaves_a_single_client_alone() {
        let instance = line_instance(vec![0, 4], vec![0, 2]);
        let mut solution = Solution::from_sequence(instance.clone(), &[1]);

        NeighborSearch::new(instance).educate(&mut solution);

        solution.validate();
        // starts at the release date, 4 out and 4 back
        assert_eq!(solution.time(), 10);
    }

    #[test]
    fn never_worsens_a_solution() {
        let instance = line_instance(vec![0, 3, 7, 2, 9, 4], vec![0, 5, 0, 11, 2, 0]);
        let sequence = vec![5, 3, 1, 4, 2];
        let mut solution = Solution::from_sequence(instance.clone(), &sequence);
        let before = solution.time();

        NeighborSearch::new(instance).educate(&mut solution);

        solution.validate();
        assert!(solution.time() <= before);
    }
}
