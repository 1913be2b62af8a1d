use std::collections::HashSet;
use std::sync::Arc;

use crate::instance::{Instance, DEPOT};
use crate::split;

/// A big tour: every client exactly once, depot excluded. This is the
/// genome used for recombination, rebuilt from the surviving solutions at
/// the end of every generation.
pub type Sequence = Vec<usize>;

/// An ordered set of depot-to-depot routes together with the timing derived
/// from them. Routes are stored with the depot at both ends and must hold
/// at least one client each.
///
/// The timing vectors satisfy, for every route `r`:
/// `route_start[0] == route_rd[0]` and
/// `route_start[r] == max(route_rd[r], route_start[r-1] + route_time[r-1])`,
/// with the total completion time being the last route's start plus its
/// duration.
#[derive(Debug, Clone)]
pub struct Solution {
    instance: Arc<Instance>,
    /// The routes, each starting and ending at the depot
    pub(crate) routes: Vec<Vec<usize>>,
    /// Largest release date among each route's clients
    pub(crate) route_rd: Vec<u32>,
    /// Total travel time of each route, including the return to the depot
    pub(crate) route_time: Vec<u32>,
    /// Starting time of each route
    pub(crate) route_start: Vec<u32>,
    /// Completion time of the last route
    pub(crate) time: u32,
    /// Transient rank slot, only meaningful during survival selection
    pub(crate) id: usize,
}

impl Solution {
    /// Builds a solution from a big tour, partitioning it into routes with
    /// the cost-optimal boundary set.
    pub fn from_sequence(instance: Arc<Instance>, sequence: &[usize]) -> Solution {
        let (boundaries, time) = split::split(&instance, sequence);
        let solution = Solution::with_boundaries(instance, sequence, &boundaries);
        debug_assert_eq!(solution.time, time);
        solution
    }

    /// Builds a solution from a big tour and an explicit boundary set: a
    /// route is closed after every client contained in `boundaries`. Any
    /// boundary set yields a structurally valid solution; the timing is
    /// recomputed from scratch.
    pub fn with_boundaries(
        instance: Arc<Instance>,
        sequence: &[usize],
        boundaries: &HashSet<usize>,
    ) -> Solution {
        let mut routes = vec![vec![DEPOT]];
        for &client in sequence {
            routes.last_mut().unwrap().push(client);
            if boundaries.contains(&client) {
                routes.last_mut().unwrap().push(DEPOT);
                routes.push(vec![DEPOT]);
            }
        }

        // the walk leaves either a trailing open route or an empty one
        if routes.last().unwrap().len() == 1 {
            routes.pop();
        } else {
            routes.last_mut().unwrap().push(DEPOT);
        }

        let mut solution = Solution {
            instance,
            routes,
            route_rd: Vec::new(),
            route_time: Vec::new(),
            route_start: Vec::new(),
            time: 0,
            id: 0,
        };
        solution.update();
        solution
    }

    /// The instance this solution belongs to
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub(crate) fn instance_arc(&self) -> Arc<Instance> {
        self.instance.clone()
    }

    /// The completion time of the last route
    pub fn time(&self) -> u32 {
        self.time
    }

    /// The routes, each bounded by the depot
    pub fn routes(&self) -> &[Vec<usize>] {
        &self.routes
    }

    /// The number of clients visited
    pub fn n_clients(&self) -> usize {
        self.routes.iter().map(|route| route.len() - 2).sum()
    }

    /// Recomputes every route's duration and max release date, then the
    /// starting times. Returns the resulting completion time.
    pub fn update(&mut self) -> u32 {
        self.route_rd.resize(self.routes.len(), 0);
        self.route_time.resize(self.routes.len(), 0);

        for (r, route) in self.routes.iter().enumerate() {
            let mut release = 0;
            let mut duration = 0;
            for i in 1..route.len() {
                duration += self.instance.time(route[i - 1], route[i]);
                release = release.max(self.instance.release_date_of(route[i]));
            }
            self.route_rd[r] = release;
            self.route_time[r] = duration;
        }

        self.update_starting_times(0)
    }

    /// Recomputes the starting times of routes `from..`, propagating the
    /// chain reaction of an earlier change. Durations and release dates of
    /// those routes must already be correct.
    pub fn update_starting_times(&mut self, from: usize) -> u32 {
        self.route_start.resize(self.routes.len(), 0);

        for r in from..self.routes.len() {
            self.route_start[r] = match r {
                0 => self.route_rd[0],
                _ => self.route_rd[r].max(self.route_start[r - 1] + self.route_time[r - 1]),
            };
        }

        self.time = self.route_start.last().unwrap() + self.route_time.last().unwrap();
        self.time
    }

    /// Drops routes that visit no client. Returns whether any route was
    /// dropped; the caller is responsible for recomputing starting times.
    pub(crate) fn remove_empty_routes(&mut self) -> bool {
        let mut removed = false;
        for r in (0..self.routes.len()).rev() {
            if self.routes[r].len() == 2 {
                self.routes.remove(r);
                self.route_rd.remove(r);
                self.route_time.remove(r);
                self.route_start.remove(r);
                removed = true;
            }
        }
        removed
    }

    /// Flattens the routes back into a big tour, dropping the depot
    /// markers. Boundary information is not preserved.
    pub fn to_sequence(&self) -> Sequence {
        self.routes
            .iter()
            .flat_map(|route| route[1..route.len() - 1].iter().copied())
            .collect()
    }

    /// Audits the structural consistency of this solution: no empty routes,
    /// depot-bounded routes, every client visited exactly once, and all
    /// timing fields matching an independent recomputation. A violation is
    /// a programming error, never user input, so it panics.
    pub fn validate(&self) {
        for route in &self.routes {
            assert!(route.len() > 2, "found empty route");
            assert_eq!(route[0], DEPOT, "route does not start at the depot");
            assert_eq!(
                *route.last().unwrap(),
                DEPOT,
                "route does not end at the depot"
            );
        }

        let mut visited = vec![false; self.instance.n_vertices()];
        visited[DEPOT] = true;
        for route in &self.routes {
            for &client in &route[1..route.len() - 1] {
                assert!(!visited[client], "client {} visited more than once", client);
                visited[client] = true;
            }
        }
        assert!(
            visited.iter().all(|&v| v),
            "some client is never visited"
        );

        for (r, route) in self.routes.iter().enumerate() {
            let mut release = 0;
            let mut duration = 0;
            for i in 1..route.len() {
                duration += self.instance.time(route[i - 1], route[i]);
                release = release.max(self.instance.release_date_of(route[i]));
            }
            assert_eq!(
                self.route_rd[r], release,
                "route {} has an incorrect release date",
                r
            );
            assert_eq!(
                self.route_time[r], duration,
                "route {} has an incorrect duration",
                r
            );
        }

        for r in 0..self.routes.len() {
            let start = match r {
                0 => self.route_rd[0],
                _ => self.route_rd[r].max(self.route_start[r - 1] + self.route_time[r - 1]),
            };
            assert_eq!(
                self.route_start[r], start,
                "route {} has an incorrect starting time",
                r
            );
        }

        assert_eq!(
            self.time,
            self.route_start.last().unwrap() + self.route_time.last().unwrap(),
            "incorrect completion time"
        );
    }
}

/// Structural equality: same completion time, same number of routes, and
/// route by route the same release date, duration and ordered clients.
impl PartialEq for Solution {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time
            && self.routes.len() == other.routes.len()
            && self.route_rd == other.route_rd
            && self.route_time == other.route_time
            && self.routes == other.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(times: Vec<Vec<u32>>, release_dates: Vec<u32>) -> Arc<Instance> {
        Arc::new(Instance::new("test".to_string(), times, release_dates).unwrap())
    }

    /// All travel times 1, the given release dates for clients 1..
    fn unit_instance(client_release_dates: Vec<u32>) -> Arc<Instance> {
        let n = client_release_dates.len() + 1;
        let times = (0..n)
            .map(|i| (0..n).map(|j| u32::from(i != j)).collect())
            .collect();
        let mut rds = vec![0];
        rds.extend(client_release_dates);
        instance(times, rds)
    }

    #[test]
    fn builds_routes_from_boundaries() {
        let instance = unit_instance(vec![0, 0, 0, 0]);
        let boundaries = HashSet::from([2, 4]);

        let solution = Solution::with_boundaries(instance, &[1, 2, 3, 4], &boundaries);

        assert_eq!(solution.routes(), &[vec![0, 1, 2, 0], vec![0, 3, 4, 0]]);
        solution.validate();
    }

    #[test]
    fn roundtrips_through_a_sequence() {
        let instance = unit_instance(vec![0, 3, 0, 8, 1]);
        let boundaries = HashSet::from([3, 5]);
        let solution =
            Solution::with_boundaries(instance.clone(), &[2, 3, 1, 4, 5], &boundaries);

        let sequence = solution.to_sequence();
        assert_eq!(sequence, vec![2, 3, 1, 4, 5]);

        let rebuilt = Solution::with_boundaries(instance, &sequence, &boundaries);
        assert_eq!(rebuilt.routes(), solution.routes());
        assert_eq!(rebuilt, solution);
    }

    #[test]
    fn starting_times_follow_the_recurrence() {
        let instance = unit_instance(vec![0, 6, 2]);
        let boundaries = HashSet::from([1, 2, 3]);
        let solution = Solution::with_boundaries(instance, &[1, 2, 3], &boundaries);

        // route [1] starts at its release date
        assert_eq!(solution.route_start[0], solution.route_rd[0]);
        for r in 1..solution.routes().len() {
            assert_eq!(
                solution.route_start[r],
                solution.route_rd[r]
                    .max(solution.route_start[r - 1] + solution.route_time[r - 1])
            );
        }
        assert_eq!(
            solution.time(),
            solution.route_start.last().unwrap() + solution.route_time.last().unwrap()
        );

        // [1] runs 0..2, [2] waits for its release date 6..8, [3] chains 8..10
        assert_eq!(solution.route_start, vec![0, 6, 8]);
        assert_eq!(solution.time(), 10);
    }

    #[test]
    fn partial_update_propagates_to_later_routes() {
        let instance = unit_instance(vec![0, 0, 0, 0]);
        let boundaries = HashSet::from([2, 4]);
        let mut solution = Solution::with_boundaries(instance, &[1, 2, 3, 4], &boundaries);
        assert_eq!(solution.route_start, vec![0, 3]);
        assert_eq!(solution.time(), 6);

        // pretend a local-search move lengthened the first route, then patch
        // the chain from there
        solution.route_time[0] = 7;
        solution.update_starting_times(0);
        assert_eq!(solution.route_start, vec![0, 7]);
        assert_eq!(solution.time(), 10);
    }

    #[test]
    fn from_sequence_matches_the_split_oracle() {
        let instance = unit_instance(vec![0, 10]);
        let solution = Solution::from_sequence(instance, &[1, 2]);

        solution.validate();
        assert_eq!(solution.time(), 12);
        assert_eq!(solution.routes().len(), 2);
    }

    #[test]
    fn removes_empty_routes() {
        let instance = unit_instance(vec![0, 0]);
        let boundaries = HashSet::from([1, 2]);
        let mut solution = Solution::with_boundaries(instance, &[1, 2], &boundaries);

        // empty out the first route by hand
        let client = solution.routes[0].remove(1);
        solution.routes[1].insert(1, client);

        assert!(solution.remove_empty_routes());
        solution.update();
        solution.validate();
        assert_eq!(solution.routes().len(), 1);
    }

    #[test]
    fn equality_ignores_the_rank_slot() {
        let instance = unit_instance(vec![0, 0, 0]);
        let solution = Solution::from_sequence(instance, &[1, 2, 3]);

        let mut other = solution.clone();
        other.id = 17;
        assert_eq!(solution, other);
    }

    #[test]
    fn equality_distinguishes_different_routes() {
        let instance = unit_instance(vec![0, 0, 0]);
        let a = Solution::from_sequence(instance.clone(), &[1, 2, 3]);
        let b = Solution::from_sequence(instance, &[2, 1, 3]);

        // same completion time, different client order
        assert_eq!(a.time(), b.time());
        assert_ne!(a, b);
    }
}
