pub mod fitness;
pub mod initialization;
pub mod parent_selection;
pub mod recombination;
pub mod survival_selection;

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, trace};
use rand::prelude::*;

use crate::instance::Instance;
use crate::search::NeighborSearch;
use crate::solution::Solution;
use crate::termination::Termination;

/// The configuration of the genetic algorithm.
#[derive(Debug, Clone)]
pub struct Config {
    /// Population floor: the number of solutions surviving each generation
    pub mi: usize,
    /// How many offspring are bred on top of `mi` before survival selection
    pub lambda: usize,
    /// Number of closest solutions considered for the diversity measure
    pub n_close: usize,
    /// Elite count; the diversity weight in the biased fitness shrinks as
    /// this approaches the working-set size
    pub nb_elite: usize,
    /// Consecutive offspring without improvement before the run stops
    pub it_ni: u32,
    /// Consecutive offspring without improvement before a diversification
    pub it_div: u32,
    /// Wall-clock budget for the whole run
    pub time_limit: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mi: 25,
            lambda: 100,
            n_close: 5,
            nb_elite: 10,
            it_ni: 2000,
            it_div: 800,
            time_limit: Duration::from_secs(600),
        }
    }
}

/// The evolutionary driver: owns the working population, breeds offspring
/// from the sequence pool, educates them, and tracks the best solution
/// ever found.
pub struct GeneticAlgorithm {
    instance: Arc<Instance>,
    config: Config,
    search: NeighborSearch,
    rng: StdRng,
    best: Option<Solution>,
    execution_time: Duration,
    time_to_best: Duration,
    search_progress: Vec<(Duration, u32)>,
}

impl GeneticAlgorithm {
    /// A driver seeded from entropy; two runs will not be comparable.
    pub fn new(instance: Arc<Instance>, config: Config) -> GeneticAlgorithm {
        Self::with_rng(instance, config, StdRng::from_entropy())
    }

    /// A driver with an explicit random source, for reproducible runs.
    pub fn with_rng(instance: Arc<Instance>, config: Config, rng: StdRng) -> GeneticAlgorithm {
        assert!(config.mi >= 2, "population floor must be at least 2");
        assert!(config.lambda >= 1, "offspring batch must be non-empty");
        assert!(config.it_div >= 1, "diversification interval must be positive");
        assert!(config.n_close >= 1, "diversity neighborhood must be non-empty");

        GeneticAlgorithm {
            search: NeighborSearch::new(instance.clone()),
            instance,
            config,
            rng,
            best: None,
            execution_time: Duration::ZERO,
            time_to_best: Duration::ZERO,
            search_progress: Vec::new(),
        }
    }

    /// Runs the evolutionary loop until the stagnation limit or the time
    /// budget is hit. The best solution found is kept on the driver.
    pub fn run(&mut self) {
        let Config {
            mi,
            lambda,
            n_close,
            nb_elite,
            it_ni,
            it_div,
            time_limit,
        } = self.config;

        self.best = None;
        self.search_progress.clear();

        let started = Instant::now();
        let termination = Termination::Any(
            Box::new(Termination::Stagnation(it_ni)),
            Box::new(Termination::Timeout(started, time_limit)),
        );
        info!(
            "solving {} ({} clients), stopping at {}",
            self.instance.name(),
            self.instance.n_clients(),
            termination
        );

        // generation zero: random big tours, split but not educated
        let mut population = initialization::random_population(&self.instance, 2 * mi, &mut self.rng);
        let mut solutions: Vec<Solution> = population
            .iter()
            .map(|sequence| Solution::from_sequence(self.instance.clone(), sequence))
            .collect();

        let mut stagnation = 0;

        while !termination.should_terminate(stagnation) {
            let biased = fitness::biased_fitness(&solutions, n_close, nb_elite);

            while solutions.len() < mi + lambda {
                let [a, b] = parent_selection::binary_tournament(&biased, mi, &mut self.rng);
                let child_tour =
                    recombination::order_crossover(&population[a], &population[b], &mut self.rng);

                let mut child = Solution::from_sequence(self.instance.clone(), &child_tour);
                self.search.educate(&mut child);

                let improved = self
                    .best
                    .as_ref()
                    .map_or(true, |best| child.time() < best.time());

                if improved {
                    self.time_to_best = started.elapsed();
                    self.search_progress.push((self.time_to_best, child.time()));
                    debug!(
                        "new best solution {} after {:?}",
                        child.time(),
                        self.time_to_best
                    );
                    self.best = Some(child.clone());
                    stagnation = 0;
                    solutions.push(child);
                } else {
                    stagnation += 1;
                    solutions.push(child);

                    if stagnation % it_div == 0 {
                        self.diversify(&mut solutions);
                    } else if stagnation == it_ni {
                        break;
                    }
                }

                if termination.should_terminate(stagnation) {
                    break;
                }
            }

            survival_selection::select_survivors(&mut solutions, mi, n_close, nb_elite);

            // the sequence pool for the next generation comes from the
            // survivors; boundary information is recomputed fresh
            population.clear();
            population.extend(solutions.iter().map(Solution::to_sequence));
            trace!(
                "generation done: {} survivors, stagnation {}",
                solutions.len(),
                stagnation
            );
        }

        self.execution_time = started.elapsed();

        // a final audit: an inconsistent best solution is a programming
        // error and must not reach downstream tooling
        if let Some(best) = &self.best {
            best.validate();
        }

        info!(
            "finished after {:?}: best {} found at {:?}",
            self.execution_time,
            self.best.as_ref().map_or(u32::MAX, Solution::time),
            self.time_to_best
        );
    }

    /// Escapes stagnation by keeping only the best third of the survivors
    /// and refilling with fresh random solutions, split but not educated.
    fn diversify(&mut self, solutions: &mut Vec<Solution>) {
        let Config {
            mi,
            n_close,
            nb_elite,
            ..
        } = self.config;

        debug!("diversifying the population");
        survival_selection::select_survivors(solutions, (mi / 3).max(1), n_close, nb_elite);

        let fresh = initialization::random_population(&self.instance, 2 * mi, &mut self.rng);
        solutions.extend(
            fresh
                .iter()
                .map(|sequence| Solution::from_sequence(self.instance.clone(), sequence)),
        );
    }

    /// The best solution found so far, if any offspring has been produced.
    pub fn best(&self) -> Option<&Solution> {
        self.best.as_ref()
    }

    /// Total wall-clock time of the last `run`.
    pub fn execution_time(&self) -> Duration {
        self.execution_time
    }

    /// Elapsed time at which the best solution was found.
    pub fn time_to_best(&self) -> Duration {
        self.time_to_best
    }

    /// One (elapsed, objective) sample per improvement of the best solution.
    pub fn search_progress(&self) -> &[(Duration, u32)] {
        &self.search_progress
    }

    /// The configuration this driver runs with.
    pub fn config(&self) -> &Config {
        &self.config
    }
}
