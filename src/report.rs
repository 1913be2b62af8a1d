use std::io;

use serde::Serialize;

use crate::ga::GeneticAlgorithm;

/// The results dump of a finished run: objective, run metadata, the route
/// plan of the best solution, and the search progress trace.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub objective: u32,
    pub execution_time_ms: u128,
    pub time_to_best_ms: u128,
    /// Number of clients per route
    pub route_sizes: Vec<usize>,
    /// Ordered clients per route, without the depot markers
    pub routes: Vec<Vec<usize>>,
    pub progress: Vec<ProgressSample>,
}

/// One sample of the progress trace, recorded whenever a new best solution
/// was found.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProgressSample {
    pub elapsed_ms: u128,
    pub objective: u32,
}

impl Report {
    /// Collects the report of a finished run. Returns `None` when the run
    /// produced no offspring at all.
    pub fn of(ga: &GeneticAlgorithm) -> Option<Report> {
        let best = ga.best()?;

        let routes: Vec<Vec<usize>> = best
            .routes()
            .iter()
            .map(|route| route[1..route.len() - 1].to_vec())
            .collect();

        Some(Report {
            objective: best.time(),
            execution_time_ms: ga.execution_time().as_millis(),
            time_to_best_ms: ga.time_to_best().as_millis(),
            route_sizes: routes.iter().map(Vec::len).collect(),
            routes,
            progress: ga
                .search_progress()
                .iter()
                .map(|&(elapsed, objective)| ProgressSample {
                    elapsed_ms: elapsed.as_millis(),
                    objective,
                })
                .collect(),
        })
    }

    pub fn write_to<W: io::Write>(&self, writer: W) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(writer, self)
    }
}
