use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::info;
use rand::prelude::*;

use tsprd::ga::{Config, GeneticAlgorithm};
use tsprd::instance::Instance;
use tsprd::report::Report;

#[derive(Parser, Debug)]
#[clap(name = "tsprd", about = "Hybrid genetic search for the TSP with release dates")]
struct Args {
    /// Path to the instance file
    instance: PathBuf,

    /// Write a JSON report of the run to this path
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Population floor
    #[clap(long, default_value_t = 25)]
    mi: usize,

    /// Offspring generated on top of the population floor each generation
    #[clap(long, default_value_t = 100)]
    lambda: usize,

    /// Diversity neighborhood size [default: 0.2 * mi]
    #[clap(long)]
    n_close: Option<usize>,

    /// Elite count [default: 0.4 * mi]
    #[clap(long)]
    nb_elite: Option<usize>,

    /// Offspring without improvement before the run stops
    #[clap(long, default_value_t = 2000)]
    it_ni: u32,

    /// Offspring without improvement before a diversification [default: 0.4 * it_ni]
    #[clap(long)]
    it_div: Option<u32>,

    /// Wall-clock budget in seconds
    #[clap(long, default_value_t = 600)]
    time_limit: u64,

    /// Fix the rng seed for a reproducible run
    #[clap(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let instance = Arc::new(Instance::from_file(&args.instance)?);

    let config = Config {
        mi: args.mi,
        lambda: args.lambda,
        n_close: args
            .n_close
            .unwrap_or(((0.2 * args.mi as f64) as usize).max(1)),
        nb_elite: args.nb_elite.unwrap_or((0.4 * args.mi as f64) as usize),
        it_ni: args.it_ni,
        it_div: args
            .it_div
            .unwrap_or(((0.4 * args.it_ni as f64) as u32).max(1)),
        time_limit: Duration::from_secs(args.time_limit),
    };

    let mut ga = match args.seed {
        Some(seed) => {
            info!("seeding the run with {seed}");
            GeneticAlgorithm::with_rng(instance, config, StdRng::seed_from_u64(seed))
        }
        None => GeneticAlgorithm::new(instance, config),
    };

    ga.run();

    let best = ga
        .best()
        .ok_or("no offspring produced within the time budget")?;
    best.validate();

    println!("RESULT {}", best.time());
    println!("EXEC_TIME {}", ga.execution_time().as_millis());
    println!("SOL_TIME {}", ga.time_to_best().as_millis());

    if let Some(path) = args.output {
        let report = Report::of(&ga).ok_or("no report for an empty run")?;
        let file = std::fs::File::create(&path)?;
        report.write_to(std::io::BufWriter::new(file))?;
        info!("report written to {}", path.display());
    }

    Ok(())
}
