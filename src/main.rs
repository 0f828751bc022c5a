// Monte-Carlo pick'em odds for a 16-team Swiss stage. Loads team ratings,
// generates random candidate predictions, simulates the bracket N times over
// K worker threads, and reports per-team category odds plus the best-scoring
// predictions.

mod ingest;
mod predictions;
mod prob;
mod sim;
mod swiss;

use std::path::PathBuf;
use std::process;
use std::sync::Mutex;
use std::time::Instant;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::ingest::TournamentData;
use crate::predictions::{random_predictions, Prediction};
use crate::sim::{RunResults, Simulation};
use crate::swiss::TEAM_COUNT;

#[derive(Parser, Debug)]
#[command(
    name = "swiss-pickem",
    about = "Monte-Carlo pick'em simulator for a 16-team Swiss stage"
)]
struct Args {
    /// Tournament data file: rating-system sigmas plus seeded teams, JSON
    #[arg(short = 'f', long = "file", default_value = "data.json")]
    file: PathBuf,

    /// Number of tournaments to simulate
    #[arg(short = 'n', long = "iterations", default_value_t = 1_000_000)]
    iterations: u64,

    /// Worker threads (0 = one per logical core)
    #[arg(short = 'k', long = "workers", default_value_t = 0)]
    workers: usize,

    /// Number of random candidate predictions to score
    #[arg(short = 'p', long = "predictions", default_value_t = 1000)]
    predictions: usize,

    /// Master RNG seed (0 = seed from entropy)
    #[arg(short = 's', long = "seed", default_value_t = 0)]
    seed: u64,

    /// Correct picks (of 10) needed for a prediction to count as a success
    #[arg(long = "threshold", default_value_t = 5)]
    threshold: u32,
}

fn main() {
    let args = Args::parse();

    let data = match TournamentData::from_file(&args.file) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    println!(
        "Loaded {} teams, rating systems: {}",
        data.teams.len(),
        data.systems.join(", ")
    );

    let workers = if args.workers == 0 {
        num_cpus::get()
    } else {
        args.workers
    };
    let master = Mutex::new(if args.seed == 0 {
        StdRng::from_entropy()
    } else {
        StdRng::seed_from_u64(args.seed)
    });

    let predictions = random_predictions(args.predictions, &mut *master.lock().unwrap());
    let sim = Simulation::new(data);

    let progress = ProgressBar::new(args.iterations);
    progress.set_style(ProgressStyle::default_bar().template("{bar:40} {pos}/{len} ({eta})"));
    progress.set_draw_delta(args.iterations / 100 + 1);

    let start = Instant::now();
    let results = sim.run(
        args.iterations,
        workers,
        &predictions,
        args.threshold,
        &master,
        Some(&progress),
    );
    progress.finish_and_clear();

    print_category(&sim, &results, "3-0 teams", &results.three_zero);
    print_category(&sim, &results, "3-1 or 3-2 teams", &results.advance);
    print_category(&sim, &results, "0-3 teams", &results.zero_three);
    print_top_predictions(&sim, &predictions, &results);

    println!(
        "\n{} simulations across {} workers in {:.2?}",
        results.runs,
        workers,
        start.elapsed()
    );
}

fn print_category(sim: &Simulation, results: &RunResults, title: &str, counts: &[u64; TEAM_COUNT]) {
    println!("\n{}", title);
    let mut rows: Vec<(usize, u64)> = counts.iter().copied().enumerate().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    for (index, count) in rows {
        let team = &sim.teams()[index];
        println!(
            "  {:>6.2}%  {} (seed {})",
            results.percentage(count),
            team.name,
            team.seed
        );
    }
}

fn team_names(sim: &Simulation, seeds: &[u32]) -> String {
    seeds
        .iter()
        .map(|&s| sim.teams()[(s - 1) as usize].name.as_str())
        .collect::<Vec<&str>>()
        .join(", ")
}

fn print_top_predictions(sim: &Simulation, predictions: &[Prediction], results: &RunResults) {
    let mut order: Vec<usize> = (0..predictions.len()).collect();
    order.sort_by(|&a, &b| {
        results.prediction_successes[b]
            .cmp(&results.prediction_successes[a])
            .then(a.cmp(&b))
    });

    println!("\nTop predictions");
    for &i in order.iter().take(5) {
        let p = &predictions[i];
        println!("  {:>6.2}% success", results.success_rate(i));
        println!("    3-0:        {}", team_names(sim, &p.three_zero_seeds()));
        println!("    3-1 or 3-2: {}", team_names(sim, &p.advance_seeds()));
        println!("    0-3:        {}", team_names(sim, &p.zero_three_seeds()));
    }
}
