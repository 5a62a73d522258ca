//! Ranking stability simulator.
//!
//! Reads crop varieties as CSV from stdin, with a header of the form
//! `name,baseline,yield_potential,disease_resistance,...` (any subset of criteria, in any order),
//! then ranks them repeatedly with noisy scores to show how stable the ranking is.
//!
//! Usage:
//!   simulator --trials 1000 --noise 0.05 < varieties.csv

use std::collections::BTreeMap;
use std::io::stdin;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context as _, Result};
use clap::Parser;
use crop_selection::{SelectionConfig, Variety};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "simulator", about = "Measure crop variety ranking stability under score noise")]
struct Args {
    /// Selection config JSON file. Defaults to the standard crop weights.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of noisy ranking trials
    #[arg(short, long, default_value_t = 1000)]
    trials: usize,

    /// Maximum absolute noise added to every score
    #[arg(short, long, default_value_t = 0.05)]
    noise: f64,

    /// RNG seed, for reproducible runs
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SelectionConfig::load(path)?,
        None => SelectionConfig::default(),
    };
    let engine = config.engine();
    let varieties = read_varieties(stdin().lines())?;
    info!(varieties = varieties.len(), trials = args.trials, "starting simulation");

    let mut rng = match args.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };

    let noise = args.noise.abs();
    let criteria: Vec<String> = engine.criteria().to_vec();
    let mut total_ranking_μs = 0;
    let mut rank_sums: BTreeMap<&str, usize> = BTreeMap::new();
    let mut first_places: BTreeMap<&str, usize> = BTreeMap::new();
    for trial in 0..args.trials {
        let noisy: Vec<Variety> = varieties
            .iter()
            .map(|v| {
                let mut v = v.clone();
                for criterion in &criteria {
                    if let Some(Some(score)) = v.score_mut(criterion) {
                        let jitter = rng.gen_range(-noise..=noise);
                        *score = (*score + jitter).clamp(0.0, 1.0);
                    }
                }
                v
            })
            .collect();

        let t0 = Instant::now();
        let result = engine.rank(&noisy, None, None);
        total_ranking_μs += Instant::now().duration_since(t0).as_micros();

        for variety in &varieties {
            if let Some(ranking) = result.results.get(&variety.name) {
                *rank_sums.entry(&variety.name).or_default() += ranking.rank;
                if ranking.rank == 1 {
                    *first_places.entry(&variety.name).or_default() += 1;
                }
            }
        }
        if trial == 0 {
            debug!(weights = ?result.weights, "derived weights");
        }
    }

    let trials = args.trials.max(1) as f64;
    println!("avg_ranking_μs: {:.2}", total_ranking_μs as f64 / trials);
    println!("name,mean_rank,first_place_rate");
    for (name, rank_sum) in &rank_sums {
        let firsts = first_places.get(name).copied().unwrap_or(0);
        println!(
            "{},{:.3},{:.4}",
            name,
            *rank_sum as f64 / trials,
            firsts as f64 / trials
        );
    }
    Ok(())
}

fn read_varieties<I>(lines: I) -> Result<Vec<Variety>>
where
    I: IntoIterator<Item = std::io::Result<String>>,
{
    let mut lines = lines.into_iter();
    let header = match lines.next() {
        Some(line) => line?,
        None => bail!("expected a CSV header on stdin"),
    };
    let columns: Vec<String> = header.split(',').map(|c| c.trim().to_owned()).collect();
    if columns.first().map(String::as_str) != Some("name") {
        bail!("first CSV column must be `name`, got {header:?}");
    }

    let mut varieties = Vec::new();
    for (index, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut variety = Variety::default();
        for (column, field) in columns.iter().zip(line.split(',')) {
            let field = field.trim();
            if column == "name" {
                variety.name = field.to_owned();
                continue;
            }
            let value: f64 = field
                .parse()
                .with_context(|| format!("row {}: invalid {column} {field:?}", index + 1))?;
            if column == "baseline" {
                variety.baseline_suitability = Some(value);
            } else if let Some(score) = variety.score_mut(column) {
                *score = Some(value);
            } else {
                debug!(%column, "ignoring unknown column");
            }
        }
        varieties.push(variety);
    }
    Ok(varieties)
}
