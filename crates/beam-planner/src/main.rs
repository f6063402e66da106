//! Beam Planning CLI
//!
//! Solves one scenario, checks the result and reports coverage.
//!
//! Usage:
//!   plan-beams data/scenarios/leo_shell_small.txt \
//!              --out results.txt \
//!              --assignment data/leo_shell_small.assignment.json \
//!              --seed 42

use anyhow::{bail, Context, Result};
use beam_planner::{solve_with_stats, validate, Assignment, PlannerConfig, Scenario, SolveStats};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Default wall-clock budget for one solve call
const DEFAULT_TIMEOUT_SECS: f64 = 600.0;

#[derive(Parser, Debug)]
#[command(
    name = "plan-beams",
    about = "Assign ground users to SX9-Orbital satellites and channels"
)]
struct Args {
    /// Scenario file to solve
    scenario: PathBuf,

    /// Append a one-line coverage/timing result to this file
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Write the assignment and solve statistics as JSON
    #[arg(short, long)]
    assignment: Option<PathBuf>,

    /// Seed for satellite pruning (random if omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Wall-clock budget for the solve call in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: f64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct PlanOutput<'a> {
    scenario: String,
    seed: u64,
    generated_at: String,
    duration_secs: f64,
    stats: &'a SolveStats,
    assignment: &'a Assignment,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let budget = Duration::try_from_secs_f64(args.timeout_secs)
        .with_context(|| format!("invalid --timeout-secs {}", args.timeout_secs))?;

    let scenario = Scenario::load(&args.scenario)
        .with_context(|| format!("failed to load scenario {:?}", args.scenario))?;

    info!(
        "Scenario: {:.2}% coverage ({} users, {} sats)",
        scenario.min_coverage * 100.0,
        scenario.users.len(),
        scenario.sats.len()
    );

    let seed = args.seed.unwrap_or_else(rand::random);
    info!("Pruning seed: {}", seed);
    let mut rng = StdRng::seed_from_u64(seed);

    let config = PlannerConfig::default();
    let start = Instant::now();
    let (assignment, stats) =
        solve_with_stats(&scenario.users, &scenario.sats, &config, &mut rng)?;
    let duration = start.elapsed();

    info!(
        "Solution: {:.2}% coverage ({} users) in {:.2}s",
        stats.coverage * 100.0,
        stats.served,
        duration.as_secs_f64()
    );
    if duration > budget / 2 {
        warn!("Solve used more than half of the {:.0}s budget", budget.as_secs_f64());
    }

    if let Some(out) = &args.out {
        append_result(out, &args.scenario, stats.coverage, duration)?;
    }

    if let Some(path) = &args.assignment {
        info!("Writing assignment to {:?}", path);
        let output = PlanOutput {
            scenario: args.scenario.display().to_string(),
            seed,
            generated_at: chrono::Utc::now().to_rfc3339(),
            duration_secs: duration.as_secs_f64(),
            stats: &stats,
            assignment: &assignment,
        };
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &output)?;
    }

    if duration >= budget {
        bail!(
            "Took too long to produce a solution ({:.2}s > {:.0}s)",
            duration.as_secs_f64(),
            budget.as_secs_f64()
        );
    }

    let report = validate(&scenario, &assignment);
    for violation in &report.violations {
        error!("{}", violation);
    }
    if !report.is_valid() {
        bail!("Solution failed validation with {} violations", report.violations.len());
    }

    info!("Solution passed validation");
    Ok(())
}

/// Append `<scenario> <coverage>% <seconds>s` to the results log
fn append_result(out: &Path, scenario: &Path, coverage: f64, duration: Duration) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(out)
        .with_context(|| format!("failed to open results log {:?}", out))?;
    writeln!(
        file,
        "{:<44} {:>6.2}% {:>6.2}s",
        scenario.display().to_string(),
        coverage * 100.0,
        duration.as_secs_f64()
    )?;
    Ok(())
}
