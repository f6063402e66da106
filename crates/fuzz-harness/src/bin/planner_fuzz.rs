//! Beam Planner Fuzz Runner CLI
//!
//! Usage:
//!   planner-fuzz run [--cases N] [--seed S] [--target NAME] [--output FORMAT]
//!   planner-fuzz list
//!   planner-fuzz report <json-file> [--output FORMAT]
//!
//! Examples:
//!   planner-fuzz run                          # All targets, 1000 cases each
//!   planner-fuzz run --cases 10000 --seed 7   # Reproducible long run
//!   planner-fuzz run --target crowded_capacity
//!   planner-fuzz run --output junit > junit.xml
//!   planner-fuzz report results.json --output markdown

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fuzz_harness::reports::FuzzReport;
use fuzz_harness::runner::{FuzzConfig, FuzzResult, FuzzRunner};
use fuzz_harness::targets::{all_targets, find_target, run_targets};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "planner-fuzz", about = "Fuzz the beam planner against its validator")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output (logs go to stderr)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run fuzz targets
    Run {
        /// Cases per target
        #[arg(long, default_value_t = 1_000)]
        cases: u64,

        /// Base seed (random if omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Only run this target (repeatable)
        #[arg(long = "target")]
        targets: Vec<String>,

        /// Most users in a generated scenario
        #[arg(long, default_value_t = 200)]
        max_users: usize,

        /// Most satellites in a generated scenario
        #[arg(long, default_value_t = 12)]
        max_sats: usize,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
    /// List available fuzz targets
    List,
    /// Re-render a report from exported JSON results
    Report {
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Junit,
    Markdown,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Command::Run {
            cases,
            seed,
            targets,
            max_users,
            max_sats,
            output,
        } => {
            let seed = seed.unwrap_or_else(rand::random);
            let config = FuzzConfig::new()
                .cases(cases)
                .seed(seed)
                .max_users(max_users)
                .max_sats(max_sats);
            run(config, &targets, output)
        }
        Command::List => {
            list_targets();
            Ok(ExitCode::SUCCESS)
        }
        Command::Report { file, output } => {
            let json = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {:?}", file))?;
            // Accept a full report from `run --output json` or a bare result list
            let report = match serde_json::from_str::<FuzzReport>(&json) {
                Ok(report) => report,
                Err(_) => {
                    let results: Vec<FuzzResult> = serde_json::from_str(&json)
                        .with_context(|| format!("failed to parse {:?}", file))?;
                    FuzzReport::new(results)
                }
            };
            emit(&report, output)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run(config: FuzzConfig, names: &[String], output: OutputFormat) -> Result<ExitCode> {
    let targets = if names.is_empty() {
        all_targets()
    } else {
        names
            .iter()
            .map(|name| find_target(name).with_context(|| format!("unknown target {:?}", name)))
            .collect::<Result<Vec<_>>>()?
    };
    if targets.is_empty() {
        bail!("no fuzz targets selected");
    }

    info!(
        "Fuzzing {} targets, {} cases each (seed {})",
        targets.len(),
        config.cases,
        config.seed
    );

    let seed = config.seed;
    let mut runner = FuzzRunner::new(config);
    run_targets(&mut runner, &targets);

    if output == OutputFormat::Text {
        runner.print_all_summaries();
        println!("Replay with: planner-fuzz run --seed {}", seed);
    }
    let report = FuzzReport::new(runner.into_results()).with_seed(seed);
    if output != OutputFormat::Text {
        emit(&report, output)?;
    }

    Ok(if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn emit(report: &FuzzReport, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Junit => print!("{}", report.to_junit_xml()),
        OutputFormat::Markdown => report.print(),
        OutputFormat::Text => {
            for result in &report.results {
                result.print_summary();
                println!();
            }
        }
    }
    Ok(())
}

fn list_targets() {
    println!("Available fuzz targets:");
    println!();
    for target in all_targets() {
        println!("  {:<24} {}", target.name, target.description);
    }
    println!();
    println!("Run with: planner-fuzz run [--cases N] [--target NAME]");
}
