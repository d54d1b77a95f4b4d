//! Headless build point economy runner.
//!
//! # Usage
//!
//! ```bash
//! # Play one scenario
//! cargo run -p bp_headless -- run --scenario scenarios/contested_fields.ron
//!
//! # Play a directory of scenarios in parallel
//! cargo run -p bp_headless -- batch --dir scenarios --output results/batch.json
//!
//! # Check that a scenario replays identically
//! cargo run -p bp_headless -- verify --scenario scenarios/contested_fields.ron --runs 8
//!
//! # Ask the prediction API about a placement five minutes in
//! cargo run -p bp_headless -- predict --scenario scenarios/contested_fields.ron \
//!     --at-ms 300000 --x -1000 --y 300 --team humans
//! ```
//!
//! JSON goes to stdout; logs go to stderr.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bp_core::teams::Team;
use bp_headless::{
    batch::{configure_threads, predict, run_batch, scenario_files, verify_determinism},
    runner::run_scenario,
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "bp_headless")]
#[command(about = "Headless build point economy runner")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one scenario and print its summary
    Run {
        /// Scenario file
        #[arg(short, long)]
        scenario: PathBuf,

        /// Also write the summary to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Play every scenario in a directory
    Batch {
        /// Directory of .ron scenarios
        #[arg(short, long)]
        dir: PathBuf,

        /// Maximum parallel scenarios (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: usize,

        /// Output JSON file
        #[arg(short, long, default_value = "results/batch.json")]
        output: PathBuf,
    },

    /// Verify determinism by running the same scenario several times
    Verify {
        /// Scenario file
        #[arg(short, long)]
        scenario: PathBuf,

        /// Number of runs
        #[arg(short, long, default_value = "5")]
        runs: usize,
    },

    /// Query the placement prediction API
    Predict {
        /// Scenario file
        #[arg(short, long)]
        scenario: PathBuf,

        /// Level time to play the scenario to
        #[arg(long, default_value = "0")]
        at_ms: u64,

        /// Candidate x
        #[arg(long, allow_hyphen_values = true)]
        x: f32,

        /// Candidate y
        #[arg(long, allow_hyphen_values = true, default_value = "0")]
        y: f32,

        /// Candidate z
        #[arg(long, allow_hyphen_values = true, default_value = "0")]
        z: f32,

        /// Team that would build there
        #[arg(long, value_enum)]
        team: TeamArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TeamArg {
    Aliens,
    Humans,
}

impl From<TeamArg> for Team {
    fn from(team: TeamArg) -> Self {
        match team {
            TeamArg::Aliens => Team::Aliens,
            TeamArg::Humans => Team::Humans,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for JSON)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Commands::Run { scenario, output } => cmd_run(scenario, output),
        Commands::Batch {
            dir,
            parallel,
            output,
        } => cmd_batch(dir, parallel, output),
        Commands::Verify { scenario, runs } => cmd_verify(scenario, runs),
        Commands::Predict {
            scenario,
            at_ms,
            x,
            y,
            z,
            team,
        } => cmd_predict(scenario, at_ms, (x, y, z), team.into()),
    }
}

fn fail(message: &str, error: &dyn std::fmt::Display) -> ! {
    tracing::error!(error = %error, "{message}");
    eprintln!("FATAL: {message}: {error}");
    std::process::exit(1);
}

fn load(path: &Path) -> Scenario {
    match Scenario::load(path) {
        Ok(scenario) => scenario,
        Err(e) => fail("Failed to load scenario", &e),
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => fail("Failed to encode JSON", &e),
    }
}

/// Play one scenario
fn cmd_run(path: PathBuf, output: Option<PathBuf>) {
    let scenario = load(&path);
    tracing::info!(scenario = %scenario.name, path = %path.display(), "Running scenario");

    let summary = match run_scenario(scenario) {
        Ok(summary) => summary,
        Err(e) => fail("Scenario failed", &e),
    };

    if let Some(output) = output {
        if let Err(e) = summary.save(&output) {
            fail("Failed to save summary", &e);
        }
    }
    print_json(&summary);
}

/// Play every scenario in a directory
fn cmd_batch(dir: PathBuf, parallel: usize, output: PathBuf) {
    let files = match scenario_files(&dir) {
        Ok(files) => files,
        Err(e) => fail("Failed to list scenarios", &e),
    };
    if files.is_empty() {
        eprintln!("No .ron scenarios in {}", dir.display());
        std::process::exit(1);
    }

    configure_threads(parallel);
    let results = run_batch(&files);

    if let Err(e) = results.save(&output) {
        fail("Failed to save results", &e);
    }

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Scenarios played: {}", results.runs.len());
    for run in &results.runs {
        let teams: Vec<String> = run
            .summary
            .teams
            .iter()
            .map(|t| format!("{} {:.1} bp", t.team, t.build_points))
            .collect();
        eprintln!("  {:<30} {}", run.summary.scenario, teams.join(", "));
    }
    if !results.errors.is_empty() {
        eprintln!("Failures: {}", results.errors.len());
        for error in &results.errors {
            eprintln!("  {}: {}", error.path.display(), error.message);
        }
    }
    eprintln!("Results saved to {}", output.display());

    if !results.errors.is_empty() {
        std::process::exit(1);
    }
}

/// Verify determinism of one scenario
fn cmd_verify(path: PathBuf, runs: usize) {
    let scenario = load(&path);
    tracing::info!(scenario = %scenario.name, runs, "Verifying determinism");

    let report = match verify_determinism(&scenario, runs) {
        Ok(report) => report,
        Err(e) => fail("Scenario failed", &e),
    };
    print_json(&report);

    if report.deterministic {
        eprintln!("PASS: All {runs} runs produced identical results");
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        std::process::exit(1);
    }
}

/// Query the prediction API
fn cmd_predict(path: PathBuf, at_ms: u64, position: (f32, f32, f32), team: Team) {
    let scenario = load(&path);
    match predict(scenario, at_ms, position, team) {
        Ok(report) => print_json(&report),
        Err(e) => fail("Scenario failed", &e),
    }
}
