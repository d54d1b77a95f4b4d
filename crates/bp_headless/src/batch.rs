//! Batch scenario runner.
//!
//! Runs many scenarios (or many copies of one) in parallel using rayon.

use std::path::{Path, PathBuf};
use std::time::Instant;

use bp_core::math::Vec3Fixed;
use bp_core::teams::Team;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::runner::{run_scenario, RunSummary, ScenarioRunner};
use crate::scenario::{Scenario, ScenarioError};

/// One finished scenario in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRun {
    /// Scenario file.
    pub path: PathBuf,
    /// Playback summary.
    pub summary: RunSummary,
}

/// A scenario that could not be run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Scenario file.
    pub path: PathBuf,
    /// Error message.
    pub message: String,
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Finished runs, in input order.
    pub runs: Vec<BatchRun>,
    /// Failures, in input order.
    pub errors: Vec<BatchError>,
    /// Wall time.
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Save results to a JSON file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// `.ron` files directly inside `dir`, sorted by path.
pub fn scenario_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "ron") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Configure the global rayon pool. Zero keeps rayon's default.
pub fn configure_threads(parallel: usize) {
    if parallel > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(parallel)
            .build_global()
            .ok(); // Ignore if already set
    }
}

/// Run every scenario file in parallel.
pub fn run_batch(paths: &[PathBuf]) -> BatchResults {
    let start = Instant::now();
    info!(scenarios = paths.len(), "Starting batch run");

    let results: Vec<Result<BatchRun, BatchError>> = paths
        .par_iter()
        .map(|path| {
            Scenario::load(path)
                .and_then(run_scenario)
                .map(|summary| BatchRun {
                    path: path.clone(),
                    summary,
                })
                .map_err(|e| {
                    warn!(path = %path.display(), error = %e, "Scenario failed");
                    BatchError {
                        path: path.clone(),
                        message: e.to_string(),
                    }
                })
        })
        .collect();

    let (runs, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let runs: Vec<BatchRun> = runs.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let duration_seconds = start.elapsed().as_secs_f64();
    info!(
        completed = runs.len(),
        failed = errors.len(),
        duration_seconds,
        "Batch complete"
    );

    BatchResults {
        runs,
        errors,
        duration_seconds,
    }
}

/// Outcome of running one scenario repeatedly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Scenario name.
    pub scenario: String,
    /// Final world hash of each run.
    pub hashes: Vec<u64>,
    /// Whether every run ended in the same state.
    pub deterministic: bool,
}

/// Run a scenario `runs` times in parallel and compare final hashes.
pub fn verify_determinism(scenario: &Scenario, runs: usize) -> Result<VerifyReport, ScenarioError> {
    // Surface setup errors once instead of per run
    scenario.validate()?;

    let hashes: Vec<u64> = (0..runs)
        .into_par_iter()
        .map(|_| run_scenario(scenario.clone()).map(|s| s.state_hash))
        .collect::<Result<_, _>>()?;

    let deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    if !deterministic {
        warn!(scenario = %scenario.name, ?hashes, "Runs diverged");
    }

    Ok(VerifyReport {
        scenario: scenario.name.clone(),
        hashes,
        deterministic,
    })
}

/// Prediction API output at one point of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    /// Level time the scenario was played to.
    pub level_time_ms: u64,
    /// Global mine rate at that time.
    pub mine_rate: f32,
    /// Candidate position.
    pub position: (f32, f32, f32),
    /// Team building there.
    pub team: Team,
    /// Efficiency the new structure would have.
    pub efficiency: f32,
    /// Predicted change in the team's total efficiency.
    pub efficiency_delta: f32,
}

/// Play a scenario to `at_ms` and ask the prediction API about `position`.
pub fn predict(
    scenario: Scenario,
    at_ms: u64,
    position: (f32, f32, f32),
    team: Team,
) -> Result<PredictionReport, ScenarioError> {
    let mut runner = ScenarioRunner::new(scenario)?;
    runner.run_until(at_ms);

    let world = runner.world();
    let (x, y, z) = position;
    let candidate = Vec3Fixed::from_f32(x, y, z);

    Ok(PredictionReport {
        level_time_ms: world.clock().level_time_ms,
        mine_rate: world.economy().mine_rate,
        position,
        team,
        efficiency: world.predict_efficiency(candidate),
        efficiency_delta: world.predict_efficiency_delta(candidate, team),
    })
}
