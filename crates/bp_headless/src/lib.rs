//! Headless economy runner for balance testing and CI verification.
//!
//! Plays RON scenarios through a [`bp_core::world::SimulationWorld`]
//! without a game host, producing JSON summaries:
//!
//! - **Scenario playback**: structures, players and a timeline of actions
//! - **Batch runs**: a directory of scenarios in parallel
//! - **Determinism checks**: one scenario many times, compare world hashes
//! - **Placement prediction**: query the prediction API mid-scenario
//!
//! # Example
//!
//! ```bash
//! # Play one scenario, JSON summary on stdout
//! cargo run -p bp_headless -- run --scenario crates/bp_headless/scenarios/contested_fields.ron
//!
//! # Verify determinism
//! cargo run -p bp_headless -- verify --scenario crates/bp_headless/scenarios/contested_fields.ron --runs 8
//! ```

pub mod batch;
pub mod runner;
pub mod scenario;

pub use batch::{predict, run_batch, verify_determinism, BatchResults, PredictionReport, VerifyReport};
pub use runner::{run_scenario, RunSummary, ScenarioRunner};
pub use scenario::{Scenario, ScenarioAction, ScenarioError, StructurePlacement, TimedAction};
