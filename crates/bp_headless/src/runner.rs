//! Scenario playback.
//!
//! [`ScenarioRunner`] advances a [`SimulationWorld`] one host frame at a
//! time, applying timeline actions whose time has come before each frame.
//! Actions that fail (a structure already destroyed, an unplayable team)
//! are logged and recorded in the summary; playback continues.

use std::path::Path;

use bp_core::components::{EntityId, StructureKind};
use bp_core::error::{EconomyError, Result as EconomyResult};
use bp_core::math::Vec3Fixed;
use bp_core::replication::encode_structure;
use bp_core::teams::Team;
use bp_core::world::{EconomyEvent, SimulationWorld, StructureSpawnParams};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::scenario::{Scenario, ScenarioAction, ScenarioError, TimedAction};

/// Final economy state of one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSummary {
    /// Team.
    pub team: Team,
    /// Spendable build points.
    pub build_points: f32,
    /// Mined pool.
    pub mined_build_points: f32,
    /// Team efficiency at the last tick.
    pub mine_efficiency: f32,
    /// Spendable build points as shown to players.
    pub build_points_int: i32,
    /// Value of structures marked for deconstruction.
    pub marked_build_points: i32,
    /// Value of all standing structures.
    pub resource_value: i32,
    /// Mining structures standing.
    pub miners: usize,
    /// Highest team efficiency seen at any tick.
    pub peak_efficiency: f32,
    /// Total subsidy received.
    pub subsidy_total: f32,
}

/// Final state of one mining structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureSummary {
    /// Entity ID.
    pub id: EntityId,
    /// Structure type.
    pub kind: StructureKind,
    /// Mining at the last calculation.
    pub mining_active: bool,
    /// Efficiency fraction.
    pub mine_efficiency: f32,
    /// Lifetime mined build points.
    pub mined_build_points: f32,
    /// Transport rate encoding.
    pub encoded_rate: i32,
    /// Transport efficiency encoding.
    pub encoded_efficiency: i32,
}

/// Result of playing a scenario to the end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Scenario name.
    pub scenario: String,
    /// Level time at the end of playback.
    pub level_time_ms: u64,
    /// Frames run.
    pub frames: u64,
    /// Economy ticks fired.
    pub ticks: u64,
    /// Global mine rate at the end.
    pub mine_rate: f32,
    /// Per-team state, playable teams only.
    pub teams: Vec<TeamSummary>,
    /// Mining structures still standing, ascending ID.
    pub miners: Vec<StructureSummary>,
    /// Mining structures destroyed.
    pub deaths: u32,
    /// Mining structures deconstructed.
    pub deconstructions: u32,
    /// Build points lost to death clawback, per team in `teams` order.
    pub clawback: Vec<f32>,
    /// Timeline actions that could not be applied.
    pub action_errors: Vec<String>,
    /// World hash at the end.
    pub state_hash: u64,
}

impl RunSummary {
    /// Entry for a team.
    #[must_use]
    pub fn team(&self, team: Team) -> Option<&TeamSummary> {
        self.teams.iter().find(|t| t.team == team)
    }

    /// Save as pretty JSON.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct TeamStats {
    peak_efficiency: f32,
    subsidy_total: f32,
    clawback: f32,
}

/// Plays one scenario.
pub struct ScenarioRunner {
    scenario: Scenario,
    world: SimulationWorld,
    timeline: Vec<TimedAction>,
    next_action: usize,
    /// Entity IDs in placement order.
    handles: Vec<EntityId>,
    frames: u64,
    ticks: u64,
    deaths: u32,
    deconstructions: u32,
    stats: [TeamStats; 2],
    action_errors: Vec<String>,
}

impl ScenarioRunner {
    /// Build the world for a validated scenario.
    pub fn new(scenario: Scenario) -> Result<Self, ScenarioError> {
        scenario.validate()?;
        let mut world = SimulationWorld::try_new(scenario.config.clone())?;

        let handles = scenario
            .structures
            .iter()
            .map(|placement| {
                world.spawn_structure(StructureSpawnParams {
                    kind: placement.kind,
                    position: placement.world_position(),
                    spawned: placement.spawned,
                    powered: placement.powered,
                    health: None,
                })
            })
            .collect();

        for &team in &scenario.players {
            world.connect_player(team);
        }

        let timeline = scenario.sorted_timeline();
        info!(
            scenario = %scenario.name,
            structures = scenario.structures.len(),
            actions = timeline.len(),
            "Scenario loaded"
        );

        Ok(Self {
            scenario,
            world,
            timeline,
            next_action: 0,
            handles,
            frames: 0,
            ticks: 0,
            deaths: 0,
            deconstructions: 0,
            stats: [TeamStats::default(); 2],
            action_errors: Vec::new(),
        })
    }

    /// Load a scenario file and build its runner.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        Self::new(Scenario::load(path)?)
    }

    /// The world being played.
    #[must_use]
    pub fn world(&self) -> &SimulationWorld {
        &self.world
    }

    /// The scenario being played.
    #[must_use]
    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Entity ID of a placement index.
    #[must_use]
    pub fn handle(&self, index: usize) -> Option<EntityId> {
        self.handles.get(index).copied()
    }

    /// Run frames until level time passes `until_ms`.
    ///
    /// The frame at exactly `until_ms` runs; the clock then rests one frame
    /// past it.
    pub fn run_until(&mut self, until_ms: u64) {
        while self.world.clock().level_time_ms <= until_ms {
            self.frame();
            self.world.advance_time(self.scenario.frame_ms);
        }
    }

    /// Play the whole scenario and summarize it.
    pub fn run_to_end(mut self) -> RunSummary {
        self.run_until(self.scenario.duration_ms);
        self.summary()
    }

    fn frame(&mut self) {
        let now = self.world.clock().level_time_ms;
        while let Some(timed) = self.timeline.get(self.next_action) {
            if timed.at_ms > now {
                break;
            }
            let action = timed.action.clone();
            self.next_action += 1;
            if let Err(e) = self.apply(&action) {
                warn!(at_ms = now, ?action, error = %e, "Timeline action failed");
                self.action_errors.push(format!("{now} ms: {action:?}: {e}"));
            }
        }

        let frame = self.world.run_frame();
        self.frames += 1;

        for event in &frame.events {
            debug!(?event, "Frame event");
            self.record(*event);
        }

        if let Some(report) = frame.economy {
            self.ticks += 1;
            for team_report in &report.teams {
                if let Some(i) = team_report.team.pool_index() {
                    let stats = &mut self.stats[i];
                    stats.peak_efficiency = stats.peak_efficiency.max(team_report.efficiency);
                    stats.subsidy_total += team_report.subsidy;
                }
            }
        }
    }

    fn entity(&self, index: usize) -> EconomyResult<EntityId> {
        self.handle(index)
            .ok_or_else(|| EconomyError::InvalidState(format!("no structure at index {index}")))
    }

    fn record(&mut self, event: EconomyEvent) {
        match event {
            EconomyEvent::Died { team, clawback, .. } => {
                self.deaths += 1;
                if let Some(i) = team.pool_index() {
                    self.stats[i].clawback += clawback.spendable;
                }
            }
            EconomyEvent::Deconstructed { .. } => self.deconstructions += 1,
            EconomyEvent::ActivityChanged { .. } => {}
        }
    }

    fn apply(&mut self, action: &ScenarioAction) -> EconomyResult<()> {
        match *action {
            ScenarioAction::StartMatch => self.world.start_match(),
            ScenarioAction::Place {
                kind,
                position,
                spawned,
                powered,
            } => {
                let (x, y, z) = position;
                let id = self.world.spawn_structure(StructureSpawnParams {
                    kind,
                    position: Vec3Fixed::from_f32(x, y, z),
                    spawned,
                    powered,
                    health: None,
                });
                self.handles.push(id);
            }
            ScenarioAction::Complete { structure } => {
                let id = self.entity(structure)?;
                self.world.complete_construction(id)?;
            }
            ScenarioAction::SetPowered { structure, powered } => {
                let id = self.entity(structure)?;
                self.world.set_powered(id, powered)?;
            }
            ScenarioAction::Damage { structure, amount } => {
                let id = self.entity(structure)?;
                self.world.damage_structure(id, amount)?;
            }
            ScenarioAction::Kill { structure } => {
                let id = self.entity(structure)?;
                self.world.kill_structure(id)?;
            }
            ScenarioAction::Deconstruct { structure } => {
                let id = self.entity(structure)?;
                self.world.deconstruct_structure(id)?;
            }
            ScenarioAction::Mark { structure, marked } => {
                let id = self.entity(structure)?;
                self.world.mark_for_deconstruction(id, marked)?;
            }
            ScenarioAction::AddBuildPoints { team, amount } => {
                self.world.add_build_points(team, amount)?;
            }
            ScenarioAction::ConnectPlayer { team } => {
                self.world.connect_player(team);
            }
        }
        Ok(())
    }

    /// Summarize the current state.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let world = &self.world;
        let values = world.buildable_resource_value();

        let miners: Vec<StructureSummary> = world
            .registry()
            .sorted_ids()
            .into_iter()
            .filter_map(|id| world.structure(id))
            .filter(|s| s.is_mining_structure())
            .map(|s| {
                let transport = encode_structure(s);
                StructureSummary {
                    id: s.id,
                    kind: s.kind,
                    mining_active: s.mining_active,
                    mine_efficiency: s.mine_efficiency,
                    mined_build_points: s.mined_build_points,
                    encoded_rate: transport.encoded_rate,
                    encoded_efficiency: transport.encoded_efficiency,
                }
            })
            .collect();

        let mut teams = Vec::with_capacity(Team::PLAYABLE.len());
        let mut clawback = Vec::with_capacity(Team::PLAYABLE.len());
        for team in Team::PLAYABLE {
            let pool = world.ledger().pool(team).copied().unwrap_or_default();
            let stats = team.pool_index().map_or_else(TeamStats::default, |i| self.stats[i]);
            teams.push(TeamSummary {
                team,
                build_points: pool.build_points,
                mined_build_points: pool.mined_build_points,
                mine_efficiency: pool.mine_efficiency,
                build_points_int: world.build_points_int(team),
                marked_build_points: world.marked_build_points(team),
                resource_value: values.get(team),
                miners: world
                    .registry()
                    .iter()
                    .filter(|s| s.team == team && s.is_mining_structure())
                    .count(),
                peak_efficiency: stats.peak_efficiency,
                subsidy_total: stats.subsidy_total,
            });
            clawback.push(stats.clawback);
        }

        RunSummary {
            scenario: self.scenario.name.clone(),
            level_time_ms: world.clock().level_time_ms,
            frames: self.frames,
            ticks: self.ticks,
            mine_rate: world.economy().mine_rate,
            teams,
            miners,
            deaths: self.deaths,
            deconstructions: self.deconstructions,
            clawback,
            action_errors: self.action_errors.clone(),
            state_hash: world.state_hash(),
        }
    }
}

/// Play a scenario to the end.
pub fn run_scenario(scenario: Scenario) -> Result<RunSummary, ScenarioError> {
    Ok(ScenarioRunner::new(scenario)?.run_to_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::StructurePlacement;

    fn two_drills() -> Scenario {
        Scenario {
            name: "Two drills".to_string(),
            duration_ms: 10_000,
            config: bp_core::config::EconomyConfig {
                initial_mine_rate: 60.0,
                ..Default::default()
            },
            structures: vec![
                StructurePlacement::new(StructureKind::Reactor, (-9000.0, 0.0, 0.0)),
                StructurePlacement::new(StructureKind::Drill, (0.0, 0.0, 0.0)),
                StructurePlacement::new(StructureKind::Drill, (0.0, 0.0, 0.0)),
            ],
            players: vec![Team::Humans],
            ..Default::default()
        }
    }

    #[test]
    fn test_runs_every_frame_and_tick() {
        let summary = run_scenario(two_drills()).unwrap();
        // Frames at 0, 100, ..., 10_000
        assert_eq!(summary.frames, 101);
        // Ticks at 0, 1000, ..., 10_000
        assert_eq!(summary.ticks, 11);
        assert_eq!(summary.level_time_ms, 10_100);
        assert_eq!(summary.miners.len(), 2);
        assert!(summary.action_errors.is_empty());

        let humans = summary.team(Team::Humans).unwrap();
        assert!((humans.peak_efficiency - 1.0).abs() < 1e-6);
        assert_eq!(humans.subsidy_total, 0.0);
        assert!(humans.build_points > 10.0);
    }

    #[test]
    fn test_timeline_kill_records_clawback() {
        let mut scenario = two_drills();
        scenario.timeline.push(TimedAction {
            at_ms: 5_500,
            action: ScenarioAction::Kill { structure: 2 },
        });
        let summary = run_scenario(scenario).unwrap();

        assert_eq!(summary.deaths, 1);
        assert_eq!(summary.miners.len(), 1);
        assert!(summary.clawback[1] > 0.0);
        assert!((summary.miners[0].mine_efficiency - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_failed_action_is_recorded() {
        let mut scenario = two_drills();
        scenario.timeline = vec![
            TimedAction {
                at_ms: 1000,
                action: ScenarioAction::Kill { structure: 1 },
            },
            TimedAction {
                at_ms: 2000,
                action: ScenarioAction::Kill { structure: 1 },
            },
            TimedAction {
                at_ms: 2000,
                action: ScenarioAction::AddBuildPoints {
                    team: Team::None,
                    amount: 5.0,
                },
            },
        ];
        let summary = run_scenario(scenario).unwrap();
        assert_eq!(summary.deaths, 1);
        assert_eq!(summary.action_errors.len(), 2);
    }

    #[test]
    fn test_run_until_stops_at_time() {
        let mut runner = ScenarioRunner::new(two_drills()).unwrap();
        runner.run_until(2_000);
        assert_eq!(runner.world().clock().level_time_ms, 2_100);
        assert_eq!(runner.summary().ticks, 3);
    }
}
