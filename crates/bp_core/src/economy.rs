//! Periodic economy tick.
//!
//! Once per calculation period the global mine rate is re-derived from the
//! match clock, every mining structure's efficiency is credited to its own
//! lifetime account and summed per team, the minimum-efficiency subsidy is
//! applied, build points are paid out, and the result is published to the
//! connected players.
//!
//! Structures are visited in ascending ID order so that the float sums
//! come out identical for identical inputs.

use serde::{Deserialize, Serialize};

use crate::components::StructureKind;
use crate::config::EconomyConfig;
use crate::ledger::{Pool, ResourceLedger};
use crate::registry::StructureRegistry;
use crate::replication::{encode_global_rate, encode_team_efficiency, PlayerEconomyView, PlayerSlot};
use crate::teams::Team;

/// Milliseconds per minute, for the per-minute rate conversions.
const MS_PER_MINUTE: f32 = 60_000.0;

/// Match timing in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct MatchClock {
    /// Current server time.
    pub level_time_ms: u64,
    /// Server time at which the match started.
    pub match_start_ms: u64,
}

impl MatchClock {
    /// Time since match start, zero before the match starts.
    #[must_use]
    pub const fn elapsed_ms(&self) -> u64 {
        self.level_time_ms.saturating_sub(self.match_start_ms)
    }
}

/// Global mining state shared by all structures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalEconomyState {
    /// Current uninterfered per-structure rate, build points per minute.
    pub mine_rate: f32,
    /// Level time at which the next economy tick may fire.
    pub next_calculation_time: u64,
}

impl GlobalEconomyState {
    /// State at match start: full initial rate, tick due immediately.
    #[must_use]
    pub fn new(config: &EconomyConfig) -> Self {
        Self {
            mine_rate: config.initial_mine_rate,
            next_calculation_time: 0,
        }
    }

    /// Whether an economy tick is due at `now`.
    #[must_use]
    pub const fn is_due(&self, now: u64) -> bool {
        now >= self.next_calculation_time
    }
}

/// Per-team outcome of one economy tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamTickReport {
    /// Team this entry describes.
    pub team: Team,
    /// Sum of the team's structure efficiencies.
    pub structure_efficiency: f32,
    /// Team efficiency after the minimum-efficiency floor.
    pub efficiency: f32,
    /// Points credited to the mined pool by the floor.
    pub subsidy: f32,
    /// Points paid into both pools.
    pub earned: f32,
}

/// Outcome of one economy tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomyReport {
    /// Level time at which the tick fired.
    pub level_time_ms: u64,
    /// Global mine rate used for this tick.
    pub mine_rate: f32,
    /// Build points earned this tick per unit of efficiency.
    pub rate_to_points_factor: f32,
    /// One entry per playable team.
    pub teams: Vec<TeamTickReport>,
}

impl EconomyReport {
    /// Entry for a team.
    #[must_use]
    pub fn team(&self, team: Team) -> Option<&TeamTickReport> {
        self.teams.iter().find(|t| t.team == team)
    }
}

/// Global mine rate after `elapsed_ms` of exponential decay.
#[must_use]
pub fn decayed_mine_rate(initial: f32, half_life_minutes: f32, elapsed_ms: u64) -> f32 {
    if half_life_minutes <= 0.0 {
        return initial;
    }
    initial * 2.0_f32.powf(-(elapsed_ms as f32) / (MS_PER_MINUTE * half_life_minutes))
}

/// Build points per tick earned at full efficiency.
#[must_use]
pub fn rate_to_points_factor(mine_rate: f32, period_ms: u64) -> f32 {
    (mine_rate / 60.0) * (period_ms as f32 / 1000.0)
}

/// Whether a team's core structure is standing and active.
#[must_use]
pub fn has_active_core(registry: &StructureRegistry, team: Team) -> bool {
    let Some(core) = StructureKind::core_of(team) else {
        return false;
    };
    registry.iter().any(|s| s.kind == core && s.is_active())
}

/// Run the economy tick if it is due.
///
/// Returns `None` without touching anything when `clock` has not reached
/// the scheduled calculation time.
pub fn economy_tick(
    state: &mut GlobalEconomyState,
    config: &EconomyConfig,
    clock: MatchClock,
    registry: &mut StructureRegistry,
    ledger: &mut ResourceLedger,
    players: &mut [PlayerSlot],
) -> Option<EconomyReport> {
    let now = clock.level_time_ms;
    if !state.is_due(now) {
        return None;
    }

    for team in Team::PLAYABLE {
        if let Some(pool) = ledger.pool_mut(team) {
            pool.mine_efficiency = 0.0;
        }
    }

    state.mine_rate = decayed_mine_rate(
        config.initial_mine_rate,
        config.mine_rate_half_life_minutes,
        clock.elapsed_ms(),
    );
    let factor = rate_to_points_factor(state.mine_rate, config.calculation_period_ms);

    for id in registry.sorted_ids() {
        let Some(structure) = registry.get_mut(id) else {
            continue;
        };
        let Some(mining_kind) = structure.mining_kind() else {
            continue;
        };

        structure.mined_build_points += structure.mine_efficiency * factor;
        structure.mine_rate = structure.mine_efficiency * state.mine_rate;

        if let Some(pool) = ledger.pool_mut(mining_kind.team()) {
            pool.mine_efficiency += structure.mine_efficiency;
        }
    }

    let minimum = config.minimum_efficiency();
    let mut teams = Vec::with_capacity(Team::PLAYABLE.len());

    for team in Team::PLAYABLE {
        let structure_efficiency = ledger.pool(team).map_or(0.0, |p| p.mine_efficiency);
        let mut subsidy = 0.0;

        let shortfall = minimum - structure_efficiency;
        if shortfall > 0.0 && has_active_core(registry, team) {
            if let Some(pool) = ledger.pool_mut(team) {
                pool.mine_efficiency += shortfall;
            }
            subsidy = factor * shortfall;
        }

        // Ledger calls only fail for unplayable teams, and `team` is playable
        let efficiency = ledger.pool(team).map_or(0.0, |p| p.mine_efficiency);
        let earned = factor * efficiency;
        if subsidy > 0.0 {
            ledger.modify(team, subsidy, Pool::Mined).ok();
        }
        ledger.add_build_points(team, earned).ok();
        ledger.add_mined_build_points(team, earned).ok();

        teams.push(TeamTickReport {
            team,
            structure_efficiency,
            efficiency,
            subsidy,
            earned,
        });
    }

    let encoded_rate = encode_global_rate(state.mine_rate);
    for player in players.iter_mut() {
        let efficiency = ledger.pool(player.team).map_or(0.0, |p| p.mine_efficiency);
        player.view = PlayerEconomyView {
            encoded_mine_rate: encoded_rate,
            encoded_team_efficiency: encode_team_efficiency(player.team, efficiency),
        };
    }

    state.next_calculation_time = now + config.calculation_period_ms;

    tracing::debug!(
        level_time = now,
        mine_rate = state.mine_rate,
        factor,
        "Economy tick"
    );

    Some(EconomyReport {
        level_time_ms: now,
        mine_rate: state.mine_rate,
        rate_to_points_factor: factor,
        teams,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Structure;
    use crate::math::Vec3Fixed;

    fn config() -> EconomyConfig {
        EconomyConfig {
            initial_mine_rate: 60.0,
            mine_rate_half_life_minutes: 10.0,
            minimum_mine_rate_percent: 50.0,
            ..Default::default()
        }
    }

    fn add(registry: &mut StructureRegistry, kind: StructureKind, efficiency: f32) {
        let mut s = Structure::new(0, kind, Vec3Fixed::ZERO, 100);
        s.spawned = true;
        s.mine_efficiency = efficiency;
        s.mining_active = efficiency > 0.0;
        registry.insert(s);
    }

    #[test]
    fn test_decay_half_life() {
        let rate = decayed_mine_rate(100.0, 10.0, 10 * 60_000);
        assert!((rate - 50.0).abs() < 1e-3);
        assert_eq!(decayed_mine_rate(100.0, 10.0, 0), 100.0);
    }

    #[test]
    fn test_rate_to_points_factor() {
        // 60 per minute over one second is one point
        assert!((rate_to_points_factor(60.0, 1000) - 1.0).abs() < f32::EPSILON);
        assert!((rate_to_points_factor(60.0, 500) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_tick_waits_for_schedule() {
        let config = config();
        let mut state = GlobalEconomyState::new(&config);
        let mut registry = StructureRegistry::new();
        let mut ledger = ResourceLedger::new();

        let clock = MatchClock::default();
        assert!(economy_tick(&mut state, &config, clock, &mut registry, &mut ledger, &mut []).is_some());
        assert_eq!(state.next_calculation_time, 1000);

        let early = MatchClock {
            level_time_ms: 999,
            ..clock
        };
        assert!(economy_tick(&mut state, &config, early, &mut registry, &mut ledger, &mut []).is_none());

        let due = MatchClock {
            level_time_ms: 1000,
            ..clock
        };
        assert!(economy_tick(&mut state, &config, due, &mut registry, &mut ledger, &mut []).is_some());
        assert_eq!(state.next_calculation_time, 2000);
    }

    #[test]
    fn test_tick_pays_structure_efficiency() {
        let config = config();
        let mut state = GlobalEconomyState::new(&config);
        let mut registry = StructureRegistry::new();
        let mut ledger = ResourceLedger::new();
        add(&mut registry, StructureKind::Drill, 1.0);
        add(&mut registry, StructureKind::Drill, 0.5);
        add(&mut registry, StructureKind::Leech, 0.75);

        let report = economy_tick(
            &mut state,
            &config,
            MatchClock::default(),
            &mut registry,
            &mut ledger,
            &mut [],
        )
        .unwrap();

        // factor = (60 / 60) * 1 = 1
        let humans = report.team(Team::Humans).unwrap();
        assert!((humans.efficiency - 1.5).abs() < 1e-6);
        assert!((humans.earned - 1.5).abs() < 1e-6);
        assert_eq!(humans.subsidy, 0.0);

        let pool = ledger.pool(Team::Humans).unwrap();
        assert!((pool.build_points - 1.5).abs() < 1e-6);
        assert!((pool.mined_build_points - 1.5).abs() < 1e-6);

        let first = registry.get(1).unwrap();
        assert!((first.mined_build_points - 1.0).abs() < 1e-6);
        assert_eq!(first.mine_rate, state.mine_rate);
    }

    #[test]
    fn test_floor_requires_active_core() {
        let config = config();
        let mut state = GlobalEconomyState::new(&config);
        let mut registry = StructureRegistry::new();
        let mut ledger = ResourceLedger::new();
        add(&mut registry, StructureKind::Reactor, 0.0);

        let report = economy_tick(
            &mut state,
            &config,
            MatchClock::default(),
            &mut registry,
            &mut ledger,
            &mut [],
        )
        .unwrap();

        let humans = report.team(Team::Humans).unwrap();
        assert!((humans.efficiency - 0.5).abs() < 1e-6);
        assert!((humans.subsidy - 0.5).abs() < 1e-6);
        let pool = ledger.pool(Team::Humans).unwrap();
        assert!((pool.build_points - 0.5).abs() < 1e-6);
        // Subsidy credited to the mined pool on top of the earned points
        assert!((pool.mined_build_points - 1.0).abs() < 1e-6);

        let aliens = report.team(Team::Aliens).unwrap();
        assert_eq!(aliens.efficiency, 0.0);
        assert_eq!(ledger.pool(Team::Aliens).unwrap().build_points, 0.0);
    }

    #[test]
    fn test_floor_does_not_touch_structures() {
        let config = config();
        let mut state = GlobalEconomyState::new(&config);
        let mut registry = StructureRegistry::new();
        let mut ledger = ResourceLedger::new();
        add(&mut registry, StructureKind::Overmind, 0.0);
        add(&mut registry, StructureKind::Leech, 0.2);

        economy_tick(
            &mut state,
            &config,
            MatchClock::default(),
            &mut registry,
            &mut ledger,
            &mut [],
        );

        let leech = registry.get(2).unwrap();
        assert!((leech.mine_efficiency - 0.2).abs() < 1e-6);
        assert!((leech.mined_build_points - 0.2).abs() < 1e-6);
        assert!((ledger.pool(Team::Aliens).unwrap().mine_efficiency - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_publish_to_players() {
        let config = config();
        let mut state = GlobalEconomyState::new(&config);
        let mut registry = StructureRegistry::new();
        let mut ledger = ResourceLedger::new();
        add(&mut registry, StructureKind::Drill, 1.0);

        let mut players = [
            PlayerSlot::new(0, Team::Humans),
            PlayerSlot::new(1, Team::Aliens),
            PlayerSlot::new(2, Team::None),
        ];
        economy_tick(
            &mut state,
            &config,
            MatchClock::default(),
            &mut registry,
            &mut ledger,
            &mut players,
        );

        assert_eq!(players[0].view.encoded_mine_rate, 600);
        assert_eq!(players[0].view.encoded_team_efficiency, 100);
        assert_eq!(players[1].view.encoded_team_efficiency, 0);
        assert_eq!(players[2].view.encoded_mine_rate, 600);
        assert_eq!(players[2].view.encoded_team_efficiency, 0);
    }

    #[test]
    fn test_elapsed_before_match_start_is_zero() {
        let clock = MatchClock {
            level_time_ms: 100,
            match_start_ms: 5000,
        };
        assert_eq!(clock.elapsed_ms(), 0);
    }
}
