//! Test fixtures and helpers.
//!
//! Pre-built worlds and structure layouts for consistent testing.

use bp_core::components::{EntityId, StructureKind};
use bp_core::config::EconomyConfig;
use bp_core::math::Vec3Fixed;
use bp_core::teams::Team;
use bp_core::world::{SimulationWorld, StructureSpawnParams};
use fixed::types::I32F32;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Position on the x axis, in whole units.
#[must_use]
pub fn at_x(x: i32) -> Vec3Fixed {
    Vec3Fixed::from_units(x, 0, 0)
}

/// Round-number config: rate 60/min so one tick at full efficiency pays
/// exactly one build point.
#[must_use]
pub fn simple_config() -> EconomyConfig {
    EconomyConfig {
        initial_mine_rate: 60.0,
        mine_rate_half_life_minutes: 10.0,
        minimum_mine_rate_percent: 50.0,
        interference_range: 1000.0,
        ..Default::default()
    }
}

/// Config as a RON document, for loader tests.
pub const SIMPLE_CONFIG_RON: &str = r"(
    initial_mine_rate: 60.0,
    mine_rate_half_life_minutes: 10.0,
    minimum_mine_rate_percent: 50.0,
    interference_range: 1000.0,
)";

/// Empty world with [`simple_config`].
#[must_use]
pub fn empty_world() -> SimulationWorld {
    SimulationWorld::new(simple_config())
}

/// Place a finished, powered structure.
pub fn place(world: &mut SimulationWorld, kind: StructureKind, position: Vec3Fixed) -> EntityId {
    world.spawn_structure(StructureSpawnParams {
        kind,
        position,
        spawned: true,
        ..Default::default()
    })
}

/// Place a finished drill.
pub fn place_drill(world: &mut SimulationWorld, position: Vec3Fixed) -> EntityId {
    place(world, StructureKind::Drill, position)
}

/// Place a finished leech.
pub fn place_leech(world: &mut SimulationWorld, position: Vec3Fixed) -> EntityId {
    place(world, StructureKind::Leech, position)
}

/// Place a team's core structure far from any miner.
pub fn place_core(world: &mut SimulationWorld, team: Team) -> Option<EntityId> {
    let kind = StructureKind::core_of(team)?;
    Some(place(world, kind, Vec3Fixed::from_units(-100_000, 0, 0)))
}

/// Both cores plus `per_team` miners per team spaced `spacing` units apart.
///
/// Humans mine along +y, aliens along -y, so teams interfere only near the
/// origin.
#[must_use]
pub fn contested_world(per_team: i32, spacing: i32) -> SimulationWorld {
    let mut world = empty_world();
    place_core(&mut world, Team::Humans);
    place_core(&mut world, Team::Aliens);
    for i in 0..per_team {
        place_drill(&mut world, Vec3Fixed::from_units(0, i * spacing, 0));
        place_leech(&mut world, Vec3Fixed::from_units(0, -(i + 1) * spacing, 0));
    }
    world.connect_player(Team::Humans);
    world.connect_player(Team::Aliens);
    world.connect_player(Team::None);
    tracing::debug!(per_team, spacing, "Contested world ready");
    world
}

/// Advance one calculation period and run a frame.
pub fn step_period(world: &mut SimulationWorld) {
    let period = world.config().calculation_period_ms;
    world.advance_time(period);
    world.run_frame();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_config_ron_matches() {
        let parsed: EconomyConfig = ron::from_str(SIMPLE_CONFIG_RON).unwrap();
        assert_eq!(parsed, simple_config());
    }

    #[test]
    fn test_contested_world_layout() {
        let world = contested_world(3, 500);
        // Two cores, three drills, three leeches
        assert_eq!(world.registry().len(), 8);
        assert_eq!(world.players().len(), 3);
    }
}
