//! Build point value of standing structures.
//!
//! A structure is worth its construction cost scaled by its remaining
//! health. Used to show how much a team would recover by deconstructing
//! marked structures, and how much each team has invested overall.

use serde::{Deserialize, Serialize};

use crate::components::Structure;
use crate::config::EconomyConfig;
use crate::registry::StructureRegistry;
use crate::teams::Team;

/// Build point value per playable team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct TeamValues {
    /// Alien total.
    pub aliens: i32,
    /// Human total.
    pub humans: i32,
}

impl TeamValues {
    /// Value for a team, 0 for unplayable teams.
    #[must_use]
    pub const fn get(&self, team: Team) -> i32 {
        match team {
            Team::Aliens => self.aliens,
            Team::Humans => self.humans,
            Team::None => 0,
        }
    }

    fn add(&mut self, team: Team, amount: i32) {
        match team {
            Team::Aliens => self.aliens = self.aliens.saturating_add(amount),
            Team::Humans => self.humans = self.humans.saturating_add(amount),
            Team::None => {}
        }
    }
}

/// Health-scaled value of one structure.
fn health_scaled_value(config: &EconomyConfig, structure: &Structure) -> f32 {
    let cost = config.build_points(structure.kind) as f32;
    let max_health = structure.max_health.max(1) as f32;
    cost * (structure.health as f32 / max_health)
}

/// Health-scaled value in integer arithmetic, widened so large health
/// values cannot overflow.
fn integer_value(config: &EconomyConfig, structure: &Structure) -> i32 {
    let cost = i64::from(config.build_points(structure.kind));
    let health = i64::from(structure.health.max(0));
    let max_health = i64::from(structure.max_health.max(1));
    // Health never exceeds max, so the quotient fits back into the cost's range
    i32::try_from(cost * health / max_health).unwrap_or(i32::MAX)
}

/// Value of a team's living structures marked for deconstruction.
#[must_use]
pub fn marked_build_points(config: &EconomyConfig, registry: &StructureRegistry, team: Team) -> i32 {
    let mut sum: i32 = 0;
    for id in registry.sorted_ids() {
        let Some(structure) = registry.get(id) else {
            continue;
        };
        if structure.team != team || !structure.is_alive() || !structure.marked_for_deconstruction {
            continue;
        }
        // Truncated per structure
        sum = sum.saturating_add(health_scaled_value(config, structure) as i32);
    }
    sum
}

/// Value of all structures per team; damaged structures count partially.
#[must_use]
pub fn buildable_resource_value(config: &EconomyConfig, registry: &StructureRegistry) -> TeamValues {
    let mut values = TeamValues::default();
    for id in registry.sorted_ids() {
        let Some(structure) = registry.get(id) else {
            continue;
        };
        values.add(structure.team, integer_value(config, structure));
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::StructureKind;
    use crate::math::Vec3Fixed;

    fn add(
        registry: &mut StructureRegistry,
        config: &EconomyConfig,
        kind: StructureKind,
        health: i32,
        marked: bool,
    ) {
        let mut s = Structure::new(0, kind, Vec3Fixed::ZERO, config.max_health(kind));
        s.spawned = true;
        s.health = health;
        s.marked_for_deconstruction = marked;
        registry.insert(s);
    }

    #[test]
    fn test_marked_value_scales_with_health() {
        let config = EconomyConfig::default();
        let mut registry = StructureRegistry::new();
        // Drill: 10 bp, 500 hp
        add(&mut registry, &config, StructureKind::Drill, 250, true);
        add(&mut registry, &config, StructureKind::Drill, 500, false);
        // Turret: 8 bp, 190 hp
        add(&mut registry, &config, StructureKind::Turret, 190, true);
        // Marked but dead
        add(&mut registry, &config, StructureKind::Turret, 0, true);
        // Other team
        add(&mut registry, &config, StructureKind::Leech, 500, true);

        assert_eq!(marked_build_points(&config, &registry, Team::Humans), 5 + 8);
        assert_eq!(marked_build_points(&config, &registry, Team::Aliens), 10);
        assert_eq!(marked_build_points(&config, &registry, Team::None), 0);
    }

    #[test]
    fn test_resource_value_per_team() {
        let config = EconomyConfig::default();
        let mut registry = StructureRegistry::new();
        add(&mut registry, &config, StructureKind::Drill, 500, false);
        add(&mut registry, &config, StructureKind::Telenode, 125, false);
        add(&mut registry, &config, StructureKind::Egg, 250, false);
        add(&mut registry, &config, StructureKind::AcidTube, -20, false);

        let values = buildable_resource_value(&config, &registry);
        assert_eq!(values.humans, 10 + 4);
        assert_eq!(values.aliens, 8);
        assert_eq!(values.get(Team::None), 0);
    }

    #[test]
    fn test_resource_value_with_huge_health() {
        let mut config = EconomyConfig::default();
        for data in &mut config.buildables {
            data.health = 1_000_000_000;
            data.build_points = 10;
        }
        assert!(config.validate().is_ok());

        let mut registry = StructureRegistry::new();
        add(&mut registry, &config, StructureKind::Drill, 1_000_000_000, true);
        add(&mut registry, &config, StructureKind::Drill, 500_000_000, false);

        let values = buildable_resource_value(&config, &registry);
        assert_eq!(values.humans, 10 + 5);
        assert_eq!(marked_build_points(&config, &registry, Team::Humans), 10);
    }
}
