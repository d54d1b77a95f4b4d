//! Mining rate systems.
//!
//! - [`recalculate_rate`] derives one structure's rate from the global rate
//!   and every interfering neighbor.
//! - [`notify_neighbors`] re-runs that calculation for everything around a
//!   structure whose state just changed.
//! - [`think`] detects active-state flips and triggers both.
//! - [`predict_efficiency`] and [`predict_efficiency_delta`] answer
//!   "what if a mining structure were built here" without mutating state.
//!
//! Interference is geometric: structures of both teams interfere with each
//! other.

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::interference::interference_modifier;
use crate::math::Vec3Fixed;
use crate::registry::StructureRegistry;
use crate::replication::{encode_structure, StructureTransport};
use crate::teams::Team;

/// Global inputs to a rate calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateContext {
    /// Current global per-structure mine rate.
    pub global_mine_rate: f32,
    /// Interference range from the configuration.
    pub interference_range: f32,
}

impl RateContext {
    /// Radius of the neighbor query, twice the interference range.
    #[must_use]
    pub fn neighbor_radius(&self) -> f32 {
        self.interference_range * 2.0
    }

    /// `rate / global`, guarded against a zero global rate.
    #[must_use]
    pub fn efficiency_of(&self, rate: f32) -> f32 {
        if self.global_mine_rate > 0.0 {
            rate / self.global_mine_rate
        } else {
            0.0
        }
    }
}

/// Direction of an active-state flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityChange {
    /// The structure started mining.
    Activated,
    /// The structure stopped mining.
    Deactivated,
}

/// Interfered rate for a mining structure at `position`.
fn interfered_rate(
    registry: &StructureRegistry,
    ctx: RateContext,
    position: Vec3Fixed,
    exclude: Option<EntityId>,
) -> f32 {
    let mut rate = ctx.global_mine_rate;
    for neighbor_id in registry.active_miners_near(position, ctx.neighbor_radius(), exclude) {
        if let Some(neighbor) = registry.get(neighbor_id) {
            rate *= interference_modifier(
                position.distance(neighbor.position),
                ctx.interference_range,
            );
        }
    }
    rate
}

/// Recompute the cached rate and efficiency of one structure.
///
/// Returns the new transport encoding, or `None` if the structure does not
/// exist or does not mine.
pub fn recalculate_rate(
    registry: &mut StructureRegistry,
    ctx: RateContext,
    id: EntityId,
) -> Option<StructureTransport> {
    let (position, active) = {
        let structure = registry.get(id)?;
        if !structure.is_mining_structure() {
            return None;
        }
        (structure.position, structure.is_active())
    };

    let rate = if active {
        Some(interfered_rate(registry, ctx, position, Some(id)))
    } else {
        None
    };

    let structure = registry.get_mut(id)?;
    match rate {
        Some(rate) => {
            structure.mine_rate = rate;
            structure.mine_efficiency = ctx.efficiency_of(rate);
            structure.mining_active = true;
        }
        None => structure.clear_mining_state(),
    }

    Some(encode_structure(structure))
}

/// Recalculate every active mining structure within range of `center`.
///
/// `exclude` is the structure that triggered the notification; it is never
/// recalculated here. Returns the IDs that were updated, ascending.
pub fn notify_neighbors(
    registry: &mut StructureRegistry,
    ctx: RateContext,
    center: Vec3Fixed,
    exclude: Option<EntityId>,
) -> Vec<EntityId> {
    let neighbors = registry.active_miners_near(center, ctx.neighbor_radius(), exclude);
    for &neighbor in &neighbors {
        recalculate_rate(registry, ctx, neighbor);
    }
    neighbors
}

/// Per-frame check of one mining structure.
///
/// Reacts to the transition edge only: if the structure's active state
/// differs from the one seen at its last calculation, recalculate it and
/// inform its neighbors.
pub fn think(
    registry: &mut StructureRegistry,
    ctx: RateContext,
    id: EntityId,
) -> Option<ActivityChange> {
    let (position, active, was_active) = {
        let structure = registry.get(id)?;
        if !structure.is_mining_structure() {
            return None;
        }
        (
            structure.position,
            structure.is_active(),
            structure.mining_active,
        )
    };

    if active == was_active {
        return None;
    }

    recalculate_rate(registry, ctx, id);
    let updated = notify_neighbors(registry, ctx, position, Some(id));
    tracing::debug!(id, active, neighbors = updated.len(), "Mining state changed");

    Some(if active {
        ActivityChange::Activated
    } else {
        ActivityChange::Deactivated
    })
}

/// Efficiency a new mining structure would have at `position`.
///
/// Considers every active mining structure of either team.
#[must_use]
pub fn predict_efficiency(registry: &StructureRegistry, ctx: RateContext, position: Vec3Fixed) -> f32 {
    ctx.efficiency_of(interfered_rate(registry, ctx, position, None))
}

/// Predicted change in `team`'s total efficiency from building at `position`.
///
/// Adds the new structure's own efficiency to the (negative) efficiency
/// losses it would inflict on the team's active mining structures in
/// range. Structures that would be removed to make room are not accounted
/// for.
#[must_use]
pub fn predict_efficiency_delta(
    registry: &StructureRegistry,
    ctx: RateContext,
    position: Vec3Fixed,
    team: Team,
) -> f32 {
    let mut delta = predict_efficiency(registry, ctx, position);

    for id in registry.active_miners_near(position, ctx.neighbor_radius(), None) {
        let Some(existing) = registry.get(id) else {
            continue;
        };
        if existing.team != team {
            continue;
        }
        let modifier = interference_modifier(
            existing.position.distance(position),
            ctx.interference_range,
        );
        delta += existing.mine_efficiency * (modifier - 1.0);
    }

    delta
}
