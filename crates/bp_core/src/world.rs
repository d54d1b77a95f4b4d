//! The simulation world context.
//!
//! [`SimulationWorld`] owns every piece of mutable economy state for one
//! match: the structure registry, the team ledger, the global mine rate,
//! the match clock, and the connected players. Every operation takes the
//! world explicitly; there is no ambient global state.
//!
//! # Frame Order
//!
//! Each call to [`SimulationWorld::run_frame`] runs, in order:
//! 1. **Think** - every mining structure, ascending ID, reacting to
//!    active-state flips
//! 2. **Economy tick** - only if the calculation period has elapsed
//!
//! State changes made through the world's methods (power, construction,
//! death, deconstruction) notify neighbors immediately; the per-frame think
//! catches anything mutated behind the world's back.
//!
//! # Example
//!
//! ```
//! use bp_core::components::StructureKind;
//! use bp_core::config::EconomyConfig;
//! use bp_core::math::Vec3Fixed;
//! use bp_core::teams::Team;
//! use bp_core::world::{SimulationWorld, StructureSpawnParams};
//!
//! let mut world = SimulationWorld::new(EconomyConfig::default());
//!
//! let drill = world.spawn_structure(StructureSpawnParams {
//!     kind: StructureKind::Drill,
//!     position: Vec3Fixed::from_units(100, 0, 0),
//!     spawned: true,
//!     ..Default::default()
//! });
//!
//! world.advance_time(1000);
//! world.run_frame();
//!
//! assert!(world.structure(drill).unwrap().mining_active);
//! assert!(world.ledger().pool(Team::Humans).unwrap().build_points > 0.0);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, Structure, StructureKind};
use crate::config::EconomyConfig;
use crate::economy::{economy_tick, EconomyReport, GlobalEconomyState, MatchClock};
use crate::error::{EconomyError, Result};
use crate::ledger::{Clawback, ResourceLedger};
use crate::math::Vec3Fixed;
use crate::mining::{self, ActivityChange, RateContext};
use crate::registry::StructureRegistry;
use crate::replication::{encode_structure, PlayerId, PlayerSlot, StructureTransport};
use crate::teams::Team;
use crate::valuation::{self, TeamValues};

/// Parameters for placing a new structure.
///
/// Use this struct to describe the structure; unspecified fields take the
/// defaults of a freshly placed, still-building, powered structure.
#[derive(Debug, Clone)]
pub struct StructureSpawnParams {
    /// Structure type.
    pub kind: StructureKind,
    /// World position.
    pub position: Vec3Fixed,
    /// Whether construction has already finished.
    pub spawned: bool,
    /// Whether the structure receives power.
    pub powered: bool,
    /// Starting health; defaults to the configured maximum.
    ///
    /// Clamped to `1..=max`, so a structure is never placed dead.
    pub health: Option<i32>,
}

impl Default for StructureSpawnParams {
    fn default() -> Self {
        Self {
            kind: StructureKind::Drill,
            position: Vec3Fixed::ZERO,
            spawned: false,
            powered: true,
            health: None,
        }
    }
}

/// Something that happened to a structure during a world operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EconomyEvent {
    /// A mining structure started or stopped mining.
    ActivityChanged {
        /// The structure.
        id: EntityId,
        /// Direction of the change.
        change: ActivityChange,
    },
    /// A structure was destroyed.
    Died {
        /// The structure.
        id: EntityId,
        /// Owning team.
        team: Team,
        /// Build points removed from the team.
        clawback: Clawback,
    },
    /// A structure was removed by its own team.
    Deconstructed {
        /// The structure.
        id: EntityId,
        /// Owning team.
        team: Team,
        /// Build points released from the mined pool.
        released: Clawback,
    },
}

/// Events generated during one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameEvents {
    /// Deaths and deconstructions since the previous frame, then activity
    /// flips detected by the think pass.
    pub events: Vec<EconomyEvent>,
    /// Economy tick outcome, if the tick fired this frame.
    pub economy: Option<EconomyReport>,
}

/// All economy state for one match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationWorld {
    /// Balance parameters.
    config: EconomyConfig,
    /// Match timing.
    clock: MatchClock,
    /// Global mine rate and tick schedule.
    economy: GlobalEconomyState,
    /// All structures.
    registry: StructureRegistry,
    /// Team pools.
    ledger: ResourceLedger,
    /// Connected players.
    players: Vec<PlayerSlot>,
    /// Next player slot ID to assign.
    next_player_id: PlayerId,
    /// Removals waiting to be reported by the next frame.
    #[serde(skip)]
    pending_events: Vec<EconomyEvent>,
}

impl SimulationWorld {
    /// Create a world at level time 0 with no structures.
    #[must_use]
    pub fn new(config: EconomyConfig) -> Self {
        let economy = GlobalEconomyState::new(&config);
        Self {
            config,
            clock: MatchClock::default(),
            economy,
            registry: StructureRegistry::new(),
            ledger: ResourceLedger::new(),
            players: Vec::new(),
            next_player_id: 0,
            pending_events: Vec::new(),
        }
    }

    /// Create a world after validating the configuration.
    pub fn try_new(config: EconomyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Balance parameters.
    #[must_use]
    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    /// Match timing.
    #[must_use]
    pub const fn clock(&self) -> MatchClock {
        self.clock
    }

    /// Global economy state.
    #[must_use]
    pub const fn economy(&self) -> &GlobalEconomyState {
        &self.economy
    }

    /// Structure storage.
    #[must_use]
    pub fn registry(&self) -> &StructureRegistry {
        &self.registry
    }

    /// Team pools.
    #[must_use]
    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    /// Connected players.
    #[must_use]
    pub fn players(&self) -> &[PlayerSlot] {
        &self.players
    }

    /// Inputs for the mining systems.
    #[must_use]
    pub fn rate_context(&self) -> RateContext {
        RateContext {
            global_mine_rate: self.economy.mine_rate,
            interference_range: self.config.interference_range,
        }
    }

    // ------------------------------------------------------------------
    // Clock
    // ------------------------------------------------------------------

    /// Advance level time.
    pub fn advance_time(&mut self, delta_ms: u64) {
        self.clock.level_time_ms = self.clock.level_time_ms.saturating_add(delta_ms);
    }

    /// Mark the current level time as the start of the match.
    ///
    /// The global mine rate decays from this point.
    pub fn start_match(&mut self) {
        self.clock.match_start_ms = self.clock.level_time_ms;
        tracing::info!(level_time = self.clock.level_time_ms, "Match started");
    }

    // ------------------------------------------------------------------
    // Structures
    // ------------------------------------------------------------------

    /// Get a structure by ID.
    #[must_use]
    pub fn structure(&self, id: EntityId) -> Option<&Structure> {
        self.registry.get(id)
    }

    fn structure_mut(&mut self, id: EntityId) -> Result<&mut Structure> {
        self.registry
            .get_mut(id)
            .ok_or(EconomyError::EntityNotFound(id))
    }

    /// Place a new structure and return its ID.
    ///
    /// A structure placed already spawned starts mining (and squeezes its
    /// neighbors) immediately.
    pub fn spawn_structure(&mut self, params: StructureSpawnParams) -> EntityId {
        let max_health = self.config.max_health(params.kind);
        let mut structure = Structure::new(0, params.kind, params.position, max_health);
        structure.spawned = params.spawned;
        structure.powered = params.powered;
        structure.health = params
            .health
            .unwrap_or(max_health)
            .clamp(1, max_health.max(1));

        let id = self.registry.insert(structure);
        let ctx = self.rate_context();
        mining::think(&mut self.registry, ctx, id);
        tracing::debug!(id, kind = ?params.kind, "Structure placed");
        id
    }

    /// Finish construction of a structure.
    pub fn complete_construction(&mut self, id: EntityId) -> Result<Option<ActivityChange>> {
        self.structure_mut(id)?.spawned = true;
        Ok(self.think(id))
    }

    /// Switch a structure's power.
    pub fn set_powered(&mut self, id: EntityId, powered: bool) -> Result<Option<ActivityChange>> {
        self.structure_mut(id)?.powered = powered;
        Ok(self.think(id))
    }

    /// Flag or unflag a structure for deconstruction.
    pub fn mark_for_deconstruction(&mut self, id: EntityId, marked: bool) -> Result<()> {
        self.structure_mut(id)?.marked_for_deconstruction = marked;
        Ok(())
    }

    /// Damage a structure, killing it when health reaches zero.
    ///
    /// Returns the death clawback if this damage destroyed it.
    pub fn damage_structure(&mut self, id: EntityId, amount: i32) -> Result<Option<Clawback>> {
        let killed = self.structure_mut(id)?.apply_damage(amount);
        if killed {
            self.kill_structure(id).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Destroy a structure.
    ///
    /// A mining structure takes its share of the team's build points with
    /// it; its neighbors then re-expand into the freed capacity.
    pub fn kill_structure(&mut self, id: EntityId) -> Result<Clawback> {
        let structure = self
            .registry
            .remove(id)
            .ok_or(EconomyError::EntityNotFound(id))?;

        if !structure.is_mining_structure() {
            return Ok(Clawback::default());
        }

        let clawback = self
            .ledger
            .apply_death_clawback(structure.team, structure.mined_build_points)?;
        let ctx = self.rate_context();
        mining::notify_neighbors(
            &mut self.registry,
            ctx,
            structure.position,
            Some(id),
        );

        tracing::info!(
            id,
            team = %structure.team,
            spendable = clawback.spendable,
            mined = clawback.mined,
            "Mining structure destroyed"
        );
        self.pending_events.push(EconomyEvent::Died {
            id,
            team: structure.team,
            clawback,
        });
        Ok(clawback)
    }

    /// Remove a structure at its team's request.
    ///
    /// The mined pool is released so the remaining structures inherit the
    /// account; spendable build points are untouched.
    pub fn deconstruct_structure(&mut self, id: EntityId) -> Result<Clawback> {
        let structure = self
            .registry
            .remove(id)
            .ok_or(EconomyError::EntityNotFound(id))?;

        if !structure.is_mining_structure() {
            return Ok(Clawback::default());
        }

        let released = self
            .ledger
            .apply_deconstruction(structure.team, structure.mined_build_points)?;
        let ctx = self.rate_context();
        mining::notify_neighbors(
            &mut self.registry,
            ctx,
            structure.position,
            Some(id),
        );
        self.pending_events.push(EconomyEvent::Deconstructed {
            id,
            team: structure.team,
            released,
        });
        Ok(released)
    }

    /// Recompute one mining structure's rate.
    pub fn recalculate_rate(&mut self, id: EntityId) -> Result<StructureTransport> {
        if !self.registry.contains(id) {
            return Err(EconomyError::EntityNotFound(id));
        }
        let ctx = self.rate_context();
        mining::recalculate_rate(&mut self.registry, ctx, id)
            .ok_or(EconomyError::NotMiningStructure(id))
    }

    /// Recompute every active mining structure around `id`.
    pub fn notify_neighbors(&mut self, id: EntityId) -> Result<Vec<EntityId>> {
        let position = self
            .registry
            .get(id)
            .ok_or(EconomyError::EntityNotFound(id))?
            .position;
        let ctx = self.rate_context();
        Ok(mining::notify_neighbors(
            &mut self.registry,
            ctx,
            position,
            Some(id),
        ))
    }

    /// Transport encoding of a structure's mining state.
    pub fn structure_transport(&self, id: EntityId) -> Result<StructureTransport> {
        self.registry
            .get(id)
            .map(encode_structure)
            .ok_or(EconomyError::EntityNotFound(id))
    }

    fn think(&mut self, id: EntityId) -> Option<ActivityChange> {
        let ctx = self.rate_context();
        mining::think(&mut self.registry, ctx, id)
    }

    /// Run the think pass over every structure in ascending ID order.
    pub fn think_all(&mut self) -> Vec<EconomyEvent> {
        let mut events = Vec::new();
        for id in self.registry.sorted_ids() {
            if let Some(change) = self.think(id) {
                events.push(EconomyEvent::ActivityChanged { id, change });
            }
        }
        events
    }

    /// Advance the economy by one host frame.
    pub fn run_frame(&mut self) -> FrameEvents {
        let mut events = std::mem::take(&mut self.pending_events);
        events.extend(self.think_all());
        let economy = economy_tick(
            &mut self.economy,
            &self.config,
            self.clock,
            &mut self.registry,
            &mut self.ledger,
            &mut self.players,
        );

        #[cfg(feature = "debug-validation")]
        self.validate_invariants();

        FrameEvents { events, economy }
    }

    #[cfg(feature = "debug-validation")]
    fn validate_invariants(&self) {
        for team in Team::PLAYABLE {
            if let Some(pool) = self.ledger.pool(team) {
                if pool.build_points < 0.0 || pool.mined_build_points < 0.0 {
                    tracing::warn!(%team, ?pool, "Negative build point pool");
                }
            }
        }
        for structure in self.registry.iter() {
            if !structure.mining_active && structure.mine_efficiency != 0.0 {
                tracing::warn!(id = structure.id, "Inactive structure with non-zero efficiency");
            }
        }
    }

    // ------------------------------------------------------------------
    // Prediction
    // ------------------------------------------------------------------

    /// Efficiency a new mining structure would have at `position`.
    #[must_use]
    pub fn predict_efficiency(&self, position: Vec3Fixed) -> f32 {
        mining::predict_efficiency(&self.registry, self.rate_context(), position)
    }

    /// Predicted change in `team`'s total efficiency from building at `position`.
    #[must_use]
    pub fn predict_efficiency_delta(&self, position: Vec3Fixed, team: Team) -> f32 {
        mining::predict_efficiency_delta(&self.registry, self.rate_context(), position, team)
    }

    // ------------------------------------------------------------------
    // Ledger
    // ------------------------------------------------------------------

    /// Adds or removes spendable build points.
    pub fn add_build_points(&mut self, team: Team, amount: f32) -> Result<()> {
        self.ledger.add_build_points(team, amount)
    }

    /// Adds or removes build points from the mined pool.
    pub fn add_mined_build_points(&mut self, team: Team, amount: f32) -> Result<()> {
        self.ledger.add_mined_build_points(team, amount)
    }

    /// Whether a team can pay `amount` build points.
    #[must_use]
    pub fn can_afford(&self, team: Team, amount: f32) -> bool {
        self.ledger.can_afford(team, amount)
    }

    /// Spendable build points as an integer.
    #[must_use]
    pub fn build_points_int(&self, team: Team) -> i32 {
        self.ledger.build_points_int(team)
    }

    /// Value of a team's structures marked for deconstruction.
    #[must_use]
    pub fn marked_build_points(&self, team: Team) -> i32 {
        valuation::marked_build_points(&self.config, &self.registry, team)
    }

    /// Value of all standing structures per team.
    #[must_use]
    pub fn buildable_resource_value(&self) -> TeamValues {
        valuation::buildable_resource_value(&self.config, &self.registry)
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    /// Connect a player and return their slot ID.
    pub fn connect_player(&mut self, team: Team) -> PlayerId {
        let id = self.next_player_id;
        self.next_player_id += 1;
        self.players.push(PlayerSlot::new(id, team));
        id
    }

    /// Get a player slot.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&PlayerSlot> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Move a player to another team. Takes effect at the next publish.
    pub fn set_player_team(&mut self, id: PlayerId, team: Team) -> Result<()> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(EconomyError::PlayerNotFound(id))?;
        player.team = team;
        Ok(())
    }

    /// Disconnect a player.
    pub fn disconnect_player(&mut self, id: PlayerId) -> Result<PlayerSlot> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or(EconomyError::PlayerNotFound(id))?;
        Ok(self.players.remove(index))
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Compute a hash of the current world state.
    ///
    /// Floats are hashed by bit pattern; structures in ascending ID order.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.clock.hash(&mut hasher);
        self.economy.mine_rate.to_bits().hash(&mut hasher);
        self.economy.next_calculation_time.hash(&mut hasher);

        for team in Team::PLAYABLE {
            if let Some(pool) = self.ledger.pool(team) {
                pool.build_points.to_bits().hash(&mut hasher);
                pool.mined_build_points.to_bits().hash(&mut hasher);
                pool.mine_efficiency.to_bits().hash(&mut hasher);
            }
        }

        for id in self.registry.sorted_ids() {
            if let Some(s) = self.registry.get(id) {
                id.hash(&mut hasher);
                s.kind.hash(&mut hasher);
                s.position.hash(&mut hasher);
                s.spawned.hash(&mut hasher);
                s.powered.hash(&mut hasher);
                s.health.hash(&mut hasher);
                s.marked_for_deconstruction.hash(&mut hasher);
                s.mined_build_points.to_bits().hash(&mut hasher);
                s.mine_rate.to_bits().hash(&mut hasher);
                s.mine_efficiency.to_bits().hash(&mut hasher);
                s.mining_active.hash(&mut hasher);
            }
        }

        for player in &self.players {
            player.id.hash(&mut hasher);
            player.team.hash(&mut hasher);
            player.view.hash(&mut hasher);
        }

        hasher.finish()
    }

    /// Serialize the world state for snapshots.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| EconomyError::InvalidState(format!("Failed to serialize world: {e}")))
    }

    /// Deserialize world state from bytes.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| EconomyError::InvalidState(format!("Failed to deserialize world: {e}")))
    }
}

impl Default for SimulationWorld {
    fn default() -> Self {
        Self::new(EconomyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> SimulationWorld {
        SimulationWorld::new(EconomyConfig {
            initial_mine_rate: 60.0,
            mine_rate_half_life_minutes: 10.0,
            minimum_mine_rate_percent: 50.0,
            interference_range: 1000.0,
            ..Default::default()
        })
    }

    fn drill(world: &mut SimulationWorld, x: i32) -> EntityId {
        world.spawn_structure(StructureSpawnParams {
            kind: StructureKind::Drill,
            position: Vec3Fixed::from_units(x, 0, 0),
            spawned: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_world_new() {
        let world = world();
        assert_eq!(world.clock().level_time_ms, 0);
        assert!(world.registry().is_empty());
        assert_eq!(world.economy().mine_rate, 60.0);
    }

    #[test]
    fn test_try_new_rejects_bad_config() {
        let config = EconomyConfig {
            mine_rate_half_life_minutes: -1.0,
            ..Default::default()
        };
        assert!(SimulationWorld::try_new(config).is_err());
    }

    #[test]
    fn test_spawn_uses_configured_health() {
        let mut world = world();
        let id = drill(&mut world, 0);
        let s = world.structure(id).unwrap();
        assert_eq!(s.health, world.config().max_health(StructureKind::Drill));
        assert_eq!(s.team, Team::Humans);
        assert!(s.mining_active);
    }

    #[test]
    fn test_construction_activates_and_squeezes_neighbor() {
        let mut world = world();
        let a = drill(&mut world, 0);
        let b = world.spawn_structure(StructureSpawnParams {
            kind: StructureKind::Leech,
            ..Default::default()
        });
        assert_eq!(world.structure(a).unwrap().mine_efficiency, 1.0);
        assert!(!world.structure(b).unwrap().mining_active);

        assert_eq!(
            world.complete_construction(b).unwrap(),
            Some(ActivityChange::Activated)
        );
        assert!((world.structure(a).unwrap().mine_efficiency - 0.5).abs() < 1e-6);
        assert!((world.structure(b).unwrap().mine_efficiency - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_power_loss_releases_neighbor() {
        let mut world = world();
        let a = drill(&mut world, 0);
        let b = drill(&mut world, 0);

        assert_eq!(
            world.set_powered(b, false).unwrap(),
            Some(ActivityChange::Deactivated)
        );
        assert_eq!(world.structure(a).unwrap().mine_efficiency, 1.0);
        assert_eq!(world.structure_transport(b).unwrap().encoded_rate, 0);

        // Same state again is not an edge
        assert_eq!(world.set_powered(b, false).unwrap(), None);
    }

    #[test]
    fn test_kill_applies_clawback_and_frees_capacity() {
        let mut world = world();
        let a = drill(&mut world, 0);
        let b = drill(&mut world, 0);
        {
            let s = world.registry.get_mut(b).unwrap();
            s.mined_build_points = 40.0;
        }
        let pool = world.ledger.pool_mut(Team::Humans).unwrap();
        pool.build_points = 500.0;
        pool.mined_build_points = 100.0;

        let clawback = world.damage_structure(b, 10_000).unwrap().unwrap();
        assert!((clawback.spendable - 200.0).abs() < 1e-3);

        let pool = world.ledger().pool(Team::Humans).unwrap();
        assert!((pool.build_points - 300.0).abs() < 1e-3);
        assert!((pool.mined_build_points - 60.0).abs() < 1e-3);
        assert!(world.structure(b).is_none());
        assert_eq!(world.structure(a).unwrap().mine_efficiency, 1.0);
    }

    #[test]
    fn test_spawn_health_is_clamped_to_living_range() {
        let mut world = world();
        let max = world.config().max_health(StructureKind::Drill);
        for (requested, expected) in [(Some(0), 1), (Some(-50), 1), (Some(max + 10), max), (None, max)] {
            let id = world.spawn_structure(StructureSpawnParams {
                kind: StructureKind::Drill,
                spawned: true,
                health: requested,
                ..Default::default()
            });
            assert_eq!(world.structure(id).unwrap().health, expected);
        }
    }

    #[test]
    fn test_structure_placed_at_zero_health_can_still_die() {
        let mut world = world();
        let a = world.spawn_structure(StructureSpawnParams {
            kind: StructureKind::Drill,
            spawned: true,
            health: Some(0),
            ..Default::default()
        });
        assert!(world.structure(a).unwrap().mining_active);

        assert!(world.damage_structure(a, 1).unwrap().is_some());
        assert!(world.structure(a).is_none());
        assert_eq!(world.buildable_resource_value().humans, 0);
    }

    #[test]
    fn test_removals_are_reported_by_next_frame() {
        let mut world = world();
        let a = drill(&mut world, 0);
        let b = drill(&mut world, 5000);
        let turret = world.spawn_structure(StructureSpawnParams {
            kind: StructureKind::Turret,
            spawned: true,
            ..Default::default()
        });
        world.run_frame();

        let clawback = world.kill_structure(a).unwrap();
        let released = world.deconstruct_structure(b).unwrap();
        world.kill_structure(turret).unwrap();

        let frame = world.run_frame();
        assert_eq!(
            frame.events,
            vec![
                EconomyEvent::Died {
                    id: a,
                    team: Team::Humans,
                    clawback
                },
                EconomyEvent::Deconstructed {
                    id: b,
                    team: Team::Humans,
                    released
                },
            ]
        );
        assert!(world.run_frame().events.is_empty());
    }

    #[test]
    fn test_non_lethal_damage_keeps_structure() {
        let mut world = world();
        let a = drill(&mut world, 0);
        assert_eq!(world.damage_structure(a, 1).unwrap(), None);
        assert!(world.structure(a).is_some());
    }

    #[test]
    fn test_deconstruct_keeps_spendable_pool() {
        let mut world = world();
        let a = drill(&mut world, 0);
        let b = drill(&mut world, 0);
        world.registry.get_mut(b).unwrap().mined_build_points = 40.0;
        let pool = world.ledger.pool_mut(Team::Humans).unwrap();
        pool.build_points = 500.0;
        pool.mined_build_points = 100.0;

        world.deconstruct_structure(b).unwrap();

        let pool = world.ledger().pool(Team::Humans).unwrap();
        assert!((pool.build_points - 500.0).abs() < f32::EPSILON);
        assert!((pool.mined_build_points - 60.0).abs() < 1e-3);
        assert_eq!(world.structure(a).unwrap().mine_efficiency, 1.0);
    }

    #[test]
    fn test_unknown_entities_are_errors() {
        let mut world = world();
        assert!(matches!(
            world.kill_structure(42),
            Err(EconomyError::EntityNotFound(42))
        ));
        assert!(world.set_powered(42, true).is_err());
        assert!(world.structure_transport(42).is_err());
    }

    #[test]
    fn test_recalculate_rejects_non_miner() {
        let mut world = world();
        let turret = world.spawn_structure(StructureSpawnParams {
            kind: StructureKind::Turret,
            spawned: true,
            ..Default::default()
        });
        assert!(matches!(
            world.recalculate_rate(turret),
            Err(EconomyError::NotMiningStructure(_))
        ));
    }

    #[test]
    fn test_think_all_catches_external_mutation() {
        let mut world = world();
        let a = drill(&mut world, 0);
        world.registry.get_mut(a).unwrap().powered = false;

        let events = world.think_all();
        assert_eq!(
            events,
            vec![EconomyEvent::ActivityChanged {
                id: a,
                change: ActivityChange::Deactivated
            }]
        );
    }

    #[test]
    fn test_run_frame_ticks_once_per_period() {
        let mut world = world();
        drill(&mut world, 0);

        assert!(world.run_frame().economy.is_some());
        world.advance_time(500);
        assert!(world.run_frame().economy.is_none());
        world.advance_time(500);
        assert!(world.run_frame().economy.is_some());

        // Two ticks at factor ~1 with one isolated drill
        let bp = world.ledger().pool(Team::Humans).unwrap().build_points;
        assert!(bp > 1.9 && bp <= 2.0, "unexpected build points {bp}");
    }

    #[test]
    fn test_players_receive_published_values() {
        let mut world = world();
        drill(&mut world, 0);
        let human = world.connect_player(Team::Humans);
        let spectator = world.connect_player(Team::None);

        world.run_frame();

        assert_eq!(world.player(human).unwrap().view.encoded_team_efficiency, 100);
        assert_eq!(world.player(spectator).unwrap().view.encoded_team_efficiency, 0);

        world.set_player_team(spectator, Team::Humans).unwrap();
        world.advance_time(1000);
        world.run_frame();
        assert_eq!(world.player(spectator).unwrap().view.encoded_team_efficiency, 100);

        assert!(world.disconnect_player(human).is_ok());
        assert!(world.player(human).is_none());
        assert!(matches!(
            world.set_player_team(human, Team::Aliens),
            Err(EconomyError::PlayerNotFound(_))
        ));
    }

    #[test]
    fn test_start_match_resets_decay() {
        let mut world = world();
        world.advance_time(10 * 60_000);
        world.start_match();
        world.run_frame();
        assert_eq!(world.economy().mine_rate, 60.0);
    }

    #[test]
    fn test_serialize_round_trip_preserves_hash() {
        let mut world = world();
        drill(&mut world, 0);
        drill(&mut world, 300);
        world.connect_player(Team::Humans);
        world.run_frame();

        let bytes = world.serialize().unwrap();
        let restored = SimulationWorld::deserialize(&bytes).unwrap();
        assert_eq!(restored.state_hash(), world.state_hash());
    }

    #[test]
    fn test_valuation_passthrough() {
        let mut world = world();
        let a = drill(&mut world, 0);
        world.mark_for_deconstruction(a, true).unwrap();
        assert_eq!(world.marked_build_points(Team::Humans), 10);
        assert_eq!(world.buildable_resource_value().humans, 10);
    }
}
