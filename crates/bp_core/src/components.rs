//! Structure data definitions.
//!
//! Structures are plain data. Rate, notification, and ledger behaviour
//! lives in the system modules and operates on these records.

use serde::{Deserialize, Serialize};

use crate::math::Vec3Fixed;
use crate::teams::Team;

/// Unique identifier for entities.
pub type EntityId = u64;

/// The two resource generation structure variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MiningKind {
    /// Human drill.
    Human,
    /// Alien leech.
    Alien,
}

impl MiningKind {
    /// Team whose pool this mining kind feeds.
    #[must_use]
    pub const fn team(self) -> Team {
        match self {
            Self::Human => Team::Humans,
            Self::Alien => Team::Aliens,
        }
    }

    /// Structure kind that carries this mining variant.
    #[must_use]
    pub const fn structure_kind(self) -> StructureKind {
        match self {
            Self::Human => StructureKind::Drill,
            Self::Alien => StructureKind::Leech,
        }
    }
}

/// Buildable structure types known to the economy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StructureKind {
    /// Human resource generation structure.
    Drill,
    /// Alien resource generation structure.
    Leech,
    /// Human core structure; powers the human base.
    Reactor,
    /// Alien core structure.
    Overmind,
    /// Human spawn point.
    Telenode,
    /// Alien spawn point.
    Egg,
    /// Human defensive turret.
    Turret,
    /// Alien defensive structure.
    AcidTube,
}

impl StructureKind {
    /// Every structure kind, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Drill,
        Self::Leech,
        Self::Reactor,
        Self::Overmind,
        Self::Telenode,
        Self::Egg,
        Self::Turret,
        Self::AcidTube,
    ];

    /// Mining variant of this kind, if it mines at all.
    #[must_use]
    pub const fn mining_kind(self) -> Option<MiningKind> {
        match self {
            Self::Drill => Some(MiningKind::Human),
            Self::Leech => Some(MiningKind::Alien),
            _ => None,
        }
    }

    /// Capability check for the rate calculator and notifier.
    #[must_use]
    pub const fn is_mining_structure(self) -> bool {
        self.mining_kind().is_some()
    }

    /// Whether this kind is a team-defining core structure.
    #[must_use]
    pub const fn is_core(self) -> bool {
        matches!(self, Self::Reactor | Self::Overmind)
    }

    /// Team that builds this kind.
    #[must_use]
    pub const fn team(self) -> Team {
        match self {
            Self::Drill | Self::Reactor | Self::Telenode | Self::Turret => Team::Humans,
            Self::Leech | Self::Overmind | Self::Egg | Self::AcidTube => Team::Aliens,
        }
    }

    /// Core structure kind for a team.
    #[must_use]
    pub const fn core_of(team: Team) -> Option<Self> {
        match team {
            Team::Humans => Some(Self::Reactor),
            Team::Aliens => Some(Self::Overmind),
            Team::None => None,
        }
    }
}

/// A buildable structure and its cached mining state.
///
/// `mine_rate` and `mine_efficiency` are derived values kept current by the
/// rate calculator; `mining_active` records the active state seen by the
/// last recalculation so state flips can be detected on the next think.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    /// Unique identifier for this structure.
    pub id: EntityId,
    /// Structure type.
    pub kind: StructureKind,
    /// Owning team.
    pub team: Team,
    /// World position.
    pub position: Vec3Fixed,
    /// Construction has finished.
    pub spawned: bool,
    /// Receives power (always true for alien structures).
    pub powered: bool,
    /// Current health.
    pub health: i32,
    /// Health at full repair.
    pub max_health: i32,
    /// Flagged for deconstruction by its team.
    pub marked_for_deconstruction: bool,
    /// Build points attributed to this structure's lifetime extraction.
    pub mined_build_points: f32,
    /// Absolute mining rate, per minute.
    pub mine_rate: f32,
    /// Fraction of the uninterfered global rate.
    pub mine_efficiency: f32,
    /// Active state at the last rate calculation.
    pub mining_active: bool,
}

impl Structure {
    /// Create an unspawned, powered structure at full health.
    #[must_use]
    pub fn new(id: EntityId, kind: StructureKind, position: Vec3Fixed, max_health: i32) -> Self {
        Self {
            id,
            kind,
            team: kind.team(),
            position,
            spawned: false,
            powered: true,
            health: max_health,
            max_health,
            marked_for_deconstruction: false,
            mined_build_points: 0.0,
            mine_rate: 0.0,
            mine_efficiency: 0.0,
            mining_active: false,
        }
    }

    /// Mining variant, if this structure mines.
    #[must_use]
    pub const fn mining_kind(&self) -> Option<MiningKind> {
        self.kind.mining_kind()
    }

    /// Whether this structure mines.
    #[must_use]
    pub const fn is_mining_structure(&self) -> bool {
        self.kind.is_mining_structure()
    }

    /// Check if the structure is still standing.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Spawned, powered, and alive.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.spawned && self.powered && self.is_alive()
    }

    /// Whether this is an active mining structure (counts for interference).
    #[must_use]
    pub const fn is_active_miner(&self) -> bool {
        self.is_mining_structure() && self.is_active()
    }

    /// Apply damage, clamping health at zero.
    ///
    /// Returns `true` if this damage killed the structure.
    pub fn apply_damage(&mut self, amount: i32) -> bool {
        let was_alive = self.is_alive();
        self.health = self.health.saturating_sub(amount.max(0)).max(0);
        was_alive && !self.is_alive()
    }

    /// Reset cached rate fields to the inactive representation.
    pub fn clear_mining_state(&mut self) {
        self.mine_rate = 0.0;
        self.mine_efficiency = 0.0;
        self.mining_active = false;
    }
}
