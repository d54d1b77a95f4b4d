//! Fixed-point transport encodings.
//!
//! The domain model keeps `f32` rates and an explicit active flag. These
//! functions produce the compact integers sent to observers. On the wire
//! an encoded structure rate of 0 is the "not mining" signal, so an active
//! structure always encodes to at least 1.

use serde::{Deserialize, Serialize};

use crate::components::Structure;
use crate::teams::Team;

/// Identifier for a connected player slot.
pub type PlayerId = u32;

/// Replicated mining state of one structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct StructureTransport {
    /// `floor(mine_rate * 1000)`, at least 1 while active, else 0.
    pub encoded_rate: i32,
    /// `floor(mine_efficiency * 100)`.
    pub encoded_efficiency: i32,
}

impl StructureTransport {
    /// Whether observers should show the structure as mining.
    #[must_use]
    pub const fn is_mining(&self) -> bool {
        self.encoded_rate > 0
    }
}

/// Encode a structure's mining state for transport.
#[must_use]
pub fn encode_structure(structure: &Structure) -> StructureTransport {
    if !structure.is_mining_structure() || !structure.mining_active {
        return StructureTransport::default();
    }

    StructureTransport {
        encoded_rate: ((structure.mine_rate * 1000.0).floor() as i32).max(1),
        encoded_efficiency: (structure.mine_efficiency * 100.0).floor() as i32,
    }
}

/// Encode the global mine rate, `round(rate * 10)`.
#[must_use]
pub fn encode_global_rate(mine_rate: f32) -> i16 {
    (mine_rate * 10.0).round() as i16
}

/// Encode a team efficiency for a player, 0 for unplayable teams.
#[must_use]
pub fn encode_team_efficiency(team: Team, efficiency: f32) -> i16 {
    if team.is_playable() {
        (efficiency * 100.0).round() as i16
    } else {
        0
    }
}

/// Per-player replicated economy values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct PlayerEconomyView {
    /// Global mine rate, tenths of a build point per minute.
    pub encoded_mine_rate: i16,
    /// Own team's efficiency in percent; 0 when on no team.
    pub encoded_team_efficiency: i16,
}

/// A connected player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSlot {
    /// Slot identifier.
    pub id: PlayerId,
    /// Current team; [`Team::None`] for spectators.
    pub team: Team,
    /// Last values published to this player.
    pub view: PlayerEconomyView,
}

impl PlayerSlot {
    /// Create a slot with an empty view.
    #[must_use]
    pub const fn new(id: PlayerId, team: Team) -> Self {
        Self {
            id,
            team,
            view: PlayerEconomyView {
                encoded_mine_rate: 0,
                encoded_team_efficiency: 0,
            },
        }
    }
}
