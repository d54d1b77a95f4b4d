//! Team identifiers.

use serde::{Deserialize, Serialize};

/// Team affiliation for players and structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Team {
    /// Unassigned players and spectators.
    None,
    /// The alien team.
    Aliens,
    /// The human team.
    Humans,
}

impl Team {
    /// Teams that own a build point pool, in ledger order.
    pub const PLAYABLE: [Self; 2] = [Self::Aliens, Self::Humans];

    /// Whether this team owns a build point pool.
    #[must_use]
    pub const fn is_playable(self) -> bool {
        matches!(self, Self::Aliens | Self::Humans)
    }

    /// Index into per-team arrays, `None` for unplayable teams.
    #[must_use]
    pub const fn pool_index(self) -> Option<usize> {
        match self {
            Self::Aliens => Some(0),
            Self::Humans => Some(1),
            Self::None => None,
        }
    }

    /// Get the display name for this team.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::None => "spectators",
            Self::Aliens => "aliens",
            Self::Humans => "humans",
        }
    }
}

impl Default for Team {
    fn default() -> Self {
        Self::None
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
