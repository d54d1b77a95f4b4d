//! Error types for the build point economy.

use thiserror::Error;

use crate::components::EntityId;
use crate::replication::PlayerId;
use crate::teams::Team;

/// Result type alias using [`EconomyError`].
pub type Result<T> = std::result::Result<T, EconomyError>;

/// Top-level error type for all economy errors.
///
/// Most economy operations degrade permissively (clamping, zero rates).
/// These variants surface the cases where a caller may want to know that
/// nothing happened.
#[derive(Debug, Error)]
pub enum EconomyError {
    /// Ledger operation addressed a team that owns no resource pool.
    #[error("Team {0:?} has no build point pool")]
    UnplayableTeam(Team),

    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Invalid player slot reference.
    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// The entity exists but does not mine.
    #[error("Entity {0} is not a mining structure")]
    NotMiningStructure(EntityId),

    /// Configuration value out of range.
    #[error("Invalid economy configuration: {0}")]
    InvalidConfig(String),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Invalid world state.
    #[error("Invalid world state: {0}")]
    InvalidState(String),
}
