//! # Build Point Core
//!
//! Deterministic build point economy for a two-team base-building match.
//!
//! Mining structures (human drills, alien leeches) produce build points at
//! a global rate that decays over the match. Nearby mining structures
//! interfere with each other, so a team earns most by spreading out. A team
//! whose miners fall below a minimum efficiency is topped up as long as its
//! core structure stands. Destroyed miners take a share of their team's
//! build points with them.
//!
//! This crate contains **only** the economy logic:
//! - No IO beyond loading config files
//! - No networking (replicated values are computed, not sent)
//! - No wall clock (time is supplied by the host)
//!
//! ## Crate Structure
//!
//! - [`components`] - Structure kinds and per-structure state
//! - [`registry`] - Structure storage and spatial queries
//! - [`interference`] - Distance-based rate modifier
//! - [`mining`] - Rate recalculation, neighbor notification, prediction
//! - [`ledger`] - Per-team build point pools
//! - [`economy`] - Periodic economy tick
//! - [`valuation`] - Build point value of standing structures
//! - [`replication`] - Transport encodings
//! - [`world`] - The simulation world tying it together

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod components;
pub mod config;
pub mod economy;
pub mod error;
pub mod interference;
pub mod ledger;
pub mod math;
pub mod mining;
pub mod registry;
pub mod replication;
pub mod teams;
pub mod valuation;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::components::{EntityId, MiningKind, Structure, StructureKind};
    pub use crate::config::{BuildableData, EconomyConfig};
    pub use crate::economy::{EconomyReport, GlobalEconomyState, MatchClock, TeamTickReport};
    pub use crate::error::{EconomyError, Result};
    pub use crate::ledger::{Clawback, Pool, ResourceLedger, TeamResourcePool};
    pub use crate::math::{Fixed, Vec3Fixed};
    pub use crate::mining::{ActivityChange, RateContext};
    pub use crate::registry::StructureRegistry;
    pub use crate::replication::{PlayerEconomyView, PlayerId, PlayerSlot, StructureTransport};
    pub use crate::teams::Team;
    pub use crate::valuation::TeamValues;
    pub use crate::world::{EconomyEvent, FrameEvents, SimulationWorld, StructureSpawnParams};
}
