//! Team build point pools.
//!
//! Each playable team has a spendable pool and a virtual "mined" pool
//! tracking how much of the income came from mining. The mined pool is
//! what a destroyed mining structure's share is measured against.
//!
//! Both pools are clamped at zero on every mutation.

use serde::{Deserialize, Serialize};

use crate::error::{EconomyError, Result};
use crate::teams::Team;

/// Changes smaller than this are not logged.
pub const LOG_THRESHOLD: f32 = 0.5;

/// Which of a team's two pools an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pool {
    /// Spendable build points.
    Spendable,
    /// Virtual pool of build points that originated from mining.
    Mined,
}

/// Resource state for one team.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TeamResourcePool {
    /// Spendable build points.
    pub build_points: f32,
    /// Build points attributed to mining.
    pub mined_build_points: f32,
    /// Aggregate mining efficiency, recomputed every economy tick.
    pub mine_efficiency: f32,
}

impl TeamResourcePool {
    /// Create a pool with a starting balance.
    #[must_use]
    pub const fn new(build_points: f32) -> Self {
        Self {
            build_points,
            mined_build_points: 0.0,
            mine_efficiency: 0.0,
        }
    }
}

/// Build points removed when a mining structure is lost.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Clawback {
    /// Deducted from the spendable pool.
    pub spendable: f32,
    /// Deducted from the mined pool.
    pub mined: f32,
}

/// Authoritative team resource pools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceLedger {
    pools: [TeamResourcePool; 2],
}

impl ResourceLedger {
    /// Create a ledger with both teams at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool for a playable team.
    #[must_use]
    pub fn pool(&self, team: Team) -> Option<&TeamResourcePool> {
        team.pool_index().map(|i| &self.pools[i])
    }

    /// Mutable pool for a playable team.
    pub fn pool_mut(&mut self, team: Team) -> Option<&mut TeamResourcePool> {
        match team.pool_index() {
            Some(i) => Some(&mut self.pools[i]),
            None => None,
        }
    }

    fn pool_or_err(&mut self, team: Team) -> Result<&mut TeamResourcePool> {
        self.pool_mut(team).ok_or_else(|| {
            tracing::debug!(%team, "Ignoring build point change for unplayable team");
            EconomyError::UnplayableTeam(team)
        })
    }

    /// Add (or with a negative amount, remove) build points from one pool.
    ///
    /// The other pool is untouched. Unplayable teams are left alone and
    /// reported as [`EconomyError::UnplayableTeam`].
    pub fn modify(&mut self, team: Team, amount: f32, pool: Pool) -> Result<()> {
        let entry = self.pool_or_err(team)?;
        match pool {
            Pool::Spendable => entry.build_points = (entry.build_points + amount).max(0.0),
            Pool::Mined => {
                entry.mined_build_points = (entry.mined_build_points + amount).max(0.0);
            }
        }
        Ok(())
    }

    /// Adds or removes spendable build points.
    pub fn add_build_points(&mut self, team: Team, amount: f32) -> Result<()> {
        if amount.abs() > LOG_THRESHOLD {
            tracing::info!(%team, amount, "Add build points");
        }
        self.modify(team, amount, Pool::Spendable)
    }

    /// Adds or removes build points from the mined pool.
    pub fn add_mined_build_points(&mut self, team: Team, amount: f32) -> Result<()> {
        if amount.abs() > LOG_THRESHOLD {
            tracing::info!(%team, amount, "Add mined build points");
        }
        self.modify(team, amount, Pool::Mined)
    }

    /// Whether a team can pay `amount` build points. The sign is ignored.
    #[must_use]
    pub fn can_afford(&self, team: Team, amount: f32) -> bool {
        self.pool(team)
            .is_some_and(|pool| amount.abs() <= pool.build_points)
    }

    /// Spendable build points truncated to an integer, 0 for unplayable teams.
    #[must_use]
    pub fn build_points_int(&self, team: Team) -> i32 {
        self.pool(team).map_or(0, |pool| pool.build_points as i32)
    }

    /// Charge a team for a destroyed mining structure.
    ///
    /// The spendable pool loses the structure's share of the mined pool
    /// (capped at everything); the mined pool loses the structure's total.
    pub fn apply_death_clawback(&mut self, team: Team, structure_mined: f32) -> Result<Clawback> {
        let entry = *self.pool_or_err(team)?;

        let spendable = if entry.mined_build_points > 0.0 {
            let share = (structure_mined / entry.mined_build_points).min(1.0);
            share * entry.build_points
        } else {
            0.0
        };

        self.add_build_points(team, -spendable)?;
        self.add_mined_build_points(team, -structure_mined)?;

        Ok(Clawback {
            spendable,
            mined: structure_mined,
        })
    }

    /// Release a deconstructed mining structure's share of the mined pool.
    ///
    /// The remaining structures take over its account; spendable points
    /// are not touched.
    pub fn apply_deconstruction(&mut self, team: Team, structure_mined: f32) -> Result<Clawback> {
        self.add_mined_build_points(team, -structure_mined)?;
        Ok(Clawback {
            spendable: 0.0,
            mined: structure_mined,
        })
    }
}
