//! Economy balance configuration.
//!
//! The balance constants are owned by the game's configuration layer and
//! handed to the core. They can be built in code or loaded from RON.
//!
//! # Example RON
//!
//! ```ron
//! EconomyConfig(
//!     initial_mine_rate: 8.0,
//!     mine_rate_half_life_minutes: 20.0,
//!     minimum_mine_rate_percent: 50.0,
//!     interference_range: 1000.0,
//!     calculation_period_ms: 1000,
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::components::StructureKind;
use crate::error::{EconomyError, Result};

/// Default interval between economy ticks, in milliseconds.
pub const DEFAULT_CALCULATION_PERIOD_MS: u64 = 1000;

/// Health used for kinds missing from the buildable table.
const FALLBACK_HEALTH: i32 = 100;

/// Cost and durability of one structure kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildableData {
    /// Structure kind these attributes apply to.
    pub kind: StructureKind,
    /// Build point cost to construct.
    pub build_points: i32,
    /// Maximum health points.
    pub health: i32,
}

impl BuildableData {
    /// Create a buildable attribute record.
    #[must_use]
    pub const fn new(kind: StructureKind, build_points: i32, health: i32) -> Self {
        Self {
            kind,
            build_points,
            health,
        }
    }
}

/// Balance parameters for the mining economy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Global mine rate at match start, build points per minute.
    pub initial_mine_rate: f32,
    /// Minutes for the global mine rate to halve.
    pub mine_rate_half_life_minutes: f32,
    /// Guaranteed team efficiency while the core structure stands, percent.
    pub minimum_mine_rate_percent: f32,
    /// Radius of a mining structure's area of effect. Zero disables interference.
    pub interference_range: f32,
    /// Interval between economy ticks, in milliseconds.
    pub calculation_period_ms: u64,
    /// Cost and health per structure kind.
    pub buildables: Vec<BuildableData>,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            initial_mine_rate: 8.0,
            mine_rate_half_life_minutes: 20.0,
            minimum_mine_rate_percent: 50.0,
            interference_range: 1000.0,
            calculation_period_ms: DEFAULT_CALCULATION_PERIOD_MS,
            buildables: default_buildables(),
        }
    }
}

fn default_buildables() -> Vec<BuildableData> {
    vec![
        BuildableData::new(StructureKind::Drill, 10, 500),
        BuildableData::new(StructureKind::Leech, 10, 500),
        BuildableData::new(StructureKind::Reactor, 0, 1000),
        BuildableData::new(StructureKind::Overmind, 0, 1000),
        BuildableData::new(StructureKind::Telenode, 8, 250),
        BuildableData::new(StructureKind::Egg, 8, 250),
        BuildableData::new(StructureKind::Turret, 8, 190),
        BuildableData::new(StructureKind::AcidTube, 8, 300),
    ]
}

impl EconomyConfig {
    /// Parse a configuration from a RON string and validate it.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron).map_err(|e| EconomyError::DataParseError {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| EconomyError::DataParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config: Self = ron::from_str(&contents).map_err(|e| EconomyError::DataParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| EconomyError::InvalidConfig(format!("Failed to serialize config: {e}")))
    }

    /// Reject values that would make the economy produce NaN or stall.
    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("initial_mine_rate", self.initial_mine_rate),
            ("mine_rate_half_life_minutes", self.mine_rate_half_life_minutes),
            ("minimum_mine_rate_percent", self.minimum_mine_rate_percent),
            ("interference_range", self.interference_range),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(EconomyError::InvalidConfig(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }

        if self.initial_mine_rate < 0.0 {
            return Err(EconomyError::InvalidConfig(format!(
                "initial_mine_rate must not be negative, got {}",
                self.initial_mine_rate
            )));
        }
        if self.mine_rate_half_life_minutes <= 0.0 {
            return Err(EconomyError::InvalidConfig(format!(
                "mine_rate_half_life_minutes must be positive, got {}",
                self.mine_rate_half_life_minutes
            )));
        }
        if self.minimum_mine_rate_percent < 0.0 {
            return Err(EconomyError::InvalidConfig(format!(
                "minimum_mine_rate_percent must not be negative, got {}",
                self.minimum_mine_rate_percent
            )));
        }
        if self.calculation_period_ms == 0 {
            return Err(EconomyError::InvalidConfig(
                "calculation_period_ms must be positive".to_string(),
            ));
        }
        for data in &self.buildables {
            if data.health <= 0 {
                return Err(EconomyError::InvalidConfig(format!(
                    "{:?} health must be positive, got {}",
                    data.kind, data.health
                )));
            }
        }

        Ok(())
    }

    /// Minimum team efficiency as a fraction.
    #[must_use]
    pub fn minimum_efficiency(&self) -> f32 {
        self.minimum_mine_rate_percent / 100.0
    }

    /// Radius within which two mining structures interfere.
    #[must_use]
    pub fn neighbor_radius(&self) -> f32 {
        self.interference_range * 2.0
    }

    /// Attributes for a structure kind.
    #[must_use]
    pub fn buildable(&self, kind: StructureKind) -> Option<&BuildableData> {
        self.buildables.iter().find(|b| b.kind == kind)
    }

    /// Maximum health for a structure kind.
    #[must_use]
    pub fn max_health(&self, kind: StructureKind) -> i32 {
        self.buildable(kind).map_or(FALLBACK_HEALTH, |b| b.health)
    }

    /// Build point cost for a structure kind (zero when unlisted).
    #[must_use]
    pub fn build_points(&self, kind: StructureKind) -> i32 {
        self.buildable(kind).map_or(0, |b| b.build_points)
    }
}
