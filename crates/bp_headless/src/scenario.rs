//! Scenario loading and configuration.
//!
//! A scenario is a RON document describing an economy config, the
//! structures standing at level time 0, the connected players, and a
//! timeline of actions applied while the runner advances the clock.
//!
//! Structures are referenced by their placement index: initial structures
//! first, in file order, then every `Place` action in timeline order.

use std::path::Path;

use bp_core::components::StructureKind;
use bp_core::config::EconomyConfig;
use bp_core::error::EconomyError;
use bp_core::math::Vec3Fixed;
use bp_core::teams::Team;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default host frame length, 100 ms.
pub const DEFAULT_FRAME_MS: u64 = 100;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Economy config rejected.
    #[error("Invalid economy settings: {0}")]
    Economy(#[from] EconomyError),
    /// Structurally invalid scenario.
    #[error("Invalid scenario: {0}")]
    Invalid(String),
}

fn default_true() -> bool {
    true
}

fn default_frame_ms() -> u64 {
    DEFAULT_FRAME_MS
}

/// A structure standing at level time 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructurePlacement {
    /// Structure type.
    pub kind: StructureKind,
    /// World position (x, y, z).
    pub position: (f32, f32, f32),
    /// Construction finished.
    #[serde(default = "default_true")]
    pub spawned: bool,
    /// Receives power.
    #[serde(default = "default_true")]
    pub powered: bool,
}

impl StructurePlacement {
    /// Finished, powered structure at `position`.
    #[must_use]
    pub fn new(kind: StructureKind, position: (f32, f32, f32)) -> Self {
        Self {
            kind,
            position,
            spawned: true,
            powered: true,
        }
    }

    /// Position in world coordinates.
    #[must_use]
    pub fn world_position(&self) -> Vec3Fixed {
        let (x, y, z) = self.position;
        Vec3Fixed::from_f32(x, y, z)
    }
}

/// Something that happens during playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScenarioAction {
    /// Start the match clock; the global rate decays from here.
    StartMatch,
    /// Place a new structure.
    Place {
        /// Structure type.
        kind: StructureKind,
        /// World position (x, y, z).
        position: (f32, f32, f32),
        /// Construction finished.
        #[serde(default)]
        spawned: bool,
        /// Receives power.
        #[serde(default = "default_true")]
        powered: bool,
    },
    /// Finish construction.
    Complete {
        /// Placement index.
        structure: usize,
    },
    /// Switch power.
    SetPowered {
        /// Placement index.
        structure: usize,
        /// New power state.
        powered: bool,
    },
    /// Deal damage; the structure dies at zero health.
    Damage {
        /// Placement index.
        structure: usize,
        /// Damage dealt.
        amount: i32,
    },
    /// Destroy outright.
    Kill {
        /// Placement index.
        structure: usize,
    },
    /// Remove at the owning team's request.
    Deconstruct {
        /// Placement index.
        structure: usize,
    },
    /// Flag for deconstruction.
    Mark {
        /// Placement index.
        structure: usize,
        /// Flag value.
        marked: bool,
    },
    /// Grant (or with a negative amount, spend) build points.
    AddBuildPoints {
        /// Receiving team.
        team: Team,
        /// Amount.
        amount: f32,
    },
    /// Connect a player.
    ConnectPlayer {
        /// Player's team.
        team: Team,
    },
}

/// An action scheduled at a level time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedAction {
    /// Level time in milliseconds.
    pub at_ms: u64,
    /// What happens.
    pub action: ScenarioAction,
}

/// A complete scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Economy balance.
    #[serde(default)]
    pub config: EconomyConfig,
    /// Level time to play until, inclusive.
    pub duration_ms: u64,
    /// Host frame length.
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,
    /// Structures standing at level time 0.
    #[serde(default)]
    pub structures: Vec<StructurePlacement>,
    /// Players connected at level time 0.
    #[serde(default)]
    pub players: Vec<Team>,
    /// Timeline.
    #[serde(default)]
    pub timeline: Vec<TimedAction>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "Empty".to_string(),
            description: String::new(),
            config: EconomyConfig::default(),
            duration_ms: 60_000,
            frame_ms: DEFAULT_FRAME_MS,
            structures: Vec::new(),
            players: Vec::new(),
            timeline: Vec::new(),
        }
    }
}

impl Scenario {
    /// Load and validate a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse and validate a scenario from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check the config and the timeline.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.config.validate()?;

        if self.frame_ms == 0 {
            return Err(ScenarioError::Invalid("frame_ms must be positive".to_string()));
        }

        // Indices must refer to a placement made at or before the action
        let mut placed = self.structures.len();
        for timed in self.sorted_timeline() {
            if let Some(index) = timed.action.structure_index() {
                if index >= placed {
                    return Err(ScenarioError::Invalid(format!(
                        "action at {} ms refers to structure {index}, only {placed} placed so far",
                        timed.at_ms
                    )));
                }
            }
            if matches!(timed.action, ScenarioAction::Place { .. }) {
                placed += 1;
            }
        }

        Ok(())
    }

    /// Timeline entries in level-time order; ties keep file order.
    #[must_use]
    pub fn sorted_timeline(&self) -> Vec<TimedAction> {
        let mut timeline = self.timeline.clone();
        timeline.sort_by_key(|t| t.at_ms);
        timeline
    }

    /// Two contested mining fields with both cores standing.
    #[must_use]
    pub fn contested_fields() -> Self {
        let mut structures = vec![
            StructurePlacement::new(StructureKind::Reactor, (-3000.0, 0.0, 0.0)),
            StructurePlacement::new(StructureKind::Overmind, (3000.0, 0.0, 0.0)),
        ];
        for i in 0..4 {
            let offset = i as f32 * 600.0;
            structures.push(StructurePlacement::new(StructureKind::Drill, (-1000.0, offset, 0.0)));
            structures.push(StructurePlacement::new(StructureKind::Leech, (1000.0, offset, 0.0)));
        }

        Self {
            name: "Contested Fields".to_string(),
            description: "Two mining fields, one drill destroyed mid-match".to_string(),
            duration_ms: 10 * 60_000,
            structures,
            players: vec![Team::Humans, Team::Aliens],
            timeline: vec![
                TimedAction {
                    at_ms: 0,
                    action: ScenarioAction::StartMatch,
                },
                TimedAction {
                    at_ms: 120_000,
                    action: ScenarioAction::Kill { structure: 2 },
                },
                TimedAction {
                    at_ms: 180_000,
                    action: ScenarioAction::Place {
                        kind: StructureKind::Drill,
                        position: (-1000.0, 0.0, 0.0),
                        spawned: true,
                        powered: true,
                    },
                },
            ],
            ..Default::default()
        }
    }
}

impl ScenarioAction {
    /// Placement index this action refers to, if any.
    #[must_use]
    pub const fn structure_index(&self) -> Option<usize> {
        match self {
            Self::Complete { structure }
            | Self::SetPowered { structure, .. }
            | Self::Damage { structure, .. }
            | Self::Kill { structure }
            | Self::Deconstruct { structure }
            | Self::Mark { structure, .. } => Some(*structure),
            Self::StartMatch
            | Self::Place { .. }
            | Self::AddBuildPoints { .. }
            | Self::ConnectPlayer { .. } => None,
        }
    }
}
