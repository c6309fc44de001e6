//! Scenario loading and configuration.
//!
//! Scenarios define the starting arena for headless runs: bounds, seed,
//! castles, units, the orchard and how a match is decided.

use std::f32::consts::TAU;
use std::path::Path;

use arena_core::components::{Personality, Skills};
use arena_core::config::WorldConfig;
use arena_core::error::SimError;
use arena_core::factions::Team;
use arena_core::math::Vec2;
use arena_core::simulation::Simulation;
use arena_core::unit::UnitSpawn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

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
    /// The scenario parsed but describes an unusable arena.
    #[error("Invalid scenario: {0}")]
    Invalid(String),
    /// The simulation rejected the scenario.
    #[error(transparent)]
    Core(#[from] SimError),
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Arena bounds.
    #[serde(default)]
    pub world: WorldConfig,
    /// Seed used when the caller does not supply one.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Start from the standard two-castle skirmish before adding the
    /// placements below.
    #[serde(default)]
    pub standard_setup: bool,
    /// Per-team placements.
    #[serde(default)]
    pub teams: Vec<TeamSetup>,
    /// Orchard layout.
    #[serde(default)]
    pub trees: TreeLayout,
    /// Animals released at random spots, on top of the standard setup's herd.
    #[serde(default)]
    pub animals: usize,
    /// How a match ends.
    #[serde(default)]
    pub victory: VictoryConditions,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Look up a built-in scenario by name.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "skirmish" | "skirmish_1v1" => Some(Self::skirmish()),
            "open_field" => Some(Self::open_field()),
            _ => None,
        }
    }

    /// The standard skirmish: two named castles, a leader, worker and
    /// fighter per side and a five-tree orchard.
    #[must_use]
    pub fn skirmish() -> Self {
        Self {
            name: "Standard Skirmish".to_string(),
            description: "Camelot against Mordor with a central orchard".to_string(),
            world: WorldConfig::default(),
            seed: None,
            standard_setup: true,
            teams: Vec::new(),
            trees: TreeLayout::None,
            animals: 0,
            victory: VictoryConditions::default(),
        }
    }

    /// Two fighter squads and no economy.
    #[must_use]
    pub fn open_field() -> Self {
        let world = WorldConfig::default();
        let mid = world.height / 2.0;
        let squad = |team, x: f32, personality| TeamSetup {
            team,
            attack_mode: true,
            castles: Vec::new(),
            units: vec![UnitPlacement {
                role: Role::Fighter,
                position: (x, mid),
                size: 30.0,
                count: 6,
                personality: Some(personality),
            }],
        };
        Self {
            name: "Open Field".to_string(),
            description: "Archer squads meet without castles".to_string(),
            world,
            seed: None,
            standard_setup: false,
            teams: vec![
                squad(Team::Blue, 300.0, Personality::Aggressive),
                squad(Team::Red, world.width - 300.0, Personality::Defensive),
            ],
            trees: TreeLayout::None,
            animals: 0,
            victory: VictoryConditions {
                elimination: true,
                time_limit_ticks: Some(20 * 60 * 60),
            },
        }
    }

    /// Check the scenario can be built.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.world.validate()?;

        for (i, setup) in self.teams.iter().enumerate() {
            if self.teams[..i].iter().any(|t| t.team == setup.team) {
                return Err(ScenarioError::Invalid(format!(
                    "team {} is listed twice",
                    setup.team
                )));
            }
            for placement in &setup.units {
                if !(placement.size.is_finite() && placement.size > 0.0) {
                    return Err(ScenarioError::Invalid(format!(
                        "unit size {} must be positive",
                        placement.size
                    )));
                }
                self.check_on_canvas(placement.position)?;
            }
            for castle in &setup.castles {
                self.check_on_canvas(castle.position)?;
            }
        }

        if let TreeLayout::Points(points) = &self.trees {
            for &p in points {
                self.check_on_canvas(p)?;
            }
        }
        if self.victory.time_limit_ticks == Some(0) {
            return Err(ScenarioError::Invalid("time limit must be positive".to_string()));
        }
        Ok(())
    }

    fn check_on_canvas(&self, (x, y): (f32, f32)) -> Result<(), ScenarioError> {
        if self.world.on_canvas(Vec2::new(x, y)) {
            Ok(())
        } else {
            Err(ScenarioError::Invalid(format!(
                "({x}, {y}) lies outside the {}x{} arena",
                self.world.width, self.world.height
            )))
        }
    }

    /// Build a simulation from this scenario.
    ///
    /// `seed` overrides the scenario's own seed; with neither, the
    /// simulation is seeded from entropy.
    pub fn build(&self, seed: Option<u64>) -> Result<Simulation, ScenarioError> {
        self.validate()?;
        let mut sim = match seed.or(self.seed) {
            Some(seed) => Simulation::with_seed(self.world, seed)?,
            None => Simulation::new(self.world)?,
        };

        if self.standard_setup {
            sim.spawn_standard_skirmish();
        }

        for setup in &self.teams {
            sim.set_attack_mode(setup.team, setup.attack_mode);
            for castle in &setup.castles {
                let (x, y) = castle.position;
                sim.spawn_castle(setup.team, Vec2::new(x, y), castle.food, castle.name.clone());
            }
            for placement in &setup.units {
                let (x, y) = placement.position;
                for _ in 0..placement.count {
                    let mut spawn =
                        UnitSpawn::new(setup.team, Vec2::new(x, y), placement.size, placement.role.skills());
                    if let Some(personality) = placement.personality {
                        spawn = spawn.with_personality(personality);
                    }
                    sim.spawn_unit(spawn);
                }
            }
        }

        match &self.trees {
            TreeLayout::None => {}
            TreeLayout::Ring { count, radius } => {
                let center = self.world.center();
                for i in 0..*count {
                    let angle = TAU * i as f32 / *count as f32;
                    sim.spawn_tree(center.offset(angle, *radius));
                }
            }
            TreeLayout::Points(points) => {
                for &(x, y) in points {
                    sim.spawn_tree(Vec2::new(x, y));
                }
            }
        }

        sim.spawn_random_animals(self.animals);

        tracing::debug!(
            scenario = %self.name,
            units = sim.world().unit_count(),
            animals = sim.world().animals().count(),
            "Scenario built"
        );
        Ok(sim)
    }
}

/// Setup for a single team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSetup {
    /// Which team.
    pub team: Team,
    /// Start in global attack mode.
    #[serde(default)]
    pub attack_mode: bool,
    /// Starting castles.
    #[serde(default)]
    pub castles: Vec<CastlePlacement>,
    /// Starting units.
    #[serde(default)]
    pub units: Vec<UnitPlacement>,
}

/// A castle at scenario start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastlePlacement {
    /// Position (x, y).
    pub position: (f32, f32),
    /// Starting food.
    #[serde(default)]
    pub food: u32,
    /// Town name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Starting skill sets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Role {
    /// Fighter skill 1.
    Fighter,
    /// Worker skill 1.
    Worker,
    /// Leader skill 1.
    Leader,
    /// Leader skill 2 and trainer skill 1, as in the standard setup.
    Commander,
    /// No skills.
    Peasant,
    /// Explicit skills.
    Custom(Skills),
}

impl Role {
    /// Skills this role starts with.
    #[must_use]
    pub const fn skills(self) -> Skills {
        match self {
            Self::Fighter => Skills::fighter(),
            Self::Worker => Skills::worker(),
            Self::Leader => Skills::leader(),
            Self::Commander => Skills {
                leader: 2.0,
                trainer: 1.0,
                ..Skills::NONE
            },
            Self::Peasant => Skills::NONE,
            Self::Custom(skills) => skills,
        }
    }
}

/// A group of identical units at scenario start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitPlacement {
    /// Starting skills.
    pub role: Role,
    /// Position (x, y); stacked units spread out on their own.
    pub position: (f32, f32),
    /// Body size.
    #[serde(default = "default_unit_size")]
    pub size: f32,
    /// Number of units to spawn.
    #[serde(default = "default_unit_count")]
    pub count: u32,
    /// Fixed temperament, random when absent.
    #[serde(default)]
    pub personality: Option<Personality>,
}

fn default_unit_size() -> f32 {
    30.0
}

fn default_unit_count() -> u32 {
    1
}

/// Where trees stand.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum TreeLayout {
    /// No trees beyond the standard setup's.
    #[default]
    None,
    /// Evenly spaced on a circle round the arena centre.
    Ring {
        /// Number of trees.
        count: u32,
        /// Circle radius.
        radius: f32,
    },
    /// Explicit positions.
    Points(Vec<(f32, f32)>),
}

/// Victory conditions for the scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictoryConditions {
    /// A team with no units and no castles loses.
    pub elimination: bool,
    /// Optional time limit in ticks; reaching it is a draw.
    pub time_limit_ticks: Option<u64>,
}

impl Default for VictoryConditions {
    fn default() -> Self {
        Self {
            elimination: true,
            time_limit_ticks: Some(10 * 60 * 60),
        }
    }
}
