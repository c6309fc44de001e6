//! # Arena Core
//!
//! Agent simulation core for a two-team medieval arena.
//!
//! Autonomous units perceive through a forward vision cone, pick
//! waypoints by utility, manage energy and sleep, fight with simulated
//! arrows, gather apples to feed their castles and follow orders from
//! their leaders. Castles turn food into new units.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO beyond loading a [`WorldConfig`](config::WorldConfig) file
//! - All randomness from one seedable generator
//!
//! ## Crate Structure
//!
//! - [`simulation`] - The tick loop and external entry points
//! - [`world`] - Entity storage and shared queries
//! - [`perception`] - Vision cone and waypoint scoring
//! - [`movement`] - Steering, avoidance and physics
//! - [`energy`] - Energy, sleep and rest breaks
//! - [`combat`] / [`projectile`] - Archery and arrow flight
//! - [`economy`] - Trees, apples and the worker cycle
//! - [`animals`] - Grazing herds
//! - [`production`] - Castles, recruitment and training
//! - [`leadership`] - Orders and strategic movement
//! - [`tuning`] - Behavioral constants

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod animals;
pub mod combat;
pub mod components;
pub mod config;
pub mod economy;
pub mod energy;
pub mod error;
pub mod factions;
pub mod leadership;
pub mod math;
pub mod memory;
pub mod movement;
pub mod perception;
pub mod production;
pub mod projectile;
pub mod simulation;
pub mod snapshot;
pub mod stats;
pub mod tuning;
pub mod unit;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::animals::Animal;
    pub use crate::combat::CombatEvent;
    pub use crate::components::*;
    pub use crate::config::WorldConfig;
    pub use crate::economy::{Apple, EconomyEvent, Tree};
    pub use crate::error::{Result, SimError};
    pub use crate::factions::{PerTeam, Team};
    pub use crate::leadership::OrderEvent;
    pub use crate::math::Vec2;
    pub use crate::production::{Castle, ProductionEvent, Recruit};
    pub use crate::simulation::{CastleDestroyed, Simulation, TickEvents};
    pub use crate::snapshot::WorldSnapshot;
    pub use crate::stats::{TeamCombatStats, TeamSummary};
    pub use crate::unit::{Unit, UnitSpawn};
    pub use crate::world::World;
}
