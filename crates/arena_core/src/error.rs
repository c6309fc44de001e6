//! Error types for the arena simulation.
//!
//! The per-tick update never fails; every behavioral dead end is a
//! branch with a fallback. Errors only surface at the boundary: loading
//! configuration and addressing entities by id from outside the core.

use thiserror::Error;

use crate::components::{CastleId, UnitId};

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Top-level error type for the simulation core.
#[derive(Debug, Error)]
pub enum SimError {
    /// No live unit has this id.
    #[error("Unit not found: {0:?}")]
    UnitNotFound(UnitId),

    /// No standing castle has this id.
    #[error("Castle not found: {0:?}")]
    CastleNotFound(CastleId),

    /// World bounds cannot host any unit.
    #[error("Invalid world config: {0}")]
    InvalidConfig(String),

    /// Failed to read a config file.
    #[error("Failed to read config file: {0}")]
    ConfigRead(#[from] std::io::Error),

    /// Failed to parse a RON config.
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),
}
