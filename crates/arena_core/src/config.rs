//! World bounds configuration.
//!
//! The only runtime-configurable input of the core. Everything else
//! lives in [`tuning`](crate::tuning).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::math::Vec2;

/// Playfield dimensions and the margin units are kept inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Arena width.
    pub width: f32,
    /// Arena height.
    pub height: f32,
    /// Distance from each edge that positions are clamped to.
    pub margin: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            margin: 60.0,
        }
    }
}

impl WorldConfig {
    /// Create a config and check it describes a usable arena.
    pub fn new(width: f32, height: f32, margin: f32) -> Result<Self> {
        let config = Self {
            width,
            height,
            margin,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse a config from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the arena leaves room inside the margins.
    pub fn validate(&self) -> Result<()> {
        if !(self.width.is_finite() && self.height.is_finite() && self.margin.is_finite()) {
            return Err(SimError::InvalidConfig(
                "dimensions must be finite".to_string(),
            ));
        }
        if self.margin < 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "margin {} is negative",
                self.margin
            )));
        }
        if self.width <= 2.0 * self.margin || self.height <= 2.0 * self.margin {
            return Err(SimError::InvalidConfig(format!(
                "{}x{} arena has no room inside a margin of {}",
                self.width, self.height, self.margin
            )));
        }
        Ok(())
    }

    /// Smallest allowed coordinate on each axis.
    #[must_use]
    pub fn min_bound(&self) -> Vec2 {
        Vec2::new(self.margin, self.margin)
    }

    /// Largest allowed coordinate on each axis.
    #[must_use]
    pub fn max_bound(&self) -> Vec2 {
        Vec2::new(self.width - self.margin, self.height - self.margin)
    }

    /// Clamp a point into the playable area.
    #[must_use]
    pub fn clamp(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            point.x.clamp(self.margin, self.width - self.margin),
            point.y.clamp(self.margin, self.height - self.margin),
        )
    }

    /// Whether a point lies inside the playable area.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.margin
            && point.x <= self.width - self.margin
            && point.y >= self.margin
            && point.y <= self.height - self.margin
    }

    /// Whether a point lies anywhere on the canvas, margins included.
    #[must_use]
    pub fn on_canvas(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.x <= self.width && point.y >= 0.0 && point.y <= self.height
    }

    /// Arena centre.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}
