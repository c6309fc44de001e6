//! Bad memories left where blood was spilled.

use serde::{Deserialize, Serialize};

use crate::math::Vec2;
use crate::tuning::{
    MEMORY_AVOIDANCE_RADIUS, MEMORY_AVOIDANCE_WEIGHT, MEMORY_DECAY, MEMORY_FORGET_THRESHOLD,
};

/// A fading point of danger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BadMemory {
    /// Where it happened.
    pub position: Vec2,
    /// How strongly it still repels.
    pub intensity: f32,
}

impl BadMemory {
    /// Create a memory.
    #[must_use]
    pub const fn new(position: Vec2, intensity: f32) -> Self {
        Self {
            position,
            intensity,
        }
    }

    /// Waypoint cost this memory imposes on `point`.
    #[must_use]
    pub fn avoidance_cost(&self, point: Vec2) -> f32 {
        let d = self.position.distance(point);
        if d < MEMORY_AVOIDANCE_RADIUS {
            self.intensity * (MEMORY_AVOIDANCE_RADIUS - d) * MEMORY_AVOIDANCE_WEIGHT
        } else {
            0.0
        }
    }
}

/// Fade every memory by one tick and forget the faint ones.
pub fn decay_memories(memories: &mut Vec<BadMemory>) {
    for memory in memories.iter_mut() {
        memory.intensity *= MEMORY_DECAY;
    }
    memories.retain(|m| m.intensity > MEMORY_FORGET_THRESHOLD);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_is_geometric() {
        let mut memories = vec![BadMemory::new(Vec2::ZERO, 2.0)];
        decay_memories(&mut memories);
        assert!((memories[0].intensity - 2.0 * MEMORY_DECAY).abs() < 1e-6);
    }

    #[test]
    fn test_faint_memories_are_forgotten() {
        let mut memories = vec![
            BadMemory::new(Vec2::ZERO, 0.0500001),
            BadMemory::new(Vec2::ZERO, 3.0),
        ];
        decay_memories(&mut memories);
        assert_eq!(memories.len(), 1);
        assert!((memories[0].intensity - 3.0 * MEMORY_DECAY).abs() < 1e-5);
    }

    #[test]
    fn test_death_memory_lasts_thousands_of_ticks() {
        let mut memories = vec![BadMemory::new(Vec2::ZERO, 2.0)];
        // 2.0 * 0.999^n > 0.05 until n ≈ 3687
        for _ in 0..3600 {
            decay_memories(&mut memories);
        }
        assert_eq!(memories.len(), 1);
        for _ in 0..200 {
            decay_memories(&mut memories);
        }
        assert!(memories.is_empty());
    }

    #[test]
    fn test_avoidance_cost_falls_off_with_distance() {
        let memory = BadMemory::new(Vec2::new(100.0, 100.0), 2.0);
        let near = memory.avoidance_cost(Vec2::new(110.0, 100.0));
        let far = memory.avoidance_cost(Vec2::new(250.0, 100.0));
        assert!(near > far);
        assert!((near - 2.0 * 190.0 * 0.02).abs() < 1e-4);
        assert_eq!(memory.avoidance_cost(Vec2::new(400.0, 100.0)), 0.0);
    }
}
