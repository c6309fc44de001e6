//! Wild animals that graze the arena in loose herds.
//!
//! Animals are scenery: no team owns them and nothing targets them yet.
//! Each one drifts toward the centroid of nearby herd mates, wanders a
//! little and turns back before reaching the arena edge.

use std::f32::consts::{PI, TAU};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::AnimalId;
use crate::config::WorldConfig;
use crate::math::{angle_delta, wrap_angle, Vec2};
use crate::tuning::{
    ANIMAL_COHESION_RATE, ANIMAL_EDGE_FACTOR, ANIMAL_HP, ANIMAL_JITTER, ANIMAL_MIN_SPEED,
    ANIMAL_MOMENTUM, ANIMAL_NEIGHBOR_RADIUS, ANIMAL_SPEED_RANGE, FRICTION,
};
use crate::world::World;

/// A grazing animal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    /// Where it stands.
    pub position: Vec2,
    /// Current motion per tick.
    pub velocity: Vec2,
    /// Heading, in radians.
    pub angle: f32,
    /// Cruising speed.
    pub speed: f32,
    /// Hit points.
    pub hp: i32,
}

impl Animal {
    /// An animal at `position`, pulled inside the margins, with a random
    /// heading and cruising speed. It starts moving at half speed.
    pub fn new<R: Rng + ?Sized>(position: Vec2, config: &WorldConfig, rng: &mut R) -> Self {
        let speed = ANIMAL_MIN_SPEED + rng.gen_range(0.0..ANIMAL_SPEED_RANGE);
        let angle = rng.gen_range(0.0..TAU);
        Self {
            position: config.clamp(position),
            velocity: Vec2::from_angle(angle) * (speed * 0.5),
            angle,
            speed,
            hp: ANIMAL_HP,
        }
    }

    /// Still alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

/// Centroid of the other animals within [`ANIMAL_NEIGHBOR_RADIUS`] of `id`.
fn neighbour_centroid(world: &World, id: AnimalId, position: Vec2) -> Option<Vec2> {
    let (sum, count) = world
        .animals
        .iter()
        .filter(|(other, a)| {
            *other != id && a.position.distance(position) < ANIMAL_NEIGHBOR_RADIUS
        })
        .fold((Vec2::ZERO, 0u32), |(sum, count), (_, a)| {
            (sum + a.position, count + 1)
        });
    (count > 0).then(|| sum * (1.0 / count as f32))
}

/// Reflect the heading off any edge band the animal is heading deeper into.
fn turn_from_edges(angle: f32, position: Vec2, config: &WorldConfig) -> f32 {
    let band = config.margin * ANIMAL_EDGE_FACTOR;
    let heading = Vec2::from_angle(angle);
    let mut angle = angle;

    let near_left = position.x < band && heading.x < 0.0;
    let near_right = position.x > config.width - band && heading.x > 0.0;
    if near_left || near_right {
        angle = PI - angle;
    }

    let near_top = position.y < band && heading.y < 0.0;
    let near_bottom = position.y > config.height - band && heading.y > 0.0;
    if near_top || near_bottom {
        angle = -angle;
    }
    wrap_angle(angle)
}

/// Move every animal one tick.
///
/// Animals update in arena order and see the herd mates that already
/// moved this tick.
pub fn animal_system<R: Rng + ?Sized>(world: &mut World, rng: &mut R) {
    let config = world.config;
    let ids: Vec<AnimalId> = world.animals.keys().collect();

    for id in ids {
        let Some(mut animal) = world.animals.get(id).copied() else {
            continue;
        };

        if let Some(centroid) = neighbour_centroid(world, id, animal.position) {
            let desired = animal.position.angle_to(centroid);
            animal.angle += angle_delta(animal.angle, desired) * ANIMAL_COHESION_RATE;
        }
        animal.angle += (rng.gen::<f32>() - 0.5) * ANIMAL_JITTER;
        animal.angle = turn_from_edges(animal.angle, animal.position, &config);

        let cruise = Vec2::from_angle(animal.angle) * animal.speed;
        animal.velocity += (cruise - animal.velocity) * ANIMAL_MOMENTUM;
        animal.velocity = animal.velocity * FRICTION;
        animal.position = config.clamp(animal.position + animal.velocity);

        if let Some(slot) = world.animals.get_mut(id) {
            *slot = animal;
        }
    }
}

/// Drop animals that have been killed.
pub fn prune_animals(world: &mut World) {
    world.animals.retain(|_, animal| animal.is_alive());
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn world_with(positions: &[Vec2], rng: &mut ChaCha8Rng) -> (World, Vec<AnimalId>) {
        let mut world = World::new(WorldConfig::default());
        let ids = positions
            .iter()
            .map(|&p| {
                let animal = Animal::new(p, &world.config, rng);
                world.animals.insert(animal)
            })
            .collect();
        (world, ids)
    }

    #[test]
    fn test_new_animal_is_clamped_and_slowly_moving() {
        let mut rng = ChaCha8Rng::seed_from_u64(71);
        let config = WorldConfig::default();
        let animal = Animal::new(Vec2::new(-50.0, 10_000.0), &config, &mut rng);

        assert!(config.contains(animal.position));
        assert_eq!(animal.hp, ANIMAL_HP);
        assert!((ANIMAL_MIN_SPEED..ANIMAL_MIN_SPEED + ANIMAL_SPEED_RANGE).contains(&animal.speed));
        assert!((animal.velocity.length() - animal.speed * 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_neighbours_pull_heading_together() {
        let mut rng = ChaCha8Rng::seed_from_u64(72);
        let (mut world, ids) =
            world_with(&[Vec2::new(600.0, 360.0), Vec2::new(640.0, 360.0)], &mut rng);
        // Both face north; the herd mate lies due east or west
        for &id in &ids {
            world.animals[id].angle = -PI / 2.0;
        }

        animal_system(&mut world, &mut rng);

        let left = world.animals[ids[0]].angle;
        let right = world.animals[ids[1]].angle;
        // Cohesion turns by 0.05 * PI/2 (about 0.079), more than the jitter's 0.05
        assert!(left > -PI / 2.0, "left herd mate turned {left}");
        assert!(right < -PI / 2.0, "right herd mate turned {right}");
    }

    #[test]
    fn test_loners_only_wander() {
        let mut rng = ChaCha8Rng::seed_from_u64(73);
        let (mut world, ids) =
            world_with(&[Vec2::new(400.0, 360.0), Vec2::new(800.0, 360.0)], &mut rng);
        let before: Vec<f32> = ids.iter().map(|&id| world.animals[id].angle).collect();

        animal_system(&mut world, &mut rng);

        for (&id, angle) in ids.iter().zip(before) {
            let turned = angle_delta(angle, world.animals[id].angle).abs();
            assert!(turned <= ANIMAL_JITTER / 2.0 + 1e-5, "turned {turned}");
        }
    }

    #[test]
    fn test_edge_band_turns_animals_back() {
        let config = WorldConfig::default();
        let band = config.margin * ANIMAL_EDGE_FACTOR;

        let west = turn_from_edges(PI, Vec2::new(band - 1.0, 360.0), &config);
        assert!(Vec2::from_angle(west).x > 0.0);
        let north = turn_from_edges(-PI / 2.0, Vec2::new(640.0, band - 1.0), &config);
        assert!(Vec2::from_angle(north).y > 0.0);

        // Already heading inward: left alone
        let inward = turn_from_edges(0.1, Vec2::new(band - 1.0, 360.0), &config);
        assert!((inward - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_dead_animals_are_pruned() {
        let mut rng = ChaCha8Rng::seed_from_u64(74);
        let (mut world, ids) =
            world_with(&[Vec2::new(400.0, 360.0), Vec2::new(800.0, 360.0)], &mut rng);
        world.animals[ids[0]].hp = 0;
        prune_animals(&mut world);
        assert_eq!(world.animals.len(), 1);
        assert!(world.animals.contains_key(ids[1]));
    }
}
