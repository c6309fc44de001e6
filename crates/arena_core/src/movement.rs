//! Steering and momentum physics.
//!
//! A unit turns a fraction of the way toward its waypoint every tick,
//! gets nudged away from walls and dangerous enemies, and accelerates
//! toward a target velocity. Whatever the physics produce, the final
//! position is clamped inside the arena margins.

use std::f32::consts::{FRAC_PI_4, PI};

use rand::Rng;

use crate::components::{MovementDirection, MovementMode};
use crate::config::WorldConfig;
use crate::math::{angle_between, angle_delta, Vec2};
use crate::tuning::{
    ARRIVAL_DISTANCE, CENTER_BIAS_RATE, CRITICAL_ENERGY_THRESHOLD, CRITICAL_SPEED_PENALTY,
    EDGE_AVOIDANCE_RATE, ENEMY_AVOIDANCE_RADIUS, ENEMY_AVOIDANCE_RATE, FRICTION,
    IDLE_RECOVERY_RATE, IDLE_VELOCITY_DECAY, MAX_VELOCITY, MOMENTUM_FACTOR, SEPARATION_RADIUS,
    SEPARATION_STEP, STEERING_RATE,
};
use crate::unit::Unit;
use crate::world::World;

/// Enemies above this fighter skill push a unit's heading away.
const THREATENING_FIGHTER_SKILL: f32 = 1.0;

/// Where the waypoint lay when the unit turned toward it this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    /// Heading toward the waypoint.
    pub heading: f32,
    /// Distance to the waypoint.
    pub distance: f32,
}

/// Classify travel along `heading` relative to `facing`.
#[must_use]
pub fn classify_direction(facing: f32, heading: f32) -> MovementDirection {
    let diff = angle_between(facing, heading);
    if diff <= FRAC_PI_4 {
        MovementDirection::Forward
    } else if diff >= 3.0 * FRAC_PI_4 {
        MovementDirection::Backward
    } else {
        MovementDirection::Sideways
    }
}

/// Turn part of the way toward the current waypoint.
pub fn steer_toward_waypoint(unit: &mut Unit) -> Steering {
    let target = unit.current_waypoint.position;
    let distance = unit.position.distance(target);
    let heading = if distance > 0.0 {
        unit.position.angle_to(target)
    } else {
        unit.angle
    };
    unit.angle += angle_delta(unit.angle, heading) * STEERING_RATE;
    Steering { heading, distance }
}

/// Drift the facing slightly toward the arena centre.
pub fn apply_center_bias(unit: &mut Unit, config: &WorldConfig) {
    let center = config.center();
    if unit.position == center {
        return;
    }
    let toward = unit.position.angle_to(center);
    unit.angle += angle_delta(unit.angle, toward) * CENTER_BIAS_RATE;
}

/// Bend `angle` away from nearby walls.
///
/// Repulsion starts one margin inside the playable area and doubles in
/// the half-margin band closest to the wall.
#[must_use]
pub fn avoid_edges(angle: f32, position: Vec2, config: &WorldConfig) -> f32 {
    let zone = config.margin;
    if zone <= 0.0 {
        return angle;
    }
    let min = config.min_bound();
    let max = config.max_bound();

    let push = |gap: f32| -> f32 {
        if gap >= zone {
            return 0.0;
        }
        let strength = (zone - gap) / zone;
        if gap < zone * 0.5 {
            strength * 2.0
        } else {
            strength
        }
    };

    let avoid = Vec2::new(
        push(position.x - min.x) - push(max.x - position.x),
        push(position.y - min.y) - push(max.y - position.y),
    );
    if avoid.is_zero() {
        return angle;
    }
    angle + EDGE_AVOIDANCE_RATE * angle_delta(angle, avoid.angle())
}

/// Bend the unit's heading away from strong enemies close by.
#[must_use]
pub fn avoid_enemies(angle: f32, unit: &Unit, world: &World) -> f32 {
    let away = world
        .enemies_of(unit.team)
        .filter(|enemy| enemy.skills.fighter > THREATENING_FIGHTER_SKILL)
        .filter(|enemy| {
            let d = enemy.position.distance(unit.position);
            d < ENEMY_AVOIDANCE_RADIUS && d > 0.0
        })
        .fold(Vec2::ZERO, |acc, enemy| {
            acc + Vec2::from_angle(enemy.position.angle_to(unit.position))
        });

    if away.is_zero() {
        return angle;
    }
    angle + ENEMY_AVOIDANCE_RATE * angle_delta(angle, away.angle())
}

/// Push the unit away from crowding neighbours.
///
/// Each pair gets a persistent random affinity on first contact; a
/// negative affinity strengthens the push.
pub fn apply_separation<R: Rng + ?Sized>(unit: &mut Unit, world: &World, rng: &mut R) {
    let mut force = Vec2::ZERO;

    for other in world.units() {
        if other.id == unit.id {
            continue;
        }
        let offset = unit.position - other.position;
        let dist = offset.length();
        if dist >= SEPARATION_RADIUS || dist <= 0.0 {
            continue;
        }
        let affinity = *unit
            .affinities
            .entry(other.id)
            .or_insert_with(|| rng.gen_range(-1.0..1.0));
        let multiplier = if affinity < 0.0 { 1.0 - affinity } else { 1.0 };
        force += offset * ((SEPARATION_RADIUS - dist) * multiplier / dist);
    }

    unit.position += force * SEPARATION_STEP;
}

/// Coast under friction without steering, then clamp.
pub fn drift(unit: &mut Unit, damping: f32, config: &WorldConfig) {
    unit.velocity = unit.velocity * (FRICTION * damping);
    unit.position += unit.velocity;
    unit.position = config.clamp(unit.position);
}

/// Integrate one tick of movement toward the waypoint seen in `steering`.
pub fn integrate(unit: &mut Unit, steering: Steering, world: &World) {
    let config = world.config();
    unit.is_moving = steering.distance > ARRIVAL_DISTANCE;

    if unit.is_moving {
        unit.angle = avoid_enemies(unit.angle, unit, world);
        unit.angle = avoid_edges(unit.angle, unit.position, config);

        unit.movement_direction = classify_direction(unit.angle, steering.heading);
        let mut multiplier =
            unit.movement_direction.speed_multiplier() * unit.movement_mode.speed_multiplier();
        if unit.energy < CRITICAL_ENERGY_THRESHOLD {
            multiplier *= CRITICAL_SPEED_PENALTY;
        }
        unit.speed_multiplier = multiplier;
        unit.target_velocity = Vec2::from_angle(unit.angle) * (unit.speed * multiplier);
    } else {
        unit.movement_mode = MovementMode::Idle;
        unit.target_velocity = unit.target_velocity * IDLE_VELOCITY_DECAY;
        unit.energy = (unit.energy + IDLE_RECOVERY_RATE).min(unit.max_energy);
    }

    unit.velocity += (unit.target_velocity - unit.velocity) * MOMENTUM_FACTOR;
    unit.velocity = (unit.velocity * FRICTION).clamp_length(MAX_VELOCITY);
    unit.position += unit.velocity;
    unit.position = config.clamp(unit.position);
}

/// Keep an angle bounded so long runs do not lose float precision.
pub fn normalize_facing(unit: &mut Unit) {
    if unit.angle.abs() > 4.0 * PI {
        unit.angle = crate::math::wrap_angle(unit.angle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Skills, UnitId};
    use crate::factions::Team;
    use crate::unit::UnitSpawn;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use slotmap::SlotMap;

    fn lone_unit(position: Vec2) -> Unit {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let mut ids: SlotMap<UnitId, ()> = SlotMap::with_key();
        Unit::new(
            ids.insert(()),
            UnitSpawn::new(Team::Blue, position, 30.0, Skills::NONE),
            &mut rng,
        )
    }

    #[test]
    fn test_classify_direction_thresholds() {
        assert_eq!(classify_direction(0.0, 0.5), MovementDirection::Forward);
        assert_eq!(classify_direction(0.0, FRAC_PI_4), MovementDirection::Forward);
        assert_eq!(classify_direction(0.0, 1.2), MovementDirection::Sideways);
        assert_eq!(classify_direction(0.0, -2.0), MovementDirection::Sideways);
        assert_eq!(classify_direction(0.0, PI), MovementDirection::Backward);
        assert_eq!(classify_direction(3.0, -3.0), MovementDirection::Forward);
    }

    #[test]
    fn test_steering_turns_a_fraction() {
        let mut unit = lone_unit(Vec2::new(300.0, 300.0));
        unit.angle = 0.0;
        unit.set_waypoint(Vec2::new(300.0, 400.0), 0.0);
        let steering = steer_toward_waypoint(&mut unit);
        assert!((steering.distance - 100.0).abs() < 1e-4);
        assert!((unit.angle - PI / 2.0 * STEERING_RATE).abs() < 1e-5);
    }

    #[test]
    fn test_edges_push_heading_inward() {
        let config = WorldConfig::default();
        // Hugging the left wall while facing it
        let angle = avoid_edges(PI, Vec2::new(65.0, 360.0), &config);
        assert!(angle_between(angle, 0.0) < angle_between(PI, 0.0));
        // Away from every wall nothing changes
        assert_eq!(avoid_edges(1.0, config.center(), &config), 1.0);
    }

    #[test]
    fn test_integration_caps_velocity_and_clamps() {
        let world = World::new(WorldConfig::default());
        let mut unit = lone_unit(Vec2::new(61.0, 61.0));
        unit.velocity = Vec2::new(-500.0, -500.0);
        unit.set_waypoint(Vec2::new(61.0, 61.0), 0.0);
        let steering = steer_toward_waypoint(&mut unit);
        integrate(&mut unit, steering, &world);

        assert!(unit.velocity.length() <= MAX_VELOCITY + 1e-4);
        assert!(world.config().contains(unit.position));
        assert!(!unit.is_moving);
        assert_eq!(unit.movement_mode, MovementMode::Idle);
    }

    #[test]
    fn test_moving_unit_accelerates_forward() {
        let world = World::new(WorldConfig::default());
        let mut unit = lone_unit(Vec2::new(400.0, 360.0));
        unit.angle = 0.0;
        unit.movement_mode = MovementMode::Walk;
        unit.set_waypoint(Vec2::new(600.0, 360.0), 0.0);
        let steering = steer_toward_waypoint(&mut unit);
        integrate(&mut unit, steering, &world);

        assert!(unit.is_moving);
        assert_eq!(unit.movement_direction, MovementDirection::Forward);
        assert!((unit.speed_multiplier - 1.5).abs() < 1e-6);
        assert!(unit.position.x > 400.0);
    }

    #[test]
    fn test_critical_energy_slows_units() {
        let world = World::new(WorldConfig::default());
        let mut unit = lone_unit(Vec2::new(400.0, 360.0));
        unit.angle = 0.0;
        unit.energy = 5.0;
        unit.movement_mode = MovementMode::Walk;
        unit.set_waypoint(Vec2::new(600.0, 360.0), 0.0);
        let steering = steer_toward_waypoint(&mut unit);
        integrate(&mut unit, steering, &world);
        assert!((unit.speed_multiplier - 1.5 * CRITICAL_SPEED_PENALTY).abs() < 1e-6);
    }

    #[test]
    fn test_drift_decays_velocity() {
        let config = WorldConfig::default();
        let mut unit = lone_unit(Vec2::new(400.0, 360.0));
        unit.velocity = Vec2::new(2.0, 0.0);
        drift(&mut unit, 0.8, &config);
        assert!((unit.velocity.x - 2.0 * FRICTION * 0.8).abs() < 1e-6);
        assert!(unit.position.x > 400.0);
    }
}
