//! Vision cones and waypoint selection.
//!
//! Units only reason about what lies inside a narrow forward cone. Every
//! waypoint they pick is sampled inside it and scored by how far it is,
//! how straight ahead it lies, what dangers are remembered near it and
//! what it would let the unit see.

use rand::Rng;

use crate::components::{MovementDirection, Waypoint};
use crate::config::WorldConfig;
use crate::math::{angle_between, Vec2};
use crate::memory::BadMemory;
use crate::movement::classify_direction;
use crate::tuning::{
    FORWARD_PATH_WEIGHT, LOST_WAYPOINT_REVIEW_CHANCE, MAX_ATTACK_RANGE, MIN_DISTANCE_FOR_TURN,
    OUT_OF_CONE_SCORE, VISION_ANGLE, VISION_HALF_ANGLE, VISION_RADIUS, WAYPOINT_RANGE,
    WAYPOINT_REVIEW_CHANCE, WAYPOINT_SAMPLE_ATTEMPTS,
};
use crate::unit::Unit;
use crate::world::World;

/// Distance of the straight-ahead fallback waypoint.
const FALLBACK_DISTANCE: f32 = 40.0;
/// Distance a waypoint is expected to lie at.
const PREFERRED_DISTANCE: f32 = VISION_RADIUS * 0.6;
/// Radius around a waypoint in which trees attract workers.
const TREE_ATTRACTION_RADIUS: f32 = 100.0;
/// Bonus per tree next to the waypoint for worker units.
const TREE_ATTRACTION_WEIGHT: f32 = 10.0;
/// Bonus per visible enemy for fighter units, scaled by skill.
const ENEMY_SIGHT_WEIGHT: f32 = 15.0;

/// Whether `point` lies inside the vision cone at `origin` facing `facing`.
///
/// A point at the origin itself counts as visible.
#[must_use]
pub fn is_visible(origin: Vec2, facing: f32, point: Vec2) -> bool {
    let distance = origin.distance(point);
    if distance > VISION_RADIUS {
        return false;
    }
    if distance == 0.0 {
        return true;
    }
    angle_between(facing, origin.angle_to(point)) <= VISION_HALF_ANGLE
}

/// Sample a destination inside the unit's vision cone.
///
/// Bearings favour a narrow forward arc and distances favour the middle
/// of the range. Candidates are clamped to the arena and must still be
/// visible; after [`WAYPOINT_SAMPLE_ATTEMPTS`] misses the point straight
/// ahead is used instead.
pub fn sample_waypoint<R: Rng + ?Sized>(
    unit: &Unit,
    range: f32,
    config: &WorldConfig,
    rng: &mut R,
) -> Vec2 {
    for _ in 0..WAYPOINT_SAMPLE_ATTEMPTS {
        let spread = if rng.gen_bool(0.7) {
            VISION_ANGLE * 0.8
        } else {
            VISION_ANGLE
        };
        let bearing = unit.angle + (rng.gen::<f32>() - 0.5) * spread;

        let bucket = rng.gen::<f32>();
        let distance = if bucket < 0.2 {
            rng.gen::<f32>() * range * 0.3
        } else if bucket < 0.8 {
            range * 0.3 + rng.gen::<f32>() * range * 0.4
        } else {
            range * 0.7 + rng.gen::<f32>() * range * 0.3
        };
        let distance = distance.min(VISION_RADIUS * 0.95);

        let candidate = config.clamp(unit.position.offset(bearing, distance));
        if unit.can_see(candidate) {
            return candidate;
        }
    }

    config.clamp(unit.position.offset(unit.angle, FALLBACK_DISTANCE))
}

/// Path preference minus remembered danger, ignoring the vision cone.
#[must_use]
pub fn base_score(point: Vec2, unit: &Unit, memories: &[BadMemory]) -> f32 {
    let memory_cost: f32 = memories.iter().map(|m| m.avoidance_cost(point)).sum();

    let distance = unit.position.distance(point);
    let mut direction_score = 0.0;
    if distance > MIN_DISTANCE_FOR_TURN
        && classify_direction(unit.angle, unit.position.angle_to(point))
            == MovementDirection::Forward
    {
        direction_score += FORWARD_PATH_WEIGHT * (distance / 200.0).min(1.0);
    }

    direction_score - memory_cost
}

/// Utility of travelling to `point`.
///
/// Points outside the cone score [`OUT_OF_CONE_SCORE`] outright.
#[must_use]
pub fn score_waypoint(point: Vec2, unit: &Unit, world: &World) -> f32 {
    if !unit.can_see(point) {
        return OUT_OF_CONE_SCORE;
    }

    let mut score = base_score(point, unit, world.memories());

    let distance = unit.position.distance(point);
    let angle_diff = if distance == 0.0 {
        0.0
    } else {
        angle_between(unit.angle, unit.position.angle_to(point))
    };
    score += (VISION_HALF_ANGLE - angle_diff) * 2.0;
    score += 5.0 - (distance - PREFERRED_DISTANCE).abs() / 10.0;

    if unit.skills.worker > 0.0 {
        for tree in world.trees() {
            let to_tree = point.distance(tree.position);
            if to_tree < TREE_ATTRACTION_RADIUS && unit.can_see(tree.position) {
                score += TREE_ATTRACTION_WEIGHT * (1.0 - to_tree / TREE_ATTRACTION_RADIUS);
            }
        }
    }

    if unit.skills.fighter > 0.0 {
        let sighted = world
            .enemies_of(unit.team)
            .filter(|enemy| {
                enemy.position.distance(point) < MAX_ATTACK_RANGE
                    && is_visible(point, unit.angle, enemy.position)
            })
            .count();
        score += sighted as f32 * ENEMY_SIGHT_WEIGHT * unit.skills.fighter;
    }

    score
}

/// Sample and score a fresh waypoint.
pub fn fresh_waypoint<R: Rng + ?Sized>(unit: &Unit, world: &World, rng: &mut R) -> Waypoint {
    let position = sample_waypoint(unit, WAYPOINT_RANGE, world.config(), rng);
    Waypoint::new(position, score_waypoint(position, unit, world))
}

/// Roll whether `unit` reviews its waypoints this tick.
///
/// Every unit gets the base roll; a unit whose waypoint has left its cone
/// gets a second one.
pub fn wants_waypoint_review<R: Rng + ?Sized>(unit: &Unit, rng: &mut R) -> bool {
    rng.gen_bool(WAYPOINT_REVIEW_CHANCE)
        || (rng.gen_bool(LOST_WAYPOINT_REVIEW_CHANCE)
            && !unit.can_see(unit.current_waypoint.position))
}

/// Re-validate the current waypoint and consider an alternative.
///
/// Out-of-bounds waypoints are pulled back in, ones that left the cone
/// are replaced, and a freshly sampled alternative takes over when it
/// scores higher.
pub fn evaluate_waypoints<R: Rng + ?Sized>(unit: &mut Unit, world: &World, rng: &mut R) {
    let config = world.config();
    let current = unit.current_waypoint.position;

    if !config.contains(current) {
        let clamped = config.clamp(current);
        unit.current_waypoint.position = clamped;
        unit.current_waypoint.score = score_waypoint(clamped, unit, world);
        if clamped.distance(current) > 10.0 {
            unit.say("Staying in bounds!");
        }
    }

    if unit.can_see(unit.current_waypoint.position) {
        unit.current_waypoint.score =
            score_waypoint(unit.current_waypoint.position, unit, world);
    } else {
        unit.current_waypoint = fresh_waypoint(unit, world, rng);
        unit.maybe_say(rng, 0.3, "Can't see that way!");
    }

    unit.alt_waypoint = fresh_waypoint(unit, world, rng);
    if unit.alt_waypoint.score > unit.current_waypoint.score {
        if unit.selected {
            tracing::debug!(
                unit = ?unit.id,
                from = ?unit.current_waypoint,
                to = ?unit.alt_waypoint,
                "Switching to better waypoint"
            );
        }
        unit.current_waypoint = unit.alt_waypoint;
        unit.maybe_say(rng, 0.3, "Found better path!");
    }
}
