//! Archery: target selection, aiming and firing.
//!
//! This module implements the fighter side of combat:
//! - Nearest-enemy targeting with a skill-scaled lock
//! - Accuracy that peaks at medium range and grows with skill
//! - Lead prediction from the target's current motion
//! - Personality-driven engagement (press, hold distance, or stand)
//!
//! Arrow flight and impacts live in [`projectile`](crate::projectile).

use std::f32::consts::PI;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{CastleId, Personality, UnitId};
use crate::math::{angle_delta, Vec2};
use crate::perception::{fresh_waypoint, score_waypoint};
use crate::projectile::Arrow;
use crate::tuning::{
    ACCURACY_FACTOR, ARROW_RANGE_CAP, ARROW_RANGE_FACTOR, ATTACK_ENERGY_COST,
    DEFENSIVE_RETREAT_RANGE, FIRE_SKILL_GAIN, MAX_ACCURACY, MAX_ARROW_PREDICTION,
    MAX_ARROW_SPEED, MAX_ATTACK_RANGE, MIN_ACCURACY, MIN_ARROW_SPEED, MIN_ATTACK_RANGE,
    OPTIMAL_ATTACK_RANGE, PRIORITY_WAYPOINT_SCORE, TIRED_FIRE_COOLDOWN, VISION_RADIUS,
};
use crate::unit::Unit;
use crate::world::World;

/// Fighter skill below which a unit only engages when pushed to.
const RELUCTANT_FIGHTER_SKILL: f32 = 0.5;

/// Events generated by combat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// An arrow was loosed.
    ArrowFired {
        /// The archer.
        shooter: UnitId,
        /// The unit aimed at.
        target: UnitId,
    },
    /// An arrow struck a unit.
    UnitHit {
        /// The archer.
        shooter: UnitId,
        /// The unit struck.
        target: UnitId,
        /// Hit points removed.
        damage: i32,
        /// Whether the hit was fatal.
        lethal: bool,
    },
    /// An arrow struck a castle.
    CastleHit {
        /// The archer.
        shooter: UnitId,
        /// The castle struck.
        castle: CastleId,
        /// Hit points removed.
        damage: i32,
        /// Whether the castle fell.
        destroyed: bool,
    },
    /// An arrow ran out of range or speed.
    ArrowMissed {
        /// The archer.
        shooter: UnitId,
        /// Where the arrow fell.
        position: Vec2,
    },
}

/// Hit probability proxy for a shot at `distance`.
///
/// Point blank shots are awkward, anything up to the optimal range is
/// clean, and accuracy falls off linearly toward the maximum range.
/// The result is clamped to `[MIN_ACCURACY, MAX_ACCURACY]`.
#[must_use]
pub fn calculate_accuracy(distance: f32, skill: f32) -> f32 {
    let base = ACCURACY_FACTOR + skill * 0.1;
    let distance_factor = if distance < MIN_ATTACK_RANGE {
        distance / MIN_ATTACK_RANGE * 0.5
    } else if distance <= OPTIMAL_ATTACK_RANGE {
        1.0
    } else {
        1.0 - (distance - OPTIMAL_ATTACK_RANGE) / (MAX_ATTACK_RANGE - OPTIMAL_ATTACK_RANGE) * 0.8
    };
    (base * distance_factor).clamp(MIN_ACCURACY, MAX_ACCURACY)
}

/// Launch speed for a shot at `distance`: fast up close, slow far away.
#[must_use]
pub fn arrow_speed_for_distance(distance: f32) -> f32 {
    let speed =
        MIN_ARROW_SPEED + (MAX_ARROW_SPEED - MIN_ARROW_SPEED) * (1.0 - distance / MAX_ATTACK_RANGE);
    speed.clamp(MIN_ARROW_SPEED, MAX_ARROW_SPEED)
}

/// Where `target` will be when an arrow fired at `arrow_speed` arrives.
///
/// A target standing still is assumed to move along its facing at its
/// current speed. Better archers lead their shots further.
#[must_use]
pub fn predict_target_position(shooter: &Unit, target: &Unit, arrow_speed: f32) -> Vec2 {
    let distance = shooter.position.distance(target.position);
    let time_to_hit = distance / arrow_speed;
    let velocity = if target.velocity.is_zero() {
        Vec2::from_angle(target.angle) * (target.speed * target.speed_multiplier)
    } else {
        target.velocity
    };
    let factor = (0.5 + shooter.skills.fighter * 0.5).min(MAX_ARROW_PREDICTION);
    target.position + velocity * (time_to_hit * factor)
}

/// Lock onto the nearest enemy within range.
///
/// Weak fighters only look for targets when aggressive or when the team
/// is in attack mode.
pub fn find_new_target<R: Rng + ?Sized>(
    unit: &mut Unit,
    world: &World,
    attack_mode: bool,
    rng: &mut R,
) {
    if unit.skills.fighter < RELUCTANT_FIGHTER_SKILL
        && unit.personality != Personality::Aggressive
        && !attack_mode
    {
        return;
    }

    let nearest = world
        .enemies_of(unit.team)
        .filter(|enemy| enemy.is_alive())
        .map(|enemy| (enemy.id, enemy.position.distance(unit.position)))
        .filter(|(_, d)| *d <= MAX_ATTACK_RANGE)
        .min_by(|a, b| a.1.total_cmp(&b.1));

    if let Some((target, distance)) = nearest {
        unit.current_target = Some(target);
        unit.target_lock_timer = 100 + (unit.skills.fighter * 50.0).floor() as u32;
        if distance < OPTIMAL_ATTACK_RANGE {
            unit.maybe_say(rng, 0.3, "Target spotted!");
        }
    }
}

/// Start drawing the bow. Skilled archers draw faster.
pub fn start_aiming<R: Rng + ?Sized>(unit: &mut Unit, rng: &mut R) {
    unit.aiming = true;
    unit.aiming_timer = 30u32.saturating_sub((unit.skills.fighter * 10.0).floor() as u32).max(5);
    unit.maybe_say(rng, 0.5, "Aiming...");
}

/// Loose an arrow at `target_id`.
///
/// Returns `false` when the target is gone, or when the unit is too
/// tired, in which case it complains and waits out a short cooldown.
pub fn fire_arrow<R: Rng + ?Sized>(
    unit: &mut Unit,
    target_id: UnitId,
    world: &World,
    rng: &mut R,
) -> bool {
    let Some(target) = world.unit(target_id).filter(|t| t.is_alive()) else {
        return false;
    };
    if unit.energy < ATTACK_ENERGY_COST {
        unit.say("Too tired to shoot!");
        unit.fire_cooldown = TIRED_FIRE_COOLDOWN;
        return false;
    }
    unit.energy -= ATTACK_ENERGY_COST;

    let distance = unit.position.distance(target.position);
    let accuracy = calculate_accuracy(distance, unit.skills.fighter);
    let speed = arrow_speed_for_distance(distance);
    let predicted = predict_target_position(unit, target, speed);

    let max_error = (1.0 - accuracy) * distance * 0.5;
    let aim = predicted
        + Vec2::new(
            rng.gen_range(-1.0..=1.0) * max_error,
            rng.gen_range(-1.0..=1.0) * max_error,
        );
    let angle = unit.position.angle_to(aim);
    let max_range = (distance * ARROW_RANGE_FACTOR).min(ARROW_RANGE_CAP);

    unit.arrows
        .push(Arrow::new(unit.id, unit.team, unit.position, angle, speed, max_range));

    if rng.gen_bool(0.3) {
        unit.say(if accuracy > 0.8 {
            "Perfect shot!"
        } else if accuracy > 0.5 {
            "Fire!"
        } else {
            "Shooting..."
        });
    }
    true
}

/// One tick of fighter behavior: targeting, the aim clock and
/// personality-specific engagement.
pub fn update_fighter<R: Rng + ?Sized>(
    unit: &mut Unit,
    world: &mut World,
    rng: &mut R,
    events: &mut Vec<CombatEvent>,
) {
    let attack_mode = world.attack_mode(unit.team);

    if unit.target_lock_timer > 0 {
        unit.target_lock_timer -= 1;
    } else {
        find_new_target(unit, world, attack_mode, rng);
    }

    if unit.aiming {
        unit.aiming_timer = unit.aiming_timer.saturating_sub(1);
        if unit.aiming_timer == 0 {
            unit.aiming = false;
            if let Some(target) = unit.current_target {
                if fire_arrow(unit, target, world, rng) {
                    let tick = world.tick;
                    let stats = &mut world.stats[unit.team];
                    stats.attacks_launched += 1;
                    stats.record_combat(tick);
                    unit.fire_cooldown = rng.gen_range(40..120);
                    unit.skills.fighter += FIRE_SKILL_GAIN;
                    events.push(CombatEvent::ArrowFired {
                        shooter: unit.id,
                        target,
                    });
                }
            }
        }
    }

    let Some(target_id) = unit.current_target else {
        return;
    };
    let Some(target_position) = world
        .unit(target_id)
        .filter(|t| t.is_alive())
        .map(|t| t.position)
    else {
        release_target(unit);
        return;
    };

    let distance = unit.position.distance(target_position);
    if distance > MAX_ATTACK_RANGE {
        release_target(unit);
        return;
    }

    let turn = angle_delta(unit.angle, unit.position.angle_to(target_position));
    if unit.personality == Personality::Aggressive || attack_mode {
        unit.angle += turn * (0.08 + unit.skills.fighter * 0.03);
        if distance > OPTIMAL_ATTACK_RANGE && !unit.aiming {
            unit.say("Closing in!");
            close_in(unit, target_position, world, rng);
        } else {
            aim_or_wait(unit, rng);
        }
    } else if unit.personality == Personality::Defensive {
        if distance < DEFENSIVE_RETREAT_RANGE {
            let away = angle_delta(unit.angle, target_position.angle_to(unit.position));
            unit.angle += away * 0.1;
            unit.say("Maintaining distance!");
            back_off(unit, target_position, world, rng);
        } else if distance < MAX_ATTACK_RANGE
            && distance > MIN_ATTACK_RANGE
            && !unit.aiming
            && unit.fire_cooldown == 0
        {
            start_aiming(unit, rng);
        } else {
            unit.fire_cooldown = unit.fire_cooldown.saturating_sub(1);
            unit.angle += turn * 0.03;
        }
    } else {
        unit.angle += turn * 0.05;
        if distance < MAX_ATTACK_RANGE {
            aim_or_wait(unit, rng);
        } else {
            unit.fire_cooldown = unit.fire_cooldown.saturating_sub(1);
        }
    }
}

fn release_target(unit: &mut Unit) {
    unit.current_target = None;
    unit.target_lock_timer = 0;
    unit.aiming = false;
}

fn aim_or_wait<R: Rng + ?Sized>(unit: &mut Unit, rng: &mut R) {
    if !unit.aiming && unit.fire_cooldown == 0 {
        start_aiming(unit, rng);
    } else {
        unit.fire_cooldown = unit.fire_cooldown.saturating_sub(1);
    }
}

/// Head for a point at roughly optimal range on the near side of the
/// target, or failing that any visible point toward it.
fn close_in<R: Rng + ?Sized>(unit: &mut Unit, target: Vec2, world: &World, rng: &mut R) {
    let offset = target - unit.position;
    if offset.is_zero() {
        return;
    }
    let toward = offset.normalize();
    let config = world.config();

    for step in 0..=4 {
        let range = OPTIMAL_ATTACK_RANGE * (0.8 + 0.1 * step as f32);
        let point = config.clamp(target - toward * range);
        if unit.can_see(point) {
            let score = PRIORITY_WAYPOINT_SCORE + score_waypoint(point, unit, world);
            unit.set_waypoint(point, score);
            return;
        }
    }

    let heading = offset.angle();
    for _ in 0..5 {
        let bearing = heading + (rng.gen::<f32>() - 0.5) * (PI / 6.0);
        let reach = rng.gen::<f32>() * VISION_RADIUS * 0.7 + VISION_RADIUS * 0.2;
        let point = config.clamp(unit.position.offset(bearing, reach));
        if unit.can_see(point) {
            unit.set_waypoint(point, PRIORITY_WAYPOINT_SCORE);
            return;
        }
    }
}

/// Retreat straight away from the target if a visible point allows it.
fn back_off<R: Rng + ?Sized>(unit: &mut Unit, target: Vec2, world: &World, rng: &mut R) {
    let offset = unit.position - target;
    if offset.is_zero() {
        return;
    }
    let away = offset.normalize();
    let config = world.config();

    for retreat in [30.0, 40.0, 50.0, 60.0] {
        let point = config.clamp(unit.position + away * retreat);
        if unit.can_see(point) {
            unit.set_waypoint(point, PRIORITY_WAYPOINT_SCORE);
            return;
        }
    }
    unit.current_waypoint = fresh_waypoint(unit, world, rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Skills;
    use crate::config::WorldConfig;
    use crate::factions::Team;
    use crate::unit::UnitSpawn;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn skirmish(distance: f32, personality: Personality) -> (World, UnitId, UnitId) {
        let mut world = World::new(WorldConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(51);
        let archer = world.spawn_unit(
            UnitSpawn::new(Team::Blue, Vec2::new(400.0, 360.0), 35.0, Skills::fighter())
                .with_personality(personality),
            &mut rng,
        );
        let target = world.spawn_unit(
            UnitSpawn::new(Team::Red, Vec2::new(400.0 + distance, 360.0), 35.0, Skills::worker()),
            &mut rng,
        );
        world.units[archer].angle = 0.0;
        (world, archer, target)
    }

    #[test]
    fn test_accuracy_profile() {
        assert!((calculate_accuracy(15.0, 0.0) - 0.225).abs() < 1e-5);
        assert!((calculate_accuracy(100.0, 0.0) - 0.9).abs() < 1e-5);
        assert!((calculate_accuracy(100.0, 1.0) - MAX_ACCURACY).abs() < 1e-5);
        assert!((calculate_accuracy(300.0, 0.0) - MIN_ACCURACY).abs() < 1e-5);
        assert!((calculate_accuracy(225.0, 0.0) - 0.54).abs() < 1e-5);
        for d in [0.0, 10.0, 80.0, 160.0, 299.0, 1000.0] {
            for skill in [0.0, 0.5, 3.0] {
                let a = calculate_accuracy(d, skill);
                assert!((MIN_ACCURACY..=MAX_ACCURACY).contains(&a));
            }
        }
    }

    #[test]
    fn test_arrow_speed_scales_with_distance() {
        assert_eq!(arrow_speed_for_distance(0.0), MAX_ARROW_SPEED);
        assert_eq!(arrow_speed_for_distance(MAX_ATTACK_RANGE), MIN_ARROW_SPEED);
        assert_eq!(arrow_speed_for_distance(900.0), MIN_ARROW_SPEED);
        assert!((arrow_speed_for_distance(150.0) - 5.5).abs() < 1e-5);
    }

    #[test]
    fn test_prediction_leads_moving_targets() {
        let (mut world, archer, target) = skirmish(120.0, Personality::Neutral);
        world.units[target].velocity = Vec2::new(0.0, 1.0);
        let shooter = world.unit(archer).unwrap();
        let victim = world.unit(target).unwrap();
        let predicted = predict_target_position(shooter, victim, 6.0);
        // 120 / 6 ticks of flight at factor 1.0
        assert!((predicted.y - (360.0 + 20.0)).abs() < 1e-3);
        assert!((predicted.x - 520.0).abs() < 1e-3);
    }

    #[test]
    fn test_nearest_enemy_is_targeted() {
        let (mut world, archer, near) = skirmish(120.0, Personality::Neutral);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        world.spawn_unit(
            UnitSpawn::new(Team::Red, Vec2::new(650.0, 360.0), 35.0, Skills::NONE),
            &mut rng,
        );
        let mut unit = world.unit(archer).unwrap().clone();
        find_new_target(&mut unit, &world, false, &mut rng);
        assert_eq!(unit.current_target, Some(near));
        assert_eq!(unit.target_lock_timer, 150);
    }

    #[test]
    fn test_reluctant_units_do_not_seek_targets() {
        let (world, archer, _) = skirmish(120.0, Personality::Neutral);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut unit = world.unit(archer).unwrap().clone();
        unit.skills.fighter = 0.2;
        find_new_target(&mut unit, &world, false, &mut rng);
        assert_eq!(unit.current_target, None);
        find_new_target(&mut unit, &world, true, &mut rng);
        assert!(unit.current_target.is_some());
    }

    #[test]
    fn test_aim_time_shrinks_with_skill() {
        let (world, archer, _) = skirmish(120.0, Personality::Neutral);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut unit = world.unit(archer).unwrap().clone();
        start_aiming(&mut unit, &mut rng);
        assert_eq!(unit.aiming_timer, 20);
        unit.skills.fighter = 5.0;
        start_aiming(&mut unit, &mut rng);
        assert_eq!(unit.aiming_timer, 5);
    }

    #[test]
    fn test_exhausted_archers_cannot_fire() {
        let (world, archer, target) = skirmish(120.0, Personality::Neutral);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut unit = world.unit(archer).unwrap().clone();
        unit.energy = 0.3;
        assert!(!fire_arrow(&mut unit, target, &world, &mut rng));
        assert!(unit.arrows.is_empty());
        assert_eq!(unit.message.as_ref().unwrap().text, "Too tired to shoot!");
        assert!((unit.energy - 0.3).abs() < 1e-6);
        assert_eq!(unit.fire_cooldown, TIRED_FIRE_COOLDOWN);
    }

    #[test]
    fn test_exhausted_archer_waits_before_aiming_again() {
        let (mut world, archer, _) = skirmish(120.0, Personality::Neutral);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut unit = world.unit(archer).unwrap().clone();
        unit.fire_cooldown = 0;
        unit.energy = 0.3;
        let mut events = Vec::new();

        let mut refusals = 0;
        for _ in 0..120 {
            let releasing = unit.aiming && unit.aiming_timer == 1;
            update_fighter(&mut unit, &mut world, &mut rng, &mut events);
            if releasing {
                refusals += 1;
                assert!(!unit.aiming, "re-aimed in the same tick");
            }
        }
        assert!(unit.arrows.is_empty());
        assert!(events.is_empty());
        assert!((1..=2).contains(&refusals), "refused {refusals} times");
    }

    #[test]
    fn test_firing_spends_energy_and_caps_range() {
        let (world, archer, target) = skirmish(120.0, Personality::Neutral);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut unit = world.unit(archer).unwrap().clone();
        assert!(fire_arrow(&mut unit, target, &world, &mut rng));
        assert!((unit.energy - (100.0 - ATTACK_ENERGY_COST)).abs() < 1e-4);
        let arrow = &unit.arrows[0];
        assert!((arrow.max_range - 180.0).abs() < 1e-3);
        assert!((arrow.speed - arrow_speed_for_distance(120.0)).abs() < 1e-5);
        assert_eq!(arrow.team, Team::Blue);
    }

    #[test]
    fn test_neutral_archer_fires_after_aiming() {
        let (mut world, archer, _) = skirmish(120.0, Personality::Neutral);
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut unit = world.unit(archer).unwrap().clone();
        unit.fire_cooldown = 0;
        let mut events = Vec::new();

        for _ in 0..40 {
            update_fighter(&mut unit, &mut world, &mut rng, &mut events);
            if !unit.arrows.is_empty() {
                break;
            }
        }
        assert_eq!(unit.arrows.len(), 1);
        assert_eq!(world.stats(Team::Blue).attacks_launched, 1);
        assert!(world.stats(Team::Blue).last_combat_tick.is_some());
        assert!((unit.skills.fighter - 1.05).abs() < 1e-6);
        assert!((40..120).contains(&unit.fire_cooldown));
        assert!(matches!(events[0], CombatEvent::ArrowFired { .. }));
    }

    #[test]
    fn test_targets_out_of_range_are_released() {
        let (mut world, archer, target) = skirmish(120.0, Personality::Neutral);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut unit = world.unit(archer).unwrap().clone();
        unit.current_target = Some(target);
        unit.target_lock_timer = 50;
        unit.aiming = true;
        unit.aiming_timer = 10;
        world.units[target].position = Vec2::new(1100.0, 600.0);

        update_fighter(&mut unit, &mut world, &mut rng, &mut Vec::new());
        assert_eq!(unit.current_target, None);
        assert_eq!(unit.target_lock_timer, 0);
        assert!(!unit.aiming);
    }

    #[test]
    fn test_aggressive_archers_close_in() {
        let (mut world, archer, target) = skirmish(250.0, Personality::Aggressive);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut unit = world.unit(archer).unwrap().clone();
        unit.current_target = Some(target);
        unit.target_lock_timer = 50;

        update_fighter(&mut unit, &mut world, &mut rng, &mut Vec::new());
        assert_eq!(unit.message.as_ref().unwrap().text, "Closing in!");
        assert!(unit.current_waypoint.score >= PRIORITY_WAYPOINT_SCORE - 1.0);
        assert!(unit.current_waypoint.position.x > 400.0);
    }

    #[test]
    fn test_defensive_archers_back_off() {
        let (mut world, archer, target) = skirmish(60.0, Personality::Defensive);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut unit = world.unit(archer).unwrap().clone();
        unit.current_target = Some(target);
        unit.target_lock_timer = 50;

        update_fighter(&mut unit, &mut world, &mut rng, &mut Vec::new());
        assert_eq!(unit.message.as_ref().unwrap().text, "Maintaining distance!");
        assert!(unit.angle.abs() > 0.0);
        assert!(!unit.aiming);
    }
}
