//! Arrow flight and impact resolution.
//!
//! Arrows are owned by the unit that loosed them and die with it. Each
//! tick every live arrow slows down, sags under gravity and is then
//! tested against enemy units and castles. An arrow strikes at most one
//! thing; spent arrows stay flagged until the end-of-tick cleanup.

use std::collections::VecDeque;
use std::mem;

use serde::{Deserialize, Serialize};

use crate::combat::CombatEvent;
use crate::components::UnitId;
use crate::factions::Team;
use crate::math::Vec2;
use crate::tuning::{
    ARROW_AIR_RESISTANCE, ARROW_CASTLE_BASE_DAMAGE, ARROW_CASTLE_SPEED_DAMAGE, ARROW_GRAVITY,
    ARROW_MIN_FLIGHT_SPEED, ARROW_TRAIL_LENGTH, ARROW_UNIT_DAMAGE, CASTLE_HIT_RADIUS,
    CASTLE_MEMORY_INTENSITY, DEATH_MEMORY_INTENSITY, DOMINANT_SKILL_THRESHOLD, HIT_SKILL_GAIN,
    MIN_DAMAGE_SPEED_RATIO,
};
use crate::world::World;

/// A projectile in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrow {
    /// Unit that loosed the arrow.
    pub shooter: UnitId,
    /// Team of the shooter.
    pub team: Team,
    /// Current position.
    pub position: Vec2,
    /// Flight direction.
    pub angle: f32,
    /// Current speed.
    pub speed: f32,
    /// Launch speed.
    pub initial_speed: f32,
    /// Distance after which the arrow drops.
    pub max_range: f32,
    /// Distance flown so far.
    pub distance_traveled: f32,
    /// Accumulated downward drift per tick.
    pub drop_velocity: f32,
    /// Spent: struck something, fell or left the arena.
    pub hit: bool,
    /// Recent positions, oldest first.
    pub trail: VecDeque<Vec2>,
}

impl Arrow {
    /// Loose a new arrow.
    #[must_use]
    pub fn new(
        shooter: UnitId,
        team: Team,
        position: Vec2,
        angle: f32,
        speed: f32,
        max_range: f32,
    ) -> Self {
        Self {
            shooter,
            team,
            position,
            angle,
            speed,
            initial_speed: speed,
            max_range,
            distance_traveled: 0.0,
            drop_velocity: 0.0,
            hit: false,
            trail: VecDeque::with_capacity(ARROW_TRAIL_LENGTH + 1),
        }
    }

    /// Fly one tick. Returns `true` when the arrow has run out of range
    /// or speed.
    pub fn advance(&mut self) -> bool {
        self.trail.push_back(self.position);
        if self.trail.len() > ARROW_TRAIL_LENGTH {
            self.trail.pop_front();
        }

        self.speed *= ARROW_AIR_RESISTANCE;
        let step = Vec2::from_angle(self.angle) * self.speed;
        self.position += step;

        self.drop_velocity += ARROW_GRAVITY;
        self.position.y += self.drop_velocity;

        self.distance_traveled += step.length();
        self.distance_traveled > self.max_range || self.speed < ARROW_MIN_FLIGHT_SPEED
    }

    /// Remaining speed as a fraction of the launch speed.
    #[must_use]
    pub fn speed_ratio(&self) -> f32 {
        if self.initial_speed > 0.0 {
            self.speed / self.initial_speed
        } else {
            0.0
        }
    }
}

/// Damage an arrow deals to a unit.
#[must_use]
pub fn unit_damage(arrow: &Arrow) -> i32 {
    (ARROW_UNIT_DAMAGE * arrow.speed_ratio().max(MIN_DAMAGE_SPEED_RATIO)).floor() as i32
}

/// Damage an arrow deals to a castle.
#[must_use]
pub fn castle_damage(arrow: &Arrow) -> i32 {
    (ARROW_CASTLE_BASE_DAMAGE + ARROW_CASTLE_SPEED_DAMAGE * arrow.speed_ratio()).floor() as i32
}

/// Fly every live arrow one tick.
///
/// Arrows that run out of range or speed count as misses for their
/// team. Arrows that leave the canvas are discarded silently.
pub fn advance_arrows(world: &mut World, events: &mut Vec<CombatEvent>) {
    let config = world.config;
    let mut missed = Vec::new();

    for unit in world.units.values_mut() {
        for arrow in unit.arrows.iter_mut().filter(|a| !a.hit) {
            if arrow.advance() {
                arrow.hit = true;
                missed.push((arrow.team, arrow.shooter, arrow.position));
            } else if !config.on_canvas(arrow.position) {
                arrow.hit = true;
            }
        }
    }

    for (team, shooter, position) in missed {
        world.stats[team].arrows_missed += 1;
        events.push(CombatEvent::ArrowMissed { shooter, position });
    }
}

/// Test every live arrow against enemy units, then enemy castles.
///
/// Units and castles already brought to zero this tick are ignored so
/// that nothing is killed twice before the deferred removal.
pub fn resolve_collisions(world: &mut World, events: &mut Vec<CombatEvent>) {
    let shooters: Vec<UnitId> = world.units.keys().collect();

    for shooter_id in shooters {
        let Some(shooter) = world.units.get_mut(shooter_id) else {
            continue;
        };
        if shooter.arrows.is_empty() {
            continue;
        }
        let mut arrows = mem::take(&mut shooter.arrows);

        for arrow in arrows.iter_mut().filter(|a| !a.hit) {
            if strike_unit(world, shooter_id, arrow, events) {
                continue;
            }
            strike_castle(world, shooter_id, arrow, events);
        }

        if let Some(shooter) = world.units.get_mut(shooter_id) {
            shooter.arrows = arrows;
        }
    }
}

fn strike_unit(
    world: &mut World,
    shooter_id: UnitId,
    arrow: &mut Arrow,
    events: &mut Vec<CombatEvent>,
) -> bool {
    let tick = world.tick;
    let Some((target_id, target)) = world.units.iter_mut().find(|(_, u)| {
        u.team != arrow.team && u.is_alive() && u.position.distance(arrow.position) < u.hit_radius()
    }) else {
        return false;
    };

    arrow.hit = true;
    let damage = unit_damage(arrow);
    target.hp -= damage;
    target.say(format!("-{damage} HP!"));
    let lethal = !target.is_alive();
    let victim_team = target.team;
    let victim_position = target.position;
    let victim_skills = target.skills;

    let attacker = &mut world.stats[arrow.team];
    attacker.damage_dealt += damage.unsigned_abs();
    attacker.arrows_hit += 1;
    attacker.record_combat(tick);

    if lethal {
        world.stats[victim_team].units_lost += 1;
        world.stats[victim_team].record_combat(tick);
        world.stats[arrow.team].units_killed += 1;
        if victim_skills.fighter > DOMINANT_SKILL_THRESHOLD {
            world.stats[victim_team].penalize_knights();
            world.stats[arrow.team].reward_knights();
        } else if victim_skills.worker > DOMINANT_SKILL_THRESHOLD {
            world.stats[victim_team].penalize_workers();
        }
        world.remember_danger(victim_position, DEATH_MEMORY_INTENSITY);
        tracing::debug!(
            tick,
            team = %victim_team,
            unit = ?target_id,
            killer = ?shooter_id,
            "Unit killed"
        );
    }

    if let Some(shooter) = world.units.get_mut(shooter_id) {
        shooter.skills.fighter += HIT_SKILL_GAIN;
        if lethal {
            shooter.say("Killed enemy!");
        }
    }

    events.push(CombatEvent::UnitHit {
        shooter: shooter_id,
        target: target_id,
        damage,
        lethal,
    });
    true
}

fn strike_castle(
    world: &mut World,
    shooter_id: UnitId,
    arrow: &mut Arrow,
    events: &mut Vec<CombatEvent>,
) {
    let tick = world.tick;
    let Some((castle_id, castle)) = world.castles.iter_mut().find(|(_, c)| {
        c.team != arrow.team
            && c.is_standing()
            && c.position.distance(arrow.position) < CASTLE_HIT_RADIUS
    }) else {
        return;
    };

    arrow.hit = true;
    let damage = castle_damage(arrow);
    castle.hp -= damage;
    let destroyed = !castle.is_standing();
    let castle_position = castle.position;
    let castle_team = castle.team;

    let attacker = &mut world.stats[arrow.team];
    attacker.damage_dealt += damage.unsigned_abs();
    attacker.arrows_hit += 1;

    if destroyed {
        world.remember_danger(castle_position, CASTLE_MEMORY_INTENSITY);
        tracing::info!(tick, team = %castle_team, castle = ?castle_id, "Castle destroyed");
    }

    events.push(CombatEvent::CastleHit {
        shooter: shooter_id,
        castle: castle_id,
        damage,
        destroyed,
    });
}
