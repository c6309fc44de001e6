//! Energy, sleep and rest breaks.
//!
//! Energy drains with movement and activity and is always kept inside
//! `[0, max_energy]`. Tired units may fall asleep; sleeping units
//! recover quickly and do nothing but drift. Rest breaks are a separate
//! clock that pauses a unit periodically regardless of its energy.

use rand::Rng;

use crate::components::{ActivityState, MovementMode, Order, Personality};
use crate::config::WorldConfig;
use crate::movement;
use crate::stats::TeamCombatStats;
use crate::tuning::{
    AIMING_ENERGY_COST, CRITICAL_ENERGY_THRESHOLD, ENERGY_RECOVERY_RATE, IDLE_ENERGY_COST,
    LEADERSHIP_THRESHOLD, LOW_ENERGY_THRESHOLD, MAX_REST_DURATION, MAX_SLEEP_DURATION,
    MAX_TIME_UNTIL_REST, MIN_REST_DURATION, MIN_SLEEP_DURATION, MIN_TIME_UNTIL_REST,
    RUN_ENERGY_COST, SLEEP_COOLDOWN, SLEEP_DRIFT_DAMPING, SLEEP_ENERGY_THRESHOLD,
    SLEEP_PROBABILITY, WALK_ENERGY_COST, WORK_ENERGY_COST,
};
use crate::unit::Unit;
use crate::world::World;

/// Energy above which defensive units consider running.
const DEFENSIVE_RUN_ENERGY: f32 = 70.0;
/// Energy under which strategic leaders walk in peacetime.
const LEADER_CONSERVE_ENERGY: f32 = 80.0;

/// Advance the rest-break clock. Returns `true` while the unit rests,
/// in which case it has already separated and drifted this tick.
pub fn update_rest_cycle<R: Rng + ?Sized>(unit: &mut Unit, world: &World, rng: &mut R) -> bool {
    if unit.rest.resting {
        unit.rest.timer = unit.rest.timer.saturating_sub(1);
        if unit.rest.timer == 0 {
            unit.rest.resting = false;
            unit.rest.time_until_rest = rng.gen_range(MIN_TIME_UNTIL_REST..MAX_TIME_UNTIL_REST);
            unit.say("Back to work/fight!");
            return false;
        }
        movement::apply_separation(unit, world, rng);
        movement::drift(unit, 1.0, world.config());
        return true;
    }

    unit.rest.time_until_rest = unit.rest.time_until_rest.saturating_sub(1);
    if unit.rest.time_until_rest == 0 {
        unit.rest.resting = true;
        unit.rest.timer = rng.gen_range(MIN_REST_DURATION..MAX_REST_DURATION);
        unit.say("Taking a break...");
    }
    false
}

/// Drain or recover energy and run the sleep state machine.
///
/// Returns `true` when the unit is asleep; it has then already drifted
/// and must skip the rest of its update.
pub fn update_energy<R: Rng + ?Sized>(
    unit: &mut Unit,
    config: &WorldConfig,
    rng: &mut R,
) -> bool {
    if unit.sleep.sleeping {
        unit.energy = (unit.energy + ENERGY_RECOVERY_RATE).min(unit.max_energy);
        unit.sleep.timer = unit.sleep.timer.saturating_sub(1);
        if unit.sleep.timer == 0 || unit.energy >= unit.max_energy {
            unit.sleep.sleeping = false;
            unit.sleep.cooldown = SLEEP_COOLDOWN;
            unit.say("Refreshed!");
            tracing::trace!(unit = ?unit.id, energy = unit.energy, "Woke up");
        }
        movement::drift(unit, SLEEP_DRIFT_DAMPING, config);
        return true;
    }

    unit.energy -= if !unit.is_moving {
        IDLE_ENERGY_COST
    } else if unit.movement_mode == MovementMode::Run {
        RUN_ENERGY_COST
    } else {
        WALK_ENERGY_COST
    };
    if unit.skills.fighter > 0.0 && unit.aiming {
        unit.energy -= AIMING_ENERGY_COST;
    }
    if unit.skills.worker > 0.0 && unit.activity != ActivityState::Idle {
        unit.energy -= WORK_ENERGY_COST;
    }
    unit.clamp_energy();

    if !unit.rest.resting
        && unit.sleep.cooldown == 0
        && unit.energy < SLEEP_ENERGY_THRESHOLD
        && rng.gen_bool(SLEEP_PROBABILITY)
    {
        unit.sleep.sleeping = true;
        unit.sleep.timer = rng.gen_range(MIN_SLEEP_DURATION..MAX_SLEEP_DURATION);
        unit.say("Sleeping to recover energy...");
        tracing::trace!(unit = ?unit.id, energy = unit.energy, "Fell asleep");
        return true;
    }
    unit.sleep.cooldown = unit.sleep.cooldown.saturating_sub(1);

    if unit.movement_mode == MovementMode::Run && unit.energy < LOW_ENERGY_THRESHOLD {
        unit.movement_mode = MovementMode::Walk;
        unit.maybe_say(rng, 0.3, "Too tired to run...");
    }
    if unit.energy < CRITICAL_ENERGY_THRESHOLD {
        unit.maybe_say(rng, 0.05, "Exhausted...");
    }
    false
}

/// Pick walk or run from energy, temperament and orders.
pub fn determine_movement_mode<R: Rng + ?Sized>(
    unit: &mut Unit,
    stats: &TeamCombatStats,
    tick: u64,
    rng: &mut R,
) {
    unit.movement_mode = if unit.energy <= LOW_ENERGY_THRESHOLD {
        MovementMode::Walk
    } else if unit.personality == Personality::Aggressive
        || unit.current_order == Some(Order::Attack)
    {
        MovementMode::Run
    } else if unit.personality == Personality::Defensive {
        if unit.energy < DEFENSIVE_RUN_ENERGY || !rng.gen_bool(0.3) {
            MovementMode::Walk
        } else {
            MovementMode::Run
        }
    } else if rng.gen_bool(0.5) {
        MovementMode::Run
    } else {
        MovementMode::Walk
    };

    if unit.skills.leader > LEADERSHIP_THRESHOLD
        && !stats.in_recent_combat(tick)
        && unit.energy < LEADER_CONSERVE_ENERGY
    {
        unit.movement_mode = MovementMode::Walk;
    }
}
