//! Behavioral tuning constants.
//!
//! These are fixed at compile time; only the world bounds in
//! [`WorldConfig`](crate::config::WorldConfig) vary between runs.
//! Durations are in ticks at [`TICK_RATE`].

use std::f32::consts::PI;

/// Simulated ticks per second.
pub const TICK_RATE: u32 = 60;

// =============================================================================
// Perception
// =============================================================================

/// How far a unit can see.
pub const VISION_RADIUS: f32 = 80.0;
/// Full opening angle of the vision cone.
pub const VISION_ANGLE: f32 = PI / 3.0;
/// Half of [`VISION_ANGLE`]; the cone spans facing ± this.
pub const VISION_HALF_ANGLE: f32 = VISION_ANGLE / 2.0;
/// Default reach for freshly sampled waypoints.
pub const WAYPOINT_RANGE: f32 = 150.0;
/// Attempts before waypoint sampling falls back to straight ahead.
pub const WAYPOINT_SAMPLE_ATTEMPTS: u32 = 20;
/// Score given to points outside the vision cone.
pub const OUT_OF_CONE_SCORE: f32 = -100.0;
/// Baseline utility for waypoints forced by combat or leadership.
pub const PRIORITY_WAYPOINT_SCORE: f32 = 100.0;
/// Per-tick chance of re-evaluating the current waypoint.
pub const WAYPOINT_REVIEW_CHANCE: f64 = 0.03;
/// Second per-tick roll, honoured only when the waypoint has left the cone.
pub const LOST_WAYPOINT_REVIEW_CHANCE: f64 = 0.05;

// =============================================================================
// Movement
// =============================================================================

/// Base unit speed before multipliers.
pub const BASE_SPEED: f32 = 1.0;
/// Speed multiplier when moving forward.
pub const FORWARD_SPEED_MULTIPLIER: f32 = 1.5;
/// Speed multiplier when moving backward.
pub const BACKWARD_SPEED_MULTIPLIER: f32 = 0.7;
/// Speed multiplier when moving sideways.
pub const SIDEWAYS_SPEED_MULTIPLIER: f32 = 1.0;
/// Waypoint bonus weight for forward paths.
pub const FORWARD_PATH_WEIGHT: f32 = 2.0;
/// Minimum distance before a forward waypoint earns the path bonus.
pub const MIN_DISTANCE_FOR_TURN: f32 = 50.0;
/// Fraction of the heading error corrected per tick.
pub const STEERING_RATE: f32 = 0.05;
/// Fraction of the heading error toward the arena centre corrected per tick.
pub const CENTER_BIAS_RATE: f32 = 0.01;
/// Blend rate toward the edge-avoidance heading.
pub const EDGE_AVOIDANCE_RATE: f32 = 0.5;
/// Radius in which stronger enemies push a unit's heading away.
pub const ENEMY_AVOIDANCE_RADIUS: f32 = 150.0;
/// Blend rate toward the enemy-avoidance heading.
pub const ENEMY_AVOIDANCE_RATE: f32 = 0.4;
/// Distance under which a unit counts as arrived at its waypoint.
pub const ARRIVAL_DISTANCE: f32 = 3.0;
/// Velocity blend toward the target velocity per tick.
pub const MOMENTUM_FACTOR: f32 = 0.8;
/// Velocity damping per tick.
pub const FRICTION: f32 = 0.97;
/// Maximum velocity magnitude.
pub const MAX_VELOCITY: f32 = 2.5;
/// Target-velocity decay while standing still.
pub const IDLE_VELOCITY_DECAY: f32 = 0.9;
/// Radius of the pairwise separation force.
pub const SEPARATION_RADIUS: f32 = 40.0;
/// Position change per unit of separation force.
pub const SEPARATION_STEP: f32 = 0.05;

// =============================================================================
// Energy
// =============================================================================

/// Energy ceiling.
pub const MAX_ENERGY: f32 = 100.0;
/// Energy regained per tick while asleep.
pub const ENERGY_RECOVERY_RATE: f32 = 0.2;
/// Energy regained per tick while awake and standing still.
pub const IDLE_RECOVERY_RATE: f32 = 0.0025;
/// Energy drained per tick while walking.
pub const WALK_ENERGY_COST: f32 = 0.02;
/// Energy drained per tick while running.
pub const RUN_ENERGY_COST: f32 = 0.1;
/// Energy drained per tick while not moving.
pub const IDLE_ENERGY_COST: f32 = 0.005;
/// Energy spent per arrow.
pub const ATTACK_ENERGY_COST: f32 = 0.5;
/// Extra drain per tick while drawing a bow.
pub const AIMING_ENERGY_COST: f32 = 0.01;
/// Extra drain per tick for a worker busy with the economy.
pub const WORK_ENERGY_COST: f32 = 0.03;
/// Speed multiplier when walking.
pub const WALK_SPEED_MULTIPLIER: f32 = 1.0;
/// Speed multiplier when running.
pub const RUN_SPEED_MULTIPLIER: f32 = 1.8;
/// Below this energy a unit may not run.
pub const LOW_ENERGY_THRESHOLD: f32 = 30.0;
/// Below this energy a unit moves with [`CRITICAL_SPEED_PENALTY`].
pub const CRITICAL_ENERGY_THRESHOLD: f32 = 10.0;
/// Speed multiplier applied at critical energy.
pub const CRITICAL_SPEED_PENALTY: f32 = 0.6;
/// Chance per eligible tick that a tired unit falls asleep.
pub const SLEEP_PROBABILITY: f64 = 0.33;
/// Energy below which a unit considers sleeping.
pub const SLEEP_ENERGY_THRESHOLD: f32 = 40.0;
/// Shortest sleep.
pub const MIN_SLEEP_DURATION: u32 = 120;
/// Longest sleep.
pub const MAX_SLEEP_DURATION: u32 = 300;
/// Ticks after waking before a unit can sleep again.
pub const SLEEP_COOLDOWN: u32 = 300;
/// Friction applied on top of [`FRICTION`] while asleep.
pub const SLEEP_DRIFT_DAMPING: f32 = 0.8;
/// Shortest awake stretch between rest breaks.
pub const MIN_TIME_UNTIL_REST: u32 = 300;
/// Longest awake stretch between rest breaks.
pub const MAX_TIME_UNTIL_REST: u32 = 900;
/// Shortest rest break.
pub const MIN_REST_DURATION: u32 = 120;
/// Longest rest break.
pub const MAX_REST_DURATION: u32 = 300;

// =============================================================================
// Combat
// =============================================================================

/// Farthest distance at which a target is acquired or kept.
pub const MAX_ATTACK_RANGE: f32 = 300.0;
/// Preferred engagement distance.
pub const OPTIMAL_ATTACK_RANGE: f32 = 150.0;
/// Closest comfortable engagement distance.
pub const MIN_ATTACK_RANGE: f32 = 30.0;
/// Defensive units back off inside this distance.
pub const DEFENSIVE_RETREAT_RANGE: f32 = OPTIMAL_ATTACK_RANGE - MIN_ATTACK_RANGE;
/// Fastest arrow launch speed.
pub const MAX_ARROW_SPEED: f32 = 8.0;
/// Slowest arrow launch speed.
pub const MIN_ARROW_SPEED: f32 = 3.0;
/// Arrow speed retained per tick.
pub const ARROW_AIR_RESISTANCE: f32 = 0.98;
/// Downward acceleration added to an arrow's drift per tick.
pub const ARROW_GRAVITY: f32 = 0.03;
/// Arrows slower than this drop out of the air.
pub const ARROW_MIN_FLIGHT_SPEED: f32 = 0.5;
/// Absolute arrow range cap.
pub const ARROW_RANGE_CAP: f32 = 550.0;
/// Arrow range as a multiple of the engagement distance.
pub const ARROW_RANGE_FACTOR: f32 = 1.5;
/// Trail points kept per arrow.
pub const ARROW_TRAIL_LENGTH: usize = 5;
/// Cap on the target-lead prediction factor.
pub const MAX_ARROW_PREDICTION: f32 = 1.5;
/// Accuracy before skill bonus.
pub const ACCURACY_FACTOR: f32 = 0.9;
/// Accuracy floor.
pub const MIN_ACCURACY: f32 = 0.2;
/// Accuracy ceiling.
pub const MAX_ACCURACY: f32 = 0.99;
/// Base arrow damage to units.
pub const ARROW_UNIT_DAMAGE: f32 = 50.0;
/// Minimum speed ratio used for unit damage.
pub const MIN_DAMAGE_SPEED_RATIO: f32 = 0.5;
/// Flat arrow damage to castles.
pub const ARROW_CASTLE_BASE_DAMAGE: f32 = 20.0;
/// Speed-scaled arrow damage to castles.
pub const ARROW_CASTLE_SPEED_DAMAGE: f32 = 30.0;
/// Radius within which an arrow strikes a castle.
pub const CASTLE_HIT_RADIUS: f32 = 20.0;
/// Fighter skill gained per hit.
pub const HIT_SKILL_GAIN: f32 = 0.02;
/// Ticks an archer waits after finding itself too tired to shoot.
pub const TIRED_FIRE_COOLDOWN: u32 = 60;
/// Fighter skill gained per arrow loosed.
pub const FIRE_SKILL_GAIN: f32 = 0.05;
/// Effectiveness change applied per kill.
pub const EFFECTIVENESS_STEP: f32 = 0.05;
/// Skill above which a unit counts as a fighter or worker for combat bookkeeping.
pub const DOMINANT_SKILL_THRESHOLD: f32 = 0.5;
/// Ticks for which combat counts as recent.
pub const RECENT_COMBAT_TICKS: u64 = 10 * TICK_RATE as u64;
/// Ticks after which combat counts as long past.
pub const STALE_COMBAT_TICKS: u64 = 30 * TICK_RATE as u64;

// =============================================================================
// Economy
// =============================================================================

/// Radius for picking up apples and depositing food.
pub const INTERACTION_RADIUS: f32 = 15.0;
/// Food carried per apple.
pub const APPLE_FOOD_VALUE: u32 = 10;
/// Ticks an apple lies on the ground before rotting.
pub const APPLE_LIFETIME: u32 = 1800;
/// Ticks per tree growth stage.
pub const TREE_STAGE_TICKS: u32 = 720;
/// Ticks between apple drops.
pub const TREE_DROP_TICKS: u32 = 3600;
/// Final tree growth stage.
pub const TREE_MAX_STAGE: u8 = 5;
/// Food spent to raise a castle.
pub const CASTLE_BUILD_COST: u32 = 50;
/// Ticks spent raising a castle.
pub const CASTLE_BUILD_TIME: u32 = 200;
/// No castle may be raised closer than this to another one.
pub const BUILD_PROTECTION_RADIUS: f32 = 60.0;
/// Worker skill gained per deposit.
pub const DEPOSIT_SKILL_GAIN: f32 = 0.05;
/// Worker skill gained per castle raised.
pub const BUILD_SKILL_GAIN: f32 = 0.2;
/// Castle hit points.
pub const CASTLE_MAX_HP: i32 = 200;
/// Ticks between castle spawn decisions.
pub const CASTLE_SPAWN_INTERVAL: u32 = 300;
/// Hard team population cap.
pub const UNIT_CAP: usize = 50;
/// Worker spawn weight drops to zero once a team has this many workers.
pub const WORKER_CAP: usize = 5;
/// Food cost of a leader.
pub const LEADER_COST: u32 = 100;
/// Food cost of a fighter.
pub const FIGHTER_COST: u32 = 50;
/// Food cost of a worker.
pub const WORKER_COST: u32 = 25;
/// Chance of a free unskilled recruit when no skilled spawn happens.
pub const PEASANT_SPAWN_CHANCE: f64 = 0.25;
/// Castle food above which leaders are favoured.
pub const LEADER_FOOD_BONUS_THRESHOLD: u32 = 200;
/// Food spent per trained rookie.
pub const TRAINING_COST: u32 = 10;
/// Ticks between training attempts.
pub const TRAINING_COOLDOWN: u32 = 300;
/// Chance per tick that an eligible trainer trains.
pub const TRAINING_CHANCE: f64 = 0.02;
/// Trainer skill gained per rookie.
pub const TRAINING_SKILL_GAIN: f32 = 0.05;

// =============================================================================
// Animals
// =============================================================================

/// Animals released by the standard skirmish.
pub const ANIMAL_COUNT: usize = 5;
/// Animal hit points.
pub const ANIMAL_HP: i32 = 50;
/// Slowest cruising speed an animal can roll.
pub const ANIMAL_MIN_SPEED: f32 = 0.5;
/// Spread of cruising speeds above [`ANIMAL_MIN_SPEED`].
pub const ANIMAL_SPEED_RANGE: f32 = 1.0;
/// Other animals closer than this pull on the heading.
pub const ANIMAL_NEIGHBOR_RADIUS: f32 = 50.0;
/// Fraction of the heading error toward the neighbours' centroid corrected per tick.
pub const ANIMAL_COHESION_RATE: f32 = 0.05;
/// Full width of the random heading jitter per tick.
pub const ANIMAL_JITTER: f32 = 0.1;
/// Animals turn back once within this many margins of an edge.
pub const ANIMAL_EDGE_FACTOR: f32 = 1.5;
/// Velocity blend toward the cruising velocity per tick.
pub const ANIMAL_MOMENTUM: f32 = 0.05;

// =============================================================================
// Leadership
// =============================================================================

/// Ticks between order decisions.
pub const ORDER_INTERVAL: u32 = 300;
/// Leader skill separating tactical from strategic leaders.
pub const LEADERSHIP_THRESHOLD: f32 = 1.0;
/// Attack weight floor for strategic leaders.
pub const STRATEGIC_ATTACK_FLOOR: f32 = 2.0;
/// Attack weight change per net kill.
pub const KILL_DIFFERENTIAL_WEIGHT: f32 = 0.5;
/// Fraction of the distance to 1.0 recovered by every order weight.
pub const ORDER_MEAN_REVERSION: f32 = 0.1;
/// Leader skill gained per order.
pub const ORDER_SKILL_GAIN: f32 = 0.05;
/// Chance per tick a strategic leader re-targets the resource centre.
pub const RESOURCE_CONTROL_CHANCE: f64 = 0.1;
/// Distance from the resource centre considered close enough.
pub const RESOURCE_CONTROL_RADIUS: f32 = 50.0;
/// Radius around the resource centre counted as controlled.
pub const RESOURCE_CONTROL_ZONE: f32 = 100.0;

// =============================================================================
// Memory
// =============================================================================

/// Intensity retained per tick.
pub const MEMORY_DECAY: f32 = 0.999;
/// Memories at or below this intensity are forgotten.
pub const MEMORY_FORGET_THRESHOLD: f32 = 0.05;
/// Memory left where a unit died.
pub const DEATH_MEMORY_INTENSITY: f32 = 2.0;
/// Memory left where a castle fell.
pub const CASTLE_MEMORY_INTENSITY: f32 = 3.0;
/// Radius within which memories repel waypoints.
pub const MEMORY_AVOIDANCE_RADIUS: f32 = 200.0;
/// Waypoint cost per unit of intensity-weighted proximity.
pub const MEMORY_AVOIDANCE_WEIGHT: f32 = 0.02;

// =============================================================================
// Messages
// =============================================================================

/// Ticks a message stays on screen.
pub const MESSAGE_DURATION: u32 = 60;
