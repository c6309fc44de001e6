//! Test fixtures and helpers.
//!
//! Pre-built arenas and unit configurations for consistent testing.

use arena_core::components::{Personality, Skills, UnitId};
use arena_core::config::WorldConfig;
use arena_core::factions::Team;
use arena_core::math::Vec2;
use arena_core::simulation::Simulation;
use arena_core::unit::UnitSpawn;

/// Body size used by fixture units.
pub const FIXTURE_UNIT_SIZE: f32 = 30.0;

/// An empty arena of the default size.
#[must_use]
pub fn empty_arena(seed: u64) -> Simulation {
    Simulation::with_seed(WorldConfig::default(), seed).expect("default config is valid")
}

/// The standard two-castle skirmish.
#[must_use]
pub fn skirmish(seed: u64) -> Simulation {
    let mut sim = empty_arena(seed);
    sim.spawn_standard_skirmish();
    sim
}

/// Spawn a unit with a fixed personality.
pub fn spawn(
    sim: &mut Simulation,
    team: Team,
    position: Vec2,
    skills: Skills,
    personality: Personality,
) -> UnitId {
    sim.spawn_unit(
        UnitSpawn::new(team, position, FIXTURE_UNIT_SIZE, skills).with_personality(personality),
    )
}

/// Two aggressive archers facing each other `distance` apart across the
/// middle of the arena, ready to shoot. Returns (blue, red).
pub fn duel(sim: &mut Simulation, distance: f32) -> (UnitId, UnitId) {
    let center = sim.world().config().center();
    let blue = spawn(
        sim,
        Team::Blue,
        Vec2::new(center.x - distance / 2.0, center.y),
        Skills::fighter(),
        Personality::Aggressive,
    );
    let red = spawn(
        sim,
        Team::Red,
        Vec2::new(center.x + distance / 2.0, center.y),
        Skills::fighter(),
        Personality::Aggressive,
    );

    for (id, angle) in [(blue, 0.0), (red, std::f32::consts::PI)] {
        let unit = sim.unit_mut(id).expect("fixture unit exists");
        unit.angle = angle;
        unit.fire_cooldown = 0;
        unit.rest.time_until_rest = 10_000;
        unit.sleep.cooldown = 10_000;
    }
    (blue, red)
}

/// A worker standing next to a loose apple with its team castle `distance`
/// away to the left. Returns the worker.
pub fn worker_beside_apple(sim: &mut Simulation, distance: f32) -> UnitId {
    let center = sim.world().config().center();
    sim.spawn_castle(Team::Blue, Vec2::new(center.x - distance, center.y), 0, None);
    sim.spawn_apple(Vec2::new(center.x + 5.0, center.y));
    spawn(
        sim,
        Team::Blue,
        center,
        Skills::worker(),
        Personality::Neutral,
    )
}
