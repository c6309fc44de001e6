//! Proptest strategies for arena types.
//!
//! These generate random but reproducible inputs for property-based
//! tests of the simulation.

use arena_core::components::{Personality, Skills};
use arena_core::config::WorldConfig;
use arena_core::factions::Team;
use arena_core::math::Vec2;
use arena_core::unit::UnitSpawn;
use proptest::prelude::*;

/// Any team.
pub fn arb_team() -> impl Strategy<Value = Team> {
    prop_oneof![Just(Team::Blue), Just(Team::Red)]
}

/// Any personality.
pub fn arb_personality() -> impl Strategy<Value = Personality> {
    prop::sample::select(Personality::ALL.to_vec())
}

/// Skills as a castle or trainer would hand them out, plus mixed sets.
pub fn arb_skills() -> impl Strategy<Value = Skills> {
    prop_oneof![
        Just(Skills::NONE),
        Just(Skills::fighter()),
        Just(Skills::worker()),
        Just(Skills::leader()),
        (0.0f32..3.0, 0.0f32..3.0, 0.0f32..3.0, 0.0f32..2.0).prop_map(
            |(fighter, worker, leader, trainer)| Skills {
                fighter,
                worker,
                leader,
                trainer,
            }
        ),
    ]
}

/// A point anywhere on the canvas of `config`, margins included.
pub fn arb_position(config: WorldConfig) -> impl Strategy<Value = Vec2> {
    (0.0..config.width, 0.0..config.height).prop_map(|(x, y)| Vec2::new(x, y))
}

/// A heading in `[-2π, 2π)`.
pub fn arb_angle() -> impl Strategy<Value = f32> {
    -std::f32::consts::TAU..std::f32::consts::TAU
}

/// Spawn parameters anywhere in a default-sized arena.
pub fn arb_unit_spawn() -> impl Strategy<Value = UnitSpawn> {
    (
        arb_team(),
        arb_position(WorldConfig::default()),
        15.0f32..40.0,
        arb_skills(),
        arb_personality(),
    )
        .prop_map(|(team, position, size, skills, personality)| {
            UnitSpawn::new(team, position, size, skills).with_personality(personality)
        })
}

/// A small army of spawns.
pub fn arb_army(max: usize) -> impl Strategy<Value = Vec<UnitSpawn>> {
    prop::collection::vec(arb_unit_spawn(), 1..=max)
}
