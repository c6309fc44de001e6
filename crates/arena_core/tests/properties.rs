//! Property tests over whole-world runs.
//!
//! Each case builds a random arena, runs it for a while and checks the
//! invariants that must hold after every tick.

use std::collections::HashMap;

use arena_core::prelude::*;
use arena_test_utils::fixtures;
use arena_test_utils::proptest::prelude::*;
use arena_test_utils::strategies::{arb_army, arb_position};

fn arena_with(seed: u64, army: &[UnitSpawn]) -> Simulation {
    let mut sim = fixtures::empty_arena(seed);
    for spawn in army {
        sim.spawn_unit(*spawn);
    }
    sim
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_energy_stays_in_bounds(seed in any::<u64>(), army in arb_army(12)) {
        let mut sim = arena_with(seed, &army);
        for _ in 0..300 {
            sim.tick();
            for unit in sim.world().units() {
                prop_assert!(unit.energy >= 0.0 && unit.energy <= unit.max_energy);
            }
        }
    }

    #[test]
    fn prop_units_stay_inside_margins(seed in any::<u64>(), army in arb_army(12)) {
        let mut sim = arena_with(seed, &army);
        let config = *sim.world().config();
        for _ in 0..300 {
            sim.tick();
            for unit in sim.world().units() {
                prop_assert!(config.contains(unit.position), "{:?} escaped", unit.position);
            }
        }
    }

    #[test]
    fn prop_animals_stay_inside_margins(
        seed in any::<u64>(),
        herd in prop::collection::vec(arb_position(WorldConfig::default()), 1..12),
    ) {
        let mut sim = fixtures::empty_arena(seed);
        for position in herd {
            sim.spawn_animal(position);
        }
        let config = *sim.world().config();
        for _ in 0..1200 {
            sim.tick();
            for (_, animal) in sim.world().animals() {
                prop_assert!(config.contains(animal.position), "{:?} escaped", animal.position);
            }
        }
    }

    #[test]
    fn prop_affinities_are_bounded_and_live(seed in any::<u64>(), army in arb_army(16)) {
        let mut sim = arena_with(seed, &army);
        let mut first_seen: HashMap<(UnitId, UnitId), f32> = HashMap::new();
        for _ in 0..200 {
            sim.tick();
            let world = sim.world();
            for unit in world.units() {
                for (&other, &affinity) in &unit.affinities {
                    prop_assert!((-1.0..1.0).contains(&affinity));
                    prop_assert!(world.unit(other).is_some());
                    let seen = *first_seen.entry((unit.id, other)).or_insert(affinity);
                    prop_assert_eq!(seen, affinity);
                }
            }
        }
    }

    #[test]
    fn prop_castle_food_is_conserved(
        seed in any::<u64>(),
        food in 0u32..400,
        army in arb_army(8),
    ) {
        let mut sim = arena_with(seed, &army);
        let config = *sim.world().config();
        let castle = sim.spawn_castle(Team::Blue, config.center(), food, None);
        sim.castle_mut(castle).unwrap().spawn_timer = 1;

        for _ in 0..900 {
            let before = sim.world().castle(castle).map(|c| c.food);
            let events = sim.tick();
            let (Some(before), Some(after)) = (before, sim.world().castle(castle).map(|c| c.food)) else {
                break;
            };

            let mut expected = i64::from(before);
            for event in &events.production {
                match *event {
                    ProductionEvent::UnitRecruited { castle: c, recruit, .. } if c == castle => {
                        prop_assert!(i64::from(recruit.cost()) <= expected);
                        expected -= i64::from(recruit.cost());
                    }
                    ProductionEvent::RookieTrained { castle: c, .. } if c == castle => expected -= 10,
                    _ => {}
                }
            }
            for event in &events.economy {
                if let EconomyEvent::FoodDeposited { castle: c, amount, .. } = *event {
                    if c == castle {
                        expected += i64::from(amount);
                    }
                }
            }
            prop_assert_eq!(i64::from(after), expected);
        }
    }

    #[test]
    fn prop_apples_dropped_anywhere_are_safe(
        seed in any::<u64>(),
        apples in prop::collection::vec(arb_position(WorldConfig::default()), 0..20),
    ) {
        let mut sim = fixtures::skirmish(seed);
        for position in apples {
            sim.spawn_apple(position);
        }
        for _ in 0..300 {
            sim.tick();
        }
        let world = sim.world();
        for (_, apple) in world.apples() {
            if let Some(holder) = apple.held_by {
                prop_assert!(world.unit(holder).is_some());
            }
        }
    }
}
