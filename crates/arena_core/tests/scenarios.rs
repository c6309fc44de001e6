//! Scenario tests that drive the full tick loop.

use arena_core::prelude::*;
use arena_core::tuning::UNIT_CAP;
use arena_test_utils::fixtures;

#[test]
fn test_duel_archers_open_fire() {
    let mut sim = fixtures::empty_arena(21);
    let (blue, red) = fixtures::duel(&mut sim, 140.0);

    let mut shooters = Vec::new();
    for _ in 0..600 {
        for event in sim.tick().combat {
            if let CombatEvent::ArrowFired { shooter, .. } = event {
                shooters.push(shooter);
            }
        }
    }
    assert!(shooters.contains(&blue) || shooters.contains(&red));
    let stats = sim.world().stats(Team::Blue);
    assert!(stats.attacks_launched > 0 || sim.world().stats(Team::Red).attacks_launched > 0);
}

#[test]
fn test_worker_delivers_apple_home() {
    let mut sim = fixtures::empty_arena(22);
    let worker = fixtures::worker_beside_apple(&mut sim, 100.0);

    let mut picked = false;
    let mut delivered = 0;
    for _ in 0..3000 {
        for event in sim.tick().economy {
            match event {
                EconomyEvent::ApplePickedUp { unit, .. } if unit == worker => picked = true,
                EconomyEvent::FoodDeposited { unit, amount, .. } if unit == worker => {
                    delivered += amount;
                }
                _ => {}
            }
        }
        if delivered > 0 {
            break;
        }
    }
    assert!(picked);
    assert_eq!(delivered, 10);
    let unit = sim.unit(worker).unwrap();
    assert_eq!(unit.inventory.carrying, 0);
    assert!(unit.inventory.hands_empty());
}

#[test]
fn test_homeless_worker_turns_builder() {
    let mut sim = fixtures::empty_arena(23);
    let center = sim.world().config().center();
    let worker = fixtures::spawn(
        &mut sim,
        Team::Red,
        center,
        Skills::worker(),
        Personality::Neutral,
    );
    {
        let unit = sim.unit_mut(worker).unwrap();
        unit.activity = ActivityState::Return;
        unit.inventory.carrying = 60;
    }

    sim.tick();
    assert_eq!(sim.unit(worker).unwrap().activity, ActivityState::Build);
}

#[test]
fn test_loaded_worker_delivers_once_a_castle_stands() {
    let mut sim = fixtures::empty_arena(25);
    let center = sim.world().config().center();
    sim.spawn_apple(Vec2::new(center.x + 5.0, center.y));
    let worker = fixtures::spawn(
        &mut sim,
        Team::Blue,
        center,
        Skills::worker(),
        Personality::Neutral,
    );

    // Picks the apple up, finds no castle and cannot afford to build one
    sim.run(5);
    let unit = sim.unit(worker).unwrap();
    assert_eq!(unit.inventory.carrying, 10);
    assert_eq!(unit.activity, ActivityState::Gather);

    let position = sim.unit(worker).unwrap().position;
    let castle = sim.spawn_castle(Team::Blue, Vec2::new(position.x - 100.0, position.y), 0, None);

    let mut delivered = 0;
    for _ in 0..6000 {
        for event in sim.tick().economy {
            if let EconomyEvent::FoodDeposited { unit, amount, .. } = event {
                if unit == worker {
                    delivered += amount;
                }
            }
        }
        if delivered > 0 {
            break;
        }
    }
    assert_eq!(delivered, 10);
    assert_eq!(sim.unit(worker).unwrap().inventory.carrying, 0);
    assert_eq!(sim.world().castle(castle).unwrap().food, 10);
}

#[test]
fn test_skirmish_respects_population_cap() {
    let mut sim = fixtures::skirmish(24);
    for castle in sim
        .world()
        .castles()
        .map(|(id, _)| id)
        .collect::<Vec<_>>()
    {
        sim.castle_mut(castle).unwrap().food = 100_000;
    }

    for _ in 0..6000 {
        sim.tick();
        for team in Team::ALL {
            assert!(sim.world().population(team) <= UNIT_CAP);
        }
    }
}

#[test]
fn test_long_skirmish_keeps_world_consistent() {
    let mut sim = fixtures::skirmish(25);
    let config = *sim.world().config();

    for _ in 0..3000 {
        let events = sim.tick();
        for id in &events.deaths {
            assert!(sim.world().unit(*id).is_none());
        }
    }

    let world = sim.world();
    for unit in world.units() {
        assert!(unit.is_alive());
        assert!(config.contains(unit.position));
        assert!(unit.energy >= 0.0 && unit.energy <= unit.max_energy);
        if let Some(target) = unit.current_target {
            // Stale targets are allowed but must not point at friends
            if let Some(t) = world.unit(target) {
                assert_ne!(t.team, unit.team);
            }
        }
        assert!(unit.arrows.iter().all(|a| !a.hit));
    }
    for (_, castle) in world.castles() {
        assert!(castle.is_standing());
    }
}

#[test]
fn test_snapshot_matches_world() {
    let mut sim = fixtures::skirmish(26);
    sim.run(120);
    let snapshot = sim.snapshot();
    assert_eq!(snapshot.tick, 120);
    assert_eq!(snapshot.units.len(), sim.world().unit_count());
    assert_eq!(snapshot.trees.len(), 5);
    assert_eq!(snapshot.animals.len(), sim.world().animals().count());
    assert!(!snapshot.animals.is_empty());
    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("Camelot"));
}

#[test]
fn test_attack_mode_engages_reluctant_fighters() {
    let mut sim = fixtures::empty_arena(27);
    let center = sim.world().config().center();
    let weak = fixtures::spawn(
        &mut sim,
        Team::Blue,
        Vec2::new(center.x - 60.0, center.y),
        Skills {
            fighter: 0.2,
            ..Skills::NONE
        },
        Personality::Friendly,
    );
    fixtures::spawn(
        &mut sim,
        Team::Red,
        Vec2::new(center.x + 60.0, center.y),
        Skills::NONE,
        Personality::Neutral,
    );
    sim.unit_mut(weak).unwrap().target_lock_timer = 0;

    sim.tick();
    assert!(sim.unit(weak).unwrap().current_target.is_none());

    sim.set_attack_mode(Team::Blue, true);
    sim.unit_mut(weak).unwrap().target_lock_timer = 0;
    sim.tick();
    assert!(sim.unit(weak).unwrap().current_target.is_some());
}

#[test]
fn test_herd_roams_and_counts_towards_state_hash() {
    let mut herd = fixtures::empty_arena(28);
    let mut bare = fixtures::empty_arena(28);
    let center = herd.world().config().center();
    let start: Vec<Vec2> = (0..4)
        .map(|i| Vec2::new(center.x + 10.0 * i as f32, center.y))
        .collect();
    for &position in &start {
        herd.spawn_animal(position);
    }
    assert_ne!(herd.state_hash(), bare.state_hash());

    herd.run(120);
    bare.run(120);
    assert_ne!(herd.state_hash(), bare.state_hash());

    let animals: Vec<&Animal> = herd.world().animals().map(|(_, a)| a).collect();
    assert_eq!(animals.len(), start.len());
    for (animal, origin) in animals.iter().zip(&start) {
        assert!(animal.position.distance(*origin) > 1.0, "animal never moved");
        assert!(herd.world().config().contains(animal.position));
        assert!(animal.is_alive());
    }
}
