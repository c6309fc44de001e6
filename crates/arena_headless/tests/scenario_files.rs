//! Integration tests over the scenario files shipped in `scenarios/`.

use std::path::PathBuf;

use arena_core::factions::Team;
use arena_headless::runner::{run_match, MatchConfig, MatchRunner};
use arena_headless::scenario::{Scenario, ScenarioError};
use arena_test_utils::determinism::{run_parallel_simulations, verify_simulation_determinism};

fn scenario_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../scenarios")
        .join(name)
}

#[test]
fn test_shipped_scenarios_load_and_build() {
    for name in ["skirmish.ron", "open_field.ron", "orchard.ron"] {
        let scenario = Scenario::load(scenario_path(name))
            .unwrap_or_else(|e| panic!("{name} failed to load: {e}"));
        let sim = scenario
            .build(Some(1))
            .unwrap_or_else(|e| panic!("{name} failed to build: {e}"));
        assert!(sim.world().unit_count() > 0, "{name} has no units");
    }
}

#[test]
fn test_shipped_skirmish_matches_builtin() {
    let file = Scenario::load(scenario_path("skirmish.ron")).unwrap();
    let builtin = Scenario::skirmish();
    let a = file.build(Some(9)).unwrap();
    let b = builtin.build(Some(9)).unwrap();
    assert_eq!(a.state_hash(), b.state_hash());
}

#[test]
fn test_orchard_layout() {
    let scenario = Scenario::load(scenario_path("orchard.ron")).unwrap();
    assert_eq!(scenario.seed, Some(2024));

    let sim = scenario.build(None).unwrap();
    let world = sim.world();
    assert_eq!(world.trees().len(), 8);
    assert_eq!(world.animals().count(), 6);
    assert_eq!(world.population(Team::Blue), 4);
    assert_eq!(world.population(Team::Red), 4);
    let names: Vec<_> = world
        .castles()
        .filter_map(|(_, c)| c.name.clone())
        .collect();
    assert!(names.contains(&"Camelot".to_string()));
    assert!(names.contains(&"Mordor".to_string()));
}

#[test]
fn test_scenario_builds_are_deterministic() {
    let scenario = Scenario::load(scenario_path("orchard.ron")).unwrap();
    assert!(verify_simulation_determinism(
        || scenario.build(Some(3)).unwrap(),
        600
    ));
    run_parallel_simulations(|| Scenario::open_field().build(Some(4)).unwrap(), 3, 300)
        .assert_deterministic();
}

#[test]
fn test_scenario_roundtrips_through_ron() {
    let original = Scenario::open_field();
    let text = ron::to_string(&original).unwrap();
    assert_eq!(Scenario::from_ron_str(&text).unwrap(), original);
}

#[test]
fn test_malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.ron");
    std::fs::write(&path, "Scenario(name: ").unwrap();
    assert!(matches!(Scenario::load(&path), Err(ScenarioError::ParseError(_))));
}

#[test]
fn test_close_squads_exchange_arrows() {
    let mut scenario = Scenario::open_field();
    scenario.teams[0].units[0].position = (540.0, 360.0);
    scenario.teams[1].units[0].position = (740.0, 360.0);
    let config = MatchConfig {
        max_ticks: 3600,
        ..MatchConfig::for_seed(8)
    };
    let metrics = MatchRunner::new(&scenario, config).unwrap().run();

    assert!(metrics.teams.blue.arrows_fired > 0, "blue squad never shot");
    assert!(metrics.teams.blue.first_attack_tick.is_some());
    let resolved = metrics.teams.blue.arrows_hit + metrics.teams.blue.arrows_missed;
    assert!(resolved <= metrics.teams.blue.arrows_fired);
}

#[test]
fn test_match_metrics_are_reproducible() {
    let config = || MatchConfig {
        max_ticks: 1200,
        ..MatchConfig::for_seed(21)
    };
    let scenario = Scenario::load(scenario_path("orchard.ron")).unwrap();
    let a = run_match(&scenario, config()).unwrap();
    let b = run_match(&scenario, config()).unwrap();
    assert_eq!(a.final_state_hash, b.final_state_hash);
    assert_eq!(a.teams.blue.food_deposited, b.teams.blue.food_deposited);
    assert_eq!(a.teams.red.apples_gathered, b.teams.red.apples_gathered);
}
