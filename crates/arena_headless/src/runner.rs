//! Headless match runner.
//!
//! Steps a [`Simulation`] built from a [`Scenario`] until a victory
//! condition is met, folding every tick into a [`MetricsCollector`] and
//! optionally emitting periodic progress reports.

use arena_core::factions::{PerTeam, Team};
use arena_core::simulation::Simulation;
use arena_core::stats::{TeamCombatStats, TeamSummary};
use arena_core::world::World;
use serde::{Deserialize, Serialize};

use crate::metrics::{EndCondition, MatchMetrics, MetricsCollector};
use crate::scenario::{Scenario, ScenarioError, VictoryConditions};

/// Runner settings for one match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Identifier written into the metrics.
    pub match_id: String,
    /// Random seed.
    pub seed: u64,
    /// Hard cap on ticks, independent of the scenario's time limit.
    pub max_ticks: u64,
    /// Emit a [`ProgressReport`] every this many ticks.
    pub report_interval: Option<u64>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            match_id: "match_0".to_string(),
            seed: 0,
            max_ticks: 36_000,
            report_interval: None,
        }
    }
}

impl MatchConfig {
    /// Config for `seed` with a matching id.
    #[must_use]
    pub fn for_seed(seed: u64) -> Self {
        Self {
            match_id: format!("match_{seed}"),
            seed,
            ..Default::default()
        }
    }
}

/// Periodic view of a running match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    /// Match identifier.
    pub match_id: String,
    /// Current tick.
    pub tick: u64,
    /// Aggregates per team.
    pub summaries: PerTeam<TeamSummary>,
    /// Combat record per team.
    pub stats: PerTeam<TeamCombatStats>,
}

impl ProgressReport {
    fn capture(match_id: &str, world: &World) -> Self {
        Self {
            match_id: match_id.to_string(),
            tick: world.tick(),
            summaries: PerTeam::new(world.team_summary(Team::Blue), world.team_summary(Team::Red)),
            stats: PerTeam::new(*world.stats(Team::Blue), *world.stats(Team::Red)),
        }
    }
}

/// Decide whether the match is over.
///
/// Only teams that started with a unit or castle can be eliminated.
/// Returns the winner (None = draw) and how the match ended.
#[must_use]
pub fn check_outcome(
    world: &World,
    victory: &VictoryConditions,
    contested: &PerTeam<bool>,
) -> Option<(Option<Team>, EndCondition)> {
    if victory.elimination {
        let eliminated = |team: Team| {
            contested[team]
                && world.population(team) == 0
                && !world.castles().any(|(_, c)| c.team == team)
        };
        match (eliminated(Team::Blue), eliminated(Team::Red)) {
            (true, true) => return Some((None, EndCondition::MutualDestruction)),
            (true, false) => return Some((Some(Team::Red), EndCondition::Elimination)),
            (false, true) => return Some((Some(Team::Blue), EndCondition::Elimination)),
            (false, false) => {}
        }
    }

    match victory.time_limit_ticks {
        Some(limit) if world.tick() >= limit => Some((None, EndCondition::TimeLimit)),
        _ => None,
    }
}

/// Runs one match to completion.
#[derive(Debug)]
pub struct MatchRunner {
    sim: Simulation,
    config: MatchConfig,
    victory: VictoryConditions,
    contested: PerTeam<bool>,
    collector: MetricsCollector,
}

impl MatchRunner {
    /// Build the scenario with the config's seed.
    pub fn new(scenario: &Scenario, config: MatchConfig) -> Result<Self, ScenarioError> {
        let sim = scenario.build(Some(config.seed))?;
        let world = sim.world();
        let contested = PerTeam::new(
            world.population(Team::Blue) > 0 || world.castles().any(|(_, c)| c.team == Team::Blue),
            world.population(Team::Red) > 0 || world.castles().any(|(_, c)| c.team == Team::Red),
        );
        let collector = MetricsCollector::new(&config.match_id, &scenario.name, config.seed);
        Ok(Self {
            sim,
            config,
            victory: scenario.victory,
            contested,
            collector,
        })
    }

    /// The simulation being run.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Advance one tick. Returns the outcome once the match is over.
    pub fn step(&mut self) -> Option<(Option<Team>, EndCondition)> {
        let events = self.sim.tick();
        self.collector.observe(&events, self.sim.world());
        check_outcome(self.sim.world(), &self.victory, &self.contested)
    }

    /// Run until the match ends, passing each periodic report to `on_report`.
    pub fn run_with_reports(mut self, mut on_report: impl FnMut(&ProgressReport)) -> MatchMetrics {
        let (winner, end_condition) = loop {
            if self.sim.current_tick() >= self.config.max_ticks {
                break (None, EndCondition::TickLimit);
            }
            let outcome = self.step();

            if let Some(interval) = self.config.report_interval.filter(|&i| i > 0) {
                if self.sim.current_tick() % interval == 0 {
                    on_report(&ProgressReport::capture(&self.config.match_id, self.sim.world()));
                }
            }

            if let Some(outcome) = outcome {
                break outcome;
            }
        };

        let hash = self.sim.state_hash();
        tracing::info!(
            match_id = %self.config.match_id,
            seed = self.config.seed,
            ticks = self.sim.current_tick(),
            winner = ?winner,
            end = ?end_condition,
            "Match finished"
        );
        self.collector
            .finalize(self.sim.world(), winner, end_condition, hash)
    }

    /// Run until the match ends.
    pub fn run(self) -> MatchMetrics {
        self.run_with_reports(|_| {})
    }
}

/// Build and run one match.
pub fn run_match(scenario: &Scenario, config: MatchConfig) -> Result<MatchMetrics, ScenarioError> {
    Ok(MatchRunner::new(scenario, config)?.run())
}
