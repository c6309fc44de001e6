//! Match metrics collection for balance analysis.
//!
//! A [`MetricsCollector`] folds each tick's events into per-team counters.
//! Combat totals come from the teams' own combat records at the end of
//! the match; everything else is counted from events as it happens.

use std::collections::HashMap;

use arena_core::components::Order;
use arena_core::economy::EconomyEvent;
use arena_core::factions::{PerTeam, Team};
use arena_core::production::{ProductionEvent, Recruit};
use arena_core::simulation::TickEvents;
use arena_core::world::World;
use serde::{Deserialize, Serialize};

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EndCondition {
    /// One team has no units and no castles left.
    Elimination,
    /// Both teams were wiped out on the same tick.
    MutualDestruction,
    /// The scenario's time limit was reached.
    TimeLimit,
    /// The runner's tick cap was reached first.
    #[default]
    TickLimit,
}

/// Complete metrics for a single match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchMetrics {
    /// Unique match identifier.
    pub match_id: String,
    /// Scenario name.
    pub scenario: String,
    /// Random seed used.
    pub seed: u64,
    /// Match duration in ticks.
    pub duration_ticks: u64,
    /// Winning team (None = draw).
    pub winner: Option<Team>,
    /// How the match ended.
    pub end_condition: EndCondition,
    /// Per-team metrics.
    pub teams: PerTeam<TeamMetrics>,
    /// Final simulation state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl MatchMetrics {
    /// Create an empty record.
    #[must_use]
    pub fn new(match_id: impl Into<String>, scenario: impl Into<String>, seed: u64) -> Self {
        Self {
            match_id: match_id.into(),
            scenario: scenario.into(),
            seed,
            ..Default::default()
        }
    }
}

/// Metrics for one team in a match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamMetrics {
    // === Production ===
    /// Units recruited by castles, by kind.
    pub recruited: HashMap<Recruit, u32>,
    /// Rookies trained in the field.
    pub rookies_trained: u32,
    /// Largest head count seen.
    pub peak_population: usize,
    /// Head count at the end.
    pub final_population: usize,

    // === Economy ===
    /// Apples picked up.
    pub apples_gathered: u32,
    /// Food delivered to castles.
    pub food_deposited: u32,
    /// Food stored at the end.
    pub final_stored_food: u32,
    /// Castles raised by workers.
    pub castles_built: u32,
    /// Own castles destroyed.
    pub castles_lost: u32,

    // === Combat ===
    /// Arrows loosed.
    pub arrows_fired: u32,
    /// Arrows that struck.
    pub arrows_hit: u32,
    /// Arrows that fell short.
    pub arrows_missed: u32,
    /// Enemy units killed.
    pub units_killed: u32,
    /// Own units lost.
    pub units_lost: u32,
    /// Damage dealt.
    pub damage_dealt: u32,
    /// Kills per loss, counting a flawless match as one loss.
    pub kd_ratio: f64,

    // === Leadership ===
    /// Orders issued, by kind.
    pub orders: HashMap<Order, u32>,

    // === Timing ===
    /// Tick of the first arrow loosed.
    pub first_attack_tick: Option<u64>,
}

impl TeamMetrics {
    /// Total units recruited by castles.
    #[must_use]
    pub fn total_recruited(&self) -> u32 {
        self.recruited.values().sum()
    }

    /// Calculate derived statistics.
    pub fn calculate_derived_stats(&mut self) {
        self.kd_ratio = self.units_killed as f64 / self.units_lost.max(1) as f64;
    }
}

/// Summary statistics across multiple matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total matches played.
    pub total_matches: u32,
    /// Matches won by each team.
    pub wins: PerTeam<u32>,
    /// Win rates by team.
    pub win_rates: PerTeam<f64>,
    /// Draws count.
    pub draws: u32,
    /// Average match duration in ticks.
    pub avg_duration_ticks: f64,
    /// Shortest match.
    pub min_duration_ticks: u64,
    /// Longest match.
    pub max_duration_ticks: u64,

    // === Aggregated Stats ===
    /// Average recruits per match.
    pub avg_recruited: PerTeam<f64>,
    /// Average food deposited per match.
    pub avg_food_deposited: PerTeam<f64>,
    /// Average K/D ratio.
    pub avg_kd_ratio: PerTeam<f64>,
    /// Average tick of the first shot, over matches with one.
    pub avg_first_attack_tick: PerTeam<Option<f64>>,
}

impl BatchSummary {
    /// Calculate summary from a list of match metrics.
    #[must_use]
    pub fn from_matches(matches: &[MatchMetrics]) -> Self {
        if matches.is_empty() {
            return Self::default();
        }

        let count = matches.len() as f64;
        let mut summary = Self {
            total_matches: matches.len() as u32,
            min_duration_ticks: u64::MAX,
            ..Default::default()
        };

        let mut duration_sum = 0u64;
        for game in matches {
            duration_sum += game.duration_ticks;
            summary.min_duration_ticks = summary.min_duration_ticks.min(game.duration_ticks);
            summary.max_duration_ticks = summary.max_duration_ticks.max(game.duration_ticks);

            match game.winner {
                Some(team) => summary.wins[team] += 1,
                None => summary.draws += 1,
            }
        }
        summary.avg_duration_ticks = duration_sum as f64 / count;

        for team in Team::ALL {
            let per_team = || matches.iter().map(|m| &m.teams[team]);

            summary.win_rates[team] = summary.wins[team] as f64 / count;
            summary.avg_recruited[team] =
                per_team().map(|t| t.total_recruited() as f64).sum::<f64>() / count;
            summary.avg_food_deposited[team] =
                per_team().map(|t| t.food_deposited as f64).sum::<f64>() / count;

            summary.avg_kd_ratio[team] = per_team().map(|t| t.kd_ratio).sum::<f64>() / count;

            let firsts: Vec<u64> = per_team().filter_map(|t| t.first_attack_tick).collect();
            summary.avg_first_attack_tick[team] = if firsts.is_empty() {
                None
            } else {
                Some(firsts.iter().sum::<u64>() as f64 / firsts.len() as f64)
            };
        }

        summary
    }

    /// Check if both win rates are within `threshold` of each other's.
    #[must_use]
    pub fn is_balanced(&self, threshold: f64) -> bool {
        (self.win_rates.blue - self.win_rates.red).abs() <= threshold
    }

    /// Team winning clearly more often, if any.
    #[must_use]
    pub fn dominant_team(&self, threshold: f64) -> Option<Team> {
        let gap = self.win_rates.blue - self.win_rates.red;
        if gap > threshold {
            Some(Team::Blue)
        } else if -gap > threshold {
            Some(Team::Red)
        } else {
            None
        }
    }
}

/// Metrics collector that folds tick events during a match.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    metrics: MatchMetrics,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    #[must_use]
    pub fn new(match_id: &str, scenario: &str, seed: u64) -> Self {
        Self {
            metrics: MatchMetrics::new(match_id, scenario, seed),
        }
    }

    /// Fold one tick's events. `world` is the state after that tick.
    pub fn observe(&mut self, events: &TickEvents, world: &World) {
        let tick = world.tick();
        let team_of_unit = |id| world.unit(id).map(|u| u.team);

        for event in &events.production {
            match *event {
                ProductionEvent::UnitRecruited { castle, unit, recruit } => {
                    let team = team_of_unit(unit).or_else(|| world.castle(castle).map(|c| c.team));
                    if let Some(team) = team {
                        *self.metrics.teams[team].recruited.entry(recruit).or_default() += 1;
                    }
                }
                ProductionEvent::RookieTrained { trainer, rookie, .. } => {
                    if let Some(team) = team_of_unit(rookie).or_else(|| team_of_unit(trainer)) {
                        self.metrics.teams[team].rookies_trained += 1;
                    }
                }
            }
        }

        for event in &events.economy {
            match *event {
                EconomyEvent::ApplePickedUp { unit, .. } => {
                    if let Some(team) = team_of_unit(unit) {
                        self.metrics.teams[team].apples_gathered += 1;
                    }
                }
                EconomyEvent::FoodDeposited { castle, amount, unit } => {
                    let team = world.castle(castle).map(|c| c.team).or_else(|| team_of_unit(unit));
                    if let Some(team) = team {
                        self.metrics.teams[team].food_deposited += amount;
                    }
                }
                EconomyEvent::CastleBuilt { castle, unit } => {
                    let team = world.castle(castle).map(|c| c.team).or_else(|| team_of_unit(unit));
                    if let Some(team) = team {
                        self.metrics.teams[team].castles_built += 1;
                    }
                }
                EconomyEvent::AppleDropped { .. } => {}
            }
        }

        for order in &events.orders {
            *self.metrics.teams[order.team].orders.entry(order.order).or_default() += 1;
        }

        for fallen in &events.castles_destroyed {
            self.metrics.teams[fallen.team].castles_lost += 1;
        }

        for team in Team::ALL {
            let metrics = &mut self.metrics.teams[team];
            metrics.peak_population = metrics.peak_population.max(world.population(team));
            if metrics.first_attack_tick.is_none() && world.stats(team).attacks_launched > 0 {
                metrics.first_attack_tick = Some(tick);
                tracing::debug!(team = %team, tick, "First attack");
            }
        }
    }

    /// Get current metrics.
    #[must_use]
    pub fn current(&self) -> &MatchMetrics {
        &self.metrics
    }

    /// Finalize and return the metrics.
    #[must_use]
    pub fn finalize(
        mut self,
        world: &World,
        winner: Option<Team>,
        end_condition: EndCondition,
        final_state_hash: u64,
    ) -> MatchMetrics {
        self.metrics.duration_ticks = world.tick();
        self.metrics.winner = winner;
        self.metrics.end_condition = end_condition;
        self.metrics.final_state_hash = final_state_hash;

        for team in Team::ALL {
            let stats = world.stats(team);
            let summary = world.team_summary(team);
            let metrics = &mut self.metrics.teams[team];
            metrics.arrows_fired = stats.attacks_launched;
            metrics.arrows_hit = stats.arrows_hit;
            metrics.arrows_missed = stats.arrows_missed;
            metrics.units_killed = stats.units_killed;
            metrics.units_lost = stats.units_lost;
            metrics.damage_dealt = stats.damage_dealt;
            metrics.final_population = summary.unit_count;
            metrics.final_stored_food = summary.stored_food;
            metrics.peak_population = metrics.peak_population.max(summary.unit_count);
            metrics.calculate_derived_stats();
        }

        self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(winner: Option<Team>, duration: u64, blue_kills: u32, blue_losses: u32) -> MatchMetrics {
        let mut game = MatchMetrics::new("m", "test", 0);
        game.winner = winner;
        game.duration_ticks = duration;
        game.teams.blue.units_killed = blue_kills;
        game.teams.blue.units_lost = blue_losses;
        game.teams.blue.food_deposited = 40;
        game.teams.blue.first_attack_tick = Some(duration / 2);
        game.teams.blue.calculate_derived_stats();
        game
    }

    #[test]
    fn test_kd_ratio() {
        let mut team = TeamMetrics {
            units_killed: 6,
            units_lost: 3,
            ..Default::default()
        };
        team.calculate_derived_stats();
        assert!((team.kd_ratio - 2.0).abs() < f64::EPSILON);

        team.units_lost = 0;
        team.calculate_derived_stats();
        assert!((team.kd_ratio - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_batch_summary() {
        let games = vec![
            finished(Some(Team::Blue), 1000, 4, 2),
            finished(Some(Team::Red), 3000, 1, 1),
            finished(None, 2000, 0, 0),
        ];
        let summary = BatchSummary::from_matches(&games);

        assert_eq!(summary.total_matches, 3);
        assert_eq!(summary.wins, PerTeam::new(1, 1));
        assert_eq!(summary.draws, 1);
        assert!((summary.avg_duration_ticks - 2000.0).abs() < f64::EPSILON);
        assert_eq!(summary.min_duration_ticks, 1000);
        assert_eq!(summary.max_duration_ticks, 3000);
        assert!((summary.avg_food_deposited.blue - 40.0).abs() < f64::EPSILON);
        assert_eq!(summary.avg_first_attack_tick.blue, Some(1000.0));
        assert_eq!(summary.avg_first_attack_tick.red, None);
        assert!(summary.is_balanced(0.01));
        assert_eq!(summary.dominant_team(0.1), None);
    }

    #[test]
    fn test_dominant_team() {
        let games = vec![
            finished(Some(Team::Red), 100, 0, 1),
            finished(Some(Team::Red), 100, 0, 1),
            finished(Some(Team::Blue), 100, 1, 0),
        ];
        let summary = BatchSummary::from_matches(&games);
        assert_eq!(summary.dominant_team(0.2), Some(Team::Red));
        assert!(!summary.is_balanced(0.2));
    }

    #[test]
    fn test_empty_batch() {
        let summary = BatchSummary::from_matches(&[]);
        assert_eq!(summary.total_matches, 0);
        assert_eq!(summary.min_duration_ticks, 0);
    }

    #[test]
    fn test_metrics_serialize_to_json() {
        let mut game = finished(Some(Team::Blue), 10, 1, 0);
        game.teams.red.orders.insert(Order::Attack, 2);
        game.teams.red.recruited.insert(Recruit::Worker, 1);
        let json = serde_json::to_string(&game).unwrap();
        assert!(json.contains("\"Attack\":2"));
        assert!(json.contains("\"Worker\":1"));
    }
}
