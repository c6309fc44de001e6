//! Batch match runner for balance testing.
//!
//! Runs many seeds of one scenario in parallel using rayon and collects
//! their metrics into a [`BatchSummary`].

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::metrics::{BatchSummary, MatchMetrics};
use crate::runner::{run_match, MatchConfig};
use crate::scenario::Scenario;

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario to run
    pub scenario: Scenario,
    /// Number of matches to run
    pub match_count: u32,
    /// Maximum parallel matches (0 = use rayon default)
    pub parallel_matches: u32,
    /// Seed of the first match; match `i` uses `seed_start + i`
    pub seed_start: u64,
    /// Maximum ticks per match
    pub max_ticks: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::skirmish(),
            match_count: 100,
            parallel_matches: 0,
            seed_start: 0,
            max_ticks: 36_000,
        }
    }
}

impl BatchConfig {
    /// Create a new batch config
    pub fn new(scenario: Scenario, match_count: u32) -> Self {
        Self {
            scenario,
            match_count,
            ..Default::default()
        }
    }

    /// Set starting seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the per-match tick cap
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Limit the number of matches run at once
    pub fn with_parallelism(mut self, threads: u32) -> Self {
        self.parallel_matches = threads;
        self
    }
}

/// Results of a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual match results, in seed order
    pub matches: Vec<MatchMetrics>,
    /// Summary statistics
    pub summary: BatchSummary,
    /// Total wall clock time
    pub duration_seconds: f64,
    /// Matches that could not be run
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Match index
    pub match_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Progress tracking for batch runs
#[derive(Debug)]
pub struct BatchProgress {
    /// Total matches
    pub total: u32,
    completed: AtomicU32,
    start_time: Instant,
}

impl BatchProgress {
    /// Create new progress tracker
    pub fn new(total: u32) -> Self {
        Self {
            total,
            completed: AtomicU32::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a completed match and return the new count
    pub fn record_completion(&self) -> u32 {
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get current completion count
    pub fn current(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Get completion percentage
    pub fn percentage(&self) -> f64 {
        self.current() as f64 / self.total.max(1) as f64 * 100.0
    }

    /// Get estimated time remaining
    pub fn eta(&self) -> Duration {
        let completed = self.current();
        if completed == 0 {
            return Duration::from_secs(0);
        }

        let per_match = self.start_time.elapsed().as_secs_f64() / completed as f64;
        let remaining = self.total.saturating_sub(completed);
        Duration::from_secs_f64(per_match * remaining as f64)
    }
}

fn run_one(config: &BatchConfig, index: u32, progress: &BatchProgress) -> Result<MatchMetrics, BatchError> {
    let seed = config.seed_start.wrapping_add(u64::from(index));
    let match_config = MatchConfig {
        match_id: format!("match_{seed}"),
        seed,
        max_ticks: config.max_ticks,
        report_interval: None,
    };

    match run_match(&config.scenario, match_config) {
        Ok(metrics) => {
            let completed = progress.record_completion();
            if completed % 10 == 0 {
                debug!(
                    completed,
                    total = progress.total,
                    percent = progress.percentage(),
                    eta_secs = progress.eta().as_secs(),
                    "Batch progress"
                );
            }
            Ok(metrics)
        }
        Err(e) => {
            warn!(index, seed, error = %e, "Match failed");
            Err(BatchError {
                match_index: index,
                seed,
                message: e.to_string(),
            })
        }
    }
}

/// Run a batch of matches
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    let progress = BatchProgress::new(config.match_count);

    info!(
        scenario = %config.scenario.name,
        matches = config.match_count,
        "Starting batch run"
    );

    let run_all = || -> Vec<Result<MatchMetrics, BatchError>> {
        (0..config.match_count)
            .into_par_iter()
            .map(|i| run_one(&config, i, &progress))
            .collect()
    };

    let results = if config.parallel_matches > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_matches as usize)
            .build()
        {
            Ok(pool) => pool.install(run_all),
            Err(e) => {
                warn!(error = %e, "Failed to build thread pool, using global pool");
                run_all()
            }
        }
    } else {
        run_all()
    };

    let mut matches = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(metrics) => matches.push(metrics),
            Err(e) => errors.push(e),
        }
    }

    let summary = BatchSummary::from_matches(&matches);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        matches = matches.len(),
        errors = errors.len(),
        seconds = duration_seconds,
        "Batch complete"
    );

    BatchResults {
        config,
        matches,
        summary,
        duration_seconds,
        errors,
    }
}

/// Run the same seed `runs` times and check every run ends identically.
pub fn verify_determinism(scenario: &Scenario, seed: u64, runs: u32, max_ticks: u64) -> bool {
    let hashes: Vec<Option<(u64, u64)>> = (0..runs)
        .into_par_iter()
        .map(|_| {
            let config = MatchConfig {
                max_ticks,
                ..MatchConfig::for_seed(seed)
            };
            run_match(scenario, config)
                .ok()
                .map(|m| (m.final_state_hash, m.duration_ticks))
        })
        .collect();

    hashes.first().is_some_and(Option::is_some) && hashes.windows(2).all(|w| w[0] == w[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_config_default() {
        let config = BatchConfig::default();
        assert_eq!(config.match_count, 100);
        assert_eq!(config.scenario.name, "Standard Skirmish");
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new(Scenario::open_field(), 500)
            .with_seed(12345)
            .with_max_ticks(600)
            .with_parallelism(2);

        assert_eq!(config.scenario.name, "Open Field");
        assert_eq!(config.match_count, 500);
        assert_eq!(config.seed_start, 12345);
        assert_eq!(config.max_ticks, 600);
        assert_eq!(config.parallel_matches, 2);
    }

    #[test]
    fn test_progress_tracking() {
        let progress = BatchProgress::new(4);
        assert_eq!(progress.current(), 0);
        assert_eq!(progress.eta(), Duration::from_secs(0));
        assert_eq!(progress.record_completion(), 1);
        assert_eq!(progress.record_completion(), 2);
        assert!((progress.percentage() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_small_batch_runs_every_seed() {
        let config = BatchConfig::new(Scenario::skirmish(), 4)
            .with_seed(100)
            .with_max_ticks(120)
            .with_parallelism(2);
        let results = run_batch(config);

        assert!(results.errors.is_empty());
        assert_eq!(results.summary.total_matches, 4);
        let seeds: Vec<u64> = results.matches.iter().map(|m| m.seed).collect();
        assert_eq!(seeds, vec![100, 101, 102, 103]);
    }

    #[test]
    fn test_invalid_scenario_is_reported() {
        let mut scenario = Scenario::skirmish();
        scenario.world.width = 10.0;
        let results = run_batch(BatchConfig::new(scenario, 2).with_max_ticks(10));
        assert!(results.matches.is_empty());
        assert_eq!(results.errors.len(), 2);
    }

    #[test]
    fn test_determinism_across_runs() {
        assert!(verify_determinism(&Scenario::skirmish(), 77, 3, 300));
    }

    #[test]
    fn test_results_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        let results = run_batch(BatchConfig::new(Scenario::skirmish(), 2).with_max_ticks(60));
        results.save(&path).unwrap();

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.matches.len(), 2);
        assert_eq!(loaded.summary.total_matches, 2);
        assert_eq!(loaded.matches[0].final_state_hash, results.matches[0].final_state_hash);
    }
}
