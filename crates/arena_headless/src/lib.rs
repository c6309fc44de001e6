//! Headless match runner for balance testing and CI verification.
//!
//! This crate runs the arena without graphics:
//!
//! - **Scenarios**: RON files (or built-ins) describing the starting arena
//! - **Matches**: step a simulation to a victory condition, collecting metrics
//! - **Batches**: many seeds in parallel, summarized for balance analysis
//!
//! # Output
//!
//! - **stdout**: Progress reports and results (JSON lines)
//! - **stderr**: Logs (human-readable)
//!
//! # Example
//!
//! ```
//! use arena_headless::runner::{run_match, MatchConfig};
//! use arena_headless::scenario::Scenario;
//!
//! let config = MatchConfig { max_ticks: 60, ..MatchConfig::for_seed(1) };
//! let metrics = run_match(&Scenario::skirmish(), config).unwrap();
//! assert_eq!(metrics.duration_ticks, 60);
//! ```

pub mod batch;
pub mod metrics;
pub mod runner;
pub mod scenario;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults};
pub use metrics::{BatchSummary, EndCondition, MatchMetrics, MetricsCollector, TeamMetrics};
pub use runner::{check_outcome, run_match, MatchConfig, MatchRunner, ProgressReport};
pub use scenario::{Scenario, ScenarioError};
