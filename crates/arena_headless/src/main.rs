//! Headless arena runner.
//!
//! Runs matches without graphics. Results and progress reports go to
//! stdout as JSON, logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Run the standard skirmish, reporting every 10 seconds of game time
//! cargo run -p arena_headless -- run --report-every 600
//!
//! # Run a scenario file with a fixed seed
//! cargo run -p arena_headless -- run --scenario scenarios/open_field.ron --seed 42
//!
//! # Run a batch of seeds in parallel
//! cargo run -p arena_headless -- batch --count 200 --output results/
//!
//! # Check a scenario file
//! cargo run -p arena_headless -- validate scenarios/orchard.ron
//! ```
//!
//! `RUST_LOG` overrides the log level chosen by `--verbose`.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use arena_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    runner::{MatchConfig, MatchRunner},
    scenario::{Scenario, ScenarioError},
};

/// Ticks per minute of game time.
const TICKS_PER_MINUTE: u64 = 60 * 60;

#[derive(Parser)]
#[command(name = "arena_headless")]
#[command(about = "Headless medieval arena runner")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single match
    Run {
        /// Scenario file or built-in name
        #[arg(short, long)]
        scenario: Option<String>,

        /// Random seed (default: scenario seed, then entropy)
        #[arg(long)]
        seed: Option<u64>,

        /// Maximum game duration in minutes
        #[arg(long, default_value = "10")]
        duration_minutes: u64,

        /// Print a progress report every N ticks
        #[arg(long)]
        report_every: Option<u64>,
    },

    /// Run a batch of matches for balance testing
    Batch {
        /// Scenario file or built-in name
        #[arg(short, long)]
        scenario: Option<String>,

        /// Number of matches to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Maximum game duration in minutes
        #[arg(long, default_value = "10")]
        duration_minutes: u64,

        /// Output directory for results
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse and check a scenario file
    Validate {
        /// Scenario file
        path: PathBuf,
    },

    /// Verify determinism by running the same seed several times
    Verify {
        /// Scenario file or built-in name
        #[arg(short, long)]
        scenario: Option<String>,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Ticks per run
        #[arg(long, default_value = "3600")]
        ticks: u64,
    },

    /// Run N ticks for benchmarking
    Benchmark {
        /// Number of ticks to run
        #[arg(short, long, default_value = "36000")]
        ticks: u64,

        /// Scenario file or built-in name
        #[arg(short, long)]
        scenario: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries JSON
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let result = match cli.command {
        Some(Commands::Run {
            scenario,
            seed,
            duration_minutes,
            report_every,
        }) => cmd_run(scenario.as_deref(), seed, duration_minutes, report_every),
        Some(Commands::Batch {
            scenario,
            count,
            parallel,
            seed,
            duration_minutes,
            output,
        }) => cmd_batch(scenario.as_deref(), count, parallel, seed, duration_minutes, output),
        Some(Commands::Validate { path }) => cmd_validate(&path),
        Some(Commands::Verify {
            scenario,
            seed,
            runs,
            ticks,
        }) => cmd_verify(scenario.as_deref(), seed, runs, ticks),
        Some(Commands::Benchmark { ticks, scenario }) => cmd_benchmark(ticks, scenario.as_deref()),
        None => cmd_run(None, None, 10, None),
    };

    if let Err(message) = result {
        tracing::error!(error = %message, "Command failed");
        eprintln!("FATAL: {message}");
        std::process::exit(1);
    }
}

/// Resolve a scenario argument: a built-in name, else a RON file path.
fn load_scenario(arg: Option<&str>) -> Result<Scenario, ScenarioError> {
    match arg {
        None => Ok(Scenario::skirmish()),
        Some(name) => match Scenario::builtin(name) {
            Some(scenario) => Ok(scenario),
            None => Scenario::load(name),
        },
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string(value).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

/// Run a single match, printing reports and the final metrics as JSON lines.
fn cmd_run(
    scenario: Option<&str>,
    seed: Option<u64>,
    duration_minutes: u64,
    report_every: Option<u64>,
) -> Result<(), String> {
    let scenario = load_scenario(scenario).map_err(|e| e.to_string())?;
    let seed = seed.or(scenario.seed).unwrap_or_else(rand_seed);
    let config = MatchConfig {
        max_ticks: duration_minutes * TICKS_PER_MINUTE,
        report_interval: report_every,
        ..MatchConfig::for_seed(seed)
    };

    tracing::info!(scenario = %scenario.name, seed, max_ticks = config.max_ticks, "Starting match");

    let runner = MatchRunner::new(&scenario, config).map_err(|e| e.to_string())?;
    let mut report_error = None;
    let metrics = runner.run_with_reports(|report| {
        if let Err(e) = print_json(report) {
            report_error.get_or_insert(e);
        }
    });
    if let Some(e) = report_error {
        return Err(e);
    }
    print_json(&metrics)
}

/// Seed for runs that did not ask for one.
fn rand_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Run a batch of matches for balance testing.
fn cmd_batch(
    scenario: Option<&str>,
    count: u32,
    parallel: u32,
    seed: u64,
    duration_minutes: u64,
    output: Option<PathBuf>,
) -> Result<(), String> {
    let scenario = load_scenario(scenario).map_err(|e| e.to_string())?;
    let num_cpus = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1);

    tracing::info!(
        scenario = %scenario.name,
        count,
        parallel,
        seed,
        cpus_available = num_cpus,
        duration_minutes,
        "Batch configuration"
    );

    let config = BatchConfig::new(scenario, count)
        .with_seed(seed)
        .with_max_ticks(duration_minutes * TICKS_PER_MINUTE)
        .with_parallelism(parallel);
    let results = run_batch(config);

    if let Some(dir) = output {
        std::fs::create_dir_all(&dir)
            .map_err(|e| format!("cannot create '{}': {e}", dir.display()))?;
        let path = dir.join("batch_results.json");
        results
            .save(&path)
            .map_err(|e| format!("cannot write '{}': {e}", path.display()))?;
        tracing::info!(path = %path.display(), "Results saved");
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Matches played: {}", summary.total_matches);
    if !results.errors.is_empty() {
        eprintln!("Matches failed: {}", results.errors.len());
    }
    eprintln!(
        "Blue wins: {} ({:.1}%)",
        summary.wins.blue,
        summary.win_rates.blue * 100.0
    );
    eprintln!(
        "Red wins:  {} ({:.1}%)",
        summary.wins.red,
        summary.win_rates.red * 100.0
    );
    eprintln!("Draws: {}", summary.draws);
    eprintln!("Avg duration: {:.0} ticks", summary.avg_duration_ticks);
    eprintln!("Wall time: {:.1}s", results.duration_seconds);

    print_json(summary)
}

/// Parse a scenario file and build it once.
fn cmd_validate(path: &std::path::Path) -> Result<(), String> {
    let scenario = Scenario::load(path).map_err(|e| e.to_string())?;
    let sim = scenario.build(Some(0)).map_err(|e| e.to_string())?;
    tracing::info!(
        scenario = %scenario.name,
        units = sim.world().unit_count(),
        castles = sim.world().castles().count(),
        trees = sim.world().trees().len(),
        animals = sim.world().animals().count(),
        "Scenario is valid"
    );
    Ok(())
}

/// Run the same seed several times and compare final hashes.
fn cmd_verify(scenario: Option<&str>, seed: u64, runs: u32, ticks: u64) -> Result<(), String> {
    let scenario = load_scenario(scenario).map_err(|e| e.to_string())?;
    if verify_determinism(&scenario, seed, runs, ticks) {
        tracing::info!(seed, runs, ticks, "Determinism verified");
        Ok(())
    } else {
        Err(format!("runs of seed {seed} diverged"))
    }
}

/// Run a fixed number of ticks and report throughput.
fn cmd_benchmark(ticks: u64, scenario: Option<&str>) -> Result<(), String> {
    let scenario = load_scenario(scenario).map_err(|e| e.to_string())?;
    let mut sim = scenario.build(Some(12345)).map_err(|e| e.to_string())?;

    let start = Instant::now();
    for _ in 0..ticks {
        sim.tick();
    }
    let elapsed = start.elapsed();
    let tps = ticks as f64 / elapsed.as_secs_f64();

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BENCHMARK RESULTS");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Ticks: {ticks}");
    eprintln!("Duration: {:.3}s", elapsed.as_secs_f64());
    eprintln!("Ticks/second: {tps:.1}");
    eprintln!("ms/tick: {:.4}", elapsed.as_secs_f64() * 1000.0 / ticks.max(1) as f64);
    eprintln!("Units alive: {}", sim.world().unit_count());
    eprintln!("State hash: {:016x}", sim.state_hash());
    Ok(())
}
