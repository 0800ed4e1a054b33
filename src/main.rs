/* src/main.rs */
#![warn(missing_docs)]
//! # Specula CLI - Speculative Execution Kernel Driver
//!
//! Builds a kernel, declares arenas, spawns workers and runs the health
//! monitor until a deadline, Ctrl-C, or a crash the restart policy gives up on.
/*▫~•◦────────────────────────────────────────────────────────────────────────────────────‣
 * © 2025 ArcMoon Studios ◦ SPDX-License-Identifier MIT OR Apache-2.0 ◦ Author: Lord Xyn ✶
 *///◦────────────────────────────────────────────────────────────────────────────────────‣

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::{signal, task};
use tracing::{error, info, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use specula::{
    interaction::SharedState,
    kernel::{KernelStats, RunExit, SpeculativeKernel},
    worker::{coupled_task, rotation_task},
    KernelConfig, RestartPolicy, RotationConvention, StateVector,
};

// =====================================================================================
// CLI CONFIGURATION & ARGUMENTS
// =====================================================================================

/// Specula CLI - Speculative Execution Kernel Driver
#[derive(Parser, Debug)]
#[command(
    name = "specula",
    version = env!("CARGO_PKG_VERSION"),
    author = "Lord Xyn <lord.xyn@arcmoon.studios>",
    about = "Concurrent workers evolving unit-norm state into named arenas under a pausable health monitor"
)]
struct Args {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level (overrides the configuration file)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "json", global = true)]
    output_format: OutputFormat,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Spawn workers into arenas and monitor them
    Run {
        /// Arena names
        #[arg(short, long, value_delimiter = ',', default_value = "arena1")]
        arenas: Vec<String>,

        /// Workers per arena (defaults to available CPUs spread over arenas)
        #[arg(short, long)]
        workers_per_arena: Option<usize>,

        /// State dimensionality
        #[arg(short, long, default_value = "3")]
        dimensions: usize,

        /// How long to run before stopping
        #[arg(long, default_value = "1000")]
        duration_ms: u64,

        /// Seed for initial states (random if omitted)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Inject a panicking task after this many milliseconds
        #[arg(long)]
        crash_after_ms: Option<u64>,

        /// Pair workers in a ring that periodically interact
        #[arg(long)]
        coupled: bool,
    },

    /// Rotate one state vector and print the result
    Rotate {
        /// Initial components
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_value = "1,0,0")]
        components: Vec<f64>,

        /// Rotation axis
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_value = "0,0,1")]
        axis: Vec<f64>,

        /// Rotation angle, radians
        #[arg(long, allow_hyphen_values = true, default_value_t = std::f64::consts::FRAC_PI_2)]
        angle: f64,

        /// Trig convention
        #[arg(long, default_value = "full")]
        convention: ConventionArg,
    },

    /// Print the effective configuration
    ShowConfig,
}

/// Log level configuration
#[derive(ValueEnum, Clone, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Output format options
#[derive(ValueEnum, Clone, Debug, PartialEq)]
enum OutputFormat {
    Json,
    Yaml,
    Text,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ConventionArg {
    Full,
    Half,
}

impl From<ConventionArg> for RotationConvention {
    fn from(arg: ConventionArg) -> Self {
        match arg {
            ConventionArg::Full => RotationConvention::FullAngle,
            ConventionArg::Half => RotationConvention::HalfAngle,
        }
    }
}

// =====================================================================================
// APPLICATION CONFIGURATION
// =====================================================================================

/// Application configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct AppConfig {
    /// Kernel configuration
    pub kernel: KernelConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct LoggingConfig {
    pub level: String,
    pub json: bool,
    pub file_logging: bool,
    pub log_directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_logging: false,
            log_directory: PathBuf::from("logs"),
        }
    }
}

// =====================================================================================
// RUN COMMAND IMPLEMENTATION
// =====================================================================================

struct RunOptions {
    arenas: Vec<String>,
    workers_per_arena: Option<usize>,
    dimensions: usize,
    duration: Duration,
    seed: Option<u64>,
    crash_after: Option<Duration>,
    coupled: bool,
}

/// Execute the run command
async fn cmd_run(config: KernelConfig, options: RunOptions, format: OutputFormat) -> Result<()> {
    if options.arenas.is_empty() {
        bail!("at least one arena is required");
    }
    let per_arena = options
        .workers_per_arena
        .unwrap_or_else(|| (num_cpus::get() / options.arenas.len()).max(1));
    let seed = options.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);

    let kernel = Arc::new(SpeculativeKernel::new(config));
    for arena in &options.arenas {
        kernel.create_arena(arena.clone());
    }

    let mut states = Vec::with_capacity(options.arenas.len() * per_arena);
    for arena in &options.arenas {
        for _ in 0..per_arena {
            let state = StateVector::random(options.dimensions, &mut rng)
                .context("Failed to draw initial state")?;
            states.push((arena.clone(), state));
        }
    }

    if options.coupled {
        spawn_coupled_ring(&kernel, states)?;
    } else {
        for (arena, state) in states {
            kernel.spawn_worker(arena, state, rotation_task)?;
        }
    }

    if let Some(delay) = options.crash_after {
        kernel.spawn_task("fault-injector", move |_| {
            std::thread::sleep(delay);
            panic!("injected fault after {} ms", delay.as_millis());
        })?;
    }

    info!(
        arenas = options.arenas.len(),
        workers_per_arena = per_arena,
        seed,
        coupled = options.coupled,
        "Kernel workers started"
    );

    let crash = supervise(&kernel, options.duration).await?;

    let stats = {
        let kernel = Arc::clone(&kernel);
        task::spawn_blocking(move || {
            kernel.stop();
            kernel.stats()
        })
        .await
        .context("Kernel stop panicked")?
    };
    println!("{}", render_stats(&stats, &format)?);

    match crash {
        Some(error) => Err(anyhow!(error)),
        None => Ok(()),
    }
}

/// Give each worker its own shared state and the next worker's as its peer.
///
/// Workers are restartable: a relaunch picks up the shared state where the
/// previous run left it.
fn spawn_coupled_ring(kernel: &SpeculativeKernel, states: Vec<(String, StateVector)>) -> Result<()> {
    if states.len() < 2 {
        bail!("coupled mode needs at least two workers in total");
    }
    let shared: Vec<(String, SharedState)> =
        states.into_iter().map(|(arena, state)| (arena, SharedState::new(state))).collect();

    for (index, (arena, own)) in shared.iter().enumerate() {
        let peer = shared[(index + 1) % shared.len()].1.clone();
        let (name, arena, own) = (arena.clone(), arena.clone(), own.clone());
        kernel.spawn_restartable_task(&name, move |kernel| {
            coupled_task(kernel, arena.clone(), own.clone(), peer.clone())
        })?;
    }
    Ok(())
}

/// What the driver does after the monitor reports a crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RestartDecision {
    /// Exited workers were re-spawned; keep monitoring
    Restarted {
        /// Workers relaunched by this restart
        respawned: usize,
    },
    /// Report the crash and shut down
    GiveUp,
}

/// Apply the kernel's restart policy after a crash, given how many restarts
/// this run already used. Blocks while workers observe the pause.
///
/// Gives up when the policy is `FlagOnly`, the budget is spent, or nothing
/// is left executing after the respawn; in that last case the kernel is
/// paused again.
fn apply_restart_policy(kernel: &SpeculativeKernel, restarts: u32) -> specula::Result<RestartDecision> {
    let RestartPolicy::RespawnFromLastSnapshot { max_restarts } = kernel.config().restart_policy else {
        return Ok(RestartDecision::GiveUp);
    };
    if restarts >= max_restarts {
        warn!(restarts, max_restarts, "Restart budget exhausted");
        return Ok(RestartDecision::GiveUp);
    }

    let wait = kernel.config().poll_interval() * 100;
    if !kernel.wait_for_idle(wait) {
        warn!("Some workers did not observe the pause before respawn");
    }
    kernel.resume();
    let respawned = kernel.respawn_exited()?;

    let alive = kernel.worker_statuses().iter().filter(|worker| worker.alive).count();
    if alive == 0 {
        error!(respawned, "No worker left executing after restart");
        kernel.interrupt();
        return Ok(RestartDecision::GiveUp);
    }

    warn!(restarts = restarts + 1, max_restarts, respawned, "Supervised restart after crash");
    Ok(RestartDecision::Restarted { respawned })
}

/// Run the health monitor until the deadline or Ctrl-C, applying the restart
/// policy on crashes. Returns the crash that ended the run, if any.
async fn supervise(kernel: &Arc<SpeculativeKernel>, duration: Duration) -> Result<Option<specula::KernelError>> {
    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);
    let mut restarts = 0u32;

    loop {
        let mut monitor = {
            let kernel = Arc::clone(kernel);
            task::spawn_blocking(move || kernel.run())
        };

        let exit = tokio::select! {
            joined = &mut monitor => joined.context("Health monitor panicked")?,
            _ = signal::ctrl_c() => {
                info!("Ctrl-C received");
                kernel.interrupt();
                monitor.await.context("Health monitor panicked")?
            }
            _ = &mut deadline => {
                info!(duration_ms = duration.as_millis() as u64, "Run duration elapsed");
                kernel.interrupt();
                monitor.await.context("Health monitor panicked")?
            }
        };

        if !matches!(exit, RunExit::WorkerCrashed { .. }) {
            return Ok(None);
        }

        let decision = {
            let kernel = Arc::clone(kernel);
            task::spawn_blocking(move || apply_restart_policy(&kernel, restarts))
                .await
                .context("Restart policy panicked")??
        };
        match decision {
            RestartDecision::Restarted { .. } => restarts += 1,
            RestartDecision::GiveUp => return Ok(exit.crash()),
        }
    }
}

fn render_stats(stats: &KernelStats, format: &OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(stats)?,
        OutputFormat::Yaml => serde_yaml::to_string(stats)?,
        OutputFormat::Text => {
            let mut lines = vec![
                format!("state: {}", stats.state),
                format!(
                    "snapshots: {} (accepted {}, rejected {})",
                    stats.total_snapshots, stats.accepted_allocations, stats.rejected_allocations
                ),
            ];
            for (arena, count) in &stats.arenas {
                lines.push(format!("  arena {arena}: {count}"));
            }
            for worker in &stats.workers {
                let exit = worker.exit.as_ref().map_or("-".to_string(), ToString::to_string);
                lines.push(format!(
                    "  {} alive={} restarts={} retired={} exit={}",
                    worker.name, worker.alive, worker.restarts, worker.retired, exit
                ));
            }
            lines.join("\n")
        }
    })
}

// =====================================================================================
// ROTATE & SHOW-CONFIG COMMANDS
// =====================================================================================

#[derive(Debug, Serialize)]
struct RotationReport {
    convention: RotationConvention,
    axis: [f64; 3],
    angle: f64,
    before: Vec<f64>,
    after: Vec<f64>,
    measure: f64,
}

/// Execute the rotate command
fn cmd_rotate(
    components: Vec<f64>,
    axis: Vec<f64>,
    angle: f64,
    convention: RotationConvention,
    format: &OutputFormat,
) -> Result<()> {
    let axis: [f64; 3] = axis
        .as_slice()
        .try_into()
        .map_err(|_| anyhow!("axis must have exactly 3 components, got {}", axis.len()))?;

    let mut state = StateVector::from_components(components)?;
    let before = state.components().to_vec();
    state.rotate_with(axis, angle, convention)?;

    let report = RotationReport {
        convention,
        axis,
        angle,
        before,
        after: state.components().to_vec(),
        measure: state.measure(),
    };
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Yaml => serde_yaml::to_string(&report)?,
        OutputFormat::Text => format!("{:?} -> {:?} (measure {})", report.before, report.after, report.measure),
    };
    println!("{rendered}");
    Ok(())
}

/// Execute the show-config command
fn cmd_show_config(config: &AppConfig, format: &OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json | OutputFormat::Text => serde_json::to_string_pretty(config)?,
        OutputFormat::Yaml => serde_yaml::to_string(config)?,
    };
    println!("{rendered}");
    Ok(())
}

// =====================================================================================
// MAIN APPLICATION ENTRY POINT
// =====================================================================================

/// Setup logging configuration
fn setup_logging(args: &Args, logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let directive = if args.verbose {
        "debug".to_string()
    } else if let Some(level) = &args.log_level {
        Level::from(level.clone()).to_string().to_lowercase()
    } else {
        logging.level.clone()
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&directive))
        .with_context(|| format!("Invalid log filter: {directive}"))?;

    let console_layer = if logging.json {
        fmt::layer().json().with_target(true).with_thread_names(true).boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    let (file_layer, guard) = if logging.file_logging {
        fs::create_dir_all(&logging.log_directory).with_context(|| {
            format!("Failed to create log directory: {}", logging.log_directory.display())
        })?;
        let appender = tracing_appender::rolling::daily(&logging.log_directory, "specula.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Load application configuration
fn load_config(config_path: Option<&Path>) -> Result<AppConfig> {
    let config: AppConfig = match config_path {
        Some(path) => specula::config::load_file(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        None => AppConfig::default(),
    };
    config.kernel.validate()?;
    Ok(config)
}

// =====================================================================================
// MAIN FUNCTION
// =====================================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let config = load_config(args.config.as_deref())?;

    // Setup logging; the guard flushes file output on exit
    let _guard = setup_logging(&args, &config.logging)?;

    // Dispatch subcommands
    match &args.command {
        Commands::Run { arenas, workers_per_arena, dimensions, duration_ms, seed, crash_after_ms, coupled } => {
            cmd_run(
                config.kernel.clone(),
                RunOptions {
                    arenas: arenas.clone(),
                    workers_per_arena: *workers_per_arena,
                    dimensions: *dimensions,
                    duration: Duration::from_millis(*duration_ms),
                    seed: *seed,
                    crash_after: crash_after_ms.map(Duration::from_millis),
                    coupled: *coupled,
                },
                args.output_format.clone(),
            )
            .await?;
        }
        Commands::Rotate { components, axis, angle, convention } => {
            cmd_rotate(
                components.clone(),
                axis.clone(),
                *angle,
                (*convention).into(),
                &args.output_format,
            )?;
        }
        Commands::ShowConfig => {
            cmd_show_config(&config, &args.output_format)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use specula::kernel::WorkerExit;
    use std::io::Write;

    fn kernel_with_policy(restart_policy: RestartPolicy) -> Arc<SpeculativeKernel> {
        let config = KernelConfig { restart_policy, ..KernelConfig::default() };
        let kernel = Arc::new(SpeculativeKernel::new(config));
        kernel.create_arena("a1");
        kernel
    }

    fn respawning(max_restarts: u32) -> RestartPolicy {
        RestartPolicy::RespawnFromLastSnapshot { max_restarts }
    }

    fn seeded_states(count: u64) -> Vec<(String, StateVector)> {
        (0..count).map(|seed| ("a1".to_string(), StateVector::seeded(3, seed).unwrap())).collect()
    }

    fn inject_fault(kernel: &SpeculativeKernel, delay_ms: u64) {
        kernel
            .spawn_task("fault-injector", move |_| {
                std::thread::sleep(Duration::from_millis(delay_ms));
                panic!("injected fault");
            })
            .unwrap();
    }

    fn crash_and_decide(kernel: &SpeculativeKernel, restarts: u32) -> RestartDecision {
        inject_fault(kernel, 10);
        assert!(matches!(kernel.run(), RunExit::WorkerCrashed { .. }));
        apply_restart_policy(kernel, restarts).unwrap()
    }

    #[test]
    fn test_restart_policy_respawns_rotation_workers() {
        let kernel = kernel_with_policy(respawning(3));
        for (arena, state) in seeded_states(2) {
            kernel.spawn_worker(arena, state, rotation_task).unwrap();
        }

        assert_eq!(crash_and_decide(&kernel, 0), RestartDecision::Restarted { respawned: 2 });
        assert!(kernel.is_running());

        let statuses = kernel.worker_statuses();
        for worker in &statuses[..2] {
            assert!(worker.alive);
            assert_eq!(worker.restarts, 1);
        }
        assert!(statuses[2].retired);
        kernel.stop();
    }

    #[test]
    fn test_restart_policy_respawns_coupled_ring() {
        let kernel = kernel_with_policy(respawning(3));
        spawn_coupled_ring(&kernel, seeded_states(2)).unwrap();

        assert_eq!(crash_and_decide(&kernel, 0), RestartDecision::Restarted { respawned: 2 });

        let statuses = kernel.worker_statuses();
        for worker in &statuses[..2] {
            assert!(worker.name.starts_with("a1/task-"));
            assert!(worker.alive);
            assert!(!worker.retired);
            assert_eq!(worker.restarts, 1);
        }
        let settled = kernel.arena_len("a1").unwrap();
        std::thread::sleep(Duration::from_millis(30));
        assert!(kernel.arena_len("a1").unwrap() > settled);
        kernel.stop();
    }

    #[test]
    fn test_flag_only_policy_gives_up() {
        let kernel = kernel_with_policy(RestartPolicy::FlagOnly);
        kernel.spawn_worker("a1", StateVector::seeded(3, 1).unwrap(), rotation_task).unwrap();

        assert_eq!(crash_and_decide(&kernel, 0), RestartDecision::GiveUp);
        assert!(!kernel.is_running());
        kernel.stop();
        assert_eq!(kernel.worker_statuses()[0].restarts, 0);
    }

    #[test]
    fn test_spent_restart_budget_gives_up() {
        let kernel = kernel_with_policy(respawning(2));
        kernel.spawn_worker("a1", StateVector::seeded(3, 1).unwrap(), rotation_task).unwrap();

        assert_eq!(crash_and_decide(&kernel, 2), RestartDecision::GiveUp);
        assert!(!kernel.is_running());
        kernel.stop();
    }

    #[test]
    fn test_nothing_restartable_gives_up_and_pauses() {
        let kernel = kernel_with_policy(respawning(3));
        kernel.spawn_task("oneshot", |kernel| {
            while kernel.is_running() {
                std::thread::sleep(Duration::from_millis(1));
            }
        })
        .unwrap();

        assert_eq!(crash_and_decide(&kernel, 0), RestartDecision::GiveUp);
        assert!(!kernel.is_running());
        assert!(kernel.worker_statuses().iter().all(|worker| worker.retired));
        kernel.stop();
    }

    #[tokio::test]
    async fn test_supervise_keeps_coupled_ring_alive_through_crash() {
        let kernel = kernel_with_policy(respawning(3));
        spawn_coupled_ring(&kernel, seeded_states(2)).unwrap();
        inject_fault(&kernel, 20);

        let crash = supervise(&kernel, Duration::from_millis(300)).await.unwrap();
        assert!(crash.is_none());

        kernel.stop();
        let statuses = kernel.worker_statuses();
        for worker in &statuses[..2] {
            assert_eq!(worker.restarts, 1);
            assert_eq!(worker.exit, Some(WorkerExit::Returned));
        }
        assert!(statuses[2].retired);
    }

    #[tokio::test]
    async fn test_supervise_reports_crash_under_flag_only() {
        let kernel = kernel_with_policy(RestartPolicy::FlagOnly);
        spawn_coupled_ring(&kernel, seeded_states(2)).unwrap();
        inject_fault(&kernel, 20);

        let crash = supervise(&kernel, Duration::from_secs(5)).await.unwrap();
        match crash {
            Some(specula::KernelError::WorkerCrashed { worker, reason }) => {
                assert!(worker.starts_with("fault-injector/task-"));
                assert!(reason.contains("injected fault"));
            }
            other => panic!("expected crash, got {other:?}"),
        }
        kernel.stop();
    }

    #[test]
    fn test_text_stats_show_retired_workers() {
        let kernel = kernel_with_policy(respawning(1));
        kernel.spawn_task("oneshot", |_| {}).unwrap();
        assert!(kernel.wait_for_idle(Duration::from_secs(2)));
        kernel.respawn_exited().unwrap();
        kernel.stop();

        let text = render_stats(&kernel.stats(), &OutputFormat::Text).unwrap();
        assert!(text.contains("oneshot/task-1 alive=false restarts=0 retired=true"));
    }

    #[test]
    fn test_load_config_reads_kernel_and_logging_sections() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "kernel:\n  restart_policy:\n    kind: respawn_from_last_snapshot\n    max_restarts: 3\nlogging:\n  level: debug"
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.kernel.restart_policy, respawning(3));
        assert_eq!(config.logging.level, "debug");
        assert!(load_config(None).is_ok());
    }

    #[test]
    fn test_load_config_rejects_invalid_kernel_section() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"kernel": {{"poll_interval_ms": 0}}}}"#).unwrap();
        assert!(load_config(Some(file.path())).is_err());
    }
}
