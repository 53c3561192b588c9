mod config;
mod telemetry;

use balancer::{
    Balancer, FileSink, LogEntry, LogSink, MonotonicClock, RandomRequests, TimeSource,
    TokioSleep,
};
use clap::{CommandFactory, Parser, error::ErrorKind};
use config::{CliArgs, LogErrorPolicy, SimConfig};
use core::time::Duration;
use telemetry::init_telemetry;

/// Longest stretch of simulated work between two writes to the log file.
const FLUSH_INTERVAL: Duration = Duration::from_millis(250);

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            _ => usage_error(&err),
        },
    };
    let config = match SimConfig::try_from(args) {
        Ok(config) => config,
        Err(err) => usage_error(&CliArgs::command().error(ErrorKind::ValueValidation, err)),
    };

    let providers = init_telemetry()?;
    log_startup_info(&config);

    let res = run(config).await;
    providers.shutdown();
    res
}

async fn run(config: SimConfig) -> anyhow::Result<()> {
    // Open the destination up front so a fail-fast policy stops before any
    // work is simulated.
    let mut sink = match FileSink::open(&config.log_file) {
        Ok(sink) => Some(sink),
        Err(err) => match config.on_log_error {
            LogErrorPolicy::Fail => return Err(err.into()),
            LogErrorPolicy::Warn => {
                eprintln!("Failed to open log file: {err}");
                None
            }
        },
    };

    let source = match config.seed {
        Some(seed) => RandomRequests::seeded(seed),
        None => RandomRequests::from_entropy(),
    };
    let mut balancer = Balancer::new(config.workers, config.balancer, source);

    // Entries are handed to the sink in slices so a long run does not hold
    // its whole log in memory.
    let clock = MonotonicClock::default();
    let summary = loop {
        let elapsed = Duration::from_millis(clock.current_millis());
        let slice = config.time_limit.saturating_sub(elapsed).min(FLUSH_INTERVAL);
        let summary = balancer.run_async::<TokioSleep, _>(&clock, slice).await;
        write_log(&mut sink, &balancer.drain_log(), config.on_log_error)?;
        if Duration::from_millis(clock.current_millis()) >= config.time_limit {
            break summary;
        }
    };
    println!("Time limit reached, stopping program.");

    #[cfg(feature = "tracing")]
    tracing::info!(
        iterations = summary.iterations,
        completed = summary.completed,
        blocked = summary.blocked,
        rejected = summary.rejected,
        workers_added = summary.workers_added,
        workers_removed = summary.workers_removed,
        pool_size = summary.pool_size,
        pending = summary.pending,
        "Simulation finished"
    );
    telemetry::record_run(&summary);

    Ok(())
}

/// Appends `entries` to the sink, if there is one.
///
/// Under [`LogErrorPolicy::Warn`] a failed write is reported and the sink is
/// dropped, so the rest of the run is not persisted.
fn write_log(
    sink: &mut Option<FileSink>,
    entries: &[LogEntry],
    policy: LogErrorPolicy,
) -> anyhow::Result<()> {
    let Some(active) = sink.as_mut() else {
        return Ok(());
    };
    match active.write_entries(entries) {
        Ok(()) => {
            #[cfg(feature = "tracing")]
            tracing::trace!("Wrote {} log entries", entries.len());
            Ok(())
        }
        Err(err) => match policy {
            LogErrorPolicy::Fail => Err(err.into()),
            LogErrorPolicy::Warn => {
                eprintln!("Failed to write log file: {err}");
                *sink = None;
                Ok(())
            }
        },
    }
}

/// Reports a bad invocation on stderr, followed by the usage line, and exits
/// with status 1.
fn usage_error(err: &clap::Error) -> ! {
    let _ = err.print();
    if !err.to_string().contains("Usage:") {
        eprintln!("\n{}", CliArgs::command().render_usage());
    }
    std::process::exit(1);
}

fn log_startup_info(_config: &SimConfig) {
    if cfg!(debug_assertions) {
        #[cfg(feature = "tracing")]
        tracing::info!(
            "Starting simulation with full config: {:#?}",
            _config
        );
    } else {
        #[cfg(feature = "tracing")]
        tracing::info!(
            "Starting simulation with {} workers for {:?}",
            _config.workers,
            _config.time_limit
        );
    }
}
