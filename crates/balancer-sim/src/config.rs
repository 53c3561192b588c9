use anyhow::bail;
use balancer::{ArrivalPolicy, BalancerConfig, BlockedPrefix, DEFAULT_LOG_FILE, PoolScaler};
use clap::{Parser, ValueEnum, builder::RangedU64ValueParser};
use core::{num::NonZeroUsize, time::Duration};
use std::path::PathBuf;

/// Largest initial pool accepted on the command line.
///
/// Each worker pre-fills the queue with 100 requests, so this bounds the
/// initial allocation.
pub const MAX_WORKERS: usize = 100_000;

/// Runtime configuration for the `balancer-sim` binary.
///
/// The two positional arguments are required. Everything else has a default
/// reproducing the classic simulation and may also be set through the
/// environment (or a `.env` file).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "balancer-sim",
    version,
    about = "Simulates a load balancer dispatching requests to a scaling pool of servers"
)]
pub struct CliArgs {
    /// Number of workers the pool starts with.
    ///
    /// The pending queue is pre-filled with 100 requests per worker.
    #[arg(
        value_name = "WORKERS",
        value_parser = RangedU64ValueParser::<usize>::new().range(1..=MAX_WORKERS as u64)
    )]
    pub workers: usize,

    /// How long to run, in seconds.
    #[arg(value_name = "TIME_LIMIT", value_parser = clap::value_parser!(u64).range(1..))]
    pub time_limit: u64,

    /// File the log entries are appended to.
    ///
    /// Environment variable: `LOG_FILE`
    #[arg(long, env = "LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Two-octet prefix whose requests are dismissed.
    ///
    /// Environment variable: `BLOCKED_PREFIX`
    #[arg(long, env = "BLOCKED_PREFIX", default_value_t = BlockedPrefix::default())]
    pub blocked_prefix: BlockedPrefix,

    /// A new request arrives whenever the queue length is a multiple of this.
    ///
    /// Environment variable: `ARRIVAL_PERIOD`
    #[arg(
        long,
        env = "ARRIVAL_PERIOD",
        default_value_t = 5,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub arrival_period: usize,

    /// The scaler never shrinks the pool below this many workers.
    ///
    /// Environment variable: `MIN_WORKERS`
    #[arg(long, env = "MIN_WORKERS", default_value_t = 1)]
    pub min_workers: usize,

    /// Pause, in milliseconds, whenever nothing can be dispatched.
    ///
    /// Environment variable: `IDLE_TICK_MS`
    #[arg(long, env = "IDLE_TICK_MS", default_value_t = 1)]
    pub idle_tick_ms: u64,

    /// Seed for request generation. Random when omitted.
    ///
    /// Environment variable: `SEED`
    #[arg(long, env = "SEED")]
    pub seed: Option<u64>,

    /// What to do when the log file cannot be opened or written.
    ///
    /// Environment variable: `ON_LOG_ERROR`
    #[arg(long, env = "ON_LOG_ERROR", value_enum, default_value_t = LogErrorPolicy::Fail)]
    pub on_log_error: LogErrorPolicy,
}

/// Handling of an unavailable log destination.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogErrorPolicy {
    /// Report the error and exit with a failure status.
    Fail,
    /// Report the error on stderr and keep running without persisting.
    Warn,
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub workers: usize,
    pub time_limit: Duration,
    pub log_file: PathBuf,
    pub seed: Option<u64>,
    pub on_log_error: LogErrorPolicy,
    pub balancer: BalancerConfig,
}

impl TryFrom<CliArgs> for SimConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.workers == 0 || args.workers > MAX_WORKERS {
            bail!("WORKERS must be between 1 and {MAX_WORKERS}");
        }

        if args.time_limit == 0 {
            bail!("TIME_LIMIT must be greater than 0");
        }

        let Some(period) = NonZeroUsize::new(args.arrival_period) else {
            bail!("ARRIVAL_PERIOD must be greater than 0");
        };

        Ok(Self {
            workers: args.workers,
            time_limit: Duration::from_secs(args.time_limit),
            log_file: args.log_file,
            seed: args.seed,
            on_log_error: args.on_log_error,
            balancer: BalancerConfig {
                blocked: args.blocked_prefix,
                arrivals: ArrivalPolicy::new(period),
                scaler: PoolScaler::new(args.min_workers),
                idle_tick: Duration::from_millis(args.idle_tick_ms),
            },
        })
    }
}
