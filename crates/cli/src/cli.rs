use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Run cloud balancing searches for many tenants at once.
#[derive(Parser, Debug)]
#[command(name = "solverhub-cli", version, about)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate one problem per tenant, solve them concurrently and report.
    Solve(SolveArgs),
}

#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Number of tenants, each submitting its own problem
    #[arg(long, default_value = "4")]
    pub tenants: usize,

    /// Computers per generated problem
    #[arg(long, default_value = "10")]
    pub computers: usize,

    /// Processes per generated problem
    #[arg(long, default_value = "30")]
    pub processes: usize,

    /// Base seed; tenant i uses seed + i
    #[arg(long, default_value = "47")]
    pub seed: u64,

    /// Wall-clock limit for each search
    #[arg(long, default_value = "5")]
    pub time_limit_secs: u64,

    /// How often to poll job status
    #[arg(long, default_value = "250")]
    pub poll_ms: u64,

    /// Manager config file (TOML). Defaults to SOLVERHUB_* env vars.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Fixed number of worker threads (overrides config)
    #[arg(long, env = "SOLVERHUB_WORKERS")]
    pub workers: Option<usize>,

    /// Bound the pending-job queue (overrides config; 0 = unbounded)
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Print job snapshots and metrics as JSON
    #[arg(long)]
    pub json: bool,
}
