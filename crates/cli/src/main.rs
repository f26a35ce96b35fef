//! solverhub-cli: drive the multi-tenant solver manager from the shell.

mod cli;
mod report;

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, info, warn};

use solverhub_cloudbalance::{generate, LocalSearchConfig};
use solverhub_core::config::load_dotenv;
use solverhub_manager::{
    JobEvent, ManagerConfig, PoolSizing, QueuePolicy, SolverManager, TenantId,
};

use crate::cli::{CliArgs, Command, SolveArgs};

fn main() -> Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    match args.command {
        Command::Solve(opts) => solve(opts),
    }
}

fn manager_config(opts: &SolveArgs) -> Result<ManagerConfig> {
    let mut config = match &opts.config {
        Some(path) => ManagerConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ManagerConfig::from_env().context("failed to load config from environment")?,
    };
    if let Some(workers) = opts.workers {
        config.pool.sizing = PoolSizing::Fixed(workers);
    }
    match opts.queue_capacity {
        Some(0) => config.pool.queue = QueuePolicy::Unbounded,
        Some(capacity) => config.pool.queue = QueuePolicy::Bounded { capacity },
        None => {}
    }
    config.validate().context("invalid manager config")?;
    Ok(config)
}

/// Seed for tenant `index`; wraps so any `--seed` is accepted.
fn tenant_seed(base: u64, index: usize) -> u64 {
    base.wrapping_add(index as u64)
}

fn solve(opts: SolveArgs) -> Result<()> {
    let config = manager_config(&opts)?;
    config.log_summary();

    let search = LocalSearchConfig::default()
        .with_time_limit(Duration::from_secs(opts.time_limit_secs))
        .with_seed(opts.seed);
    let manager = SolverManager::new(config, search).context("failed to start solver manager")?;
    let mut events = manager.subscribe();

    let mut tenants = Vec::with_capacity(opts.tenants);
    for i in 0..opts.tenants {
        let tenant = TenantId::new(format!("tenant-{i}"));
        let problem = generate(opts.computers, opts.processes, tenant_seed(opts.seed, i));
        manager
            .submit(tenant.clone(), problem)
            .with_context(|| format!("failed to submit problem for {tenant}"))?;
        tenants.push(tenant);
    }
    info!(
        tenants = tenants.len(),
        computers = opts.computers,
        processes = opts.processes,
        "Submitted cloud balancing problems"
    );

    let poll = Duration::from_millis(opts.poll_ms.max(1));
    loop {
        drain_events(&mut events);
        let mut done = 0;
        for tenant in &tenants {
            let status = manager.status(tenant)?;
            if status.is_terminal() {
                done += 1;
            } else {
                let score = manager.best_score(tenant)?;
                debug!(
                    tenant = %tenant,
                    %status,
                    score = score.map(|s| s.to_string()).as_deref().unwrap_or("-"),
                    "Progress"
                );
            }
        }
        if done == tenants.len() {
            break;
        }
        info!(done, total = tenants.len(), "Waiting for solver jobs");
        thread::sleep(poll);
    }
    drain_events(&mut events);

    let jobs: Vec<_> = tenants
        .iter()
        .map(|t| manager.job_info(t))
        .collect::<Result<_, _>>()?;
    let metrics = manager.metrics();
    if opts.json {
        report::print_json(&jobs, &metrics)?;
    } else {
        report::print_table(&jobs, &metrics);
    }

    manager.shutdown();
    Ok(())
}

fn drain_events(events: &mut tokio::sync::broadcast::Receiver<JobEvent>) {
    loop {
        match events.try_recv() {
            Ok(event) => debug!(tenant = %event.tenant_id, kind = ?event.kind, "Job event"),
            Err(TryRecvError::Lagged(skipped)) => warn!(skipped, "Dropped job events"),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
}
