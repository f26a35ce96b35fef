use anyhow::Result;
use serde::Serialize;

use solverhub_manager::{JobInfo, ManagerMetrics};

#[derive(Serialize)]
struct Report<'a> {
    jobs: &'a [JobInfo],
    metrics: &'a ManagerMetrics,
}

pub fn print_json(jobs: &[JobInfo], metrics: &ManagerMetrics) -> Result<()> {
    let json = serde_json::to_string_pretty(&Report { jobs, metrics })?;
    println!("{json}");
    Ok(())
}

pub fn print_table(jobs: &[JobInfo], metrics: &ManagerMetrics) {
    println!("{:<14} {:<18} {:<22} {:>10}", "TENANT", "STATUS", "BEST SCORE", "SECONDS");
    for job in jobs {
        let seconds = match (job.started_at, job.finished_at) {
            (Some(start), Some(end)) => format!("{:.2}", (end - start).num_milliseconds() as f64 / 1000.0),
            _ => "-".to_string(),
        };
        println!(
            "{:<14} {:<18} {:<22} {:>10}",
            job.tenant_id.as_str(),
            job.status.to_string(),
            job.best_score.as_deref().unwrap_or("-"),
            seconds
        );
        if let Some(failure) = &job.failure {
            println!("    failed: {}", failure.message);
        }
    }
    println!();
    println!(
        "submitted={} finished={} failed={} cancelled={} avg_solve={:.2}s workers={}",
        metrics.submitted,
        metrics.finished,
        metrics.failed,
        metrics.cancelled,
        metrics.avg_solve_duration.as_secs_f64(),
        metrics.pool_capacity
    );
}
