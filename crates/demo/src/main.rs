//! Taskgate - synthetic workload driver
//!
//! Builds a queue from layered configuration, pushes a batch of timed
//! operations through it and reports how each one settled.

mod settings;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use futures::future::join_all;
use std::path::PathBuf;
use std::time::Duration;
use tabled::{Table, Tabled};
use taskgate_core::{Queue, QueueError, VERSION};
use tokio::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use settings::Overrides;

#[derive(Parser, Debug)]
#[command(name = "taskgate")]
#[command(about = "Run a synthetic workload through a bounded, throttled task queue", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (toml, json or yaml)
    #[arg(long, env = "TASKGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Max tasks running at once
    #[arg(long)]
    max_concurrent: Option<i64>,

    /// Max tasks waiting to run
    #[arg(long)]
    max_queued: Option<i64>,

    /// Max time a task may wait before it is rejected
    #[arg(long)]
    timeout_ms: Option<i64>,

    /// Dispatches allowed per throttle window
    #[arg(long)]
    throttle_rate: Option<i64>,

    /// Throttle window length
    #[arg(long)]
    throttle_interval_ms: Option<i64>,

    /// Number of tasks to submit
    #[arg(long, default_value = "10")]
    tasks: usize,

    /// How long each task runs
    #[arg(long, default_value = "100")]
    task_ms: u64,

    /// Fail every K-th task (0 = never)
    #[arg(long, default_value = "0")]
    fail_every: usize,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            max_concurrent: self.max_concurrent,
            max_queued: self.max_queued,
            timeout_ms: self.timeout_ms,
            throttle_rate: self.throttle_rate,
            throttle_interval_ms: self.throttle_interval_ms,
        }
    }
}

#[derive(Tabled)]
struct TaskRow {
    task: usize,
    id: String,
    outcome: String,
    elapsed_ms: u128,
}

fn init_logging() -> Result<()> {
    let log_format = std::env::var("TASKGATE_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("taskgate=info"))
        .context("Failed to create env filter")?;

    match log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty())
            .try_init(),
    }
    .context("Failed to install tracing subscriber")
}

fn outcome_label(outcome: &Result<usize, QueueError<String>>) -> String {
    match outcome {
        Ok(n) => format!("ok ({})", n),
        Err(QueueError::Operation(msg)) => format!("failed: {}", msg),
        Err(e) => e.to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    info!("Taskgate v{} starting...", VERSION);

    let config = settings::load(cli.config.as_deref(), &cli.overrides())?;
    info!(
        max_concurrent = ?config.max_concurrent,
        max_queued = ?config.max_queued,
        timeout = ?config.timeout,
        throttle = ?config.throttle,
        "Queue configured"
    );

    let queue: Queue<usize, String> = Queue::new(config);
    let task_time = Duration::from_millis(cli.task_ms);
    let fail_every = cli.fail_every;
    let start = Instant::now();

    let pending: Vec<_> = (0..cli.tasks)
        .map(|n| {
            let submission = queue.submit(move || async move {
                tokio::time::sleep(task_time).await;
                if fail_every > 0 && (n + 1) % fail_every == 0 {
                    Err(format!("task {} failed on purpose", n))
                } else {
                    Ok(n)
                }
            });
            async move {
                let id = submission.id();
                let outcome = submission.await;
                (n, id, outcome, start.elapsed())
            }
        })
        .collect();

    let metrics = queue.metrics();
    info!(
        submitted = cli.tasks,
        active = metrics.active,
        queued = metrics.queued,
        "Workload submitted"
    );

    let settled = join_all(pending).await;
    let total = start.elapsed();
    let stats = queue.stats();
    info!(elapsed_ms = total.as_millis() as u64, ?stats, "Workload settled");

    let rows: Vec<TaskRow> = settled
        .iter()
        .map(|(n, id, outcome, elapsed)| TaskRow {
            task: *n,
            id: id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
            outcome: outcome_label(outcome),
            elapsed_ms: elapsed.as_millis(),
        })
        .collect();

    println!();
    println!("{}", "Workload complete".cyan().bold());
    println!();
    println!("  {} {:.2?}", "Elapsed:".bold(), total);
    println!("  {} {}", "Succeeded:".bold(), stats.succeeded.to_string().green());
    println!("  {} {}", "Failed:".bold(), stats.failed.to_string().red());
    println!("  {} {}", "Timed out:".bold(), stats.timed_out.to_string().yellow());
    println!("  {} {}", "Rejected:".bold(), stats.rejected.to_string().yellow());
    println!(
        "  {} {} active / {} queued",
        "Peak:".bold(),
        stats.peak_active,
        stats.peak_queued
    );
    println!();
    println!("{}", Table::new(rows));

    Ok(())
}
