//! CLI entry point for the ToolsLab backend tool.

use std::io::{self, IsTerminal, Read};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{debug, info, warn};

use toolslab_core::indexnow::{
    IndexNowClient, QueueWorker, RetryPolicy, SubmissionConfig, SubmissionQueue,
    SubmissionRateLimiter, SubmissionReport,
};
use toolslab_core::{Database, detect};

mod cli;

use cli::{Args, Command, QueueCommand};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    match &args.command {
        Command::Submit { urls } => run_submit(&args, urls).await,
        Command::Queue { command } => run_queue(&args, command).await,
        Command::Detect { text, json } => run_detect(text.as_deref(), *json),
    }
}

/// Reads input URLs/text from arguments, falling back to stdin when piped.
fn read_input(from_args: &[String]) -> Result<Vec<String>> {
    if !from_args.is_empty() {
        return Ok(from_args.to_vec());
    }
    if io::stdin().is_terminal() {
        return Ok(Vec::new());
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("failed to read stdin")?;
    Ok(buffer
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

/// Builds a submission client from the global flags.
fn build_client(args: &Args) -> Result<IndexNowClient> {
    let host = args
        .host
        .clone()
        .context("missing --host (or INDEXNOW_HOST)")?;
    let key = args
        .key
        .clone()
        .context("missing --key (or INDEXNOW_KEY)")?;

    let mut config = SubmissionConfig::new(host, key).with_engine(args.engine);
    if let Some(key_location) = &args.key_location {
        config = config.with_key_location(key_location);
    }

    let retry_policy = RetryPolicy::with_max_attempts(args.max_retries);
    let rate_limiter = if args.rate_limit == 0 {
        debug!("rate limiting disabled");
        Arc::new(SubmissionRateLimiter::disabled())
    } else {
        Arc::new(SubmissionRateLimiter::new(Duration::from_millis(
            args.rate_limit,
        )))
    };

    Ok(IndexNowClient::with_policy(
        config,
        retry_policy,
        rate_limiter,
    )?)
}

/// Prints a per-batch report and returns an error if any batch failed.
fn print_report(report: &SubmissionReport) -> Result<()> {
    for rejected in &report.rejected {
        warn!(url = %rejected.url, reason = %rejected.reason, "URL rejected");
    }
    for batch in &report.batches {
        match &batch.result {
            Ok(()) => println!(
                "batch {}: {} URLs submitted to {} ({} attempt{})",
                batch.batch_index,
                batch.url_count,
                report.endpoint,
                batch.attempts,
                if batch.attempts == 1 { "" } else { "s" }
            ),
            Err(e) => println!(
                "batch {}: {} URLs FAILED after {} attempt{}: {e}",
                batch.batch_index,
                batch.url_count,
                batch.attempts,
                if batch.attempts == 1 { "" } else { "s" }
            ),
        }
    }
    println!(
        "submitted {} / failed {} / rejected {}",
        report.submitted_count(),
        report.failed_count(),
        report.rejected.len()
    );

    if !report.is_complete_success() {
        bail!("submission incomplete");
    }
    Ok(())
}

async fn run_submit(args: &Args, urls: &[String]) -> Result<()> {
    let urls = read_input(urls)?;
    if urls.is_empty() {
        info!("No URLs provided. Pipe URLs via stdin or pass as arguments.");
        return Ok(());
    }

    let client = build_client(args)?;
    let report = client.submit(&urls).await;
    print_report(&report)
}

async fn run_queue(args: &Args, command: &QueueCommand) -> Result<()> {
    let db = Database::new(&args.db).await?;
    let queue = SubmissionQueue::new(db);

    match command {
        QueueCommand::Add { urls, priority } => {
            let urls = read_input(urls)?;
            if urls.is_empty() {
                info!("No URLs provided. Pipe URLs via stdin or pass as arguments.");
                return Ok(());
            }
            for url in &urls {
                let id = queue.enqueue(url, *priority).await?;
                debug!(id, url = %url, "enqueued");
            }
            println!("queued {} URL(s) at {priority} priority", urls.len());
            Ok(())
        }

        QueueCommand::Flush => {
            let client = Arc::new(build_client(args)?);
            let recovered = queue.reset_in_flight().await?;
            if recovered > 0 {
                info!(recovered, "recovered in-flight entries");
            }
            let worker = QueueWorker::new(queue, client);
            let summary = worker.flush().await?;
            println!(
                "flushed: {} claimed, {} submitted, {} requeued, {} failed",
                summary.claimed, summary.submitted, summary.requeued, summary.failed
            );
            if summary.failed > 0 {
                bail!("{} URL(s) failed", summary.failed);
            }
            Ok(())
        }

        QueueCommand::Status => {
            let counts = queue.counts().await?;
            println!("pending:   {}", counts.pending);
            println!("in flight: {}", counts.in_flight);
            println!("submitted: {}", counts.submitted);
            println!("failed:    {}", counts.failed);
            println!("total:     {}", counts.total());
            Ok(())
        }

        QueueCommand::Watch {
            interval,
            batch_size,
        } => {
            let client = Arc::new(build_client(args)?);
            let worker = QueueWorker::new(queue, client)
                .with_flush_interval(Duration::from_secs(*interval))
                .with_batch_size(usize::try_from(*batch_size).unwrap_or(100));

            let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("shutdown requested");
                    let _ = shutdown_tx.send(true);
                }
            });

            info!(interval, batch_size, "queue worker running, Ctrl-C to stop");
            worker.run(shutdown_rx).await;
            Ok(())
        }
    }
}

fn run_detect(text: Option<&str>, as_json: bool) -> Result<()> {
    let input = match text {
        Some(text) => text.to_string(),
        None => {
            if io::stdin().is_terminal() {
                info!("No text provided. Pipe text via stdin or pass as an argument.");
                return Ok(());
            }
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            buffer
        }
    };

    let result = detect(&input);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.is_empty() {
        println!("nothing to detect");
        return Ok(());
    }
    for detection in &result.detections {
        println!("{detection}");
    }
    Ok(())
}
