//! IndexNow submission pipeline.
//!
//! Implements the IndexNow protocol: sites notify participating search
//! engines about changed URLs by POSTing JSON batches to
//! `https://<endpoint>/indexnow`, proving ownership with a key file served
//! from the site.
//!
//! # Overview
//!
//! The pipeline consists of:
//! - [`IndexNowClient`] - validates, chunks, and POSTs URL batches with retries
//! - [`SubmissionQueue`] / [`QueueWorker`] - persistent queue with periodic flush
//! - [`RetryPolicy`] / [`classify_error`] - backoff and failure classification
//! - [`SubmissionRateLimiter`] - per-endpoint pacing between requests
//! - [`SearchEngine`] - registry of known endpoints
//!
//! # Example
//!
//! ```ignore
//! use toolslab_core::indexnow::{IndexNowClient, SubmissionConfig};
//!
//! let config = SubmissionConfig::new("toolslab.dev", std::env::var("INDEXNOW_KEY")?);
//! let client = IndexNowClient::new(config)?;
//! let report = client.submit(&changed_urls).await;
//! println!("{} submitted, {} failed", report.submitted_count(), report.failed_count());
//! ```

mod client;
mod endpoint;
mod error;
mod queue;
mod rate_limiter;
mod retry;

pub use client::{
    BatchOutcome, IndexNowClient, MAX_URLS_PER_BATCH, RejectedUrl, SubmissionConfig,
    SubmissionReport,
};
pub use endpoint::SearchEngine;
pub use error::SubmitError;
pub use queue::{
    DEFAULT_FLUSH_BATCH_SIZE, DEFAULT_FLUSH_INTERVAL, FlushSummary, Priority, QueueCounts,
    QueueError, QueueState, QueueWorker, QueuedUrl, SubmissionQueue,
};
pub use rate_limiter::{SubmissionRateLimiter, parse_retry_after};
pub use retry::{DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy, classify_error};
