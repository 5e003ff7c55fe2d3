//! Batching HTTP submission client for the IndexNow protocol.
//!
//! This module provides the [`IndexNowClient`] struct which validates,
//! chunks, and POSTs changed URLs to a search-engine indexing endpoint,
//! retrying transient failures with exponential backoff and reporting
//! per-batch outcomes.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::endpoint::SearchEngine;
use super::error::SubmitError;
use super::rate_limiter::{SubmissionRateLimiter, parse_retry_after};
use super::retry::{RetryDecision, RetryPolicy, classify_error};
use crate::user_agent;

/// Maximum URLs allowed in a single POST, per the IndexNow protocol.
pub const MAX_URLS_PER_BATCH: usize = 10_000;

/// Connect timeout for submission requests (seconds).
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Read timeout for submission requests (seconds).
/// Submissions are small JSON bodies; a minute is generous.
const READ_TIMEOUT_SECS: u64 = 60;

/// Configuration for a submission client.
///
/// `host` is the site whose URLs are being submitted; `key` is the IndexNow
/// API key the site serves; `key_location` overrides the default
/// `https://<host>/<key>.txt` location when the key file lives elsewhere.
#[derive(Debug, Clone)]
pub struct SubmissionConfig {
    /// The host all submitted URLs must belong to (e.g. `toolslab.dev`).
    pub host: String,
    /// The IndexNow API key.
    pub key: String,
    /// Optional explicit key file location.
    pub key_location: Option<String>,
    /// Which engine endpoint to submit to.
    pub engine: SearchEngine,
}

impl SubmissionConfig {
    /// Creates a configuration for the default shared relay endpoint.
    #[must_use]
    pub fn new(host: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            key: key.into(),
            key_location: None,
            engine: SearchEngine::default(),
        }
    }

    /// Sets the target engine.
    #[must_use]
    pub fn with_engine(mut self, engine: SearchEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Sets an explicit key file location.
    #[must_use]
    pub fn with_key_location(mut self, key_location: impl Into<String>) -> Self {
        self.key_location = Some(key_location.into());
        self
    }

    /// Returns the effective key file location (explicit or protocol default).
    #[must_use]
    pub fn key_location_or_default(&self) -> String {
        self.key_location
            .clone()
            .unwrap_or_else(|| format!("https://{}/{}.txt", self.host, self.key))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::InvalidConfig`] when the key is empty, the key
    /// contains characters outside the protocol's allowed set, or the host is
    /// empty or contains a scheme/path.
    pub fn validate(&self) -> Result<(), SubmitError> {
        if self.host.trim().is_empty() {
            return Err(SubmitError::invalid_config("host must not be empty"));
        }
        if self.host.contains('/') || self.host.contains("://") {
            return Err(SubmitError::invalid_config(
                "host must be a bare hostname (no scheme or path)",
            ));
        }
        if self.key.trim().is_empty() {
            return Err(SubmitError::invalid_config("key must not be empty"));
        }
        // Protocol: 8-128 chars, a-zA-Z0-9 and dashes
        if self.key.len() < 8 || self.key.len() > 128 {
            return Err(SubmitError::invalid_config(
                "key must be between 8 and 128 characters",
            ));
        }
        if !self
            .key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(SubmitError::invalid_config(
                "key may only contain letters, digits, and dashes",
            ));
        }
        Ok(())
    }
}

/// JSON payload POSTed to the IndexNow endpoint.
#[derive(Debug, Serialize)]
struct SubmitPayload<'a> {
    host: &'a str,
    key: &'a str,
    #[serde(rename = "keyLocation", skip_serializing_if = "Option::is_none")]
    key_location: Option<&'a str>,
    #[serde(rename = "urlList")]
    url_list: &'a [String],
}

/// A URL rejected before submission, with the reason it was rejected.
#[derive(Debug, Clone)]
pub struct RejectedUrl {
    /// The original input URL.
    pub url: String,
    /// Why it was not submitted.
    pub reason: String,
}

/// Outcome of submitting a single batch.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Zero-based index of the batch within the submission.
    pub batch_index: usize,
    /// Number of URLs in the batch.
    pub url_count: usize,
    /// Total attempts made (1 = succeeded or failed without retry).
    pub attempts: u32,
    /// Final result after retries.
    pub result: Result<(), SubmitError>,
}

impl BatchOutcome {
    /// Returns true if the batch was accepted by the endpoint.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-batch report for a submission call.
#[derive(Debug, Default)]
pub struct SubmissionReport {
    /// The endpoint host the batches were sent to.
    pub endpoint: String,
    /// One outcome per batch, in submission order.
    pub batches: Vec<BatchOutcome>,
    /// URLs rejected up front (malformed or wrong host); never submitted.
    pub rejected: Vec<RejectedUrl>,
}

impl SubmissionReport {
    /// Returns true if every batch succeeded and nothing was rejected.
    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.rejected.is_empty() && self.batches.iter().all(BatchOutcome::is_success)
    }

    /// Total URLs accepted by the endpoint across all successful batches.
    #[must_use]
    pub fn submitted_count(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.is_success())
            .map(|b| b.url_count)
            .sum()
    }

    /// Total URLs in batches that ultimately failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| !b.is_success())
            .map(|b| b.url_count)
            .sum()
    }
}

/// HTTP client for IndexNow batch submissions.
///
/// This client is designed to be created once and reused for multiple
/// submissions, taking advantage of connection pooling.
///
/// # Example
///
/// ```no_run
/// use toolslab_core::indexnow::{IndexNowClient, SubmissionConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SubmissionConfig::new("toolslab.dev", "0123456789abcdef");
/// let client = IndexNowClient::new(config)?;
///
/// let urls = vec!["https://toolslab.dev/it/tools/json-formatter".to_string()];
/// let report = client.submit(&urls).await;
/// assert!(report.is_complete_success());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct IndexNowClient {
    http: Client,
    config: SubmissionConfig,
    retry_policy: RetryPolicy,
    rate_limiter: Arc<SubmissionRateLimiter>,
    /// Full POST URL; normally derived from the engine, overridable for tests
    /// and self-hosted relays.
    endpoint_url: String,
    /// Host component of `endpoint_url`, used for rate-limiter keys and logs.
    endpoint_host: String,
}

impl IndexNowClient {
    /// Creates a new client with the default retry policy and rate limiter.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::InvalidConfig`] when the configuration fails
    /// [`SubmissionConfig::validate`].
    pub fn new(config: SubmissionConfig) -> Result<Self, SubmitError> {
        Self::with_policy(
            config,
            RetryPolicy::default(),
            Arc::new(SubmissionRateLimiter::new(Duration::from_millis(1000))),
        )
    }

    /// Creates a new client with an explicit retry policy and rate limiter.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::InvalidConfig`] when the configuration fails
    /// [`SubmissionConfig::validate`].
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[allow(clippy::expect_used)]
    pub fn with_policy(
        config: SubmissionConfig,
        retry_policy: RetryPolicy,
        rate_limiter: Arc<SubmissionRateLimiter>,
    ) -> Result<Self, SubmitError> {
        config.validate()?;

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .gzip(true)
            .user_agent(user_agent::default_submit_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");

        let endpoint_url = config.engine.submit_url();
        let endpoint_host = config.engine.host().to_string();

        Ok(Self {
            http,
            config,
            retry_policy,
            rate_limiter,
            endpoint_url,
            endpoint_host,
        })
    }

    /// Overrides the endpoint URL.
    ///
    /// Intended for tests and self-hosted relays; production callers select
    /// an endpoint through [`SubmissionConfig::with_engine`].
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = endpoint_url.into();
        self.endpoint_host = Url::parse(&self.endpoint_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| self.endpoint_url.clone());
        self
    }

    /// Returns the configured submission host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// Returns the endpoint host batches are submitted to.
    #[must_use]
    pub fn endpoint_host(&self) -> &str {
        &self.endpoint_host
    }

    /// Submits a set of changed URLs to the configured endpoint.
    ///
    /// URLs are validated against the configured host, deduplicated
    /// preserving order, chunked into batches of at most
    /// [`MAX_URLS_PER_BATCH`], and POSTed batch by batch. Transient failures
    /// (429/5xx/network/timeout) are retried with exponential backoff; a
    /// batch that exhausts its retries is recorded as failed and submission
    /// continues with the remaining batches.
    ///
    /// Empty input produces an empty report.
    #[instrument(skip(self, urls), fields(url_count = urls.len(), endpoint = %self.endpoint_host))]
    pub async fn submit(&self, urls: &[String]) -> SubmissionReport {
        let mut report = SubmissionReport {
            endpoint: self.endpoint_host.clone(),
            ..SubmissionReport::default()
        };

        let accepted = self.partition_urls(urls, &mut report.rejected);
        if accepted.is_empty() {
            debug!(
                rejected = report.rejected.len(),
                "nothing to submit after validation"
            );
            return report;
        }

        for (batch_index, batch) in accepted.chunks(MAX_URLS_PER_BATCH).enumerate() {
            let (attempts, result) = self.submit_batch(batch).await;
            report.batches.push(BatchOutcome {
                batch_index,
                url_count: batch.len(),
                attempts,
                result,
            });
        }

        info!(
            batches = report.batches.len(),
            submitted = report.submitted_count(),
            failed = report.failed_count(),
            rejected = report.rejected.len(),
            "submission complete"
        );

        report
    }

    /// Submits a single URL; convenience wrapper over [`submit`](Self::submit).
    ///
    /// # Errors
    ///
    /// Returns the batch error when the submission failed, or an
    /// [`SubmitError::InvalidUrl`] when the URL was rejected up front.
    #[instrument(skip(self))]
    pub async fn submit_one(&self, url: &str) -> Result<(), SubmitError> {
        let mut report = self.submit(std::slice::from_ref(&url.to_string())).await;
        if let Some(rejected) = report.rejected.pop() {
            return Err(SubmitError::invalid_url(rejected.url, &self.config.host));
        }
        match report.batches.pop() {
            Some(outcome) => outcome.result,
            // Validated URL always produces exactly one batch; this arm is
            // unreachable but avoids a panic path.
            None => Ok(()),
        }
    }

    /// Validates URLs against the configured host, deduplicating while
    /// preserving first-seen order. Rejections are appended to `rejected`.
    fn partition_urls(&self, urls: &[String], rejected: &mut Vec<RejectedUrl>) -> Vec<String> {
        let mut accepted = Vec::with_capacity(urls.len());
        let mut seen = std::collections::HashSet::new();

        for url in urls {
            let trimmed = url.trim();
            if trimmed.is_empty() {
                continue;
            }
            match Url::parse(trimmed) {
                Ok(parsed) => {
                    if !matches!(parsed.scheme(), "http" | "https") {
                        rejected.push(RejectedUrl {
                            url: trimmed.to_string(),
                            reason: format!("unsupported scheme: {}", parsed.scheme()),
                        });
                        continue;
                    }
                    let host_matches = parsed
                        .host_str()
                        .is_some_and(|h| h.eq_ignore_ascii_case(&self.config.host));
                    if !host_matches {
                        rejected.push(RejectedUrl {
                            url: trimmed.to_string(),
                            reason: format!("host does not match {}", self.config.host),
                        });
                        continue;
                    }
                    if seen.insert(parsed.to_string()) {
                        accepted.push(parsed.to_string());
                    }
                }
                Err(e) => {
                    rejected.push(RejectedUrl {
                        url: trimmed.to_string(),
                        reason: format!("malformed URL: {e}"),
                    });
                }
            }
        }

        accepted
    }

    /// Submits one batch with retries, returning (attempts, final result).
    #[instrument(skip(self, batch), fields(batch_size = batch.len()))]
    async fn submit_batch(&self, batch: &[String]) -> (u32, Result<(), SubmitError>) {
        let mut attempt: u32 = 1;

        loop {
            self.rate_limiter.acquire(&self.endpoint_host).await;

            match self.post_batch_once(batch).await {
                Ok(()) => {
                    debug!(attempt, "batch accepted");
                    return (attempt, Ok(()));
                }
                Err(error) => {
                    let failure_type = classify_error(&error);

                    // A server-mandated Retry-After takes precedence over the
                    // computed backoff delay.
                    let server_delay = match &error {
                        SubmitError::HttpStatus {
                            status: 429,
                            retry_after: Some(value),
                            ..
                        } => parse_retry_after(value),
                        _ => None,
                    };

                    match self.retry_policy.should_retry(failure_type, attempt) {
                        RetryDecision::Retry {
                            delay,
                            attempt: next_attempt,
                        } => {
                            let delay = server_delay.unwrap_or(delay);
                            if server_delay.is_some() {
                                self.rate_limiter
                                    .record_rate_limit(&self.endpoint_host, delay);
                            }
                            warn!(
                                attempt,
                                next_attempt,
                                delay_ms = delay.as_millis(),
                                error = %error,
                                "batch submission failed, retrying"
                            );
                            tokio::time::sleep(delay).await;
                            attempt = next_attempt;
                        }
                        RetryDecision::DoNotRetry { reason } => {
                            warn!(attempt, %reason, error = %error, "batch submission failed");
                            return (attempt, Err(error));
                        }
                    }
                }
            }
        }
    }

    /// Performs a single POST of the batch payload.
    async fn post_batch_once(&self, batch: &[String]) -> Result<(), SubmitError> {
        let payload = SubmitPayload {
            host: &self.config.host,
            key: &self.config.key,
            key_location: self.config.key_location.as_deref(),
            url_list: batch,
        };

        let body = serde_json::to_string(&payload)
            .map_err(|e| SubmitError::invalid_config(format!("unserializable payload: {e}")))?;

        let response = self
            .http
            .post(&self.endpoint_url)
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SubmitError::timeout(&self.endpoint_host)
                } else {
                    SubmitError::network(&self.endpoint_host, e)
                }
            })?;

        let status = response.status();

        // 200 OK and 202 Accepted are both success per the protocol.
        if status.is_success() {
            return Ok(());
        }

        if status.as_u16() == 403 {
            return Err(SubmitError::key_rejected(
                &self.endpoint_host,
                self.config.key_location_or_default(),
            ));
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(std::string::ToString::to_string);

        Err(SubmitError::http_status_with_retry_after(
            &self.endpoint_host,
            status.as_u16(),
            retry_after,
        ))
    }
}
