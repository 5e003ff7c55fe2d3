//! Per-endpoint rate limiting for submission requests.
//!
//! This module provides the [`SubmissionRateLimiter`] struct which enforces
//! minimum delays between requests to the same indexing endpoint, preventing
//! the endpoints from throttling or blocking the client.
//!
//! # Overview
//!
//! Rate limiting is applied per endpoint host, meaning submissions to
//! different engines can proceed in parallel without waiting for each other.
//! Only subsequent submissions to the *same* endpoint are delayed.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use toolslab_core::indexnow::SubmissionRateLimiter;
//!
//! # async fn example() {
//! let limiter = Arc::new(SubmissionRateLimiter::new(Duration::from_secs(1)));
//!
//! // First submission proceeds immediately
//! limiter.acquire("api.indexnow.org").await;
//!
//! // Second submission to the same endpoint waits for the delay
//! limiter.acquire("api.indexnow.org").await;
//!
//! // Submission to a different endpoint proceeds immediately
//! limiter.acquire("www.bing.com").await;
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// Warning threshold for cumulative delay per endpoint (30 seconds).
const CUMULATIVE_DELAY_WARNING_THRESHOLD: Duration = Duration::from_secs(30);

/// Maximum Retry-After value (1 hour) to prevent excessive delays.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Per-endpoint rate limiter for submission requests.
///
/// This struct is designed to be wrapped in `Arc` and shared across multiple
/// Tokio tasks. It uses `DashMap` for lock-free concurrent access to
/// per-endpoint state, and `tokio::sync::Mutex` for atomic read-update
/// operations on timing.
#[derive(Debug)]
pub struct SubmissionRateLimiter {
    /// Default minimum delay between submissions to the same endpoint.
    default_delay: Duration,

    /// Whether rate limiting is disabled (for `--rate-limit 0`).
    disabled: bool,

    /// Per-endpoint state tracking.
    /// Uses Arc to allow cloning the state and releasing the `DashMap` lock
    /// before awaiting on the inner Mutex (prevents shard lock across await).
    endpoints: DashMap<String, Arc<EndpointState>>,
}

/// State tracked for each endpoint.
#[derive(Debug)]
struct EndpointState {
    /// Time of the last submission to this endpoint.
    /// `None` indicates no submission yet (first request is immediate).
    last_request: Mutex<Option<Instant>>,

    /// Cumulative delay applied to this endpoint (in milliseconds).
    /// Used to warn when excessive rate limiting occurs.
    cumulative_delay_ms: AtomicU64,
}

impl EndpointState {
    fn new() -> Self {
        Self {
            last_request: Mutex::new(None),
            cumulative_delay_ms: AtomicU64::new(0),
        }
    }

    /// Adds to the cumulative delay and returns the new total.
    #[allow(clippy::cast_possible_truncation)]
    fn add_cumulative_delay(&self, delay: Duration) -> Duration {
        let delay_ms = delay.as_millis() as u64;
        let new_total = self
            .cumulative_delay_ms
            .fetch_add(delay_ms, Ordering::SeqCst)
            + delay_ms;
        Duration::from_millis(new_total)
    }
}

impl SubmissionRateLimiter {
    /// Creates a new rate limiter with the specified default delay.
    #[must_use]
    #[instrument(skip_all, fields(delay_ms = default_delay.as_millis()))]
    pub fn new(default_delay: Duration) -> Self {
        debug!("creating submission rate limiter");
        Self {
            default_delay,
            disabled: false,
            endpoints: DashMap::new(),
        }
    }

    /// Creates a disabled rate limiter that applies no delays.
    ///
    /// Use this when `--rate-limit 0` is specified.
    #[must_use]
    #[instrument]
    pub fn disabled() -> Self {
        debug!("creating disabled submission rate limiter");
        Self {
            default_delay: Duration::ZERO,
            disabled: true,
            endpoints: DashMap::new(),
        }
    }

    /// Returns whether rate limiting is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns the default delay between submissions.
    #[must_use]
    pub fn default_delay(&self) -> Duration {
        self.default_delay
    }

    /// Acquires permission to submit to the given endpoint host.
    ///
    /// This method will:
    /// 1. Wait if necessary to respect the rate limit
    /// 2. Update the endpoint's last request time
    ///
    /// The first submission to any endpoint proceeds immediately.
    #[instrument(skip(self))]
    pub async fn acquire(&self, endpoint: &str) {
        if self.disabled {
            return;
        }

        // Get or create endpoint state, clone Arc to release DashMap lock
        // before awaiting
        let state = self
            .endpoints
            .entry(endpoint.to_string())
            .or_insert_with(|| Arc::new(EndpointState::new()))
            .clone();

        // Lock the state to atomically check and update
        // Note: DashMap lock is released above, only Mutex lock is held during await
        let mut last_request_guard = state.last_request.lock().await;

        if let Some(last_request) = *last_request_guard {
            let elapsed = last_request.elapsed();

            if elapsed < self.default_delay {
                let delay = self.default_delay.saturating_sub(elapsed);
                let cumulative = state.add_cumulative_delay(delay);

                debug!(
                    endpoint = %endpoint,
                    delay_ms = delay.as_millis(),
                    cumulative_ms = cumulative.as_millis(),
                    "applying rate limit delay"
                );

                if cumulative >= CUMULATIVE_DELAY_WARNING_THRESHOLD {
                    warn!(
                        endpoint = %endpoint,
                        cumulative_delay_secs = cumulative.as_secs(),
                        "excessive rate limiting - consider lowering submission frequency"
                    );
                }

                tokio::time::sleep(delay).await;
            }
        } else {
            debug!(endpoint = %endpoint, "first submission to endpoint - no delay");
        }

        // Update last request time after any delay
        *last_request_guard = Some(Instant::now());
    }

    /// Records a server-mandated rate limit delay (from a Retry-After header).
    ///
    /// This updates the endpoint's state to reflect the server's rate limit,
    /// ensuring subsequent submissions respect the server's wishes.
    #[instrument(skip(self))]
    pub fn record_rate_limit(&self, endpoint: &str, delay: Duration) {
        let state = self
            .endpoints
            .entry(endpoint.to_string())
            .or_insert_with(|| Arc::new(EndpointState::new()));
        let cumulative = state.add_cumulative_delay(delay);

        debug!(
            endpoint = %endpoint,
            delay_ms = delay.as_millis(),
            cumulative_ms = cumulative.as_millis(),
            "recorded server rate limit"
        );

        if cumulative >= CUMULATIVE_DELAY_WARNING_THRESHOLD {
            warn!(
                endpoint = %endpoint,
                cumulative_delay_secs = cumulative.as_secs(),
                "excessive server rate limiting - endpoint may be under heavy load"
            );
        }
    }
}

/// Parses a Retry-After header value into a Duration.
///
/// Supports two formats as per RFC 7231:
/// - Integer seconds: `Retry-After: 120`
/// - HTTP-date: `Retry-After: Wed, 21 Oct 2026 07:28:00 GMT`
///
/// Returns `None` if the value cannot be parsed. Caps excessive values at 1 hour.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use toolslab_core::indexnow::parse_retry_after;
///
/// assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
/// assert_eq!(parse_retry_after("0"), Some(Duration::ZERO));
/// assert_eq!(parse_retry_after("invalid"), None);
/// ```
#[must_use]
#[instrument]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let header_value = header_value.trim();

    // Try parsing as integer seconds first (most common)
    if let Ok(seconds) = header_value.parse::<i64>() {
        if seconds < 0 {
            debug!(seconds, "negative Retry-After value, ignoring");
            return None;
        }

        #[allow(clippy::cast_sign_loss)]
        let duration = Duration::from_secs(seconds as u64);

        if duration > MAX_RETRY_AFTER {
            warn!(
                seconds,
                max_seconds = MAX_RETRY_AFTER.as_secs(),
                "Retry-After exceeds maximum, capping at 1 hour"
            );
            return Some(MAX_RETRY_AFTER);
        }

        return Some(duration);
    }

    // Try parsing as HTTP-date
    if let Ok(datetime) = httpdate::parse_http_date(header_value) {
        let now = std::time::SystemTime::now();

        if let Ok(duration) = datetime.duration_since(now) {
            if duration > MAX_RETRY_AFTER {
                warn!(
                    delay_secs = duration.as_secs(),
                    max_secs = MAX_RETRY_AFTER.as_secs(),
                    "Retry-After date exceeds maximum, capping at 1 hour"
                );
                return Some(MAX_RETRY_AFTER);
            }
            Some(duration)
        } else {
            // Date is in the past
            debug!(
                header_value,
                "Retry-After date is in the past, returning zero"
            );
            Some(Duration::ZERO)
        }
    } else {
        debug!(header_value, "unparseable Retry-After value");
        None
    }
}
