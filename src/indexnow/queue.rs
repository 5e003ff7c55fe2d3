//! SQLite-backed submission queue with a background flush worker.
//!
//! URLs whose content changed are enqueued here instead of being submitted
//! immediately, so that bursts of edits coalesce into a few well-sized
//! batches. Items move through a lifecycle (pending → `in_flight` →
//! submitted/failed) and every batch attempt is recorded in the
//! `submission_log` table.
//!
//! # Overview
//!
//! - [`SubmissionQueue`] - persistence layer over [`Database`]
//! - [`QueuedUrl`] - a single queue entry
//! - [`Priority`] / [`QueueState`] - ordering and lifecycle
//! - [`QueueWorker`] - periodic flusher driving an [`IndexNowClient`]
//!
//! # Example
//!
//! ```ignore
//! use toolslab_core::Database;
//! use toolslab_core::indexnow::{Priority, SubmissionQueue};
//!
//! let db = Database::new(Path::new("queue.db")).await?;
//! let queue = SubmissionQueue::new(db);
//!
//! queue.enqueue("https://toolslab.dev/it/tools/json-formatter", Priority::High).await?;
//! let batch = queue.claim_batch(100).await?;
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use sqlx::{FromRow, Row};
use thiserror::Error;
use tokio::sync::{Notify, watch};
use tracing::{debug, error, info, instrument, warn};

use super::client::IndexNowClient;
use super::retry::{FailureType, classify_error};
use crate::db::Database;

/// How often the worker flushes pending URLs when nothing else wakes it.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(60);

/// How many URLs the worker claims per flush cycle.
pub const DEFAULT_FLUSH_BATCH_SIZE: usize = 100;

/// Queue-level attempt cap before an item is marked failed for good.
const MAX_QUEUE_ATTEMPTS: i64 = 3;

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;

/// Errors from queue persistence operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An operation referenced a queue entry that does not exist.
    #[error("queue entry not found: id {0}")]
    ItemNotFound(i64),
}

/// Returns `Ok(())` if at least one row was affected; otherwise [`QueueError::ItemNotFound`].
fn check_affected(id: i64, rows_affected: u64) -> Result<()> {
    if rows_affected == 0 {
        Err(QueueError::ItemNotFound(id))
    } else {
        Ok(())
    }
}

/// Submission priority. Higher priorities are flushed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Priority {
    /// Flushed last (e.g. bulk backfills).
    Low,
    /// The default for ordinary content changes.
    #[default]
    Normal,
    /// Flushed first (e.g. newly published pages).
    High,
}

impl Priority {
    /// Returns the database integer representation.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Low => 0,
            Self::Normal => 1,
            Self::High => 2,
        }
    }

    /// Parses the database integer representation.
    ///
    /// Falls back to `Normal` for values outside the known range.
    #[must_use]
    pub fn from_i64(value: i64) -> Self {
        match value {
            0 => Self::Low,
            2 => Self::High,
            _ => Self::Normal,
        }
    }

    /// Returns the CLI string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            other => Err(format!(
                "invalid priority: {other} (expected low, normal, or high)"
            )),
        }
    }
}

/// Lifecycle state of a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Waiting to be flushed.
    Pending,
    /// Claimed by a flush cycle that has not finished yet.
    InFlight,
    /// Accepted by the endpoint.
    Submitted,
    /// Given up after exhausting queue-level attempts.
    Failed,
}

impl QueueState {
    /// Returns the database string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Submitted => "submitted",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for QueueState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_flight" => Ok(Self::InFlight),
            "submitted" => Ok(Self::Submitted),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid queue state: {s}")),
        }
    }
}

/// A single entry in the submission queue.
#[derive(Debug, Clone, FromRow)]
pub struct QueuedUrl {
    /// Unique identifier.
    pub id: i64,
    /// The URL to submit.
    pub url: String,
    /// Integer priority (see [`Priority`]).
    #[sqlx(rename = "priority")]
    pub priority_raw: i64,
    /// Current lifecycle state (stored as text, parsed via `state()`).
    #[sqlx(rename = "status")]
    pub status_str: String,
    /// Flush cycles that have included this URL so far.
    pub attempts: i64,
    /// Last submission error, if any.
    pub last_error: Option<String>,
    /// When the entry was created.
    pub created_at: String,
    /// When the entry was last updated.
    pub updated_at: String,
}

impl QueuedUrl {
    /// Returns the parsed lifecycle state.
    ///
    /// Falls back to `Pending` if the status string is invalid.
    #[must_use]
    pub fn state(&self) -> QueueState {
        self.status_str.parse().unwrap_or(QueueState::Pending)
    }

    /// Returns the parsed priority.
    #[must_use]
    pub fn priority(&self) -> Priority {
        Priority::from_i64(self.priority_raw)
    }
}

impl fmt::Display for QueuedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "QueuedUrl {{ id: {}, url: {}, priority: {}, state: {} }}",
            self.id,
            self.url,
            self.priority(),
            self.state()
        )
    }
}

/// Per-state counts for status reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueCounts {
    /// Entries waiting to be flushed.
    pub pending: i64,
    /// Entries claimed by an active flush cycle.
    pub in_flight: i64,
    /// Entries accepted by the endpoint.
    pub submitted: i64,
    /// Entries that exhausted their attempts.
    pub failed: i64,
}

impl QueueCounts {
    /// Total entries across all states.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.pending + self.in_flight + self.submitted + self.failed
    }
}

/// Persistent submission queue.
///
/// Backed by `SQLite` with WAL mode, so the CLI and a background worker can
/// share one database file.
#[derive(Debug, Clone)]
pub struct SubmissionQueue {
    db: Database,
}

impl SubmissionQueue {
    /// Creates a new queue over the given database connection.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Adds a URL to the queue with pending status.
    ///
    /// Duplicate URLs are coalesced: if the URL already has a pending or
    /// in-flight entry, no new row is created. When the new priority is
    /// higher than the existing entry's, the existing entry is promoted.
    ///
    /// # Returns
    ///
    /// The ID of the queue entry (new or existing).
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Database`] if the insert fails.
    #[instrument(skip(self), fields(url = %url, priority = %priority))]
    pub async fn enqueue(&self, url: &str, priority: Priority) -> Result<i64> {
        let existing = sqlx::query(
            r"SELECT id, priority FROM submission_queue
              WHERE url = ? AND status IN (?, ?)",
        )
        .bind(url)
        .bind(QueueState::Pending.as_str())
        .bind(QueueState::InFlight.as_str())
        .fetch_optional(self.db.pool())
        .await?;

        if let Some(row) = existing {
            let id: i64 = row.get("id");
            let current: i64 = row.get("priority");
            if priority.as_i64() > current {
                sqlx::query(
                    r"UPDATE submission_queue
                      SET priority = ?, updated_at = datetime('now')
                      WHERE id = ?",
                )
                .bind(priority.as_i64())
                .bind(id)
                .execute(self.db.pool())
                .await?;
                debug!(id, "promoted existing queue entry");
            } else {
                debug!(id, "URL already queued, skipping");
            }
            return Ok(id);
        }

        let result = sqlx::query(
            r"INSERT INTO submission_queue (url, priority, status)
              VALUES (?, ?, ?)
              RETURNING id",
        )
        .bind(url)
        .bind(priority.as_i64())
        .bind(QueueState::Pending.as_str())
        .fetch_one(self.db.pool())
        .await?;

        Ok(result.get("id"))
    }

    /// Claims up to `limit` pending entries for a flush cycle.
    ///
    /// Atomically transitions the highest-priority pending entries to
    /// `in_flight` (incrementing their attempt counters) and returns them
    /// ordered by priority descending, then age ascending. Returns an empty
    /// vector when nothing is pending.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn claim_batch(&self, limit: usize) -> Result<Vec<QueuedUrl>> {
        // Atomic UPDATE...RETURNING ensures no race condition between select and update
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let items = sqlx::query_as::<_, QueuedUrl>(
            r"UPDATE submission_queue
              SET status = ?, attempts = attempts + 1, updated_at = datetime('now')
              WHERE id IN (
                  SELECT id FROM submission_queue
                  WHERE status = ?
                  ORDER BY priority DESC, created_at ASC
                  LIMIT ?
              )
              RETURNING *",
        )
        .bind(QueueState::InFlight.as_str())
        .bind(QueueState::Pending.as_str())
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        let mut items = items;
        // RETURNING does not guarantee order; restore the claim order.
        items.sort_by(|a, b| {
            b.priority_raw
                .cmp(&a.priority_raw)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(items)
    }

    /// Marks an entry as accepted by the endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::ItemNotFound`] if no entry exists with the given ID.
    /// Returns [`QueueError::Database`] if the update fails.
    #[instrument(skip(self))]
    pub async fn mark_submitted(&self, id: i64) -> Result<()> {
        let result = sqlx::query(
            r"UPDATE submission_queue
              SET status = ?, last_error = NULL, updated_at = datetime('now')
              WHERE id = ?",
        )
        .bind(QueueState::Submitted.as_str())
        .bind(id)
        .execute(self.db.pool())
        .await?;

        check_affected(id, result.rows_affected())
    }

    /// Marks an entry as failed with an error message.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::ItemNotFound`] if no entry exists with the given ID.
    /// Returns [`QueueError::Database`] if the update fails.
    #[instrument(skip(self), fields(error = %error))]
    pub async fn mark_failed(&self, id: i64, error: &str) -> Result<()> {
        let result = sqlx::query(
            r"UPDATE submission_queue
              SET status = ?, last_error = ?, updated_at = datetime('now')
              WHERE id = ?",
        )
        .bind(QueueState::Failed.as_str())
        .bind(error)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        check_affected(id, result.rows_affected())
    }

    /// Returns an entry to pending status for a later flush cycle.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::ItemNotFound`] if no entry exists with the given ID.
    /// Returns [`QueueError::Database`] if the update fails.
    #[instrument(skip(self))]
    pub async fn requeue(&self, id: i64, error: Option<&str>) -> Result<()> {
        let result = sqlx::query(
            r"UPDATE submission_queue
              SET status = ?, last_error = ?, updated_at = datetime('now')
              WHERE id = ?",
        )
        .bind(QueueState::Pending.as_str())
        .bind(error)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        check_affected(id, result.rows_affected())
    }

    /// Gets a queue entry by ID.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Option<QueuedUrl>> {
        let item = sqlx::query_as::<_, QueuedUrl>(r"SELECT * FROM submission_queue WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(item)
    }

    /// Counts pending entries.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn pending_count(&self) -> Result<i64> {
        let result = sqlx::query(r"SELECT COUNT(*) as count FROM submission_queue WHERE status = ?")
            .bind(QueueState::Pending.as_str())
            .fetch_one(self.db.pool())
            .await?;

        Ok(result.get("count"))
    }

    /// Counts entries in every lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn counts(&self) -> Result<QueueCounts> {
        let rows = sqlx::query(
            r"SELECT status, COUNT(*) as count FROM submission_queue GROUP BY status",
        )
        .fetch_all(self.db.pool())
        .await?;

        let mut counts = QueueCounts::default();
        for row in rows {
            let status: String = row.get("status");
            let count: i64 = row.get("count");
            match status.parse::<QueueState>() {
                Ok(QueueState::Pending) => counts.pending = count,
                Ok(QueueState::InFlight) => counts.in_flight = count,
                Ok(QueueState::Submitted) => counts.submitted = count,
                Ok(QueueState::Failed) => counts.failed = count,
                Err(_) => warn!(%status, "unknown status in submission_queue"),
            }
        }

        Ok(counts)
    }

    /// Lists entries filtered by state, ordered by priority then age.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn list_by_state(&self, state: QueueState) -> Result<Vec<QueuedUrl>> {
        let items = sqlx::query_as::<_, QueuedUrl>(
            r"SELECT * FROM submission_queue
              WHERE status = ?
              ORDER BY priority DESC, created_at ASC",
        )
        .bind(state.as_str())
        .fetch_all(self.db.pool())
        .await?;

        Ok(items)
    }

    /// Resets all in-flight entries back to pending status.
    ///
    /// Called at startup for crash recovery - entries left `in_flight` by a
    /// previous process are returned to the queue for the next flush.
    ///
    /// # Returns
    ///
    /// The number of entries that were reset.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Database`] if the update fails.
    #[instrument(skip(self))]
    pub async fn reset_in_flight(&self) -> Result<u64> {
        let result = sqlx::query(
            r"UPDATE submission_queue
              SET status = ?, updated_at = datetime('now')
              WHERE status = ?",
        )
        .bind(QueueState::Pending.as_str())
        .bind(QueueState::InFlight.as_str())
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected())
    }

    /// Removes entries with a specific state.
    ///
    /// # Returns
    ///
    /// The number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Database`] if the delete fails.
    #[instrument(skip(self))]
    pub async fn clear_by_state(&self, state: QueueState) -> Result<u64> {
        let result = sqlx::query(r"DELETE FROM submission_queue WHERE status = ?")
            .bind(state.as_str())
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected())
    }

    /// Records one batch attempt in the submission log.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Database`] if the insert fails.
    #[instrument(skip(self, error))]
    pub async fn log_batch(
        &self,
        endpoint: &str,
        url_count: usize,
        attempts: u32,
        success: bool,
        error: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r"INSERT INTO submission_log (endpoint, url_count, attempts, outcome, error)
              VALUES (?, ?, ?, ?, ?)",
        )
        .bind(endpoint)
        .bind(i64::try_from(url_count).unwrap_or(i64::MAX))
        .bind(i64::from(attempts))
        .bind(if success { "success" } else { "failure" })
        .bind(error)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }
}

/// Summary of one flush cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlushSummary {
    /// Entries claimed this cycle.
    pub claimed: usize,
    /// Entries accepted by the endpoint.
    pub submitted: usize,
    /// Entries returned to pending for a later retry.
    pub requeued: usize,
    /// Entries marked failed for good.
    pub failed: usize,
}

/// Background worker that drains the queue through an [`IndexNowClient`].
///
/// Flushes on a fixed interval, and early whenever it is woken while the
/// pending backlog has reached the flush batch size. A shutdown signal
/// triggers one final flush before the worker exits.
#[derive(Debug)]
pub struct QueueWorker {
    queue: SubmissionQueue,
    client: Arc<IndexNowClient>,
    flush_interval: Duration,
    batch_size: usize,
    wake: Arc<Notify>,
}

impl QueueWorker {
    /// Creates a worker with the default interval and batch size.
    #[must_use]
    pub fn new(queue: SubmissionQueue, client: Arc<IndexNowClient>) -> Self {
        Self {
            queue,
            client,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            batch_size: DEFAULT_FLUSH_BATCH_SIZE,
            wake: Arc::new(Notify::new()),
        }
    }

    /// Sets the flush interval.
    #[must_use]
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Sets how many entries are claimed per flush cycle.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Returns a handle producers can use to wake the worker after enqueueing.
    ///
    /// The worker only flushes early when the pending backlog has reached the
    /// batch size, so waking it after every enqueue is cheap.
    #[must_use]
    pub fn waker(&self) -> Arc<Notify> {
        Arc::clone(&self.wake)
    }

    /// Flushes one cycle: claims a batch, submits it, and updates entry states.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when a queue persistence operation fails.
    /// Submission failures are not errors here; they are reflected in the
    /// returned [`FlushSummary`] and in entry states.
    #[instrument(skip(self))]
    pub async fn flush(&self) -> Result<FlushSummary> {
        let mut summary = FlushSummary::default();

        loop {
            let claimed = self.queue.claim_batch(self.batch_size).await?;
            if claimed.is_empty() {
                break;
            }
            summary.claimed += claimed.len();

            let urls: Vec<String> = claimed.iter().map(|item| item.url.clone()).collect();
            let report = self.client.submit(&urls).await;

            // URLs the client refused up front will never succeed; fail them now.
            for rejected in &report.rejected {
                if let Some(item) = claimed.iter().find(|i| i.url == rejected.url) {
                    self.queue.mark_failed(item.id, &rejected.reason).await?;
                    summary.failed += 1;
                }
            }

            // Claims are capped at the flush batch size, so the client produced
            // at most one batch for the accepted URLs.
            let Some(outcome) = report.batches.first() else {
                continue;
            };

            match &outcome.result {
                Ok(()) => {
                    for item in claimed
                        .iter()
                        .filter(|i| !report.rejected.iter().any(|r| r.url == i.url))
                    {
                        self.queue.mark_submitted(item.id).await?;
                        summary.submitted += 1;
                    }
                    self.queue
                        .log_batch(
                            &report.endpoint,
                            outcome.url_count,
                            outcome.attempts,
                            true,
                            None,
                        )
                        .await?;
                }
                Err(submit_error) => {
                    let message = submit_error.to_string();
                    let permanent = !matches!(
                        classify_error(submit_error),
                        FailureType::Transient | FailureType::RateLimited
                    );
                    for item in claimed
                        .iter()
                        .filter(|i| !report.rejected.iter().any(|r| r.url == i.url))
                    {
                        if permanent || item.attempts >= MAX_QUEUE_ATTEMPTS {
                            self.queue.mark_failed(item.id, &message).await?;
                            summary.failed += 1;
                        } else {
                            self.queue.requeue(item.id, Some(&message)).await?;
                            summary.requeued += 1;
                        }
                    }
                    self.queue
                        .log_batch(
                            &report.endpoint,
                            outcome.url_count,
                            outcome.attempts,
                            false,
                            Some(&message),
                        )
                        .await?;
                    // Requeued entries would be claimed again immediately;
                    // leave them for the next cycle instead.
                    break;
                }
            }
        }

        if summary.claimed > 0 {
            info!(
                claimed = summary.claimed,
                submitted = summary.submitted,
                requeued = summary.requeued,
                failed = summary.failed,
                "flush cycle complete"
            );
        }

        Ok(summary)
    }

    /// Runs the worker until the shutdown signal fires.
    ///
    /// Performs crash recovery on startup, then flushes on every interval
    /// tick, early when woken with a full backlog, and once more on shutdown.
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        match self.queue.reset_in_flight().await {
            Ok(0) => {}
            Ok(reset) => info!(reset, "recovered in-flight entries from previous run"),
            Err(e) => error!(error = %e, "crash recovery failed"),
        }

        let mut interval = tokio::time::interval(self.flush_interval);
        // The first tick fires immediately; skip it so startup does not flush
        // before producers had a chance to enqueue.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.flush().await {
                        error!(error = %e, "flush cycle failed");
                    }
                }
                () = self.wake.notified() => {
                    match self.queue.pending_count().await {
                        Ok(pending) if pending >= i64::try_from(self.batch_size).unwrap_or(i64::MAX) => {
                            debug!(pending, "backlog reached batch size, flushing early");
                            if let Err(e) = self.flush().await {
                                error!(error = %e, "early flush failed");
                            }
                            interval.reset();
                        }
                        Ok(_) => {}
                        Err(e) => error!(error = %e, "pending count failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        if let Err(e) = self.flush().await {
            error!(error = %e, "final flush on shutdown failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Database;

    // ==================== Priority Tests ====================

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::High > Priority::Normal);
        assert!(Priority::Normal > Priority::Low);
    }

    #[test]
    fn test_priority_as_i64() {
        assert_eq!(Priority::Low.as_i64(), 0);
        assert_eq!(Priority::Normal.as_i64(), 1);
        assert_eq!(Priority::High.as_i64(), 2);
    }

    #[test]
    fn test_priority_from_i64_round_trips() {
        for priority in [Priority::Low, Priority::Normal, Priority::High] {
            assert_eq!(Priority::from_i64(priority.as_i64()), priority);
        }
    }

    #[test]
    fn test_priority_from_i64_out_of_range_is_normal() {
        assert_eq!(Priority::from_i64(99), Priority::Normal);
        assert_eq!(Priority::from_i64(-1), Priority::Normal);
    }

    #[test]
    fn test_priority_from_str() {
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("Normal".parse::<Priority>().unwrap(), Priority::Normal);
        assert_eq!("LOW".parse::<Priority>().unwrap(), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_priority_default_is_normal() {
        assert_eq!(Priority::default(), Priority::Normal);
    }

    // ==================== QueueState Tests ====================

    #[test]
    fn test_queue_state_round_trips() {
        for state in [
            QueueState::Pending,
            QueueState::InFlight,
            QueueState::Submitted,
            QueueState::Failed,
        ] {
            assert_eq!(state.as_str().parse::<QueueState>().unwrap(), state);
        }
    }

    #[test]
    fn test_queue_state_from_str_invalid() {
        let result = "done".parse::<QueueState>();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("invalid queue state"));
    }

    // ==================== QueuedUrl Tests ====================

    fn test_item(status: &str, priority: i64) -> QueuedUrl {
        QueuedUrl {
            id: 1,
            url: "https://toolslab.dev/a".to_string(),
            priority_raw: priority,
            status_str: status.to_string(),
            attempts: 0,
            last_error: None,
            created_at: "2026-01-01".to_string(),
            updated_at: "2026-01-01".to_string(),
        }
    }

    #[test]
    fn test_queued_url_state_parses() {
        assert_eq!(test_item("in_flight", 1).state(), QueueState::InFlight);
    }

    #[test]
    fn test_queued_url_state_fallback_on_invalid() {
        assert_eq!(test_item("garbage", 1).state(), QueueState::Pending);
    }

    #[test]
    fn test_queued_url_display() {
        let display = test_item("pending", 2).to_string();
        assert!(display.contains("toolslab.dev"));
        assert!(display.contains("high"));
        assert!(display.contains("pending"));
    }

    // ==================== SubmissionQueue Tests ====================

    #[tokio::test]
    async fn test_enqueue_and_get() {
        let db = Database::new_in_memory().await.unwrap();
        let queue = SubmissionQueue::new(db);

        let id = queue
            .enqueue("https://toolslab.dev/it/tools/json-formatter", Priority::Normal)
            .await
            .unwrap();

        let item = queue.get(id).await.unwrap().unwrap();
        assert_eq!(item.url, "https://toolslab.dev/it/tools/json-formatter");
        assert_eq!(item.state(), QueueState::Pending);
        assert_eq!(item.priority(), Priority::Normal);
        assert_eq!(item.attempts, 0);
    }

    #[tokio::test]
    async fn test_enqueue_deduplicates_pending_url() {
        let db = Database::new_in_memory().await.unwrap();
        let queue = SubmissionQueue::new(db);

        let first = queue
            .enqueue("https://toolslab.dev/a", Priority::Normal)
            .await
            .unwrap();
        let second = queue
            .enqueue("https://toolslab.dev/a", Priority::Normal)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(queue.pending_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_enqueue_duplicate_promotes_priority() {
        let db = Database::new_in_memory().await.unwrap();
        let queue = SubmissionQueue::new(db);

        let id = queue
            .enqueue("https://toolslab.dev/a", Priority::Low)
            .await
            .unwrap();
        queue
            .enqueue("https://toolslab.dev/a", Priority::High)
            .await
            .unwrap();

        let item = queue.get(id).await.unwrap().unwrap();
        assert_eq!(item.priority(), Priority::High);
    }

    #[tokio::test]
    async fn test_enqueue_duplicate_does_not_demote_priority() {
        let db = Database::new_in_memory().await.unwrap();
        let queue = SubmissionQueue::new(db);

        let id = queue
            .enqueue("https://toolslab.dev/a", Priority::High)
            .await
            .unwrap();
        queue
            .enqueue("https://toolslab.dev/a", Priority::Low)
            .await
            .unwrap();

        let item = queue.get(id).await.unwrap().unwrap();
        assert_eq!(item.priority(), Priority::High);
    }

    #[tokio::test]
    async fn test_enqueue_submitted_url_creates_new_entry() {
        let db = Database::new_in_memory().await.unwrap();
        let queue = SubmissionQueue::new(db);

        let first = queue
            .enqueue("https://toolslab.dev/a", Priority::Normal)
            .await
            .unwrap();
        queue.claim_batch(10).await.unwrap();
        queue.mark_submitted(first).await.unwrap();

        // Content changed again after submission; it must be queueable again.
        let second = queue
            .enqueue("https://toolslab.dev/a", Priority::Normal)
            .await
            .unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_claim_batch_orders_by_priority_then_age() {
        let db = Database::new_in_memory().await.unwrap();
        let queue = SubmissionQueue::new(db);

        queue
            .enqueue("https://toolslab.dev/low", Priority::Low)
            .await
            .unwrap();
        queue
            .enqueue("https://toolslab.dev/normal", Priority::Normal)
            .await
            .unwrap();
        queue
            .enqueue("https://toolslab.dev/high", Priority::High)
            .await
            .unwrap();

        let batch = queue.claim_batch(10).await.unwrap();
        assert_eq!(batch.len(), 3);
        assert!(batch[0].url.ends_with("/high"));
        assert!(batch[1].url.ends_with("/normal"));
        assert!(batch[2].url.ends_with("/low"));
    }

    #[tokio::test]
    async fn test_claim_batch_respects_limit_and_increments_attempts() {
        let db = Database::new_in_memory().await.unwrap();
        let queue = SubmissionQueue::new(db);

        for i in 0..5 {
            queue
                .enqueue(&format!("https://toolslab.dev/p{i}"), Priority::Normal)
                .await
                .unwrap();
        }

        let batch = queue.claim_batch(3).await.unwrap();
        assert_eq!(batch.len(), 3);
        assert!(batch.iter().all(|i| i.state() == QueueState::InFlight));
        assert!(batch.iter().all(|i| i.attempts == 1));
        assert_eq!(queue.pending_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_claim_batch_empty_queue() {
        let db = Database::new_in_memory().await.unwrap();
        let queue = SubmissionQueue::new(db);
        assert!(queue.claim_batch(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_submitted_clears_last_error() {
        let db = Database::new_in_memory().await.unwrap();
        let queue = SubmissionQueue::new(db);

        let id = queue
            .enqueue("https://toolslab.dev/a", Priority::Normal)
            .await
            .unwrap();
        queue.claim_batch(10).await.unwrap();
        queue.requeue(id, Some("HTTP 503")).await.unwrap();
        queue.claim_batch(10).await.unwrap();
        queue.mark_submitted(id).await.unwrap();

        let item = queue.get(id).await.unwrap().unwrap();
        assert_eq!(item.state(), QueueState::Submitted);
        assert!(item.last_error.is_none());
    }

    #[tokio::test]
    async fn test_mark_failed_records_error() {
        let db = Database::new_in_memory().await.unwrap();
        let queue = SubmissionQueue::new(db);

        let id = queue
            .enqueue("https://toolslab.dev/a", Priority::Normal)
            .await
            .unwrap();
        queue.mark_failed(id, "HTTP 400 from api.indexnow.org").await.unwrap();

        let item = queue.get(id).await.unwrap().unwrap();
        assert_eq!(item.state(), QueueState::Failed);
        assert_eq!(item.last_error.as_deref(), Some("HTTP 400 from api.indexnow.org"));
    }

    #[tokio::test]
    async fn test_mark_missing_id_returns_item_not_found() {
        let db = Database::new_in_memory().await.unwrap();
        let queue = SubmissionQueue::new(db);

        let result = queue.mark_submitted(999).await;
        assert!(matches!(result, Err(QueueError::ItemNotFound(999))));
    }

    #[tokio::test]
    async fn test_reset_in_flight() {
        let db = Database::new_in_memory().await.unwrap();
        let queue = SubmissionQueue::new(db);

        queue
            .enqueue("https://toolslab.dev/a", Priority::Normal)
            .await
            .unwrap();
        queue
            .enqueue("https://toolslab.dev/b", Priority::Normal)
            .await
            .unwrap();
        queue.claim_batch(10).await.unwrap();

        let reset = queue.reset_in_flight().await.unwrap();
        assert_eq!(reset, 2);
        assert_eq!(queue.pending_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_counts_reflect_lifecycle() {
        let db = Database::new_in_memory().await.unwrap();
        let queue = SubmissionQueue::new(db);

        let a = queue
            .enqueue("https://toolslab.dev/a", Priority::Normal)
            .await
            .unwrap();
        let b = queue
            .enqueue("https://toolslab.dev/b", Priority::Normal)
            .await
            .unwrap();
        queue
            .enqueue("https://toolslab.dev/c", Priority::Normal)
            .await
            .unwrap();
        queue.claim_batch(2).await.unwrap();
        queue.mark_submitted(a).await.unwrap();
        queue.mark_failed(b, "HTTP 422").await.unwrap();

        let counts = queue.counts().await.unwrap();
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.in_flight, 0);
        assert_eq!(counts.submitted, 1);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.total(), 3);
    }

    #[tokio::test]
    async fn test_list_by_state() {
        let db = Database::new_in_memory().await.unwrap();
        let queue = SubmissionQueue::new(db);

        queue
            .enqueue("https://toolslab.dev/a", Priority::Low)
            .await
            .unwrap();
        queue
            .enqueue("https://toolslab.dev/b", Priority::High)
            .await
            .unwrap();

        let pending = queue.list_by_state(QueueState::Pending).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending[0].url.ends_with("/b"));

        let failed = queue.list_by_state(QueueState::Failed).await.unwrap();
        assert!(failed.is_empty());
    }

    #[tokio::test]
    async fn test_clear_by_state() {
        let db = Database::new_in_memory().await.unwrap();
        let queue = SubmissionQueue::new(db);

        let id = queue
            .enqueue("https://toolslab.dev/a", Priority::Normal)
            .await
            .unwrap();
        queue.mark_failed(id, "HTTP 400").await.unwrap();

        let removed = queue.clear_by_state(QueueState::Failed).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(queue.counts().await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn test_log_batch_inserts_row() {
        let db = Database::new_in_memory().await.unwrap();
        let queue = SubmissionQueue::new(db.clone());

        queue
            .log_batch("api.indexnow.org", 42, 2, false, Some("HTTP 503"))
            .await
            .unwrap();

        let row = sqlx::query("SELECT endpoint, url_count, attempts, outcome, error FROM submission_log")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(row.get::<String, _>("endpoint"), "api.indexnow.org");
        assert_eq!(row.get::<i64, _>("url_count"), 42);
        assert_eq!(row.get::<i64, _>("attempts"), 2);
        assert_eq!(row.get::<String, _>("outcome"), "failure");
        assert_eq!(row.get::<Option<String>, _>("error").as_deref(), Some("HTTP 503"));
    }
}
