//! ToolsLab Core Library
//!
//! This library provides the backend subsystems for the ToolsLab developer
//! utility toolbox: a format-detection engine that classifies arbitrary
//! pasted text, and an IndexNow submission pipeline that reports changed
//! URLs to search-engine indexing endpoints.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`db`] - Database connection and schema management
//! - [`detect`] - Heuristic format detection with confidence scores
//! - [`indexnow`] - Batching, retrying IndexNow submission client and queue

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod db;
pub mod detect;
pub mod indexnow;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use db::Database;
pub use detect::{DetectedFormat, Detection, DetectionResult, detect};
pub use indexnow::{
    BatchOutcome, DEFAULT_MAX_RETRIES, FailureType, IndexNowClient, Priority, RetryDecision,
    RetryPolicy, SearchEngine, SubmissionQueue, SubmissionRateLimiter, SubmissionReport,
    SubmitError, classify_error,
};
