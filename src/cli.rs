//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use toolslab_core::indexnow::{Priority, SearchEngine};
use toolslab_core::DEFAULT_MAX_RETRIES;

/// Backend toolbox for ToolsLab: format detection and IndexNow submission.
///
/// Submits changed URLs to search-engine indexing endpoints, manages a
/// persistent submission queue, and classifies pasted text into the formats
/// the toolbox has a tool for.
#[derive(Parser, Debug)]
#[command(name = "toolslab")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// IndexNow API key (the site must serve it as <https://host/key.txt>)
    #[arg(long, env = "INDEXNOW_KEY", global = true)]
    pub key: Option<String>,

    /// Host all submitted URLs must belong to (e.g. toolslab.dev)
    #[arg(long, env = "INDEXNOW_HOST", global = true)]
    pub host: Option<String>,

    /// Explicit key file location when it is not at the default path
    #[arg(long, global = true)]
    pub key_location: Option<String>,

    /// Target engine endpoint (indexnow, bing, seznam, yandex, naver)
    #[arg(long, default_value = "indexnow", global = true)]
    pub engine: SearchEngine,

    /// Maximum attempts per batch for transient failures (1-10)
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES, value_parser = clap::value_parser!(u32).range(1..=10), global = true)]
    pub max_retries: u32,

    /// Minimum delay between requests to the endpoint in milliseconds (0 to disable, max 60000)
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(0..=60000), global = true)]
    pub rate_limit: u64,

    /// Path to the queue database file
    #[arg(long, default_value = "toolslab.db", global = true)]
    pub db: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Submit URLs to the indexing endpoint immediately
    Submit {
        /// URLs to submit (reads stdin when omitted)
        urls: Vec<String>,
    },

    /// Manage the persistent submission queue
    Queue {
        #[command(subcommand)]
        command: QueueCommand,
    },

    /// Detect the format of pasted text and suggest tools
    Detect {
        /// Text to classify (reads stdin when omitted)
        text: Option<String>,

        /// Print detections as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Queue management subcommands.
#[derive(Subcommand, Debug)]
pub enum QueueCommand {
    /// Add URLs to the queue
    Add {
        /// URLs to enqueue (reads stdin when omitted)
        urls: Vec<String>,

        /// Submission priority
        #[arg(long, default_value = "normal")]
        priority: Priority,
    },

    /// Drain and submit everything pending now
    Flush,

    /// Show counts by queue state
    Status,

    /// Run the periodic flush worker until interrupted
    Watch {
        /// Seconds between flush cycles
        #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..=86400))]
        interval: u64,

        /// URLs claimed per flush cycle
        #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..=10000))]
        batch_size: u64,
    },
}
