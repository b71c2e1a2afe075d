use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::crawler::{DEFAULT_BASE_URL, LINK_REQUEST_TIMEOUT_SEC};
use crate::ranker::DEFAULT_TOP_K;

/// Crawls below this many pages are too small to rank meaningfully
pub const MIN_PAGE_LIMIT: usize = 1000;

/// Log levels as defined in log2 crate
#[derive(Debug, Serialize, Deserialize, Clone, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}
/// Program arguments. `CrawlerConfig` is built from these and
/// describes only the crawl itself
#[derive(Parser, Debug, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Wikipedia article to start from
    #[arg(short, long, default_value = "India")]
    pub seed: String,
    /// Maximum number of articles to discover
    #[arg(short, long, default_value = "10000")]
    pub page_limit: usize,
    /// Rank only articles referenced more than this many times
    #[arg(short, long, default_value = "5")]
    pub min_count: usize,
    /// Rank every article, including unreferenced ones
    #[arg(long, conflicts_with = "min_count")]
    pub include_all: bool,
    /// Number of articles kept in the ranked graph
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,
    /// Save crawl state periodically so an interrupted crawl can resume
    #[arg(long)]
    pub save_state: bool,
    /// Discard the saved state for this seed and page limit first
    #[arg(long)]
    pub fresh: bool,
    /// Fail instead of starting over when the saved state is unreadable
    #[arg(long)]
    pub strict_resume: bool,
    /// Directory holding saved state and results
    #[arg(long, default_value = ".")]
    pub state_dir: PathBuf,
    /// Base URL that article names are appended to
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
    /// Delay between requests in milliseconds
    #[arg(short, long, default_value = "0")]
    pub request_delay: u64,
    /// Request timeout in seconds
    #[arg(long, default_value_t = LINK_REQUEST_TIMEOUT_SEC)]
    pub request_timeout: u64,
    /// Write the ranked graph in Graphviz format to this file
    #[arg(short, long)]
    pub dot_output: Option<PathBuf>,
    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", value_enum)]
    pub log_level: LogLevel,
}

impl Config {
    pub fn new() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.seed.trim().is_empty() {
            anyhow::bail!("seed must not be empty");
        }
        if self.page_limit < MIN_PAGE_LIMIT {
            anyhow::bail!("page_limit must be at least {}", MIN_PAGE_LIMIT);
        }
        if self.top_k == 0 {
            anyhow::bail!("top_k must be greater than 0");
        }
        if self.request_timeout == 0 {
            anyhow::bail!("request_timeout must be greater than 0");
        }
        url::Url::parse(&self.base_url)?;
        Ok(())
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        write!(f, "{}", s)
    }
}
