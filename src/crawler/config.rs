use std::time::Duration;
use url::Url;

/// Default timeout for link requests in seconds
pub const LINK_REQUEST_TIMEOUT_SEC: u64 = 10;

/// Wall-clock time between two periodic checkpoints
pub const CHECKPOINT_INTERVAL: Duration = Duration::from_secs(300);

pub const DEFAULT_BASE_URL: &str = "https://en.wikipedia.org/wiki/";

/// Substrings that mark a raw `/wiki/` link as non-article (meta pages, media,
/// fragments, percent-encoded titles, archive links)
pub const DEFAULT_EXCLUSIONS: &[&str] = &[
    "Wikipedia",
    "Category",
    "File",
    "Help",
    "Special",
    "identifier",
    "%",
    "Template",
    "#",
    "Wayback_Machine",
    "Portal",
];

/// Configuration for the crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub seed: String,
    pub page_limit: usize,
    pub checkpointing: bool,
    pub checkpoint_interval: Duration,
    /// Fail instead of starting fresh when a checkpoint exists but cannot be read
    pub strict_resume: bool,
    /// Stop the crawl when a checkpoint cannot be written
    pub abort_on_checkpoint_failure: bool,
    pub request_delay_ms: u64,
    pub request_timeout_sec: u64,
    pub base_url: Url,
    pub exclusions: Vec<String>,
}

impl CrawlerConfig {
    pub fn new(seed: impl Into<String>, base_url: Url) -> Self {
        Self {
            seed: seed.into(),
            page_limit: 10_000,
            checkpointing: false,
            checkpoint_interval: CHECKPOINT_INTERVAL,
            strict_resume: false,
            abort_on_checkpoint_failure: false,
            request_delay_ms: 0,
            request_timeout_sec: LINK_REQUEST_TIMEOUT_SEC,
            base_url,
            exclusions: DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = page_limit;
        self
    }

    pub fn with_checkpointing(mut self, enabled: bool) -> Self {
        self.checkpointing = enabled;
        self
    }

    pub fn with_checkpoint_interval(mut self, interval: Duration) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    pub fn with_strict_resume(mut self, strict: bool) -> Self {
        self.strict_resume = strict;
        self
    }

    pub fn with_abort_on_checkpoint_failure(mut self, abort: bool) -> Self {
        self.abort_on_checkpoint_failure = abort;
        self
    }

    pub fn with_request_delay(mut self, delay_ms: u64) -> Self {
        self.request_delay_ms = delay_ms;
        self
    }

    pub fn with_request_timeout(mut self, timeout_sec: u64) -> Self {
        self.request_timeout_sec = timeout_sec;
        self
    }

    pub fn with_exclusions(mut self, exclusions: Vec<String>) -> Self {
        self.exclusions = exclusions;
        self
    }
}
