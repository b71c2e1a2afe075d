pub mod state;
pub mod config;
pub mod scrape;
pub mod runner;


pub use state::{AdjacencyMap, CrawlState};
pub use config::{CHECKPOINT_INTERVAL, CrawlerConfig, DEFAULT_BASE_URL, DEFAULT_EXCLUSIONS, LINK_REQUEST_TIMEOUT_SEC};
pub use scrape::{LinkFetcher, WikiFetcher, article_url, extract_links};
pub use runner::{CrawlEngine, CrawlOutcome};
