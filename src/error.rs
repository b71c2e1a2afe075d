use thiserror::Error;

/// Failure to turn one article into its outbound links
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to fetch page: {0}")]
    Status(reqwest::StatusCode),

    #[error("Page has no content container")]
    MissingContent,

    #[error("Failed to parse selector: {0}")]
    Selector(String),

    #[error("Cannot build article URL for {0:?}")]
    InvalidIdentifier(String),
}

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Checkpoint IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checkpoint serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Unsupported checkpoint version {0}")]
    UnsupportedVersion(u32),

    #[error("Checkpoint belongs to ({seed}, {page_limit}), not the requested crawl")]
    KeyMismatch { seed: String, page_limit: usize },

    #[error("Inconsistent checkpoint: {0}")]
    Inconsistent(String),
}

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Failed to fetch {identifier}: {source}")]
    Fetch {
        identifier: String,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RankError {
    #[error("Nothing interconnects here: ranking produced an empty graph")]
    EmptyGraph,
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Article name is empty")]
    Empty,

    #[error("Article {identifier} does not resolve (status {status})")]
    NotFound {
        identifier: String,
        status: reqwest::StatusCode,
    },

    #[error("Validation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Cannot build article URL for {0:?}")]
    InvalidIdentifier(String),
}
