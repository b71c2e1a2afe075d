use async_trait::async_trait;
use log2::{debug, info};
use percent_encoding::percent_decode_str;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use super::config::CrawlerConfig;
use crate::error::FetchError;

const ARTICLE_PREFIX: &str = "/wiki/";

/// Source of outbound links for an article.
///
/// Implementations return every distinct article identifier the page references,
/// in document order, with excluded links already removed.
#[async_trait]
pub trait LinkFetcher: Send + Sync {
    async fn fetch(&self, identifier: &str) -> Result<Vec<String>, FetchError>;
}

/// Builds the page URL of `identifier` below `base_url`.
/// The identifier becomes a single percent-encoded path segment; `.` and `..`
/// would leave the article path and yield `None`.
pub fn article_url(base_url: &Url, identifier: &str) -> Option<Url> {
    if identifier == "." || identifier == ".." {
        return None;
    }
    let mut url = base_url.clone();
    url.path_segments_mut().ok()?.pop_if_empty().push(identifier);
    Some(url)
}

/// Extracts article identifiers from the `main#content` element of `html`.
///
/// Only hrefs starting with `/wiki/` count. An href containing any exclusion
/// substring is dropped before the prefix is stripped and the rest percent-decoded.
pub fn extract_links(html: &str, exclusions: &[String]) -> Result<Vec<String>, FetchError> {
    let document = Html::parse_document(html);
    let content_selector = Selector::parse("main#content")
        .map_err(|e| FetchError::Selector(e.to_string()))?;
    let link_selector =
        Selector::parse("a").map_err(|e| FetchError::Selector(e.to_string()))?;

    let content = document
        .select(&content_selector)
        .next()
        .ok_or(FetchError::MissingContent)?;

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for element in content.select(&link_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(raw) = href.strip_prefix(ARTICLE_PREFIX) else {
            continue;
        };
        if let Some(pattern) = exclusions.iter().find(|p| href.contains(p.as_str())) {
            debug!("Skipped {} (matches {:?})", href, pattern);
            continue;
        }
        let identifier = percent_decode_str(raw).decode_utf8_lossy().into_owned();
        if !identifier.is_empty() && seen.insert(identifier.clone()) {
            links.push(identifier);
        }
    }

    Ok(links)
}

/// Fetches articles over HTTP from a MediaWiki-style `/wiki/` site
pub struct WikiFetcher {
    client: Client,
    base_url: Url,
    timeout: Duration,
    exclusions: Vec<String>,
}

impl WikiFetcher {
    pub fn new(config: &CrawlerConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &CrawlerConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            timeout: Duration::from_secs(config.request_timeout_sec),
            exclusions: config.exclusions.clone(),
        }
    }
}

#[async_trait]
impl LinkFetcher for WikiFetcher {
    async fn fetch(&self, identifier: &str) -> Result<Vec<String>, FetchError> {
        let url = article_url(&self.base_url, identifier)
            .ok_or_else(|| FetchError::InvalidIdentifier(identifier.to_string()))?;

        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let html = response.text().await?;
        let links = extract_links(&html, &self.exclusions)?;

        info!("Found {} links on page {}", links.len(), url);

        Ok(links)
    }
}
