use log2::debug;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::crawler::article_url;
use crate::error::ValidationError;

/// Checks that a seed article exists before a crawl starts
pub struct Validator {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl Validator {
    pub fn new(base_url: Url, timeout_sec: u64) -> Self {
        Self {
            client: Client::new(),
            base_url,
            timeout: Duration::from_secs(timeout_sec),
        }
    }

    /// Ok when `identifier` is non-empty and its page answers 200
    pub async fn validate(&self, identifier: &str) -> Result<(), ValidationError> {
        if identifier.is_empty() {
            return Err(ValidationError::Empty);
        }
        let url = article_url(&self.base_url, identifier)
            .ok_or_else(|| ValidationError::InvalidIdentifier(identifier.to_string()))?;

        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await?;
        debug!("Validation of {} returned {}", url, response.status());

        if response.status() != reqwest::StatusCode::OK {
            return Err(ValidationError::NotFound {
                identifier: identifier.to_string(),
                status: response.status(),
            });
        }
        Ok(())
    }

    pub async fn is_valid(&self, identifier: &str) -> bool {
        self.validate(identifier).await.is_ok()
    }
}
