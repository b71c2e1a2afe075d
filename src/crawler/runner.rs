use log2::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::time::{Duration, sleep};

use super::config::CrawlerConfig;
use super::scrape::LinkFetcher;
use super::state::{AdjacencyMap, CrawlState};
use crate::checkpoint::{CheckpointKey, CheckpointStore};
use crate::error::CrawlError;

/// Result of one `crawl` call
#[derive(Debug)]
pub struct CrawlOutcome {
    pub adjacency: AdjacencyMap,
    /// Number of articles ever queued
    pub visited: usize,
    pub frontier_remaining: usize,
    /// Checkpoint saves that failed without aborting the crawl
    pub checkpoint_failures: usize,
    /// The stop flag ended the crawl before a stopping condition was reached
    pub cancelled: bool,
}

/// Breadth-first crawler over article links.
///
/// Owns no state between calls: each `crawl` starts from the seed or from the
/// checkpoint saved for `(seed, page_limit)`.
pub struct CrawlEngine<F> {
    config: CrawlerConfig,
    fetcher: F,
    store: Option<Arc<dyn CheckpointStore>>,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl<F: LinkFetcher> CrawlEngine<F> {
    pub fn new(config: CrawlerConfig, fetcher: F) -> Self {
        Self {
            config,
            fetcher,
            store: None,
            stop_flag: None,
        }
    }

    pub fn with_checkpoint_store(mut self, store: Arc<dyn CheckpointStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Raising the flag makes the engine save state and return at the next iteration
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    fn checkpoint_store(&self) -> Option<&dyn CheckpointStore> {
        if !self.config.checkpointing {
            return None;
        }
        if self.store.is_none() {
            warn!("Checkpointing requested but no checkpoint store configured");
        }
        self.store.as_deref()
    }

    fn stop_requested(&self) -> bool {
        self.stop_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Runs the crawl until the frontier is empty or `page_limit` articles are queued.
    /// `on_progress` receives `min(visited / page_limit, 1.0)` after every expanded article.
    ///
    /// The seed is always expanded, so a limit of 1 still yields the seed's own links.
    /// A fetch failure ends the crawl without touching the last saved checkpoint.
    pub async fn crawl(&self, mut on_progress: impl FnMut(f64)) -> Result<CrawlOutcome, CrawlError> {
        let page_limit = self.config.page_limit;
        let key = CheckpointKey::new(self.config.seed.clone(), page_limit);
        let store = self.checkpoint_store();

        let mut state = match store {
            Some(store) => self.restore(store, &key).await?,
            None => CrawlState::new(&self.config.seed),
        };

        let mut last_checkpoint = Instant::now();
        let mut checkpoint_failures = 0;
        let mut cancelled = false;

        while !state.frontier.is_empty()
            && (state.visited.len() < page_limit || state.adjacency.is_empty())
        {
            if self.stop_requested() {
                info!("Stop requested, ending crawl of {}", key);
                cancelled = true;
                break;
            }
            let Some(current) = state.frontier.pop_front() else {
                break;
            };

            if !state.adjacency.contains(&current) {
                debug!("Expanding {}", current);
                let links = self
                    .fetcher
                    .fetch(&current)
                    .await
                    .map_err(|source| CrawlError::Fetch {
                        identifier: current.clone(),
                        source,
                    })?;
                state.adjacency.insert(current.clone(), links);

                if self.config.request_delay_ms > 0 {
                    sleep(Duration::from_millis(self.config.request_delay_ms)).await;
                }
            }
            state.enqueue_links_of(&current);

            on_progress(state.progress(page_limit));

            if let Some(store) = store {
                if last_checkpoint.elapsed() >= self.config.checkpoint_interval {
                    self.persist(store, &key, &state, &mut checkpoint_failures)
                        .await?;
                    last_checkpoint = Instant::now();
                }
            }
        }

        if let Some(store) = store {
            self.persist(store, &key, &state, &mut checkpoint_failures)
                .await?;
        }

        info!(
            "Crawl of {} finished: {} pages expanded, {} discovered, {} queued",
            key,
            state.adjacency.len(),
            state.visited.len(),
            state.frontier.len()
        );

        Ok(CrawlOutcome {
            visited: state.visited.len(),
            frontier_remaining: state.frontier.len(),
            adjacency: state.adjacency,
            checkpoint_failures,
            cancelled,
        })
    }

    /// Loads the saved state for `key` as a whole, or a fresh state when there is none
    async fn restore(
        &self,
        store: &dyn CheckpointStore,
        key: &CheckpointKey,
    ) -> Result<CrawlState, CrawlError> {
        match store.load(key).await {
            Ok(Some(state)) => {
                info!(
                    "Resuming {} from checkpoint: {} pages expanded, {} queued",
                    key,
                    state.adjacency.len(),
                    state.frontier.len()
                );
                Ok(state)
            }
            Ok(None) => Ok(CrawlState::new(&self.config.seed)),
            Err(e) if self.config.strict_resume => {
                error!("Cannot resume {}: {}", key, e);
                Err(e.into())
            }
            Err(e) => {
                warn!("Ignoring unreadable checkpoint for {}: {}", key, e);
                Ok(CrawlState::new(&self.config.seed))
            }
        }
    }

    async fn persist(
        &self,
        store: &dyn CheckpointStore,
        key: &CheckpointKey,
        state: &CrawlState,
        failures: &mut usize,
    ) -> Result<(), CrawlError> {
        match store.save(key, state).await {
            Ok(()) => {
                info!(
                    "Checkpoint saved for {} ({} pages expanded)",
                    key,
                    state.adjacency.len()
                );
                Ok(())
            }
            Err(e) if self.config.abort_on_checkpoint_failure => {
                error!("Failed to save checkpoint for {}: {}", key, e);
                Err(e.into())
            }
            Err(e) => {
                *failures += 1;
                warn!("Failed to save checkpoint for {}: {}", key, e);
                Ok(())
            }
        }
    }
}
