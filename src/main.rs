use WikiWeb::checkpoint::{CheckpointKey, CheckpointStore, FileCheckpointStore};
use WikiWeb::config;
use WikiWeb::crawler::{CrawlEngine, CrawlerConfig, WikiFetcher};
use WikiWeb::error::RankError;
use WikiWeb::ranker::{self, RankOptions, RankTable};
use WikiWeb::validator::Validator;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log2::*;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use url::Url;

/// Indicates start time of a project, lazily initialized
pub static START_TIME: once_cell::sync::Lazy<Instant> = once_cell::sync::Lazy::new(Instant::now);

const PROGRESS_STEPS: u64 = 1000;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = *START_TIME;
    let cfg = config::Config::new();
    cfg.validate()?;
    let _log2 = stdout()
        .module(true) // include module name
        .module_with_line(true) // include line number from module
        .module_filter(|module| module.starts_with("WikiWeb")) // include only modules having this pattern
        .compress(false) // compress output
        .level(cfg.log_level.to_string()) // level of logging
        .start();

    let base_url = Url::parse(&cfg.base_url)?;
    Validator::new(base_url.clone(), cfg.request_timeout)
        .validate(&cfg.seed)
        .await
        .with_context(|| format!("{:?} is not a valid Wikipedia article", cfg.seed))?;

    let crawler_config = CrawlerConfig::new(cfg.seed.clone(), base_url)
        .with_page_limit(cfg.page_limit)
        .with_checkpointing(cfg.save_state)
        .with_strict_resume(cfg.strict_resume)
        .with_request_delay(cfg.request_delay)
        .with_request_timeout(cfg.request_timeout);

    let store = Arc::new(FileCheckpointStore::new(&cfg.state_dir));
    if cfg.fresh {
        store
            .remove(&CheckpointKey::new(cfg.seed.clone(), cfg.page_limit))
            .await?;
        info!("Discarded saved state for {}", cfg.seed);
    }

    let stop_flag = Arc::new(AtomicBool::new(false));
    {
        let stop_flag = Arc::clone(&stop_flag);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping after the current page");
                stop_flag.store(true, Ordering::SeqCst);
            }
        });
    }

    let fetcher = WikiFetcher::new(&crawler_config);
    let engine = CrawlEngine::new(crawler_config, fetcher)
        .with_checkpoint_store(store.clone())
        .with_stop_flag(stop_flag);

    let progress = ProgressBar::new(PROGRESS_STEPS);
    progress.set_style(ProgressStyle::with_template(
        "{spinner} [{elapsed_precise}] {bar:40} {percent:>3}%",
    )?);

    let outcome = match engine
        .crawl(|fraction| progress.set_position((fraction * PROGRESS_STEPS as f64) as u64))
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            progress.abandon();
            error!("Crawling failed: {}", e);
            return Err(e.into());
        }
    };
    progress.finish_and_clear();

    debug!(
        "Crawling completed. {} pages expanded, {} articles discovered",
        outcome.adjacency.len(),
        outcome.visited
    );
    if outcome.cancelled {
        warn!("Crawl stopped early with {} articles still queued", outcome.frontier_remaining);
    }
    if outcome.checkpoint_failures > 0 {
        warn!("{} checkpoint saves failed", outcome.checkpoint_failures);
    }

    let seed_dir = store.seed_dir(&cfg.seed);
    if cfg.save_state {
        write_json(&seed_dir.join("adj.json"), &outcome.adjacency)?;
    }

    let options = RankOptions {
        min_count: if cfg.include_all { None } else { Some(cfg.min_count) },
        top_k: cfg.top_k,
    };
    match ranker::rank(&outcome.adjacency, options) {
        Ok(ranking) => {
            if cfg.save_state {
                write_json(&seed_dir.join("ranks.json"), &ranking.table)?;
            }
            print_ranking(&ranking.table);
            info!(
                "Ranked graph has {} nodes and {} edges",
                ranking.subgraph.nodes.len(),
                ranking.subgraph.edges.len()
            );
            if let Some(path) = &cfg.dot_output {
                std::fs::write(path, ranking.subgraph.to_dot())?;
                info!("Graph written to {:?}", path);
            }
        }
        Err(RankError::EmptyGraph) => {
            println!("Nothing interconnects here");
        }
    }

    info!("Finished in {:?}", START_TIME.elapsed());
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_vec(value)?)?;
    info!("Wrote {:?}", path);
    Ok(())
}

/// Print the ranking in a readable format
fn print_ranking(table: &RankTable) {
    println!("Most referenced articles ({}):", table.len());
    for (i, (article, count)) in table.iter().enumerate() {
        println!("  {:>3}. {} : {}", i + 1, article, count);
    }
}
