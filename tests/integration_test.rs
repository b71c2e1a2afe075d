use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::path;
use wiremock::{Mock, MockServer, ResponseTemplate};
use WikiWeb::checkpoint::{CheckpointKey, CheckpointStore, FileCheckpointStore};
use WikiWeb::crawler::{CrawlEngine, CrawlerConfig, WikiFetcher};
use WikiWeb::error::{CrawlError, RankError};
use WikiWeb::ranker::{self, RankOptions};
use WikiWeb::validator::Validator;

fn article(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="/wiki/{}">{}</a>"#, l, l))
        .collect();
    format!(r#"<html><body><main id="content">{}</main></body></html>"#, anchors)
}

async fn mount(server: &MockServer, title: &str, links: &[&str]) {
    Mock::given(path(format!("/wiki/{}", title)))
        .respond_with(ResponseTemplate::new(200).set_body_string(article(links)))
        .mount(server)
        .await;
}

async fn mini_wiki(server: &MockServer) {
    mount(server, "India", &["Delhi", "Mumbai", "Asia", "Category:Countries"]).await;
    mount(server, "Delhi", &["India", "Asia"]).await;
    mount(server, "Mumbai", &["India", "Delhi"]).await;
    mount(server, "Asia", &["India"]).await;
}

fn base_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}/wiki/", server.uri())).unwrap()
}

#[tokio::test]
async fn test_validate_crawl_and_rank() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    mini_wiki(&server).await;
    let base = base_url(&server);

    assert!(Validator::new(base.clone(), 2).is_valid("India").await);
    assert!(!Validator::new(base.clone(), 2).is_valid("Atlantis").await);

    let dir = TempDir::new()?;
    let store = Arc::new(FileCheckpointStore::new(dir.path()));
    let config = CrawlerConfig::new("India", base)
        .with_page_limit(1000)
        .with_checkpointing(true);
    let engine = CrawlEngine::new(config.clone(), WikiFetcher::new(&config))
        .with_checkpoint_store(store.clone());

    let outcome = engine.crawl(|_| {}).await?;
    assert_eq!(outcome.adjacency.len(), 4);
    assert!(store.path_for(&CheckpointKey::new("India", 1000)).is_file());

    let ranking = ranker::rank(&outcome.adjacency, RankOptions { min_count: Some(1), top_k: 100 })?;
    let table: Vec<(&str, usize)> = ranking.table.iter().collect();
    assert_eq!(table, vec![("India", 3), ("Delhi", 2), ("Asia", 2)]);
    assert_eq!(ranking.subgraph.nodes, vec!["India", "Delhi", "Asia"]);
    assert_eq!(ranking.subgraph.edges.len(), 5);

    assert_eq!(
        ranker::rank(&outcome.adjacency, RankOptions { min_count: Some(3), top_k: 100 }),
        Err(RankError::EmptyGraph)
    );
    Ok(())
}

#[tokio::test]
async fn test_resume_after_failure_from_file_checkpoint() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let store = Arc::new(FileCheckpointStore::new(dir.path()));

    // first run: Asia is down
    let broken = MockServer::start().await;
    mount(&broken, "India", &["Delhi", "Mumbai", "Asia"]).await;
    mount(&broken, "Delhi", &["India", "Asia"]).await;
    mount(&broken, "Mumbai", &["India", "Delhi"]).await;
    Mock::given(path("/wiki/Asia"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&broken)
        .await;

    let config = CrawlerConfig::new("India", base_url(&broken))
        .with_page_limit(1000)
        .with_checkpointing(true)
        .with_checkpoint_interval(Duration::ZERO);
    let engine = CrawlEngine::new(config.clone(), WikiFetcher::new(&config))
        .with_checkpoint_store(store.clone());
    let err = engine.crawl(|_| {}).await.unwrap_err();
    assert!(matches!(err, CrawlError::Fetch { ref identifier, .. } if identifier == "Asia"));

    let key = CheckpointKey::new("India", 1000);
    let saved = store.load(&key).await?.expect("checkpoint after three pages");
    assert_eq!(saved.adjacency.len(), 3);

    // second run: only Asia is served, everything else comes from the checkpoint
    let healthy = MockServer::start().await;
    Mock::given(path("/wiki/Asia"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article(&["India"])))
        .expect(1)
        .mount(&healthy)
        .await;

    let config = CrawlerConfig::new("India", base_url(&healthy))
        .with_page_limit(1000)
        .with_checkpointing(true);
    let engine = CrawlEngine::new(config.clone(), WikiFetcher::new(&config))
        .with_checkpoint_store(store.clone());
    let outcome = engine.crawl(|_| {}).await?;

    let sources: Vec<&str> = outcome.adjacency.iter().map(|(source, _)| source).collect();
    assert_eq!(sources, vec!["India", "Delhi", "Mumbai", "Asia"]);
    assert_eq!(store.load(&key).await?.map(|s| s.frontier.len()), Some(0));
    Ok(())
}
