//! Persistence of crawl state between runs.
//!
//! A checkpoint is keyed by seed article and page limit; two limits for the same
//! seed are two unrelated crawls. State is stored as a versioned JSON record.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use url::form_urlencoded;

use crate::crawler::state::{AdjacencyMap, CrawlState};
use crate::error::CheckpointError;

pub const CHECKPOINT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CheckpointKey {
    pub seed: String,
    pub page_limit: usize,
}

impl CheckpointKey {
    pub fn new(seed: impl Into<String>, page_limit: usize) -> Self {
        Self {
            seed: seed.into(),
            page_limit,
        }
    }
}

impl fmt::Display for CheckpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.seed, self.page_limit)
    }
}

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// `Ok(None)` when nothing was saved under `key`
    async fn load(&self, key: &CheckpointKey) -> Result<Option<CrawlState>, CheckpointError>;

    /// Replaces the checkpoint for `key`. A failed save leaves the previous one readable.
    async fn save(&self, key: &CheckpointKey, state: &CrawlState) -> Result<(), CheckpointError>;

    /// Removing a missing checkpoint is not an error
    async fn remove(&self, key: &CheckpointKey) -> Result<(), CheckpointError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct AdjacencyEntry {
    source: String,
    links: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointRecord {
    version: u32,
    seed: String,
    page_limit: usize,
    adjacency: Vec<AdjacencyEntry>,
    visited: Vec<String>,
    frontier: Vec<String>,
}

impl CheckpointRecord {
    fn from_state(key: &CheckpointKey, state: &CrawlState) -> Self {
        let mut visited: Vec<String> = state.visited.iter().cloned().collect();
        visited.sort();

        Self {
            version: CHECKPOINT_VERSION,
            seed: key.seed.clone(),
            page_limit: key.page_limit,
            adjacency: state
                .adjacency
                .iter()
                .map(|(source, links)| AdjacencyEntry {
                    source: source.to_string(),
                    links: links.to_vec(),
                })
                .collect(),
            visited,
            frontier: state.frontier.iter().cloned().collect(),
        }
    }

    fn into_state(self, key: &CheckpointKey) -> Result<CrawlState, CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion(self.version));
        }
        if self.seed != key.seed || self.page_limit != key.page_limit {
            return Err(CheckpointError::KeyMismatch {
                seed: self.seed,
                page_limit: self.page_limit,
            });
        }


        let visited: HashSet<String> = self.visited.into_iter().collect();

        let mut queued = HashSet::new();
        for identifier in &self.frontier {
            if !visited.contains(identifier) {
                return Err(CheckpointError::Inconsistent(format!(
                    "queued article {identifier:?} was never visited"
                )));
            }
            if !queued.insert(identifier.as_str()) {
                return Err(CheckpointError::Inconsistent(format!(
                    "article {identifier:?} is queued twice"
                )));
            }
        }

        let mut adjacency = AdjacencyMap::new();
        for entry in self.adjacency {
            if !visited.contains(&entry.source) {
                return Err(CheckpointError::Inconsistent(format!(
                    "expanded article {:?} was never visited",
                    entry.source
                )));
            }
            let source = entry.source.clone();
            if !adjacency.insert(entry.source, entry.links) {
                return Err(CheckpointError::Inconsistent(format!(
                    "article {source:?} is expanded twice"
                )));
            }
        }

        Ok(CrawlState {
            adjacency,
            visited,
            frontier: self.frontier.into_iter().collect::<VecDeque<_>>(),
        })
    }
}

pub fn encode_state(key: &CheckpointKey, state: &CrawlState) -> Result<Vec<u8>, CheckpointError> {
    Ok(serde_json::to_vec(&CheckpointRecord::from_state(key, state))?)
}

pub fn decode_state(key: &CheckpointKey, bytes: &[u8]) -> Result<CrawlState, CheckpointError> {
    let record: CheckpointRecord = serde_json::from_slice(bytes)?;
    record.into_state(key)
}

/// Stores checkpoints as `<root>/<seed>/state_<page_limit>.json`
pub struct FileCheckpointStore {
    root: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding everything saved for `seed`. The seed is URL-encoded
    /// so titles containing `/` stay one path component, and `.`/`..` never
    /// name the root or its parent.
    pub fn seed_dir(&self, seed: &str) -> PathBuf {
        let mut encoded: String = form_urlencoded::byte_serialize(seed.as_bytes()).collect();
        if encoded == "." || encoded == ".." {
            encoded = encoded.replace('.', "%2E");
        }
        self.root.join(encoded)
    }

    pub fn path_for(&self, key: &CheckpointKey) -> PathBuf {
        self.seed_dir(&key.seed)
            .join(format!("state_{}.json", key.page_limit))
    }
}

async fn write_replacing(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    let mut file = fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(&tmp, path).await
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn load(&self, key: &CheckpointKey) -> Result<Option<CrawlState>, CheckpointError> {
        match fs::read(self.path_for(key)).await {
            Ok(bytes) => decode_state(key, &bytes).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, key: &CheckpointKey, state: &CrawlState) -> Result<(), CheckpointError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let bytes = encode_state(key, state)?;
        write_replacing(&path, &bytes).await?;
        Ok(())
    }

    async fn remove(&self, key: &CheckpointKey) -> Result<(), CheckpointError> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps encoded checkpoints in memory, for embedding and tests
#[derive(Default)]
pub struct MemoryCheckpointStore {
    blobs: Mutex<HashMap<CheckpointKey, Vec<u8>>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.lock().await.len()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn load(&self, key: &CheckpointKey) -> Result<Option<CrawlState>, CheckpointError> {
        match self.blobs.lock().await.get(key) {
            Some(bytes) => decode_state(key, bytes).map(Some),
            None => Ok(None),
        }
    }

    async fn save(&self, key: &CheckpointKey, state: &CrawlState) -> Result<(), CheckpointError> {
        let bytes = encode_state(key, state)?;
        self.blobs.lock().await.insert(key.clone(), bytes);
        Ok(())
    }

    async fn remove(&self, key: &CheckpointKey) -> Result<(), CheckpointError> {
        self.blobs.lock().await.remove(key);
        Ok(())
    }
}
