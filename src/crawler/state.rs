use serde::{Serialize, Serializer};
use std::collections::{HashMap, HashSet, VecDeque};

/// Outbound links per article, kept in the order the sources were expanded.
/// An entry is written once and never replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyMap {
    order: Vec<String>,
    links: HashMap<String, Vec<String>>,
}

impl AdjacencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `links` for `source` unless it already has an entry.
    /// Returns false when an entry was already present.
    pub fn insert(&mut self, source: String, links: Vec<String>) -> bool {
        if self.links.contains_key(&source) {
            return false;
        }
        self.order.push(source.clone());
        self.links.insert(source, links);
        true
    }

    pub fn get(&self, source: &str) -> Option<&[String]> {
        self.links.get(source).map(Vec::as_slice)
    }

    pub fn contains(&self, source: &str) -> bool {
        self.links.contains_key(source)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in expansion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.order
            .iter()
            .map(|source| (source.as_str(), self.links[source].as_slice()))
    }
}

impl FromIterator<(String, Vec<String>)> for AdjacencyMap {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        let mut map = AdjacencyMap::new();
        for (source, links) in iter {
            map.insert(source, links);
        }
        map
    }
}

/// Serializes as a JSON object `{source: [links]}` in expansion order
impl Serialize for AdjacencyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Everything needed to resume a crawl: expanded pages, every article ever queued,
/// and the articles still waiting to be expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlState {
    pub adjacency: AdjacencyMap,
    pub visited: HashSet<String>,
    pub frontier: VecDeque<String>,
}

impl CrawlState {
    pub fn new(seed: &str) -> Self {
        let mut frontier = VecDeque::new();
        frontier.push_back(seed.to_string());

        Self {
            adjacency: AdjacencyMap::new(),
            visited: HashSet::from([seed.to_string()]),
            frontier,
        }
    }

    /// Queues `identifier` if it was never seen. Visited and frontier change together.
    pub fn enqueue(&mut self, identifier: &str) -> bool {
        if self.visited.contains(identifier) {
            return false;
        }
        self.visited.insert(identifier.to_string());
        self.frontier.push_back(identifier.to_string());
        true
    }

    /// Queues every not yet seen link of the expanded article `source`
    pub fn enqueue_links_of(&mut self, source: &str) -> usize {
        let Self {
            adjacency,
            visited,
            frontier,
        } = self;

        let mut added = 0;
        for link in adjacency.get(source).unwrap_or_default() {
            if visited.insert(link.clone()) {
                frontier.push_back(link.clone());
                added += 1;
            }
        }
        added
    }

    /// `min(|visited| / page_limit, 1.0)`
    pub fn progress(&self, page_limit: usize) -> f64 {
        if page_limit == 0 {
            return 1.0;
        }
        (self.visited.len() as f64 / page_limit as f64).min(1.0)
    }
}
