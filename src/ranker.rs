//! Ranks crawled articles by inbound references and reduces the crawl graph
//! to the most referenced articles.

use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Serialize, Serializer};
use std::collections::{HashMap, HashSet};

use crate::crawler::state::AdjacencyMap;
use crate::error::RankError;

pub const DEFAULT_TOP_K: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankOptions {
    /// Keep only counts strictly greater than this. `None` keeps every article.
    pub min_count: Option<usize>,
    pub top_k: usize,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            min_count: Some(0),
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl RankOptions {
    pub fn include_all(top_k: usize) -> Self {
        Self {
            min_count: None,
            top_k,
        }
    }
}

/// Articles with their inbound-reference counts, highest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankTable {
    entries: Vec<(String, usize)>,
}

impl RankTable {
    pub fn get(&self, identifier: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(node, _)| node == identifier)
            .map(|(_, count)| *count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries
            .iter()
            .map(|(node, count)| (node.as_str(), *count))
    }
}

impl Serialize for RankTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// The ranked articles and the crawl edges running between them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InducedSubgraph {
    pub nodes: Vec<String>,
    pub edges: Vec<(String, String)>,
}

impl InducedSubgraph {
    fn build(adjacency: &AdjacencyMap, table: &RankTable) -> Self {
        let node_set: HashSet<&str> = table.iter().map(|(node, _)| node).collect();
        let mut edges = Vec::new();

        for (node, _) in table.iter() {
            let Some(neighbors) = adjacency.get(node) else {
                continue;
            };
            for neighbor in neighbors {
                if node_set.contains(neighbor.as_str()) {
                    edges.push((node.to_string(), neighbor.clone()));
                }
            }
        }

        Self {
            nodes: table.iter().map(|(node, _)| node.to_string()).collect(),
            edges,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn to_digraph(&self) -> DiGraph<String, ()> {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        let mut index: HashMap<&str, NodeIndex> = HashMap::new();
        for node in &self.nodes {
            index.insert(node, graph.add_node(node.clone()));
        }
        for (from, to) in &self.edges {
            if let (Some(&a), Some(&b)) = (index.get(from.as_str()), index.get(to.as_str())) {
                graph.add_edge(a, b, ());
            }
        }
        graph
    }

    /// Graphviz rendering of the subgraph
    pub fn to_dot(&self) -> String {
        let graph = self.to_digraph();
        format!("{:?}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranking {
    pub table: RankTable,
    pub subgraph: InducedSubgraph,
}

/// Inbound-reference count of every article in the crawl, in discovery order.
///
/// Every expanded source is present (0 when nothing links to it); every link target
/// counts once per adjacency list it appears in, expanded or not.
pub fn inbound_counts(adjacency: &AdjacencyMap) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for (node, neighbors) in adjacency.iter() {
        if !index.contains_key(node) {
            index.insert(node, counts.len());
            counts.push((node.to_string(), 0));
        }
        for neighbor in neighbors {
            match index.get(neighbor.as_str()) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(neighbor, counts.len());
                    counts.push((neighbor.clone(), 1));
                }
            }
        }
    }

    counts
}

/// Filters, sorts (count descending, ties by discovery order) and truncates the
/// counts, then builds the subgraph induced by the survivors.
pub fn rank(adjacency: &AdjacencyMap, options: RankOptions) -> Result<Ranking, RankError> {
    let mut entries = inbound_counts(adjacency);
    if let Some(min_count) = options.min_count {
        entries.retain(|(_, count)| *count > min_count);
    }
    // sort_by is stable, which keeps discovery order among equal counts
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(options.top_k);

    let table = RankTable { entries };
    let subgraph = InducedSubgraph::build(adjacency, &table);
    if subgraph.is_empty() {
        return Err(RankError::EmptyGraph);
    }

    Ok(Ranking { table, subgraph })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjacency(entries: &[(&str, &[&str])]) -> AdjacencyMap {
        entries
            .iter()
            .map(|(source, links)| {
                (
                    source.to_string(),
                    links.iter().map(|l| l.to_string()).collect::<Vec<_>>(),
                )
            })
            .collect()
    }

    fn pairs(table: &RankTable) -> Vec<(&str, usize)> {
        table.iter().collect()
    }

    #[test]
    fn test_counts_include_isolated_sources() {
        let graph = adjacency(&[("A", &["B", "C"]), ("B", &["C"])]);
        let counts = inbound_counts(&graph);
        assert_eq!(
            counts,
            vec![("A".to_string(), 0), ("B".to_string(), 1), ("C".to_string(), 2)]
        );
    }

    #[test]
    fn test_unfiltered_rank_keeps_zero_counts() {
        let graph = adjacency(&[("A", &["B", "C"]), ("B", &["C"])]);
        let ranking = rank(&graph, RankOptions::include_all(100)).unwrap();
        assert_eq!(pairs(&ranking.table), vec![("C", 2), ("B", 1), ("A", 0)]);
        assert_eq!(ranking.table.get("A"), Some(0));
        assert_eq!(ranking.table.get("Z"), None);
    }

    #[test]
    fn test_top_k_truncates_after_sorting() {
        let graph = adjacency(&[("A", &["B", "C"]), ("B", &["C"])]);
        let ranking = rank(&graph, RankOptions { min_count: Some(0), top_k: 2 }).unwrap();
        assert_eq!(pairs(&ranking.table), vec![("C", 2), ("B", 1)]);
        assert_eq!(ranking.subgraph.nodes, vec!["C", "B"]);
        assert_eq!(ranking.subgraph.edges, vec![("B".to_string(), "C".to_string())]);
    }

    #[test]
    fn test_min_count_is_strict() {
        let graph = adjacency(&[("A", &["B", "C"]), ("B", &["C"])]);
        let ranking = rank(&graph, RankOptions { min_count: Some(1), top_k: 100 }).unwrap();
        assert_eq!(pairs(&ranking.table), vec![("C", 2)]);
    }

    #[test]
    fn test_ties_follow_discovery_order() {
        let graph = adjacency(&[("S", &["Q", "P", "R"]), ("Q", &["R"]), ("P", &["Q", "R"])]);
        let ranking = rank(&graph, RankOptions::default()).unwrap();
        assert_eq!(pairs(&ranking.table), vec![("R", 3), ("Q", 2), ("P", 1)]);

        let flat = adjacency(&[("S", &["Q", "P", "R"])]);
        let ranking = rank(&flat, RankOptions::default()).unwrap();
        assert_eq!(pairs(&ranking.table), vec![("Q", 1), ("P", 1), ("R", 1)]);
    }

    #[test]
    fn test_all_zero_counts_give_empty_graph() {
        let graph = adjacency(&[("A", &[]), ("B", &[])]);
        assert_eq!(rank(&graph, RankOptions::default()), Err(RankError::EmptyGraph));
        assert_eq!(rank(&AdjacencyMap::new(), RankOptions::include_all(100)), Err(RankError::EmptyGraph));
    }

    #[test]
    fn test_rank_is_idempotent() {
        let graph = adjacency(&[
            ("X", &["Y", "Z", "W"]),
            ("Y", &["X", "W"]),
            ("Z", &["W", "Y"]),
        ]);
        let first = rank(&graph, RankOptions::default()).unwrap();
        let second = rank(&graph, RankOptions::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_subgraph_only_keeps_edges_between_ranked_nodes() {
        let graph = adjacency(&[("X", &["Y", "Z"]), ("Y", &["X"]), ("Z", &[])]);
        let ranking = rank(&graph, RankOptions::default()).unwrap();
        assert_eq!(pairs(&ranking.table), vec![("X", 1), ("Y", 1), ("Z", 1)]);
        assert_eq!(
            ranking.subgraph.edges,
            vec![
                ("X".to_string(), "Y".to_string()),
                ("X".to_string(), "Z".to_string()),
                ("Y".to_string(), "X".to_string()),
            ]
        );

        let digraph = ranking.subgraph.to_digraph();
        assert_eq!(digraph.node_count(), 3);
        assert_eq!(digraph.edge_count(), 3);
    }

    #[test]
    fn test_unexpanded_targets_are_ranked() {
        let graph = adjacency(&[("A", &["B"]), ("C", &["B"])]);
        let ranking = rank(&graph, RankOptions::default()).unwrap();
        assert_eq!(pairs(&ranking.table), vec![("B", 2)]);
        assert!(ranking.subgraph.edges.is_empty());
    }

    #[test]
    fn test_dot_lists_ranked_nodes() {
        let graph = adjacency(&[("A", &["B"]), ("B", &["A"])]);
        let dot = rank(&graph, RankOptions::default()).unwrap().subgraph.to_dot();
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("->"));
    }

    #[test]
    fn test_rank_table_serializes_in_rank_order() {
        let graph = adjacency(&[("A", &["B", "C"]), ("B", &["C"])]);
        let ranking = rank(&graph, RankOptions::default()).unwrap();
        let json = serde_json::to_string(&ranking.table).unwrap();
        assert_eq!(json, r#"{"C":2,"B":1}"#);
    }
}
