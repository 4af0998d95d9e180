//! Undirected, optionally weighted graph with a per-node visibility mask.
//!
//! Isolating a node hides it from every traversal (neighbour iteration,
//! random walks, pagerank) without renumbering the remaining nodes, so
//! node ids stay stable for the lifetime of a cascade run.

use crate::common_io::{parse_word, read_lines_of_words};
use fnv::FnvHashMap as HashMap;
use log::info;
use petgraph::graph::NodeIndex;
use petgraph::prelude::UnGraph;
use petgraph::visit::EdgeRef;

/// A weighted edge (i, j, weight)
pub type WeightedEdge = (usize, usize, f64);

#[derive(Debug, Clone)]
pub struct CascadeGraph {
    /// node `v` is `NodeIndex::new(v)`; edge weights are positive
    graph: UnGraph<(), f64>,
    /// `visible[v]` is false once `v` has been isolated
    visible: Vec<bool>,
    num_visible: usize,
}

impl CascadeGraph {
    /// Build an unweighted graph (every edge has weight 1).
    ///
    /// * `edges` - undirected edge list; provide each edge once
    /// * `n_nodes` - number of nodes; ids must be in `0..n_nodes`
    pub fn from_edges(edges: &[(usize, usize)], n_nodes: usize) -> Self {
        let weighted: Vec<WeightedEdge> = edges.iter().map(|&(i, j)| (i, j, 1.0)).collect();
        Self::from_weighted_edges(&weighted, n_nodes)
    }

    /// Build a weighted graph.
    ///
    /// Self-loops and non-positive weights are dropped. Repeated edges are
    /// merged by adding up their weights.
    pub fn from_weighted_edges(edges: &[WeightedEdge], n_nodes: usize) -> Self {
        let mut merged: HashMap<(usize, usize), f64> = HashMap::default();
        for &(i, j, w) in edges {
            assert!(
                i < n_nodes && j < n_nodes,
                "edge ({}, {}) out of range for {} nodes",
                i,
                j,
                n_nodes
            );
            if i == j || w <= 0.0 {
                continue;
            }
            *merged.entry((i.min(j), i.max(j))).or_insert(0.0) += w;
        }

        let mut pairs: Vec<_> = merged.into_iter().collect();
        pairs.sort_by_key(|&(key, _)| key);

        let mut graph = UnGraph::<(), f64>::with_capacity(n_nodes, pairs.len());
        for _ in 0..n_nodes {
            graph.add_node(());
        }
        for ((i, j), w) in pairs {
            graph.add_edge(NodeIndex::new(i), NodeIndex::new(j), w);
        }

        CascadeGraph {
            graph,
            visible: vec![true; n_nodes],
            num_visible: n_nodes,
        }
    }

    /// Read an edge list: `u v [w]` per line, `#` for comments.
    ///
    /// The number of nodes is one past the largest id mentioned.
    pub fn from_edge_list_file(edge_file: &str) -> anyhow::Result<Self> {
        let lines = read_lines_of_words(edge_file)?;
        let mut edges = Vec::with_capacity(lines.len());
        let mut n_nodes = 0;

        for words in lines.iter() {
            if words.len() < 2 {
                return Err(anyhow::anyhow!(
                    "expected `u v [w]`, found: {}",
                    words.join(" ")
                ));
            }
            let i: usize = parse_word(&words[0])?;
            let j: usize = parse_word(&words[1])?;
            let w: f64 = match words.get(2) {
                Some(x) => parse_word(x)?,
                None => 1.0,
            };
            n_nodes = n_nodes.max(i + 1).max(j + 1);
            edges.push((i, j, w));
        }

        let graph = Self::from_weighted_edges(&edges, n_nodes);
        info!(
            "read {} nodes and {} edges from {}",
            graph.num_nodes(),
            graph.num_edges(),
            edge_file
        );
        Ok(graph)
    }

    /// Number of nodes, isolated ones included
    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of nodes that have not been isolated
    pub fn num_visible(&self) -> usize {
        self.num_visible
    }

    /// Number of edges between visible nodes
    pub fn num_edges(&self) -> usize {
        self.graph
            .edge_references()
            .filter(|e| self.visible[e.source().index()] && self.visible[e.target().index()])
            .count()
    }

    pub fn contains(&self, v: usize) -> bool {
        v < self.num_nodes()
    }

    pub fn is_visible(&self, v: usize) -> bool {
        self.visible.get(v).copied().unwrap_or(false)
    }

    pub fn visible_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.num_nodes()).filter(move |&v| self.visible[v])
    }

    /// Visible neighbours of `v` with edge weights; empty if `v` is isolated.
    pub fn neighbors(&self, v: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let visible = self.is_visible(v);
        self.graph
            .edges(NodeIndex::new(v))
            .filter(move |_| visible)
            .map(move |e| {
                let u = if e.source().index() == v {
                    e.target()
                } else {
                    e.source()
                };
                (u.index(), *e.weight())
            })
            .filter(move |&(u, _)| self.visible[u])
    }

    /// Sum of edge weights to visible neighbours
    pub fn weighted_degree(&self, v: usize) -> f64 {
        self.neighbors(v).map(|(_, w)| w).sum()
    }

    pub fn degree(&self, v: usize) -> usize {
        self.neighbors(v).count()
    }

    /// Full topology, isolated nodes and their edges included
    pub fn topology(&self) -> &UnGraph<(), f64> {
        &self.graph
    }

    /// Hide `v` and all of its edges. Isolating twice is a no-op.
    pub fn isolate_node(&mut self, v: usize) {
        if self.is_visible(v) {
            self.visible[v] = false;
            self.num_visible -= 1;
        }
    }

    /// Undo `isolate_node`
    pub fn restore_node(&mut self, v: usize) {
        if self.contains(v) && !self.visible[v] {
            self.visible[v] = true;
            self.num_visible += 1;
        }
    }
}
