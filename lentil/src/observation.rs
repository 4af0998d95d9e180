//! Observation bookkeeping shared by samplers and query generators.

use crate::errors::{QueryError, QueryResult};
use fnv::FnvHashSet as HashSet;
use rand::seq::IteratorRandom;
use rand::Rng;
use std::collections::BTreeSet;

type Node = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Infected,
    Uninfected,
}

impl Label {
    pub fn from_infected(infected: bool) -> Self {
        if infected {
            Label::Infected
        } else {
            Label::Uninfected
        }
    }

    pub fn is_infected(self) -> bool {
        self == Label::Infected
    }
}

/// Disjoint, grow-only sets of confirmed infected and uninfected nodes.
#[derive(Debug, Clone, Default)]
pub struct Observations {
    infected: HashSet<Node>,
    uninfected: HashSet<Node>,
}

impl Observations {
    pub fn new(infected: impl IntoIterator<Item = Node>) -> Self {
        Observations {
            infected: infected.into_iter().collect(),
            uninfected: HashSet::default(),
        }
    }

    /// Record a revealed label.
    ///
    /// Panics if `node` was already observed with the opposite label.
    pub fn observe(&mut self, node: Node, label: Label) {
        let (add, other) = match label {
            Label::Infected => (&mut self.infected, &self.uninfected),
            Label::Uninfected => (&mut self.uninfected, &self.infected),
        };
        assert!(
            !other.contains(&node),
            "node {} observed with conflicting labels",
            node
        );
        add.insert(node);
    }

    pub fn infected(&self) -> &HashSet<Node> {
        &self.infected
    }

    pub fn uninfected(&self) -> &HashSet<Node> {
        &self.uninfected
    }

    /// Infected observations in ascending order
    pub fn sorted_infected(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self.infected.iter().copied().collect();
        nodes.sort_unstable();
        nodes
    }

    pub fn is_observed(&self, node: Node) -> bool {
        self.infected.contains(&node) || self.uninfected.contains(&node)
    }

    pub fn label(&self, node: Node) -> Option<Label> {
        if self.infected.contains(&node) {
            Some(Label::Infected)
        } else if self.uninfected.contains(&node) {
            Some(Label::Uninfected)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.infected.len() + self.uninfected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `infected ⊆ tree` and `tree ∩ uninfected = ∅`
    pub fn is_consistent(&self, tree: &HashSet<Node>) -> bool {
        self.infected.iter().all(|v| tree.contains(v))
            && !self.uninfected.iter().any(|v| tree.contains(v))
    }
}

/// Ground truth for one cascade instance.
#[derive(Debug, Clone)]
pub struct Cascade {
    /// infection time per node; negative means never infected
    times: Vec<i64>,
    /// nodes whose label is known before any query
    observed: Vec<Node>,
    source: Option<Node>,
}

impl Cascade {
    pub fn new(times: Vec<i64>, observed: Vec<Node>) -> Self {
        Cascade {
            times,
            observed,
            source: None,
        }
    }

    pub fn with_source(mut self, source: Node) -> Self {
        self.source = Some(source);
        self
    }

    pub fn n_nodes(&self) -> usize {
        self.times.len()
    }

    pub fn times(&self) -> &[i64] {
        &self.times
    }

    pub fn label(&self, node: Node) -> QueryResult<Label> {
        self.times
            .get(node)
            .map(|&t| Label::from_infected(t >= 0))
            .ok_or(QueryError::UnknownNode(node))
    }

    pub fn infected_nodes(&self) -> Vec<Node> {
        (0..self.times.len()).filter(|&v| self.times[v] >= 0).collect()
    }

    pub fn observed(&self) -> &[Node] {
        &self.observed
    }

    /// The explicit source, else the earliest infected node
    pub fn source(&self) -> Option<Node> {
        self.source.or_else(|| {
            (0..self.times.len())
                .filter(|&v| self.times[v] >= 0)
                .min_by_key(|&v| self.times[v])
        })
    }

    /// Initial observation set from the pre-observed nodes
    pub fn initial_observations(&self) -> QueryResult<Observations> {
        let mut obs = Observations::default();
        for &v in self.observed.iter() {
            obs.observe(v, self.label(v)?);
        }
        Ok(obs)
    }
}

/// Nodes neither observed nor already queried.
///
/// Observed nodes leave the pool as soon as their label is revealed.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    nodes: BTreeSet<Node>,
}

impl CandidatePool {
    /// Every node in `0..n_nodes` that is not yet observed
    pub fn new(n_nodes: usize, obs: &Observations) -> Self {
        CandidatePool {
            nodes: (0..n_nodes).filter(|&v| !obs.is_observed(v)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: Node) -> bool {
        self.nodes.contains(&node)
    }

    /// Candidates in ascending order
    pub fn iter(&self) -> impl Iterator<Item = Node> + '_ {
        self.nodes.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<Node> {
        self.iter().collect()
    }

    /// Returns whether `node` was a candidate
    pub fn remove(&mut self, node: Node) -> bool {
        self.nodes.remove(&node)
    }

    /// Take a selected node out of the pool.
    ///
    /// Panics if a strategy selected something outside the pool.
    pub fn take(&mut self, node: Node) -> Node {
        assert!(
            self.nodes.remove(&node),
            "selected node {} is not a candidate",
            node
        );
        node
    }

    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> QueryResult<Node> {
        self.iter()
            .choose(rng)
            .ok_or(QueryError::NoMoreQuery)
    }
}
