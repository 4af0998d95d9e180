//! A fixed-size population of tree samples consistent with the observations.
//!
//! Each sample is the node set of a random tree rooted at a draw from the
//! root sampler and spanning every infected observation. Observed
//! uninfected nodes are isolated in the graph, so no walk can enter them.
//!
//! When a new label arrives only the samples it contradicts are redrawn;
//! every other slot is left untouched. The number of contradicted samples
//! shrinks as the observations pile up, so later rounds get cheaper.

use crate::common::*;
use crate::errors::RoundBudget;
use crate::root_sampler::RootSampler;
use graph_util::spanning_tree::{generate_random_spanning_tree, loop_erased_steiner_tree};
use graph_util::traversal::{bfs_predecessors, extract_steiner_tree};

/// Node set of one sampled tree
pub type TreeSample = HashSet<Node>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SamplingMethod {
    /// Loop-erased random walks from each terminal to the tree
    #[default]
    LoopErased,
    /// Full random spanning tree, then the sub-tree over the terminals
    SpanningTree,
}

/// Options for the tree sample pool.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Number of tree samples N. Default: 100
    pub n_samples: usize,
    /// How one tree is drawn. Default: loop-erased
    pub method: SamplingMethod,
    /// Draws attempted per slot before giving up. Default: 100
    pub max_retries: usize,
}

impl Default for PoolOptions {
    fn default() -> Self {
        PoolOptions {
            n_samples: 100,
            method: SamplingMethod::LoopErased,
            max_retries: 100,
        }
    }
}

pub struct TreeSamplePool {
    options: PoolOptions,
    samples: Vec<TreeSample>,
    budget: Option<RoundBudget>,
}

impl TreeSamplePool {
    pub fn new(options: PoolOptions) -> Self {
        assert!(options.n_samples > 0, "need at least one tree sample");
        TreeSamplePool {
            options,
            samples: vec![],
            budget: None,
        }
    }

    pub fn samples(&self) -> &[TreeSample] {
        &self.samples
    }

    pub fn n_samples(&self) -> usize {
        self.options.n_samples
    }

    pub fn options(&self) -> &PoolOptions {
        &self.options
    }

    /// Bound the wall-clock time spent in the current round
    pub fn set_budget(&mut self, budget: Option<RoundBudget>) {
        self.budget = budget;
    }

    ///
    /// Draw all N samples from scratch.
    ///
    /// * `graph` - graph with observed-uninfected nodes isolated
    /// * `obs` - current observations
    /// * `root_sampler` - root distribution for `obs`
    ///
    pub fn fill<R: Rng + ?Sized>(
        &mut self,
        graph: &CascadeGraph,
        obs: &Observations,
        root_sampler: &RootSampler,
        rng: &mut R,
    ) -> QueryResult<()> {
        let samples = (0..self.options.n_samples)
            .map(|_| self.draw_consistent(graph, obs, root_sampler, None, rng))
            .collect::<QueryResult<Vec<_>>>()?;
        self.samples = samples;

        info!(
            "filled {} tree samples ({:?}), mean size {:.1}",
            self.samples.len(),
            self.options.method,
            self.samples.iter().map(|t| t.len()).sum::<usize>() as f64
                / self.samples.len() as f64
        );
        Ok(())
    }

    ///
    /// Replace exactly the samples contradicted by a new label.
    ///
    /// `obs` must already contain `(node, label)`. Returns the
    /// `(slot, new sample)` pairs that changed; every other slot is left
    /// as it was. On error no slot is modified.
    ///
    pub fn update_samples<R: Rng + ?Sized>(
        &mut self,
        graph: &CascadeGraph,
        obs: &Observations,
        root_sampler: &RootSampler,
        node: Node,
        label: Label,
        rng: &mut R,
    ) -> QueryResult<Vec<(usize, TreeSample)>> {
        assert_eq!(
            obs.label(node),
            Some(label),
            "observations must include the new label before updating samples"
        );

        let invalid: Vec<usize> = self
            .samples
            .iter()
            .enumerate()
            .filter(|(_, t)| t.contains(&node) != label.is_infected())
            .map(|(j, _)| j)
            .collect();

        let mut changed = Vec::with_capacity(invalid.len());
        for j in invalid {
            let tree = self.draw_consistent(graph, obs, root_sampler, Some(node), rng)?;
            changed.push((j, tree));
        }

        for (j, tree) in changed.iter() {
            self.samples[*j] = tree.clone();
        }

        debug!(
            "node {} labeled {:?}: replaced {} of {} samples",
            node,
            label,
            changed.len(),
            self.samples.len()
        );
        Ok(changed)
    }

    /// Panics if any sample violates the observations
    pub fn assert_consistent(&self, obs: &Observations) {
        for (j, t) in self.samples.iter().enumerate() {
            assert!(
                obs.is_consistent(t),
                "tree sample {} is inconsistent with the observations",
                j
            );
        }
    }

    fn draw_consistent<R: Rng + ?Sized>(
        &self,
        graph: &CascadeGraph,
        obs: &Observations,
        root_sampler: &RootSampler,
        node: Option<Node>,
        rng: &mut R,
    ) -> QueryResult<TreeSample> {
        let attempts = self.options.max_retries.max(1);
        for _ in 0..attempts {
            if let Some(budget) = &self.budget {
                budget.check()?;
            }
            if let Some(tree) = self.draw_one(graph, obs, root_sampler, rng) {
                if obs.is_consistent(&tree) {
                    return Ok(tree);
                }
            }
        }
        Err(QueryError::SamplingExhausted { node, attempts })
    }

    fn draw_one<R: Rng + ?Sized>(
        &self,
        graph: &CascadeGraph,
        obs: &Observations,
        root_sampler: &RootSampler,
        rng: &mut R,
    ) -> Option<TreeSample> {
        let root = root_sampler.sample(rng);
        let terminals = obs.sorted_infected();

        let nodes = match self.options.method {
            SamplingMethod::LoopErased => loop_erased_steiner_tree(graph, root, &terminals, rng)?,
            SamplingMethod::SpanningTree => {
                let edges = generate_random_spanning_tree(graph, root, rng)?;
                let pred = bfs_predecessors(&edges, root);
                extract_steiner_tree(&pred, root, &terminals)?
            }
        };
        Some(nodes.into_iter().collect())
    }
}
