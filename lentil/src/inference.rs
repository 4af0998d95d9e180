//! Tree-sampling inference for one cascade.
//!
//! Owns this worker's graph view, the observations, the sample pool and
//! the statistics, and keeps all four in step: a new label is recorded,
//! an uninfected node is isolated, the root distribution is rebuilt, the
//! contradicted samples are redrawn and exactly their rows are patched.

use crate::common::*;
use crate::errors::RoundBudget;
use crate::root_sampler::{RootSampler, RootSamplerKind};
use crate::sample_pool::{PoolOptions, TreeSamplePool};
use crate::tree_stat::TreeBasedStatistics;

pub struct TreeInference {
    graph: CascadeGraph,
    obs: Observations,
    root_kind: RootSamplerKind,
    true_root: Option<Node>,
    pool: TreeSamplePool,
    stat: TreeBasedStatistics,
    rng: SmallRng,
}

impl TreeInference {
    ///
    /// Fill the pool and build the statistics for the initial observations.
    ///
    /// * `graph` - this worker's own copy of the graph
    /// * `obs` - initial observations; uninfected ones get isolated
    /// * `root_kind` - root sampling policy
    /// * `true_root` - ground-truth source for `RootSamplerKind::TrueRoot`
    /// * `pool_options` - sample pool size and method
    /// * `rng` - source of randomness for every draw
    ///
    pub fn new(
        mut graph: CascadeGraph,
        obs: Observations,
        root_kind: RootSamplerKind,
        true_root: Option<Node>,
        pool_options: PoolOptions,
        mut rng: SmallRng,
    ) -> QueryResult<Self> {
        for v in obs.infected().iter().chain(obs.uninfected().iter()) {
            if !graph.contains(*v) {
                return Err(QueryError::UnknownNode(*v));
            }
        }
        for &v in obs.uninfected() {
            graph.isolate_node(v);
        }

        let root_sampler = RootSampler::build(&root_kind, &graph, &obs, true_root)?;
        let mut pool = TreeSamplePool::new(pool_options);
        pool.fill(&graph, &obs, &root_sampler, &mut rng)?;
        let stat = TreeBasedStatistics::build_matrix(graph.num_nodes(), pool.samples());

        Ok(TreeInference {
            graph,
            obs,
            root_kind,
            true_root,
            pool,
            stat,
            rng,
        })
    }

    ///
    /// Fold a revealed label into the pool and the statistics.
    ///
    /// Returns the number of samples that had to be redrawn. Observing a
    /// node a second time with the same label changes nothing. On error
    /// the label is not recorded and the graph is left as it was.
    ///
    pub fn observe(&mut self, node: Node, label: Label) -> QueryResult<usize> {
        if !self.graph.contains(node) {
            return Err(QueryError::UnknownNode(node));
        }
        if self.obs.label(node) == Some(label) {
            return Ok(0);
        }

        let mut obs = self.obs.clone();
        obs.observe(node, label);
        let isolated = !label.is_infected() && self.graph.is_visible(node);
        if isolated {
            self.graph.isolate_node(node);
        }

        let changed = RootSampler::build(&self.root_kind, &self.graph, &obs, self.true_root)
            .and_then(|root_sampler| {
                self.pool.update_samples(
                    &self.graph,
                    &obs,
                    &root_sampler,
                    node,
                    label,
                    &mut self.rng,
                )
            });

        let changed = match changed {
            Ok(changed) => changed,
            Err(e) => {
                if isolated {
                    self.graph.restore_node(node);
                }
                return Err(e);
            }
        };

        self.obs = obs;
        self.stat.update_trees(&changed, node, label);
        Ok(changed.len())
    }

    pub fn set_budget(&mut self, budget: Option<RoundBudget>) {
        self.pool.set_budget(budget);
    }

    /// Infection probability of every node
    pub fn infection_probabilities(&self) -> Vec<f64> {
        self.stat.infection_probabilities()
    }

    pub fn graph(&self) -> &CascadeGraph {
        &self.graph
    }

    pub fn observations(&self) -> &Observations {
        &self.obs
    }

    pub fn pool(&self) -> &TreeSamplePool {
        &self.pool
    }

    pub fn statistics(&self) -> &TreeBasedStatistics {
        &self.stat
    }
}
