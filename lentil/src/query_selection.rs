//! Query selection strategies.
//!
//! Every strategy owns a `CandidatePool` and implements `choose`; the
//! shared `select_query` handles the empty pool and removes the chosen
//! node. Revealed labels come back through `update_observation`.
//!
//! | strategy         | picks the candidate with            |
//! |------------------|-------------------------------------|
//! | random           | uniform draw                        |
//! | pagerank         | highest personalized pagerank       |
//! | entropy          | highest entropy of its own label    |
//! | prediction error | lowest expected residual entropy    |

use crate::common::*;
use crate::errors::RoundBudget;
use crate::inference::TreeInference;
use crate::observation::CandidatePool;
use crate::root_sampler::RootSamplerKind;
use crate::sample_pool::PoolOptions;
use crate::tree_stat::binary_entropy;
use graph_util::pagerank::{personalized_pagerank, PagerankOptions};
use rand::seq::IndexedRandom;

pub trait QueryGenerator {
    /// Pick the next query among the candidates (pool is non-empty)
    fn choose(&mut self) -> QueryResult<Node>;

    /// Fold a revealed label into the strategy's state
    fn update_observation(&mut self, node: Node, label: Label) -> QueryResult<()>;

    fn candidates(&self) -> &CandidatePool;

    fn candidates_mut(&mut self) -> &mut CandidatePool;

    fn name(&self) -> &'static str;

    /// Tree-sampling state, if the strategy keeps one
    fn inference(&self) -> Option<&TreeInference> {
        None
    }

    fn set_budget(&mut self, _budget: Option<RoundBudget>) {}

    /// Next node to query, removed from the candidate pool.
    ///
    /// `NoMoreQuery` once the pool is empty.
    fn select_query(&mut self) -> QueryResult<Node> {
        if self.candidates().is_empty() {
            return Err(QueryError::NoMoreQuery);
        }
        let q = self.choose()?;
        Ok(self.candidates_mut().take(q))
    }
}

/// First node attaining the maximum score
fn argmax_by(nodes: &[Node], score: impl Fn(usize) -> f64) -> Option<Node> {
    let mut best: Option<(Node, f64)> = None;
    for (i, &v) in nodes.iter().enumerate() {
        let s = score(i);
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((v, s));
        }
    }
    best.map(|(v, _)| v)
}

///////////////////////
// random            //
///////////////////////

pub struct RandomQueryGenerator {
    pool: CandidatePool,
    rng: SmallRng,
}

impl RandomQueryGenerator {
    pub fn new(n_nodes: usize, obs: &Observations, rng: SmallRng) -> Self {
        RandomQueryGenerator {
            pool: CandidatePool::new(n_nodes, obs),
            rng,
        }
    }
}

impl QueryGenerator for RandomQueryGenerator {
    fn choose(&mut self) -> QueryResult<Node> {
        self.pool.choose(&mut self.rng)
    }

    fn update_observation(&mut self, node: Node, _label: Label) -> QueryResult<()> {
        self.pool.remove(node);
        Ok(())
    }

    fn candidates(&self) -> &CandidatePool {
        &self.pool
    }

    fn candidates_mut(&mut self) -> &mut CandidatePool {
        &mut self.pool
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

///////////////////////
// pagerank          //
///////////////////////

/// Ranks candidates by pagerank personalized at the infected observations,
/// recomputed after every revealed label.
pub struct PagerankQueryGenerator {
    graph: CascadeGraph,
    obs: Observations,
    pool: CandidatePool,
    options: PagerankOptions,
    scores: Vec<f64>,
}

impl PagerankQueryGenerator {
    pub fn new(mut graph: CascadeGraph, obs: Observations, options: PagerankOptions) -> Self {
        for &v in obs.uninfected() {
            graph.isolate_node(v);
        }
        let pool = CandidatePool::new(graph.num_nodes(), &obs);
        let mut ret = PagerankQueryGenerator {
            graph,
            obs,
            pool,
            options,
            scores: vec![],
        };
        ret.rescore();
        ret
    }

    fn rescore(&mut self) {
        let infected = self.obs.sorted_infected();
        let seeds: Vec<(Node, f64)> = infected
            .iter()
            .map(|&v| (v, 1.0 / infected.len() as f64))
            .collect();
        self.scores = personalized_pagerank(&self.graph, &seeds, &self.options);
        for v in self.obs.infected().iter().chain(self.obs.uninfected().iter()) {
            self.scores[*v] = 0.0;
        }
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }
}

impl QueryGenerator for PagerankQueryGenerator {
    fn choose(&mut self) -> QueryResult<Node> {
        let cands = self.pool.to_vec();
        argmax_by(&cands, |i| self.scores[cands[i]]).ok_or(QueryError::NoMoreQuery)
    }

    fn update_observation(&mut self, node: Node, label: Label) -> QueryResult<()> {
        if !self.graph.contains(node) {
            return Err(QueryError::UnknownNode(node));
        }
        self.obs.observe(node, label);
        if !label.is_infected() {
            self.graph.isolate_node(node);
        }
        self.pool.remove(node);
        self.rescore();
        Ok(())
    }

    fn candidates(&self) -> &CandidatePool {
        &self.pool
    }

    fn candidates_mut(&mut self) -> &mut CandidatePool {
        &mut self.pool
    }

    fn name(&self) -> &'static str {
        "pagerank"
    }
}

///////////////////////
// entropy           //
///////////////////////

/// Queries the candidate whose own label is most uncertain.
pub struct EntropyQueryGenerator {
    inference: TreeInference,
    pool: CandidatePool,
}

impl EntropyQueryGenerator {
    pub fn new(inference: TreeInference) -> Self {
        let pool = CandidatePool::new(inference.graph().num_nodes(), inference.observations());
        EntropyQueryGenerator { inference, pool }
    }
}

impl QueryGenerator for EntropyQueryGenerator {
    fn choose(&mut self) -> QueryResult<Node> {
        let cands = self.pool.to_vec();
        let entropies = self.inference.statistics().node_entropies(&cands);
        argmax_by(&cands, |i| entropies[i]).ok_or(QueryError::NoMoreQuery)
    }

    fn update_observation(&mut self, node: Node, label: Label) -> QueryResult<()> {
        self.inference.observe(node, label)?;
        self.pool.remove(node);
        Ok(())
    }

    fn candidates(&self) -> &CandidatePool {
        &self.pool
    }

    fn candidates_mut(&mut self) -> &mut CandidatePool {
        &mut self.pool
    }

    fn name(&self) -> &'static str {
        "entropy"
    }

    fn inference(&self) -> Option<&TreeInference> {
        Some(&self.inference)
    }

    fn set_budget(&mut self, budget: Option<RoundBudget>) {
        self.inference.set_budget(budget);
    }
}

///////////////////////
// prediction error  //
///////////////////////

/// Options for the prediction-error strategy.
#[derive(Debug, Clone)]
pub struct PredictionErrorOptions {
    /// Skip candidates whose probability is already near 0 or 1. Default: true
    pub prune_nodes: bool,
    /// Pruning threshold on `min(p, 1 - p)`. Default: 0.05
    pub min_proba: f64,
    /// Cap on hidden nodes the score is evaluated against. Default: Some(100)
    pub n_node_samples: Option<usize>,
}

impl Default for PredictionErrorOptions {
    fn default() -> Self {
        PredictionErrorOptions {
            prune_nodes: true,
            min_proba: 0.05,
            n_node_samples: Some(100),
        }
    }
}

/// Queries the candidate expected to leave the least uncertainty over the
/// rest of the unobserved nodes.
pub struct PredictionErrorQueryGenerator {
    inference: TreeInference,
    pool: CandidatePool,
    options: PredictionErrorOptions,
    rng: SmallRng,
}

impl PredictionErrorQueryGenerator {
    pub fn new(inference: TreeInference, options: PredictionErrorOptions, rng: SmallRng) -> Self {
        let pool = CandidatePool::new(inference.graph().num_nodes(), inference.observations());
        PredictionErrorQueryGenerator {
            inference,
            pool,
            options,
            rng,
        }
    }

    /// Candidates whose probability is not yet near 0 or 1
    pub fn prune_candidates(&self) -> Vec<Node> {
        self.inference
            .statistics()
            .filter_out_extreme_targets(&self.pool.to_vec(), self.options.min_proba)
    }

    ///
    /// Hidden nodes to evaluate query scores against.
    ///
    /// All unobserved nodes if they fit under `n_node_samples`; otherwise
    /// exactly `n_node_samples` of them, drawn without replacement with
    /// weight favouring probabilities near 1/2.
    ///
    pub fn sample_nodes_for_estimation(&mut self) -> QueryResult<Vec<Node>> {
        let hidden = self.pool.to_vec();
        let cap = match self.options.n_node_samples {
            Some(cap) if cap < hidden.len() => cap,
            _ => return Ok(hidden),
        };

        let probas = self.inference.statistics().unconditional_proba(&hidden);
        let weighted: Vec<(Node, f64)> = hidden
            .into_iter()
            .zip(probas)
            .map(|(v, p)| (v, binary_entropy(p) + 1e-6))
            .collect();

        let mut chosen: Vec<Node> = weighted
            .choose_multiple_weighted(&mut self.rng, cap, |&(_, w)| w)
            .map_err(|_| QueryError::DegenerateDistribution)?
            .map(|&(v, _)| v)
            .collect();
        chosen.sort_unstable();
        Ok(chosen)
    }
}

impl QueryGenerator for PredictionErrorQueryGenerator {
    fn choose(&mut self) -> QueryResult<Node> {
        let mut cands = self.pool.to_vec();
        if self.options.prune_nodes {
            let pruned = self.prune_candidates();
            if !pruned.is_empty() {
                cands = pruned;
            }
        }
        let hidden = self.sample_nodes_for_estimation()?;

        let stat = self.inference.statistics();
        let neg_scores: Vec<f64> = cands.iter().map(|&q| -stat.query_score(q, &hidden)).collect();
        argmax_by(&cands, |i| neg_scores[i]).ok_or(QueryError::NoMoreQuery)
    }

    fn update_observation(&mut self, node: Node, label: Label) -> QueryResult<()> {
        self.inference.observe(node, label)?;
        self.pool.remove(node);
        Ok(())
    }

    fn candidates(&self) -> &CandidatePool {
        &self.pool
    }

    fn candidates_mut(&mut self) -> &mut CandidatePool {
        &mut self.pool
    }

    fn name(&self) -> &'static str {
        "prediction-error"
    }

    fn inference(&self) -> Option<&TreeInference> {
        Some(&self.inference)
    }

    fn set_budget(&mut self, budget: Option<RoundBudget>) {
        self.inference.set_budget(budget);
    }
}

///////////////////////
// construction      //
///////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum QueryMethod {
    Random,
    Pagerank,
    Entropy,
    #[default]
    PredictionError,
}

impl QueryMethod {
    /// Strategies that keep their own tree samples
    pub fn samples_trees(self) -> bool {
        matches!(self, QueryMethod::Entropy | QueryMethod::PredictionError)
    }
}

/// Everything needed to build a query generator for one cascade.
#[derive(Debug, Clone, Default)]
pub struct GeneratorConfig {
    pub method: QueryMethod,
    pub pool: PoolOptions,
    pub root: RootSamplerKind,
    pub prediction_error: PredictionErrorOptions,
    pub pagerank: PagerankOptions,
}

///
/// Build the configured strategy for one cascade.
///
/// * `graph` - this worker's own copy of the graph
/// * `obs` - initial observations
/// * `true_root` - ground-truth source, for `RootSamplerKind::TrueRoot`
/// * `seed` - seed for every random draw the strategy makes
///
pub fn build_query_generator(
    config: &GeneratorConfig,
    graph: CascadeGraph,
    obs: Observations,
    true_root: Option<Node>,
    seed: u64,
) -> QueryResult<Box<dyn QueryGenerator + Send>> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let ret: Box<dyn QueryGenerator + Send> = match config.method {
        QueryMethod::Random => Box::new(RandomQueryGenerator::new(graph.num_nodes(), &obs, rng)),
        QueryMethod::Pagerank => Box::new(PagerankQueryGenerator::new(
            graph,
            obs,
            config.pagerank.clone(),
        )),
        QueryMethod::Entropy => {
            let inference = TreeInference::new(
                graph,
                obs,
                config.root.clone(),
                true_root,
                config.pool.clone(),
                rng,
            )?;
            Box::new(EntropyQueryGenerator::new(inference))
        }
        QueryMethod::PredictionError => {
            let pe_rng = SmallRng::seed_from_u64(rng.random());
            let inference = TreeInference::new(
                graph,
                obs,
                config.root.clone(),
                true_root,
                config.pool.clone(),
                rng,
            )?;
            Box::new(PredictionErrorQueryGenerator::new(
                inference,
                config.prediction_error.clone(),
                pe_rng,
            ))
        }
    };
    Ok(ret)
}
