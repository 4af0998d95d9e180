//! Independent query sessions over many cascades, one worker per cascade.

use crate::common::*;
use crate::inference::TreeInference;
use crate::observation::Cascade;
use crate::query_selection::{build_query_generator, GeneratorConfig};
use crate::simulator::{QueryLog, Simulator, SimulatorOptions};
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub generator: GeneratorConfig,
    pub simulator: SimulatorOptions,
    /// cascade `i` is seeded with `seed + i`
    pub seed: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            generator: GeneratorConfig::default(),
            simulator: SimulatorOptions::default(),
            seed: 42,
        }
    }
}

#[derive(Debug)]
pub struct CascadeOutcome {
    pub index: usize,
    pub result: QueryResult<QueryLog>,
}

impl CascadeOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

///
/// Run one query session on a private copy of the graph.
///
/// * `graph` - shared topology; cloned before any node is isolated
/// * `cascade` - ground truth and initial observations
/// * `config` - strategy and loop options
/// * `seed` - seed for this cascade only
///
pub fn run_cascade(
    graph: &CascadeGraph,
    cascade: &Cascade,
    config: &BatchConfig,
    seed: u64,
) -> QueryResult<QueryLog> {
    let obs = cascade.initial_observations()?;
    let true_root = cascade.source();
    let gen_config = &config.generator;

    let generator =
        build_query_generator(gen_config, graph.clone(), obs.clone(), true_root, seed)?;

    // probabilities for strategies that do not sample trees themselves
    let tracker = if config.simulator.record_probas && !gen_config.method.samples_trees() {
        let rng = SmallRng::seed_from_u64(seed.wrapping_add(1 << 32));
        Some(TreeInference::new(
            graph.clone(),
            obs,
            gen_config.root.clone(),
            true_root,
            gen_config.pool.clone(),
            rng,
        )?)
    } else {
        None
    };

    let mut sim = Simulator::new(cascade, generator, tracker, config.simulator.clone());
    sim.run()
}

///
/// Run every cascade in parallel.
///
/// A cascade that aborts is logged and reported in its outcome; the
/// others carry on.
///
pub fn run_cascades(
    graph: &CascadeGraph,
    cascades: &[Cascade],
    config: &BatchConfig,
) -> Vec<CascadeOutcome> {
    info!(
        "running {} cascades with {:?} queries",
        cascades.len(),
        config.generator.method
    );

    let outcomes: Vec<CascadeOutcome> = cascades
        .par_iter()
        .enumerate()
        .progress_count(cascades.len() as u64)
        .map(|(index, cascade)| {
            let seed = config.seed.wrapping_add(index as u64);
            let result = run_cascade(graph, cascade, config, seed);
            match &result {
                Ok(log) => info!("cascade {}: {} queries", index, log.n_rounds()),
                Err(e) => warn!("cascade {} aborted: {}", index, e),
            }
            CascadeOutcome { index, result }
        })
        .collect();

    let n_ok = outcomes.iter().filter(|o| o.is_ok()).count();
    info!(
        "{} cascades finished, {} aborted",
        n_ok,
        outcomes.len() - n_ok
    );
    outcomes
}
