//! Sequential query loop for one cascade.

use crate::common::*;
use crate::errors::RoundBudget;
use crate::inference::TreeInference;
use crate::observation::Cascade;
use crate::query_selection::QueryGenerator;
use std::time::Duration;

/// Options for one simulated query session.
#[derive(Debug, Clone)]
pub struct SimulatorOptions {
    /// Stop after this many queries; `None` runs until no candidate is left.
    /// Default: None
    pub n_queries: Option<usize>,
    /// Keep the infection probability vector after each round. Default: true
    pub record_probas: bool,
    /// Wall-clock allowance per round, checked before every tree redraw.
    /// A round that completes is logged whatever its duration. Default: None
    pub round_budget: Option<Duration>,
}

impl Default for SimulatorOptions {
    fn default() -> Self {
        SimulatorOptions {
            n_queries: None,
            record_probas: true,
            round_budget: None,
        }
    }
}

/// Queried nodes in order and, per round, the probability of every node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryLog {
    pub queries: Vec<Node>,
    pub probas: Vec<Vec<f64>>,
}

impl QueryLog {
    pub fn n_rounds(&self) -> usize {
        self.queries.len()
    }
}

pub struct Simulator<'a> {
    cascade: &'a Cascade,
    generator: Box<dyn QueryGenerator + Send>,
    /// separate tree sampler for strategies that keep none
    tracker: Option<TreeInference>,
    options: SimulatorOptions,
}

impl<'a> Simulator<'a> {
    ///
    /// * `cascade` - ground truth revealed one query at a time
    /// * `generator` - query strategy, already built on the initial observations
    /// * `tracker` - tree inference used only to record probabilities
    ///   when the strategy does not sample trees itself
    ///
    pub fn new(
        cascade: &'a Cascade,
        generator: Box<dyn QueryGenerator + Send>,
        tracker: Option<TreeInference>,
        options: SimulatorOptions,
    ) -> Self {
        Simulator {
            cascade,
            generator,
            tracker,
            options,
        }
    }

    pub fn generator(&self) -> &dyn QueryGenerator {
        self.generator.as_ref()
    }

    fn current_probas(&self) -> Option<Vec<f64>> {
        self.generator
            .inference()
            .or(self.tracker.as_ref())
            .map(|inf| inf.infection_probabilities())
    }

    ///
    /// Select, reveal and update until the query limit is reached or no
    /// candidate is left.
    ///
    /// Running out of candidates ends the loop normally. Any other error
    /// aborts the session.
    ///
    pub fn run(&mut self) -> QueryResult<QueryLog> {
        let mut log = QueryLog::default();
        let limit = self.options.n_queries.unwrap_or(usize::MAX);

        while log.queries.len() < limit {
            let budget = self.options.round_budget.map(RoundBudget::start);
            self.generator.set_budget(budget);
            if let Some(tracker) = self.tracker.as_mut() {
                tracker.set_budget(budget);
            }

            let q = match self.generator.select_query() {
                Ok(q) => q,
                Err(QueryError::NoMoreQuery) => {
                    debug!("{}: no candidate left", self.generator.name());
                    break;
                }
                Err(e) => return Err(e),
            };

            let label = self.cascade.label(q)?;
            self.generator.update_observation(q, label)?;
            if let Some(tracker) = self.tracker.as_mut() {
                tracker.observe(q, label)?;
            }
            log.queries.push(q);

            if self.options.record_probas {
                if let Some(probas) = self.current_probas() {
                    log.probas.push(probas);
                }
            }

            debug!(
                "{} round {}: queried {} ({:?}), {} candidates left",
                self.generator.name(),
                log.queries.len(),
                q,
                label,
                self.generator.candidates().len()
            );
        }

        Ok(log)
    }
}

///
/// Replay a fixed query sequence and return the infection probabilities
/// after each query.
///
/// * `inference` - tree inference built on the initial observations
/// * `cascade` - ground truth for the labels
/// * `queries` - nodes to reveal, in order
///
pub fn infer_probas_for_queries(
    inference: &mut TreeInference,
    cascade: &Cascade,
    queries: &[Node],
) -> QueryResult<Vec<Vec<f64>>> {
    let mut ret = Vec::with_capacity(queries.len());
    for &q in queries {
        let label = cascade.label(q)?;
        inference.observe(q, label)?;
        ret.push(inference.infection_probabilities());
    }
    Ok(ret)
}
