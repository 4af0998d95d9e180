use std::time::{Duration, Instant};

/// Why a query round could not proceed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    /// The candidate pool is empty. Ends a run cleanly.
    #[error("no more nodes to query")]
    NoMoreQuery,

    /// The root sampler has no valid support
    #[error("root distribution has no support")]
    DegenerateDistribution,

    /// No observation-consistent tree within the retry budget
    #[error("no consistent tree sample after {attempts} attempts (last labeled node: {node:?})")]
    SamplingExhausted { node: Option<usize>, attempts: usize },

    #[error("round exceeded its wall-clock budget after {elapsed:?}")]
    RoundBudgetExceeded { elapsed: Duration },

    #[error("node {0} is not in the graph")]
    UnknownNode(usize),
}

impl QueryError {
    /// Errors that abort the current cascade but not a batch
    pub fn is_round_abort(&self) -> bool {
        matches!(
            self,
            QueryError::DegenerateDistribution
                | QueryError::SamplingExhausted { .. }
                | QueryError::RoundBudgetExceeded { .. }
        )
    }
}

pub type QueryResult<T> = std::result::Result<T, QueryError>;

/// Wall-clock allowance for one query round.
#[derive(Debug, Clone, Copy)]
pub struct RoundBudget {
    started: Instant,
    allowance: Duration,
}

impl RoundBudget {
    pub fn start(allowance: Duration) -> Self {
        RoundBudget {
            started: Instant::now(),
            allowance,
        }
    }

    pub fn check(&self) -> QueryResult<()> {
        let elapsed = self.started.elapsed();
        if elapsed > self.allowance {
            Err(QueryError::RoundBudgetExceeded { elapsed })
        } else {
            Ok(())
        }
    }
}
