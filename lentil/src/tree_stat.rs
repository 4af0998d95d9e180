//! Statistics over the tree sample pool.
//!
//! Keeps a sample × node membership matrix plus per-node occurrence
//! counts. Rows are patched in lockstep with the pool, so marginal
//! infection probabilities are O(1) reads and query scores never need a
//! rescan of the raw samples.
//!
//! # Scores
//!
//! For a query `q` the pool splits into samples with and without `q`.
//! Within each part, every hidden node `u` has an empirical infection
//! probability `p_u` and binary entropy `H(p_u)`. The query score is the
//! size-weighted sum
//!
//! ```text
//! score(q) = Σ_y  n_y / N  Σ_u  H(p_u | q = y)
//! ```
//!
//! i.e. the uncertainty expected to remain after learning `q`'s label.

use crate::common::*;
use crate::sample_pool::TreeSample;
use ndarray::prelude::*;

/// Binary entropy in nats; exactly 0 at `p ∈ {0, 1}`
pub fn binary_entropy(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 {
        return 0.0;
    }
    -(p * p.ln() + (1.0 - p) * (1.0 - p).ln())
}

pub struct TreeBasedStatistics {
    /// `membership[[j, v]]`: sample `j` contains node `v`
    membership: Array2<bool>,
    /// number of samples containing each node
    counts: Vec<usize>,
}

impl TreeBasedStatistics {
    ///
    /// Build the membership matrix from scratch.
    ///
    /// * `n_nodes` - number of graph nodes
    /// * `samples` - the current tree samples
    ///
    pub fn build_matrix(n_nodes: usize, samples: &[TreeSample]) -> Self {
        let mut membership = Array2::from_elem((samples.len(), n_nodes), false);
        let mut counts = vec![0; n_nodes];
        for (j, tree) in samples.iter().enumerate() {
            for &v in tree {
                membership[[j, v]] = true;
                counts[v] += 1;
            }
        }
        TreeBasedStatistics { membership, counts }
    }

    ///
    /// Overwrite the rows of the replaced samples.
    ///
    /// * `changed` - `(slot, new sample)` pairs from the pool update
    /// * `node`, `label` - the observation that caused the update
    ///
    /// Panics if afterwards some sample still disagrees with `label` on
    /// `node`; that means the pool and the matrix went out of sync.
    ///
    pub fn update_trees(&mut self, changed: &[(usize, TreeSample)], node: Node, label: Label) {
        for (j, tree) in changed {
            let mut row = self.membership.row_mut(*j);
            for (v, x) in row.iter_mut().enumerate() {
                if *x {
                    self.counts[v] -= 1;
                    *x = false;
                }
            }
            for &v in tree {
                row[v] = true;
                self.counts[v] += 1;
            }
        }

        let expected = if label.is_infected() {
            self.n_samples()
        } else {
            0
        };
        assert_eq!(
            self.counts[node], expected,
            "membership matrix disagrees with the label of node {}",
            node
        );
    }

    pub fn n_samples(&self) -> usize {
        self.membership.nrows()
    }

    pub fn n_nodes(&self) -> usize {
        self.membership.ncols()
    }

    /// Number of samples containing `node`
    pub fn sample_count(&self, node: Node) -> usize {
        self.counts[node]
    }

    pub fn contains(&self, sample: usize, node: Node) -> bool {
        self.membership[[sample, node]]
    }

    /// Fraction of samples containing each node
    pub fn unconditional_proba(&self, nodes: &[Node]) -> Vec<f64> {
        let n = self.n_samples() as f64;
        nodes.iter().map(|&v| self.counts[v] as f64 / n).collect()
    }

    /// Infection probability of every node, in node order
    pub fn infection_probabilities(&self) -> Vec<f64> {
        let n = self.n_samples() as f64;
        self.counts.iter().map(|&c| c as f64 / n).collect()
    }

    /// Keep candidates with `min_value <= p <= 1 - min_value`
    pub fn filter_out_extreme_targets(&self, candidates: &[Node], min_value: f64) -> Vec<Node> {
        let n = self.n_samples() as f64;
        candidates
            .iter()
            .copied()
            .filter(|&v| {
                let p = self.counts[v] as f64 / n;
                p >= min_value && p <= 1.0 - min_value
            })
            .collect()
    }

    /// Entropy of each node's own infection label
    pub fn node_entropies(&self, nodes: &[Node]) -> Vec<f64> {
        self.unconditional_proba(nodes)
            .into_iter()
            .map(binary_entropy)
            .collect()
    }

    /// Sample slots that contain (`Infected`) or omit (`Uninfected`) `q`
    fn partition(&self, q: Node, label: Label) -> Vec<usize> {
        let col = self.membership.column(q);
        (0..self.n_samples())
            .filter(|&j| col[j] == label.is_infected())
            .collect()
    }

    /// Entropy summed over `hidden` within the given sample slots
    fn partition_entropy(&self, part: &[usize], hidden: &[Node], skip: Node) -> f64 {
        if part.is_empty() {
            return 0.0;
        }
        let size = part.len() as f64;
        hidden
            .iter()
            .filter(|&&u| u != skip)
            .map(|&u| {
                let col = self.membership.column(u);
                let hits = part.iter().filter(|&&j| col[j]).count();
                binary_entropy(hits as f64 / size)
            })
            .sum()
    }

    ///
    /// Residual entropy over `hidden` among samples agreeing with
    /// `q = label`. Zero if no sample agrees.
    ///
    pub fn prediction_error(&self, q: Node, label: Label, hidden: &[Node]) -> f64 {
        self.partition_entropy(&self.partition(q, label), hidden, q)
    }

    ///
    /// Expected residual entropy over `hidden` after observing `q`.
    ///
    /// `q` itself is skipped if it appears in `hidden`.
    ///
    pub fn query_score(&self, q: Node, hidden: &[Node]) -> f64 {
        let n = self.n_samples() as f64;
        let with_q = self.partition(q, Label::Infected);
        let without_q = self.partition(q, Label::Uninfected);

        let w1 = with_q.len() as f64 / n;
        let w0 = without_q.len() as f64 / n;

        w1 * self.partition_entropy(&with_q, hidden, q)
            + w0 * self.partition_entropy(&without_q, hidden, q)
    }
}
