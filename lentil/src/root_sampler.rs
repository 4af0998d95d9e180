//! Distributions over candidate cascade sources.

use crate::common::*;
use graph_util::pagerank::{personalized_pagerank, PagerankOptions};
use graph_util::traversal::connected_components_of;
use rand_distr::{weighted::WeightedIndex, Distribution};

/// Policy for drawing tree roots. Rebuilt whenever observations change.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RootSamplerKind {
    /// Uniform over the visible nodes that can still reach the infected
    /// observations
    #[default]
    Uniform,
    /// Personalized pagerank seeded at the infected observations, plus
    /// `eps` on every node that can still reach them
    Pagerank { eps: f64 },
    /// The known source of the cascade; evaluation only
    TrueRoot,
}

#[derive(Debug, Clone)]
pub struct RootSampler {
    support: Vec<Node>,
    /// `None` means uniform over `support`
    weights: Option<WeightedIndex<f64>>,
}

impl RootSampler {
    ///
    /// Build the root distribution for the current observations.
    ///
    /// * `kind` - sampling policy
    /// * `graph` - graph with observed-uninfected nodes isolated
    /// * `obs` - current observations
    /// * `true_root` - ground-truth source, used by `TrueRoot` only
    ///
    pub fn build(
        kind: &RootSamplerKind,
        graph: &CascadeGraph,
        obs: &Observations,
        true_root: Option<Node>,
    ) -> QueryResult<Self> {
        match kind {
            RootSamplerKind::Uniform => {
                let support = candidate_roots(graph, obs);
                if support.is_empty() {
                    return Err(QueryError::DegenerateDistribution);
                }
                Ok(RootSampler {
                    support,
                    weights: None,
                })
            }
            RootSamplerKind::Pagerank { eps } => {
                Self::build_pagerank(graph, obs, *eps, &PagerankOptions::default())
            }
            RootSamplerKind::TrueRoot => match true_root {
                Some(r) if graph.is_visible(r) => Ok(RootSampler {
                    support: vec![r],
                    weights: None,
                }),
                _ => Err(QueryError::DegenerateDistribution),
            },
        }
    }

    fn build_pagerank(
        graph: &CascadeGraph,
        obs: &Observations,
        eps: f64,
        options: &PagerankOptions,
    ) -> QueryResult<Self> {
        let infected = obs.sorted_infected();
        if infected.is_empty() {
            return Err(QueryError::DegenerateDistribution);
        }
        let seed_weight = 1.0 / infected.len() as f64;
        let seeds: Vec<(Node, f64)> = infected.iter().map(|&v| (v, seed_weight)).collect();
        let rank = personalized_pagerank(graph, &seeds, options);

        let support = candidate_roots(graph, obs);
        let weights: Vec<f64> = support.iter().map(|&v| rank[v] + eps.max(0.0)).collect();
        if !weights.iter().any(|&w| w > 0.0) {
            return Err(QueryError::DegenerateDistribution);
        }

        let weights =
            WeightedIndex::new(&weights).map_err(|_| QueryError::DegenerateDistribution)?;
        Ok(RootSampler {
            support,
            weights: Some(weights),
        })
    }

    /// Draw one root
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Node {
        match &self.weights {
            Some(w) => self.support[w.sample(rng)],
            None => self.support[rng.random_range(0..self.support.len())],
        }
    }

    pub fn support(&self) -> &[Node] {
        &self.support
    }
}

///
/// Visible nodes in the components of the infected observations; every
/// visible node when nothing infected is known.
///
/// A root outside these components can never span the infected nodes.
///
pub fn candidate_roots(graph: &CascadeGraph, obs: &Observations) -> Vec<Node> {
    let infected = obs.sorted_infected();
    if infected.is_empty() {
        return graph.visible_nodes().collect();
    }
    connected_components_of(graph, &infected)
        .into_iter()
        .enumerate()
        .filter_map(|(v, reached)| reached.then_some(v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(n: usize) -> CascadeGraph {
        let edges: Vec<_> = (1..n).map(|v| (v - 1, v)).collect();
        CascadeGraph::from_edges(&edges, n)
    }

    #[test]
    fn pagerank_needs_infected_seeds() {
        let g = path(4);
        let obs = Observations::default();
        let kind = RootSamplerKind::Pagerank { eps: 1e-6 };
        assert_eq!(
            RootSampler::build(&kind, &g, &obs, None).err(),
            Some(QueryError::DegenerateDistribution)
        );
    }

    #[test]
    fn pagerank_favours_the_seeds() {
        let g = path(6);
        let obs = Observations::new([0]);
        let kind = RootSamplerKind::Pagerank { eps: 0.0 };
        let sampler = RootSampler::build(&kind, &g, &obs, None).unwrap();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut counts = [0usize; 6];
        for _ in 0..2000 {
            counts[sampler.sample(&mut rng)] += 1;
        }
        assert!(counts[0] > counts[5]);
        assert!(counts[1] > counts[4]);
    }

    #[test]
    fn uniform_skips_isolated_nodes() {
        let mut g = path(5);
        g.isolate_node(2);
        let sampler =
            RootSampler::build(&RootSamplerKind::Uniform, &g, &Observations::default(), None)
                .unwrap();
        assert_eq!(sampler.support(), &[0, 1, 3, 4]);
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_ne!(sampler.sample(&mut rng), 2);
        }
    }

    #[test]
    fn roots_stay_next_to_the_infected() {
        let mut g = path(6);
        g.isolate_node(2);
        let obs = Observations::new([0]);

        let uniform = RootSampler::build(&RootSamplerKind::Uniform, &g, &obs, None).unwrap();
        assert_eq!(uniform.support(), &[0, 1]);

        let kind = RootSamplerKind::Pagerank { eps: 0.5 };
        let pagerank = RootSampler::build(&kind, &g, &obs, None).unwrap();
        assert_eq!(pagerank.support(), &[0, 1]);

        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..200 {
            assert!(uniform.sample(&mut rng) < 2);
            assert!(pagerank.sample(&mut rng) < 2);
        }

        // infected on both sides keeps both components
        let both = Observations::new([0, 5]);
        assert_eq!(candidate_roots(&g, &both), vec![0, 1, 3, 4, 5]);
    }

    #[test]
    fn true_root_is_fixed() {
        let g = path(3);
        let sampler =
            RootSampler::build(&RootSamplerKind::TrueRoot, &g, &Observations::default(), Some(1))
                .unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(sampler.sample(&mut rng), 1);
        assert!(
            RootSampler::build(&RootSamplerKind::TrueRoot, &g, &Observations::default(), None)
                .is_err()
        );
    }
}
