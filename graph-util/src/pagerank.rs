use crate::cascade_graph::CascadeGraph;

/// Options for personalized pagerank.
#[derive(Debug, Clone)]
pub struct PagerankOptions {
    /// Probability of following an edge rather than teleporting. Default: 0.85
    pub damping: f64,
    /// Maximum number of power iterations. Default: 100
    pub max_iter: usize,
    /// Stop when the L1 change between iterations drops below this. Default: 1e-8
    pub tol: f64,
}

impl Default for PagerankOptions {
    fn default() -> Self {
        PagerankOptions {
            damping: 0.85,
            max_iter: 100,
            tol: 1e-8,
        }
    }
}

///
/// Personalized pagerank over the visible part of `graph`.
///
/// Teleportation and dangling mass both go back to the personalization
/// vector. Isolated nodes score zero. If no seed is visible or all seed
/// weights are zero, every score is zero.
///
/// * `seed_weights` - (node, weight) pairs; normalized internally
///
pub fn personalized_pagerank(
    graph: &CascadeGraph,
    seed_weights: &[(usize, f64)],
    options: &PagerankOptions,
) -> Vec<f64> {
    let n = graph.num_nodes();
    let mut pers = vec![0.0; n];
    for &(v, w) in seed_weights {
        if graph.is_visible(v) && w > 0.0 {
            pers[v] += w;
        }
    }
    let total: f64 = pers.iter().sum();
    if total <= 0.0 {
        return vec![0.0; n];
    }
    pers.iter_mut().for_each(|x| *x /= total);

    let degree: Vec<f64> = (0..n).map(|v| graph.weighted_degree(v)).collect();
    let d = options.damping;

    let mut rank = pers.clone();
    let mut next = vec![0.0; n];

    for _ in 0..options.max_iter {
        next.iter_mut().for_each(|x| *x = 0.0);
        let mut dangling = 0.0;

        for v in graph.visible_nodes() {
            if degree[v] > 0.0 {
                let share = rank[v] / degree[v];
                for (u, w) in graph.neighbors(v) {
                    next[u] += d * share * w;
                }
            } else {
                dangling += rank[v];
            }
        }

        let restart = (1.0 - d) + d * dangling;
        for (x, p) in next.iter_mut().zip(pers.iter()) {
            *x += restart * p;
        }

        let delta: f64 = next.iter().zip(rank.iter()).map(|(a, b)| (a - b).abs()).sum();
        std::mem::swap(&mut rank, &mut next);
        if delta < options.tol {
            break;
        }
    }
    rank
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn scores_sum_to_one_and_decay_with_distance() {
        let g = CascadeGraph::from_edges(&[(0, 1), (1, 2), (2, 3), (3, 4)], 5);
        let pr = personalized_pagerank(&g, &[(0, 1.0)], &PagerankOptions::default());
        assert_abs_diff_eq!(pr.iter().sum::<f64>(), 1.0, epsilon = 1e-6);
        assert!(pr[0] > pr[2]);
        assert!(pr[2] > pr[4]);
    }

    #[test]
    fn isolated_nodes_score_zero() {
        let mut g = CascadeGraph::from_edges(&[(0, 1), (1, 2)], 3);
        g.isolate_node(1);
        let pr = personalized_pagerank(&g, &[(0, 1.0)], &PagerankOptions::default());
        assert_eq!(pr[1], 0.0);
        assert_eq!(pr[2], 0.0);
        assert_abs_diff_eq!(pr[0], 1.0, epsilon = 1e-9);

        let none = personalized_pagerank(&g, &[(1, 1.0)], &PagerankOptions::default());
        assert!(none.iter().all(|&x| x == 0.0));
    }
}
