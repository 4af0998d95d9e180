use graph_util::CascadeGraph;
use lentil::errors::QueryError;
use lentil::inference::TreeInference;
use lentil::observation::{Cascade, Observations};
use lentil::query_selection::*;
use lentil::root_sampler::RootSamplerKind;
use lentil::sample_pool::PoolOptions;
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn grid(k: usize) -> CascadeGraph {
    let mut edges = vec![];
    for r in 0..k {
        for c in 0..k {
            let v = r * k + c;
            if c + 1 < k {
                edges.push((v, v + 1));
            }
            if r + 1 < k {
                edges.push((v, v + k));
            }
        }
    }
    CascadeGraph::from_edges(&edges, k * k)
}

fn path(n: usize) -> CascadeGraph {
    let edges: Vec<_> = (1..n).map(|v| (v - 1, v)).collect();
    CascadeGraph::from_edges(&edges, n)
}

fn inference(graph: CascadeGraph, obs: Observations, n_samples: usize, seed: u64) -> TreeInference {
    TreeInference::new(
        graph,
        obs,
        RootSamplerKind::Uniform,
        None,
        PoolOptions {
            n_samples,
            ..Default::default()
        },
        SmallRng::seed_from_u64(seed),
    )
    .unwrap()
}

/// 4 x 4 grid infected in a connected block around the corner
fn grid_cascade() -> Cascade {
    let mut times = vec![-1; 16];
    for (v, t) in [(0, 0), (1, 1), (4, 1), (2, 2), (5, 2), (8, 2)] {
        times[v] = t;
    }
    Cascade::new(times, vec![0])
}

#[test]
fn query_scores_are_non_negative() {
    let inf = inference(grid(4), Observations::new([0, 5]), 60, 2);
    let stat = inf.statistics();
    let hidden: Vec<usize> = (0..16).filter(|&v| v != 0 && v != 5).collect();
    for &q in hidden.iter() {
        assert!(stat.query_score(q, &hidden) >= 0.0);
    }
}

#[test]
fn determined_nodes_score_zero() {
    // on a path with both ends infected every tree covers every node
    let inf = inference(path(5), Observations::new([0, 4]), 20, 9);
    let stat = inf.statistics();
    assert_eq!(inf.infection_probabilities(), vec![1.0; 5]);
    for q in 1..4 {
        assert_eq!(stat.query_score(q, &[1, 2, 3]), 0.0);
    }
}

#[test]
fn every_strategy_drains_the_pool_without_repeats() -> anyhow::Result<()> {
    let cascade = grid_cascade();
    let methods = [
        QueryMethod::Random,
        QueryMethod::Pagerank,
        QueryMethod::Entropy,
        QueryMethod::PredictionError,
    ];

    for method in methods {
        let config = GeneratorConfig {
            method,
            pool: PoolOptions {
                n_samples: 40,
                ..Default::default()
            },
            ..Default::default()
        };
        let obs = cascade.initial_observations()?;
        let mut qg = build_query_generator(&config, grid(4), obs, cascade.source(), 17)?;

        let mut queried = vec![];
        loop {
            let before = qg.candidates().len();
            let q = match qg.select_query() {
                Ok(q) => q,
                Err(e) => {
                    assert_eq!(e, QueryError::NoMoreQuery);
                    assert_eq!(before, 0);
                    break;
                }
            };
            assert_ne!(q, 0, "{} re-queried an observed node", qg.name());
            assert!(!queried.contains(&q), "{} repeated node {}", qg.name(), q);
            assert_eq!(qg.candidates().len(), before - 1);
            assert!(!qg.candidates().contains(q));

            qg.update_observation(q, cascade.label(q)?)?;
            queried.push(q);
        }

        queried.sort_unstable();
        assert_eq!(queried, (1..16).collect::<Vec<_>>());
        assert_eq!(qg.select_query(), Err(QueryError::NoMoreQuery));

        if let Some(inf) = qg.inference() {
            let p = inf.infection_probabilities();
            for v in 0..16 {
                let truth = if cascade.label(v)?.is_infected() { 1.0 } else { 0.0 };
                assert_eq!(p[v], truth);
            }
        }
    }
    Ok(())
}

#[test]
fn larger_threshold_prunes_more() {
    let obs = Observations::new([12]);
    let mut previous: Option<Vec<usize>> = None;

    for min_proba in [0.0, 0.05, 0.2, 0.4, 0.5] {
        // same seed, same samples
        let inf = inference(grid(5), obs.clone(), 50, 4);
        let options = PredictionErrorOptions {
            min_proba,
            ..Default::default()
        };
        let qg = PredictionErrorQueryGenerator::new(inf, options, SmallRng::seed_from_u64(0));
        let pruned = qg.prune_candidates();

        if let Some(prev) = previous.as_ref() {
            assert!(pruned.len() <= prev.len());
            assert!(pruned.iter().all(|v| prev.contains(v)));
        }
        previous = Some(pruned);
    }
}

#[test]
fn hidden_nodes_are_capped() -> anyhow::Result<()> {
    let obs = Observations::new([12]);

    let options = PredictionErrorOptions {
        n_node_samples: Some(5),
        ..Default::default()
    };
    let mut qg = PredictionErrorQueryGenerator::new(
        inference(grid(5), obs.clone(), 50, 4),
        options,
        SmallRng::seed_from_u64(8),
    );
    let hidden = qg.sample_nodes_for_estimation()?;
    assert_eq!(hidden.len(), 5);
    assert!(hidden.windows(2).all(|w| w[0] < w[1]));
    assert!(hidden.iter().all(|&v| qg.candidates().contains(v)));

    let mut uncapped = PredictionErrorQueryGenerator::new(
        inference(grid(5), obs, 50, 4),
        PredictionErrorOptions::default(),
        SmallRng::seed_from_u64(8),
    );
    assert_eq!(uncapped.sample_nodes_for_estimation()?.len(), 24);
    Ok(())
}

#[test]
fn prediction_error_picks_the_lowest_score() -> anyhow::Result<()> {
    // star around 0 with a tail 5 - 6 - 7 out to the infected node
    let edges: Vec<_> = (1..6).map(|v| (0, v)).chain([(5, 6), (6, 7)]).collect();
    let graph = CascadeGraph::from_edges(&edges, 8);
    let obs = Observations::new([7]);

    let mut qg = PredictionErrorQueryGenerator::new(
        inference(graph, obs, 100, 6),
        PredictionErrorOptions {
            prune_nodes: false,
            ..Default::default()
        },
        SmallRng::seed_from_u64(1),
    );

    let hidden = qg.sample_nodes_for_estimation()?;
    let stat = qg.inference().map(|inf| inf.statistics()).unwrap();
    let scores: Vec<f64> = qg
        .candidates()
        .iter()
        .map(|q| stat.query_score(q, &hidden))
        .collect();
    let best = scores.iter().cloned().fold(f64::INFINITY, f64::min);

    let q = qg.select_query()?;
    let idx = (0..7).position(|v| v == q).unwrap();
    assert_eq!(scores[idx], best);
    Ok(())
}
