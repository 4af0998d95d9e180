use graph_util::CascadeGraph;
use lentil::errors::QueryError;
use lentil::observation::{Label, Observations};
use lentil::root_sampler::{RootSampler, RootSamplerKind};
use lentil::sample_pool::{PoolOptions, SamplingMethod, TreeSample, TreeSamplePool};
use lentil::tree_stat::TreeBasedStatistics;
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

fn pool_with(n_samples: usize, method: SamplingMethod) -> TreeSamplePool {
    TreeSamplePool::new(PoolOptions {
        n_samples,
        method,
        ..Default::default()
    })
}

fn count_untouched(before: &[TreeSample], after: &[TreeSample]) -> usize {
    before.iter().zip(after).filter(|(a, b)| a == b).count()
}

#[test]
fn updates_touch_only_contradicted_samples() -> anyhow::Result<()> {
    let n = 50;
    let mut g = grid(4);
    let mut obs = Observations::new([0]);
    let mut rng = SmallRng::seed_from_u64(7);

    let sampler = RootSampler::build(&RootSamplerKind::Uniform, &g, &obs, None)?;
    let mut pool = pool_with(n, SamplingMethod::LoopErased);
    pool.fill(&g, &obs, &sampler, &mut rng)?;
    pool.assert_consistent(&obs);
    let mut stat = TreeBasedStatistics::build_matrix(g.num_nodes(), pool.samples());

    // 5 is infected: samples without it are redrawn
    let before = pool.samples().to_vec();
    obs.observe(5, Label::Infected);
    let sampler = RootSampler::build(&RootSamplerKind::Uniform, &g, &obs, None)?;
    let changed = pool.update_samples(&g, &obs, &sampler, 5, Label::Infected, &mut rng)?;
    pool.assert_consistent(&obs);
    assert_eq!(count_untouched(&before, pool.samples()), n - changed.len());
    stat.update_trees(&changed, 5, Label::Infected);

    // 10 is uninfected: samples through it are redrawn
    let before = pool.samples().to_vec();
    obs.observe(10, Label::Uninfected);
    g.isolate_node(10);
    let sampler = RootSampler::build(&RootSamplerKind::Uniform, &g, &obs, None)?;
    let changed = pool.update_samples(&g, &obs, &sampler, 10, Label::Uninfected, &mut rng)?;
    pool.assert_consistent(&obs);
    assert_eq!(count_untouched(&before, pool.samples()), n - changed.len());
    stat.update_trees(&changed, 10, Label::Uninfected);

    // patched statistics agree with a direct count over the pool
    let nodes: Vec<usize> = (0..g.num_nodes()).collect();
    let probas = stat.unconditional_proba(&nodes);
    for (&v, &p) in nodes.iter().zip(probas.iter()) {
        let hits = pool.samples().iter().filter(|t| t.contains(&v)).count();
        assert_eq!(p, hits as f64 / n as f64);
        assert!((0.0..=1.0).contains(&p));
    }
    assert_eq!(probas[0], 1.0);
    assert_eq!(probas[5], 1.0);
    assert_eq!(probas[10], 0.0);
    Ok(())
}

#[test]
fn spanning_tree_method_respects_observations() -> anyhow::Result<()> {
    let mut g = grid(4);
    let mut obs = Observations::new([0, 15]);
    obs.observe(5, Label::Uninfected);
    g.isolate_node(5);

    let mut rng = SmallRng::seed_from_u64(21);
    let sampler = RootSampler::build(&RootSamplerKind::Uniform, &g, &obs, None)?;
    let mut pool = pool_with(30, SamplingMethod::SpanningTree);
    pool.fill(&g, &obs, &sampler, &mut rng)?;
    pool.assert_consistent(&obs);

    obs.observe(6, Label::Infected);
    let sampler = RootSampler::build(&RootSamplerKind::Uniform, &g, &obs, None)?;
    pool.update_samples(&g, &obs, &sampler, 6, Label::Infected, &mut rng)?;
    pool.assert_consistent(&obs);
    assert_eq!(pool.samples().len(), 30);
    Ok(())
}

#[test]
fn single_sample_without_replacement_is_exhausted() -> anyhow::Result<()> {
    // 0 - 1 - 2 with both ends infected: every tree goes through 1
    let mut g = CascadeGraph::from_edges(&[(0, 1), (1, 2)], 3);
    let mut obs = Observations::new([0, 2]);
    let mut rng = SmallRng::seed_from_u64(1);

    let sampler = RootSampler::build(&RootSamplerKind::Uniform, &g, &obs, None)?;
    let mut pool = pool_with(1, SamplingMethod::LoopErased);
    pool.fill(&g, &obs, &sampler, &mut rng)?;
    assert!(pool.samples()[0].contains(&1));

    obs.observe(1, Label::Uninfected);
    g.isolate_node(1);
    let sampler = RootSampler::build(&RootSamplerKind::Uniform, &g, &obs, None)?;
    let res = pool.update_samples(&g, &obs, &sampler, 1, Label::Uninfected, &mut rng);

    assert_eq!(
        res.err(),
        Some(QueryError::SamplingExhausted {
            node: Some(1),
            attempts: 100
        })
    );
    // nothing was committed
    assert!(pool.samples()[0].contains(&1));
    Ok(())
}

#[test]
fn redraws_survive_a_split_graph() -> anyhow::Result<()> {
    // 0 - 1 - 2 - ... - 99 with 0 infected; 2 turns out uninfected
    let n = 100;
    let edges: Vec<_> = (1..n).map(|v| (v - 1, v)).collect();
    let mut g = CascadeGraph::from_edges(&edges, n);
    let mut obs = Observations::new([0]);
    let mut rng = SmallRng::seed_from_u64(3);

    let sampler = RootSampler::build(&RootSamplerKind::Uniform, &g, &obs, None)?;
    let mut pool = TreeSamplePool::new(PoolOptions::default());
    pool.fill(&g, &obs, &sampler, &mut rng)?;

    obs.observe(2, Label::Uninfected);
    g.isolate_node(2);
    let sampler = RootSampler::build(&RootSamplerKind::Uniform, &g, &obs, None)?;
    assert_eq!(sampler.support(), &[0, 1]);

    pool.update_samples(&g, &obs, &sampler, 2, Label::Uninfected, &mut rng)?;
    pool.assert_consistent(&obs);
    assert!(pool.samples().iter().all(|t| t.iter().all(|&v| v < 2)));
    Ok(())
}
