use graph_util::common_io::write_types;
use graph_util::spanning_tree::loop_erased_steiner_tree;
use graph_util::CascadeGraph;
use rand::rngs::SmallRng;
use rand::SeedableRng;

#[test]
fn read_weighted_edge_list() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("edges.tsv.gz");
    let file = file.to_str().unwrap();

    let lines = vec![
        "# u v w".to_string(),
        "0\t1\t0.5".to_string(),
        "1\t2".to_string(),
        "2\t1\t1.5".to_string(),
        "3\t3".to_string(),
    ];
    write_types(&lines, file)?;

    let g = CascadeGraph::from_edge_list_file(file)?;
    assert_eq!(g.num_nodes(), 4);
    assert_eq!(g.num_edges(), 2);
    assert_eq!(g.degree(3), 0);
    approx::assert_abs_diff_eq!(g.weighted_degree(1), 3.0);
    approx::assert_abs_diff_eq!(g.weighted_degree(2), 2.5);
    Ok(())
}

#[test]
fn isolation_hides_edges() {
    let mut g = CascadeGraph::from_edges(&[(0, 1), (1, 2), (0, 2), (2, 3)], 4);
    assert_eq!(g.num_visible(), 4);
    g.isolate_node(2);
    g.isolate_node(2);
    assert_eq!(g.num_visible(), 3);
    assert_eq!(g.num_edges(), 1);
    assert_eq!(g.degree(3), 0);
    assert_eq!(g.neighbors(2).count(), 0);
    assert_eq!(g.visible_nodes().collect::<Vec<_>>(), vec![0, 1, 3]);

    g.restore_node(2);
    assert_eq!(g.num_visible(), 4);
    assert_eq!(g.num_edges(), 4);
    let mut nbrs: Vec<usize> = g.neighbors(2).map(|(u, _)| u).collect();
    nbrs.sort_unstable();
    assert_eq!(nbrs, vec![0, 1, 3]);
}

#[test]
fn steiner_trees_avoid_isolated_nodes() {
    // a 4-cycle 0-1-2-3-0; removing 1 forces the path through 3
    let mut g = CascadeGraph::from_edges(&[(0, 1), (1, 2), (2, 3), (3, 0)], 4);
    g.isolate_node(1);
    let mut rng = SmallRng::seed_from_u64(3);
    for _ in 0..10 {
        let mut nodes = loop_erased_steiner_tree(&g, 0, &[2], &mut rng).unwrap();
        nodes.sort();
        assert_eq!(nodes, vec![0, 2, 3]);
    }
}
