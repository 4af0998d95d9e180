use crate::cascade_graph::CascadeGraph;
use fnv::{FnvHashMap as HashMap, FnvHashSet as HashSet};
use petgraph::graph::NodeIndex;
use petgraph::prelude::UnGraphMap;
use petgraph::visit::{Bfs, NodeFiltered};

/// Visible nodes reachable from `source`, as a mask over all node ids.
///
/// An isolated `source` reaches nothing, not even itself.
pub fn connected_component(graph: &CascadeGraph, source: usize) -> Vec<bool> {
    let mut reached = vec![false; graph.num_nodes()];
    if !graph.is_visible(source) {
        return reached;
    }

    let visible =
        NodeFiltered::from_fn(graph.topology(), |x: NodeIndex| graph.is_visible(x.index()));
    let mut bfs = Bfs::new(&visible, NodeIndex::new(source));
    while let Some(x) = bfs.next(&visible) {
        reached[x.index()] = true;
    }
    reached
}

/// Union of the components of every node in `sources`
pub fn connected_components_of(graph: &CascadeGraph, sources: &[usize]) -> Vec<bool> {
    let mut reached = vec![false; graph.num_nodes()];
    for &s in sources {
        if reached.get(s).copied().unwrap_or(true) {
            continue;
        }
        for (r, x) in reached.iter_mut().zip(connected_component(graph, s)) {
            *r |= x;
        }
    }
    reached
}

///
/// BFS over an edge set (typically a spanning tree) from `source`.
///
/// Returns node -> predecessor for every node reached; `source` itself is
/// not a key.
///
/// * `tree_edges` - undirected edges
/// * `source` - where the search starts
///
pub fn bfs_predecessors(tree_edges: &[(usize, usize)], source: usize) -> HashMap<usize, usize> {
    let tree: UnGraphMap<usize, ()> = UnGraphMap::from_edges(tree_edges.iter().copied());
    let mut pred = HashMap::default();
    if !tree.contains_node(source) {
        return pred;
    }

    // in a tree the only neighbour seen before `x` is its parent
    let mut bfs = Bfs::new(&tree, source);
    while let Some(x) = bfs.next(&tree) {
        for u in tree.neighbors(x) {
            if u != source && !pred.contains_key(&u) {
                pred.insert(u, x);
            }
        }
    }
    pred
}

///
/// Nodes of the sub-tree connecting `terminals` to `root`.
///
/// Walks the predecessor chain from each terminal back toward the root
/// and stops as soon as it joins a path already collected. Returns `None`
/// if some terminal is not connected to `root`.
///
pub fn extract_steiner_tree(
    pred: &HashMap<usize, usize>,
    root: usize,
    terminals: &[usize],
) -> Option<Vec<usize>> {
    let mut nodes = vec![root];
    let mut in_tree: HashSet<usize> = HashSet::default();
    in_tree.insert(root);

    for &t in terminals {
        let mut x = t;
        while in_tree.insert(x) {
            nodes.push(x);
            x = *pred.get(&x)?;
        }
    }
    Some(nodes)
}
