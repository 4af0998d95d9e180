//! Random trees by loop-erased random walks (Wilson's algorithm).
//!
//! A walk starts at a node outside the current tree and moves to a visible
//! neighbour with probability proportional to the edge weight until it
//! hits the tree. Overwriting `next[u]` on every visit erases loops, so
//! retracing `next` from the start grafts a loop-erased path onto the tree.
//!
//! Walking from every node of a component yields a uniformly random
//! (weighted) spanning tree. Walking only from a terminal set yields the
//! Steiner tree that the spanning tree would induce on those terminals,
//! without paying for the rest of the graph.

use crate::cascade_graph::CascadeGraph;
use crate::traversal::connected_component;
use rand::Rng;

/// Visible neighbour of `v` drawn proportional to edge weight
fn random_neighbor<R: Rng + ?Sized>(graph: &CascadeGraph, v: usize, rng: &mut R) -> Option<usize> {
    let total = graph.weighted_degree(v);
    if total <= 0.0 {
        return None;
    }
    let mut x = rng.random::<f64>() * total;
    let mut last = None;
    for (u, w) in graph.neighbors(v) {
        if x < w {
            return Some(u);
        }
        x -= w;
        last = Some(u);
    }
    last
}

struct WalkState {
    in_tree: Vec<bool>,
    next: Vec<usize>,
    nodes: Vec<usize>,
    edges: Vec<(usize, usize)>,
}

impl WalkState {
    fn rooted_at(n_nodes: usize, root: usize) -> Self {
        let mut in_tree = vec![false; n_nodes];
        in_tree[root] = true;
        WalkState {
            in_tree,
            next: vec![usize::MAX; n_nodes],
            nodes: vec![root],
            edges: vec![],
        }
    }

    /// Walk from `start` until the tree is hit, then graft the erased path.
    fn graft<R: Rng + ?Sized>(
        &mut self,
        graph: &CascadeGraph,
        start: usize,
        rng: &mut R,
    ) -> Option<()> {
        let mut u = start;
        while !self.in_tree[u] {
            let v = random_neighbor(graph, u, rng)?;
            self.next[u] = v;
            u = v;
        }

        let mut u = start;
        while !self.in_tree[u] {
            self.in_tree[u] = true;
            self.nodes.push(u);
            self.edges.push((u, self.next[u]));
            u = self.next[u];
        }
        Some(())
    }
}

///
/// Random spanning tree of the visible component containing `root`.
///
/// Returns the tree's edges, or `None` if `root` is isolated. A component
/// of one node yields an empty edge set.
///
pub fn generate_random_spanning_tree<R: Rng + ?Sized>(
    graph: &CascadeGraph,
    root: usize,
    rng: &mut R,
) -> Option<Vec<(usize, usize)>> {
    let component = connected_component(graph, root);
    if !component.get(root).copied().unwrap_or(false) {
        return None;
    }

    let mut state = WalkState::rooted_at(graph.num_nodes(), root);
    for v in (0..graph.num_nodes()).filter(|&v| component[v]) {
        state.graft(graph, v, rng)?;
    }
    Some(state.edges)
}

///
/// Node set of a random tree connecting `terminals` to `root`.
///
/// Returns `None` if `root` is isolated or some terminal lies outside the
/// visible component of `root`.
///
/// * `graph` - graph with isolated nodes hidden
/// * `root` - where the tree is anchored
/// * `terminals` - nodes the tree must contain
///
pub fn loop_erased_steiner_tree<R: Rng + ?Sized>(
    graph: &CascadeGraph,
    root: usize,
    terminals: &[usize],
    rng: &mut R,
) -> Option<Vec<usize>> {
    let component = connected_component(graph, root);
    let reachable = |v: usize| component.get(v).copied().unwrap_or(false);
    if !reachable(root) || terminals.iter().any(|&t| !reachable(t)) {
        return None;
    }

    let mut state = WalkState::rooted_at(graph.num_nodes(), root);
    for &t in terminals {
        state.graft(graph, t, rng)?;
    }
    Some(state.nodes)
}
