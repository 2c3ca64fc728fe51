use rand::{Rng, rngs::StdRng, seq::{IndexedRandom, SliceRandom}};
use tracing::trace;

use crate::{chain::{Proposal, Target}, partition::Partition};

/// Cut-friendly spanning tree over a subset of the graph's nodes.
#[derive(Debug)]
struct SpanningTree {
    order: Vec<usize>,          // preorder over nodes in the tree, order[0] is the root
    index: Vec<usize>,          // preorder entry index (meaningful only for tree nodes)
    size: Vec<usize>,           // subtree sizes (meaningful only for tree nodes)
}

impl SpanningTree {
    /// Subtree slice for `node` (contiguous in `order`).
    #[inline]
    fn subtree_slice(&self, node: usize) -> &[usize] {
        &self.order[self.index[node] .. self.index[node] + self.size[node]]
    }
}

/// Recombination proposal: merge two adjacent parts, draw a uniform spanning tree of
/// the merged region and cut one of its edges so both halves are population-balanced.
#[derive(Clone, Debug)]
pub struct Recom {
    pop_series: String,
    epsilon: f64,
    node_repeats: usize,
}

impl Recom {
    /// `epsilon` is the allowed fractional deviation of each half from the ideal
    /// (half of the merged population); `node_repeats` bounds the number of trees drawn.
    pub fn new(pop_series: impl Into<String>, epsilon: f64, node_repeats: usize) -> Self {
        assert!(epsilon >= 0.0, "epsilon must be non-negative");
        Self { pop_series: pop_series.into(), epsilon, node_repeats: node_repeats.max(1) }
    }

    /// Recombine parts `a` and `b`. Returns None if the parts are equal, not adjacent,
    /// their union is disconnected, or no balanced cut was found.
    pub fn recombine(&self, partition: &Partition, a: u32, b: u32, rng: &mut StdRng) -> Option<Partition> {
        if a == b || a >= partition.num_parts() || b >= partition.num_parts() { return None }

        let adjacent = partition.cut_edges().iter().any(|&(u, v)| {
            let (pu, pv) = (partition.assignment(u as usize), partition.assignment(v as usize));
            (pu == a && pv == b) || (pu == b && pv == a)
        });
        if !adjacent { return None }

        let nodes = partition.part(a).iter().chain(partition.part(b)).copied().collect::<Vec<_>>();
        let inside = |node: usize| {
            let part = partition.assignment(node);
            part == a || part == b
        };
        if partition.reachable_within(nodes[0], inside) != nodes.len() { return None }

        for attempt in 0..self.node_repeats {
            let tree = random_spanning_tree(partition, &nodes, &inside, rng)?;
            let cuts = self.balanced_cuts(partition, &tree);

            if let Some(&node) = cuts.choose(rng) {
                trace!(attempt, candidates = cuts.len(), "balanced cut found");
                let subtree = tree.subtree_slice(node).iter().copied().collect::<Vec<_>>();
                let moves = nodes.iter().map(|&u| (u, b))
                    .chain(subtree.into_iter().map(|u| (u, a)))
                    .collect::<Vec<_>>();
                return Some(partition.with_moves(moves));
            }
        }

        trace!(a, b, "no balanced cut after {} trees", self.node_repeats);
        None
    }

    /// Every non-root node whose subtree holds a population within epsilon of half the total.
    fn balanced_cuts(&self, partition: &Partition, tree: &SpanningTree) -> Vec<usize> {
        let graph = partition.graph();
        let weights = tree.order.iter()
            .map(|&u| graph.node_weight(&self.pop_series, u).unwrap_or(0.0))
            .collect::<Vec<_>>();

        // Prefix sums over preorder.
        let mut prefix = Vec::with_capacity(weights.len() + 1);
        prefix.push(0.0);
        for w in weights { prefix.push(prefix[prefix.len() - 1] + w) }

        let target = prefix[prefix.len() - 1] * 0.5;
        let tolerance = self.epsilon * target;

        tree.order[1..].iter().copied()
            .filter(|&u| {
                let start = tree.index[u];
                let sub = prefix[start + tree.size[u]] - prefix[start];
                (sub - target).abs() <= tolerance
            })
            .collect()
    }
}

impl Proposal for Recom {
    fn propose(&self, partition: &Partition, target: &Target, rng: &mut StdRng) -> Option<Partition> {
        match *target {
            Target::Pair(a, b) | Target::Fracked(a, b) => self.recombine(partition, a, b, rng),
            Target::Anywhere => {
                let &(u, v) = partition.cut_edges().choose(rng)?;
                self.recombine(partition, partition.assignment(u as usize), partition.assignment(v as usize), rng)
            }
        }
    }
}

/// Generate a uniform random spanning tree over `nodes` (a connected set) using
/// Wilson's algorithm, restricted to edges whose endpoints are both `inside`.
fn random_spanning_tree(
    partition: &Partition,
    nodes: &[usize],
    inside: &impl Fn(usize) -> bool,
    rng: &mut impl Rng,
) -> Option<SpanningTree> {
    let graph = partition.graph();
    let num_nodes = partition.num_nodes();

    let mut shuffled = nodes.to_vec();
    shuffled.shuffle(rng);
    let root = *shuffled.first()?;

    let mut parent = vec![None; num_nodes];
    parent[root] = Some(root);

    // Loop-erased random walks.
    let mut walk_start = vec![usize::MAX; num_nodes];
    let mut walk_position = vec![0; num_nodes];
    let mut neighbors = Vec::new();

    for &start in &shuffled[1..] {
        if parent[start].is_some() { continue }

        let mut walk = vec![start];
        walk_start[start] = start;
        walk_position[start] = 0;

        let mut current = start;
        while parent[current].is_none() {
            neighbors.clear();
            neighbors.extend(graph.edges(current).filter(|&v| inside(v)));
            current = *neighbors.choose(rng)?;

            if walk_start[current] == start && walk.get(walk_position[current]) == Some(&current) {
                walk.truncate(walk_position[current] + 1);
            } else {
                walk_start[current] = start;
                walk_position[current] = walk.len();
                walk.push(current);
            }
        }

        // Stitch the loop-erased path into the tree.
        while let Some(node) = walk.pop() {
            if parent[node].is_some() { continue }
            parent[node] = Some(current);
            current = node;
        }
    }

    let mut children = vec![Vec::new(); num_nodes];
    for &u in nodes {
        if let Some(p) = parent[u] && p != u { children[p].push(u) }
    }

    // Iterative DFS preorder from the root, with subtree sizes on exit.
    let mut order = Vec::with_capacity(nodes.len());
    let mut index = vec![0; num_nodes];
    let mut size = vec![0; num_nodes];
    let mut stack = vec![(root, false)];
    while let Some((node, entered)) = stack.pop() {
        if !entered {
            index[node] = order.len();
            order.push(node);
            stack.push((node, true));
            stack.extend(children[node].iter().rev().map(|&child| (child, false)));
        } else {
            size[node] = 1 + children[node].iter().map(|&child| size[child]).sum::<usize>();
        }
    }

    Some(SpanningTree { order, index, size })
}
