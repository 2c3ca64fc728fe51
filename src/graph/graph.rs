use std::collections::{HashMap, HashSet};

use ahash::AHashMap;

use crate::graph::WeightMatrix;

/// An undirected graph of geographic units in compressed sparse row format,
/// annotated with node weights, sub-region (locality) membership and geo ids.
#[derive(Debug, Default)]
pub struct Graph {
    size: usize,
    offsets: Vec<u32>,
    edges: Vec<u32>,
    node_weights: WeightMatrix,
    totals: WeightMatrix,         // single row of column sums
    localities: Vec<u32>,         // localities[node] = index into locality_names
    locality_names: Vec<String>,
    geo_ids: Vec<String>,
}

impl Graph {
    /// Construct a graph from adjacency lists and node weights.
    /// Every node starts in a single shared locality, with its index as geo id.
    pub fn new(
        edges: &[Vec<u32>],
        weights_i64: HashMap<String, Vec<i64>>,
        weights_f64: HashMap<String, Vec<f64>>,
    ) -> Self {
        let num_nodes = edges.len();
        edges.iter().enumerate().for_each(|(u, neighbors)| {
            neighbors.iter().for_each(|&v| {
                assert!((v as usize) < num_nodes, "edges[{u}] references node {v} out of range");
                assert!(edges[v as usize].contains(&(u as u32)), "edge ({u}, {v}) must be symmetric");
            });
        });

        let node_weights = WeightMatrix::new(num_nodes, weights_i64, weights_f64);
        let totals = node_weights.sum_rows();

        Self {
            size: num_nodes,
            offsets: std::iter::once(0u32).chain(
                edges.iter()
                    .map(|v| v.len() as u32)
                    .scan(0u32, |acc, len| {*acc += len; Some(*acc)})
            ).collect::<Vec<u32>>(),
            edges: edges.iter().flatten().copied().collect(),
            node_weights,
            totals,
            localities: vec![0; num_nodes],
            locality_names: vec![String::new()],
            geo_ids: (0..num_nodes).map(|node| node.to_string()).collect(),
        }
    }

    /// Assign each node to a named sub-region. Names are interned in order of first appearance.
    pub fn with_localities<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        assert!(names.len() == self.size, "localities.len() must equal node_count");

        let mut index: AHashMap<&str, u32> = AHashMap::new();
        let mut locality_names = Vec::new();
        self.localities = names.iter()
            .map(|name| *index.entry(name.as_ref()).or_insert_with(|| {
                locality_names.push(name.as_ref().to_string());
                (locality_names.len() - 1) as u32
            }))
            .collect();

        // An empty graph still has a (vacuous) default locality.
        if locality_names.is_empty() { locality_names.push(String::new()) }
        self.locality_names = locality_names;
        self
    }

    /// Attach geographic identifiers to each node.
    pub fn with_geo_ids(mut self, geo_ids: Vec<String>) -> Self {
        assert!(geo_ids.len() == self.size, "geo_ids.len() must equal node_count");
        self.geo_ids = geo_ids;
        self
    }

    /// Get the number of nodes in the graph.
    #[inline] pub fn node_count(&self) -> usize { self.size }

    /// Get the number of directed edge entries (twice the number of undirected edges).
    #[inline] pub fn edge_count(&self) -> usize { self.edges.len() }

    /// Get a reference to the node weights matrix.
    #[inline] pub(crate) fn node_weights(&self) -> &WeightMatrix { &self.node_weights }

    /// Names of all weight series attached to the nodes.
    #[inline] pub fn series(&self) -> HashSet<String> { self.node_weights.series() }

    /// Check whether a weight series exists.
    #[inline] pub fn contains_series(&self, series: &str) -> bool { self.node_weights.contains(series) }

    /// Read a single node weight as f64.
    #[inline]
    pub fn node_weight(&self, series: &str, node: usize) -> Option<f64> {
        self.node_weights.get_as_f64(series, node)
    }

    /// Total of a weight series over the whole graph.
    #[inline] pub fn total(&self, series: &str) -> Option<f64> { self.totals.get_as_f64(series, 0) }

    /// Get the locality index of a node.
    #[inline] pub fn locality(&self, node: usize) -> u32 { self.localities[node] }

    /// Number of distinct localities.
    #[inline] pub fn num_localities(&self) -> usize { self.locality_names.len() }

    /// Name of a locality by index.
    #[inline] pub fn locality_name(&self, locality: u32) -> &str { &self.locality_names[locality as usize] }

    /// Geographic identifier of a node.
    #[inline] pub fn geo_id(&self, node: usize) -> &str { &self.geo_ids[node] }

    /// Geographic identifiers of every node, in node order.
    #[inline] pub fn geo_ids(&self) -> &[String] { &self.geo_ids }

    /// Get the range of edges for a given node.
    #[inline]
    fn range(&self, node: usize) -> std::ops::Range<usize> {
        self.offsets[node] as usize .. self.offsets[node + 1] as usize
    }

    /// Get the degree (number of neighbors) of a given node.
    #[inline] pub fn degree(&self, node: usize) -> usize { self.range(node).len() }

    /// Get the ith neighbor of a given node.
    #[inline]
    pub fn edge(&self, node: usize, i: usize) -> Option<usize> {
        self.range(node).nth(i).map(|v| self.edges[v] as usize)
    }

    /// Get an iterator over the neighbors of a given node.
    #[inline]
    pub fn edges(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.range(node).map(move |v| self.edges[v] as usize)
    }

    /// Iterate each undirected edge once, as `(u, v)` with `u < v`.
    pub fn undirected_edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.size).flat_map(move |u| self.edges(u).filter(move |&v| u < v).map(move |v| (u, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_graph() -> Graph {
        Graph::new(
            &[
                vec![1, 2],       // 0
                vec![0, 2],       // 1
                vec![0, 1, 3],    // 2
                vec![2],          // 3
            ],
            HashMap::from([("pop".to_string(), vec![5, 10, 15, 20])]),
            HashMap::new(),
        )
    }

    #[test]
    fn csr_graph_construction() {
        let graph = make_test_graph();

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 8);

        // Offsets are cumulative neighbor counts, len = nodes + 1
        assert_eq!(graph.offsets, vec![0, 2, 4, 7, 8]);
        assert_eq!(graph.edges, vec![1, 2, 0, 2, 0, 1, 3, 2]);

        for window in graph.offsets.windows(2) { assert!(window[0] <= window[1]) }
    }

    #[test]
    fn degree_and_edge_access() {
        let graph = make_test_graph();

        assert_eq!(graph.degree(2), 3);
        assert_eq!(graph.degree(3), 1);
        assert_eq!(graph.edge(2, 2), Some(3));
        assert_eq!(graph.edge(2, 3), None);
        assert_eq!(graph.edges(2).collect::<Vec<_>>(), vec![0, 1, 3]);
    }

    #[test]
    fn undirected_edges_visits_each_edge_once() {
        let graph = make_test_graph();
        let edges = graph.undirected_edges().collect::<Vec<_>>();
        assert_eq!(edges, vec![(0, 1), (0, 2), (1, 2), (2, 3)]);
        assert_eq!(edges.len() * 2, graph.edge_count());
    }

    #[test]
    fn localities_are_interned_in_order() {
        let graph = make_test_graph().with_localities(&["B", "A", "B", "C"]);
        assert_eq!(graph.num_localities(), 3);
        assert_eq!(graph.locality(0), 0);
        assert_eq!(graph.locality(1), 1);
        assert_eq!(graph.locality(2), 0);
        assert_eq!(graph.locality_name(2), "C");
    }

    #[test]
    fn totals_and_defaults() {
        let graph = make_test_graph();
        assert_eq!(graph.total("pop"), Some(50.0));
        assert_eq!(graph.node_weight("pop", 3), Some(20.0));
        assert_eq!(graph.num_localities(), 1);
        assert_eq!(graph.geo_id(2), "2");
    }

    #[test]
    fn empty_graph_is_valid() {
        let graph = Graph::new(&[], HashMap::new(), HashMap::new());
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.offsets, vec![0]);
    }

    #[test]
    #[should_panic(expected = "edge (0, 1) must be symmetric")]
    fn new_panics_on_asymmetric_edges() {
        Graph::new(&[vec![1], vec![]], HashMap::new(), HashMap::new());
    }

    #[test]
    #[should_panic]
    fn degree_panics_for_out_of_bounds_node() {
        let graph = make_test_graph();
        graph.degree(graph.node_count());
    }
}
