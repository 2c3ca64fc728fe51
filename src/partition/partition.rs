use std::{collections::HashSet, sync::Arc};

use crate::{
    error::ChainError,
    graph::{Graph, WeightMatrix},
    partition::PartitionSet,
};

/// A total assignment of graph nodes to non-empty parts (districts), with cached
/// per-part weight totals and the list of cut edges.
///
/// Partitions are values: deriving a new partition (see [`Partition::with_moves`])
/// never links it to the one it came from.
#[derive(Clone, Debug)]
pub struct Partition {
    graph: Arc<Graph>,
    parts: PartitionSet,          // nodes in each part
    part_weights: WeightMatrix,   // per-part totals of every node weight series
    cut_edges: Vec<(u32, u32)>,   // undirected edges crossing parts, u < v
}

impl Partition {
    /// Construct a partition from one part id per node. Part ids must be dense:
    /// every id in `0..=max(assignments)` must own at least one node.
    pub fn new(graph: impl Into<Arc<Graph>>, assignments: Vec<u32>) -> Result<Self, ChainError> {
        let graph: Arc<Graph> = graph.into();

        if assignments.len() != graph.node_count() {
            return Err(ChainError::InvalidPartition(format!(
                "assignment covers {} nodes, graph has {}", assignments.len(), graph.node_count()
            )));
        }
        let Some(&max_part) = assignments.iter().max() else {
            return Err(ChainError::InvalidPartition("graph has no nodes".to_string()));
        };

        let num_parts = max_part as usize + 1;
        let parts = PartitionSet::from_assignments(num_parts, &assignments);
        if let Some(empty) = parts.iter_sets().position(|set| set.is_empty()) {
            return Err(ChainError::InvalidPartition(format!("part {empty} has no nodes")));
        }

        let part_weights = graph.node_weights().aggregate(&assignments, num_parts);
        let mut partition = Self { graph, parts, part_weights, cut_edges: Vec::new() };
        partition.rebuild_cut_edges();

        Ok(partition)
    }

    /// Get the number of parts in this partition.
    #[inline] pub fn num_parts(&self) -> u32 { self.parts.num_sets() as u32 }

    /// Get the number of nodes in the underlying graph.
    #[inline] pub fn num_nodes(&self) -> usize { self.graph.node_count() }

    /// Get a reference to the underlying graph.
    #[inline] pub fn graph(&self) -> &Graph { &self.graph }

    /// Get a shared handle to the underlying graph.
    #[inline] pub fn graph_handle(&self) -> Arc<Graph> { Arc::clone(&self.graph) }

    /// Get the part assignment of a given node.
    #[inline] pub fn assignment(&self, node: usize) -> u32 { self.parts.find(node) }

    /// Get a complete vector of assignments for each node.
    #[inline] pub fn assignments(&self) -> Vec<u32> { self.parts.assignments().to_vec() }

    /// Get the nodes currently assigned to `part`.
    #[inline] pub fn part(&self, part: u32) -> &[usize] { self.parts.get(part) }

    /// Get the list of weight series available for part totals.
    #[inline] pub fn series(&self) -> HashSet<String> { self.part_weights.series() }

    /// Sum of a given series for a specific part (0.0 if the series is missing).
    #[inline]
    pub fn part_total(&self, series: &str, part: u32) -> f64 {
        self.part_weights.get_as_f64(series, part as usize).unwrap_or(0.0)
    }

    /// Sum of a given series for each part.
    pub fn part_totals(&self, series: &str) -> Vec<f64> {
        (0..self.num_parts()).map(|part| self.part_total(series, part)).collect()
    }

    /// Get the total weight of the entire graph for a given series.
    #[inline]
    pub fn region_total(&self, series: &str) -> f64 { self.graph.total(series).unwrap_or(0.0) }

    /// Edges whose endpoints lie in different parts.
    #[inline] pub fn cut_edges(&self) -> &[(u32, u32)] { &self.cut_edges }

    /// Number of cut edges, the boundary-length proxy.
    #[inline] pub fn num_cut_edges(&self) -> usize { self.cut_edges.len() }

    /// Derive a new partition by reassigning nodes. Totals are updated incrementally.
    /// The caller is responsible for keeping every part non-empty.
    pub fn with_moves(&self, moves: impl IntoIterator<Item = (usize, u32)>) -> Partition {
        let mut next = self.clone();
        for (node, part) in moves {
            assert!(part < next.num_parts(), "part {part} out of range [0, {})", next.num_parts());
            let prev = next.parts.find(node);
            if prev == part { continue }

            next.part_weights.subtract_row_from(prev as usize, self.graph.node_weights(), node);
            next.part_weights.add_row_from(part as usize, self.graph.node_weights(), node);
            next.parts.move_to(node, part);
        }

        debug_assert!(next.parts.iter_sets().all(|set| !set.is_empty()), "moves must not empty a part");
        next.rebuild_cut_edges();
        next
    }

    /// Recompute the cut edge cache from scratch.
    fn rebuild_cut_edges(&mut self) {
        let parts = &self.parts;
        self.cut_edges = self.graph.undirected_edges()
            .filter(|&(u, v)| parts.find(u) != parts.find(v))
            .map(|(u, v)| (u as u32, v as u32))
            .collect();
    }
}
