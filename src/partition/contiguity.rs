use std::collections::VecDeque;

use crate::partition::Partition;

impl Partition {
    /// Check whether every part induces a connected subgraph.
    pub fn is_contiguous(&self) -> bool {
        (0..self.num_parts()).all(|part| self.part_is_contiguous(part))
    }

    /// Check whether a single part induces a connected subgraph.
    pub fn part_is_contiguous(&self, part: u32) -> bool {
        let nodes = self.part(part);
        let Some(&start) = nodes.first() else { return true };

        self.reachable_within(start, |node| self.assignment(node) == part) == nodes.len()
    }

    /// Count nodes reachable from `start` through nodes accepted by `inside`.
    pub(crate) fn reachable_within(&self, start: usize, inside: impl Fn(usize) -> bool) -> usize {
        let mut visited = vec![false; self.num_nodes()];
        let mut queue = VecDeque::from([start]);
        visited[start] = true;

        let mut count = 0;
        while let Some(node) = queue.pop_front() {
            count += 1;
            for neighbor in self.graph().edges(node) {
                if !visited[neighbor] && inside(neighbor) {
                    visited[neighbor] = true;
                    queue.push_back(neighbor);
                }
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc};

    use crate::graph::Graph;
    use super::*;

    /// Path graph 0 - 1 - 2 - 3.
    fn path() -> Arc<Graph> {
        Arc::new(Graph::new(
            &[vec![1], vec![0, 2], vec![1, 3], vec![2]],
            HashMap::from([("pop".to_string(), vec![1; 4])]),
            HashMap::new(),
        ))
    }

    #[test]
    fn contiguous_parts() {
        let partition = Partition::new(path(), vec![0, 0, 1, 1]).unwrap();
        assert!(partition.is_contiguous());
    }

    #[test]
    fn detects_disconnected_part() {
        let partition = Partition::new(path(), vec![0, 1, 0, 1]).unwrap();
        assert!(!partition.part_is_contiguous(0));
        assert!(!partition.is_contiguous());
    }

    #[test]
    fn reachable_within_respects_filter() {
        let partition = Partition::new(path(), vec![0, 0, 0, 0]).unwrap();
        assert_eq!(partition.reachable_within(0, |node| node != 2), 2);
        assert_eq!(partition.reachable_within(3, |_| true), 4);
    }
}
