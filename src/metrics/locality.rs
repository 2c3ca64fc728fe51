use std::collections::VecDeque;

use rand::{rngs::StdRng, seq::{IndexedRandom, SliceRandom}};
use smallvec::SmallVec;

use crate::partition::Partition;

/// Per-locality breakdown of a partition: which parts touch each locality and into how
/// many connected pieces each part's share of the locality falls.
#[derive(Clone, Debug)]
pub struct LocalitySplits {
    /// entries[locality] = (part, pieces) for each part touching the locality, sorted by part.
    entries: Vec<SmallVec<[(u32, u32); 4]>>,
}

/// Result of [`fracking_merge`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergeSplits {
    pub fracking: usize,
    /// Number of localities touched by both merged parts.
    pub shared_localities: usize,
    pub total_splits: usize,
}

impl MergeSplits {
    /// True when the merged parts share more than one locality.
    #[inline] pub fn doubly_split(&self) -> bool { self.shared_localities > 1 }
}

impl LocalitySplits {
    /// Label the connected components of every (locality, part) induced subgraph in one pass.
    pub fn new(partition: &Partition) -> Self {
        let graph = partition.graph();
        let mut entries = vec![SmallVec::<[(u32, u32); 4]>::new(); graph.num_localities()];
        let mut visited = vec![false; partition.num_nodes()];
        let mut queue = VecDeque::new();

        for start in 0..partition.num_nodes() {
            if visited[start] { continue }

            let (locality, part) = (graph.locality(start), partition.assignment(start));
            visited[start] = true;
            queue.push_back(start);
            while let Some(node) = queue.pop_front() {
                for neighbor in graph.edges(node) {
                    if !visited[neighbor]
                        && graph.locality(neighbor) == locality
                        && partition.assignment(neighbor) == part
                    {
                        visited[neighbor] = true;
                        queue.push_back(neighbor);
                    }
                }
            }

            let entry = &mut entries[locality as usize];
            match entry.iter_mut().find(|(p, _)| *p == part) {
                Some((_, pieces)) => *pieces += 1,
                None => entry.push((part, 1)),
            }
        }

        entries.iter_mut().for_each(|entry| entry.sort_unstable_by_key(|&(part, _)| part));
        Self { entries }
    }

    /// Number of localities tracked (including any with no nodes).
    #[inline] pub fn num_localities(&self) -> usize { self.entries.len() }

    /// Parts that intersect a locality, in ascending order.
    pub fn parts(&self, locality: u32) -> impl Iterator<Item = u32> + '_ {
        self.entries[locality as usize].iter().map(|&(part, _)| part)
    }

    /// Number of connected pieces of `part` inside `locality` (0 if it does not touch it).
    pub fn pieces(&self, locality: u32, part: u32) -> u32 {
        self.entries[locality as usize].iter()
            .find_map(|&(p, pieces)| (p == part).then_some(pieces))
            .unwrap_or(0)
    }

    /// Pieces there would be if each part held its share of every locality in one piece.
    pub fn expected_pieces(&self) -> usize { self.entries.iter().map(|entry| entry.len()).sum() }

    /// Pieces actually formed by cutting the graph along locality and part boundaries.
    pub fn actual_pieces(&self) -> usize {
        self.entries.iter().flatten().map(|&(_, pieces)| pieces as usize).sum()
    }

    /// Excess pieces over the expected count.
    #[inline] pub fn fracking(&self) -> usize { self.actual_pieces() - self.expected_pieces() }

    /// Sum over localities of (parts touching it - 1).
    pub fn total_splits(&self) -> usize {
        self.entries.iter().map(|entry| entry.len().saturating_sub(1)).sum()
    }

    /// Check whether any part's share of `locality` is disconnected.
    pub fn is_fractured(&self, locality: u32) -> bool {
        self.entries[locality as usize].iter().any(|&(_, pieces)| pieces > 1)
    }

    /// Number of localities touched by both `a` and `b`.
    pub fn shared_localities(&self, a: u32, b: u32) -> usize {
        self.entries.iter()
            .filter(|entry| {
                entry.iter().any(|&(part, _)| part == a) && entry.iter().any(|&(part, _)| part == b)
            })
            .count()
    }

    /// Every (locality, part) whose share of the locality falls into more than one piece.
    pub fn fractured(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.entries.iter().enumerate().flat_map(|(locality, entry)| {
            entry.iter()
                .filter(|&&(_, pieces)| pieces > 1)
                .map(move |&(part, _)| (locality as u32, part))
        })
    }
}

/// Excess locality fragments created by part boundaries. Zero iff every part's share
/// of every locality is connected.
pub fn fracking(partition: &Partition) -> usize {
    LocalitySplits::new(partition).fracking()
}

/// Total number of locality splits, Σ(parts touching locality - 1).
pub fn total_splits(partition: &Partition) -> usize {
    LocalitySplits::new(partition).total_splits()
}

/// Fracking and total splits from a single traversal.
pub fn fracking_total_splits(partition: &Partition) -> (usize, usize) {
    let splits = LocalitySplits::new(partition);
    (splits.fracking(), splits.total_splits())
}

/// Fracking, total splits and the number of localities shared by parts `a` and `b`.
pub fn fracking_merge(partition: &Partition, a: u32, b: u32) -> MergeSplits {
    let splits = LocalitySplits::new(partition);
    MergeSplits {
        fracking: splits.fracking(),
        shared_localities: splits.shared_localities(a, b),
        total_splits: splits.total_splits(),
    }
}

/// Locate a fractured locality and a pair of parts occupying it, as `((low, high), locality)`.
///
/// A fractured (locality, part) entry is drawn at random. If exactly two parts touch the
/// locality they are returned; otherwise a random cut edge inside the locality with one
/// endpoint in the fractured part supplies the pair. Entries with no such edge are skipped.
pub fn find_split_pair(partition: &Partition, rng: &mut StdRng) -> Option<((u32, u32), u32)> {
    let splits = LocalitySplits::new(partition);
    let mut fractured = splits.fractured().collect::<Vec<_>>();
    fractured.shuffle(rng);

    let graph = partition.graph();
    for (locality, part) in fractured {
        let parts = splits.parts(locality).collect::<SmallVec<[u32; 4]>>();
        if let [a, b] = parts[..] { return Some(((a, b), locality)) }

        let candidates = partition.cut_edges().iter()
            .filter(|&&(u, v)| {
                graph.locality(u as usize) == locality
                    && graph.locality(v as usize) == locality
                    && (partition.assignment(u as usize) == part || partition.assignment(v as usize) == part)
            })
            .collect::<Vec<_>>();

        if let Some(&&(u, v)) = candidates.choose(rng) {
            let (a, b) = (partition.assignment(u as usize), partition.assignment(v as usize));
            return Some(((a.min(b), a.max(b)), locality));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc};

    use rand::SeedableRng;

    use crate::graph::Graph;
    use super::*;

    /// Cycle 0 - 1 - 2 - 3 - 4 - 5 - 0, nodes 0..=4 in locality X and node 5 in Y.
    fn ring() -> Arc<Graph> {
        let edges = (0..6u32).map(|i| vec![(i + 5) % 6, (i + 1) % 6]).collect::<Vec<_>>();
        Arc::new(
            Graph::new(&edges, HashMap::from([("pop".to_string(), vec![1; 6])]), HashMap::new())
                .with_localities(&["X", "X", "X", "X", "X", "Y"]),
        )
    }

    #[test]
    fn contiguous_shares_are_not_fracked() {
        // A = {0, 1, 5}, B = {2, 3, 4}: each part's share of X is a path.
        let partition = Partition::new(ring(), vec![0, 0, 1, 1, 1, 0]).unwrap();
        assert_eq!(fracking(&partition), 0);
        assert_eq!(total_splits(&partition), 1);
    }

    #[test]
    fn disconnected_pocket_adds_one_piece() {
        // A = {0, 1, 4, 5}, B = {2, 3}: A's share of X is {0, 1} and {4}, joined only through Y.
        let partition = Partition::new(ring(), vec![0, 0, 1, 1, 0, 0]).unwrap();
        let splits = LocalitySplits::new(&partition);

        assert_eq!(splits.expected_pieces(), 3);
        assert_eq!(splits.actual_pieces(), 4);
        assert_eq!(splits.fracking(), 1);
        assert_eq!(splits.pieces(0, 0), 2);
        assert!(splits.is_fractured(0));
        assert!(!splits.is_fractured(1));
        assert_eq!(splits.fractured().collect::<Vec<_>>(), vec![(0, 0)]);
    }

    #[test]
    fn combined_and_separate_counts_agree() {
        let partition = Partition::new(ring(), vec![0, 0, 1, 1, 0, 0]).unwrap();
        assert_eq!(fracking_total_splits(&partition), (fracking(&partition), total_splits(&partition)));

        let merge = fracking_merge(&partition, 0, 1);
        assert_eq!(merge, MergeSplits { fracking: 1, shared_localities: 1, total_splits: 1 });
        assert!(!merge.doubly_split());
    }

    #[test]
    fn find_split_pair_returns_the_two_parts() {
        let partition = Partition::new(ring(), vec![0, 0, 1, 1, 0, 0]).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(find_split_pair(&partition, &mut rng), Some(((0, 1), 0)));

        let clean = Partition::new(ring(), vec![0, 0, 1, 1, 1, 0]).unwrap();
        assert_eq!(find_split_pair(&clean, &mut rng), None);
    }

    #[test]
    fn find_split_pair_probes_cut_edges_with_many_parts() {
        // Parts: A = {0, 4, 5}, B = {1}, C = {2, 3}. A's share of X is {0} and {4}.
        let partition = Partition::new(ring(), vec![0, 1, 2, 2, 0, 0]).unwrap();
        let mut rng = StdRng::seed_from_u64(9);

        for _ in 0..10 {
            let ((a, b), locality) = find_split_pair(&partition, &mut rng).unwrap();
            assert_eq!(locality, 0);
            assert!(a == 0 && (b == 1 || b == 2));
        }
    }

    #[test]
    fn shared_localities_count_both_parts() {
        let graph = Arc::new(
            Graph::new(
                &[vec![1], vec![0, 2], vec![1, 3], vec![2]],
                HashMap::from([("pop".to_string(), vec![1; 4])]),
                HashMap::new(),
            )
            .with_localities(&["X", "X", "Y", "Y"]),
        );
        let partition = Partition::new(graph, vec![0, 1, 0, 1]).unwrap();
        let merge = fracking_merge(&partition, 0, 1);
        assert_eq!(merge.shared_localities, 2);
        assert!(merge.doubly_split());
        assert_eq!(merge.total_splits, 2);
    }
}
