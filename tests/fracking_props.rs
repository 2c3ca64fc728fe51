// Locality-split invariants over random plans on a 4x4 lattice.

mod common;

use std::collections::VecDeque;

use districtwalk::{
    LocalitySplits, Partition, fracking, fracking_merge, fracking_total_splits, population_deviation, total_splits,
};
use proptest::prelude::*;

const SIDE: usize = 4;

prop_compose! {
    fn arb_plan()(
        raw in proptest::collection::vec(0u32..4, SIDE * SIDE),
        localities in proptest::collection::vec(prop::sample::select(vec!["A", "B", "C"]), SIDE * SIDE),
        population in proptest::collection::vec(1i64..50, SIDE * SIDE),
    ) -> Partition {
        let graph = common::grid(SIDE, SIDE, &population, &localities);
        common::partition(graph, common::dense(&raw))
    }
}

/// Connected pieces of every (locality, part) cell, counted by a plain BFS per cell.
fn brute_force_fracking(partition: &Partition) -> usize {
    let graph = partition.graph();
    let cell = |node: usize| (graph.locality(node), partition.assignment(node));

    let mut seen = vec![false; graph.node_count()];
    let mut pieces = 0;
    let mut cells = std::collections::HashSet::new();
    for start in 0..graph.node_count() {
        cells.insert(cell(start));
        if seen[start] { continue }
        pieces += 1;
        seen[start] = true;
        let mut queue = VecDeque::from([start]);
        while let Some(u) = queue.pop_front() {
            for v in graph.edges(u) {
                if !seen[v] && cell(v) == cell(start) {
                    seen[v] = true;
                    queue.push_back(v);
                }
            }
        }
    }
    pieces - cells.len()
}

proptest! {
    #[test]
    fn fracking_counts_excess_pieces(plan in arb_plan()) {
        prop_assert_eq!(fracking(&plan), brute_force_fracking(&plan));
    }

    #[test]
    fn combined_and_separate_counts_agree(plan in arb_plan()) {
        let (combined_fracking, combined_splits) = fracking_total_splits(&plan);
        prop_assert_eq!(combined_fracking, fracking(&plan));
        prop_assert_eq!(combined_splits, total_splits(&plan));

        let merge = fracking_merge(&plan, 0, plan.num_parts() - 1);
        prop_assert_eq!(merge.fracking, combined_fracking);
        prop_assert_eq!(merge.total_splits, combined_splits);
    }

    #[test]
    fn metrics_are_idempotent(plan in arb_plan()) {
        prop_assert_eq!(fracking(&plan), fracking(&plan));
        prop_assert_eq!(total_splits(&plan), total_splits(&plan));
        prop_assert_eq!(
            population_deviation(&plan, "TOTPOP").to_bits(),
            population_deviation(&plan, "TOTPOP").to_bits()
        );

        let first = LocalitySplits::new(&plan);
        let second = LocalitySplits::new(&plan);
        prop_assert_eq!(first.fractured().collect::<Vec<_>>(), second.fractured().collect::<Vec<_>>());
    }

    #[test]
    fn unfracked_iff_every_cell_is_connected(plan in arb_plan()) {
        let splits = LocalitySplits::new(&plan);
        let any_fractured = (0..splits.num_localities() as u32).any(|l| splits.is_fractured(l));
        prop_assert_eq!(fracking(&plan) == 0, !any_fractured);
    }
}
