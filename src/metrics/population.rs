use tracing::warn;

use crate::partition::Partition;

/// Ideal population of a single part, or None when the total is not positive.
fn ideal_population(partition: &Partition, pop_series: &str) -> Option<f64> {
    let ideal = partition.region_total(pop_series) / partition.num_parts() as f64;
    (ideal > 0.0).then_some(ideal)
}

/// Signed fractional deviation of each part from the ideal population.
/// A degenerate (non-positive) ideal yields all zeros.
pub fn population_deviations(partition: &Partition, pop_series: &str) -> Vec<f64> {
    let Some(ideal) = ideal_population(partition, pop_series) else {
        warn!(pop_series, "ideal population is not positive; deviations reported as zero");
        return vec![0.0; partition.num_parts() as usize];
    };

    partition.part_totals(pop_series).into_iter()
        .map(|pop| pop / ideal - 1.0)
        .collect()
}

/// Spread of the population deviation: `|max deviation| + |min deviation|`.
pub fn population_deviation(partition: &Partition, pop_series: &str) -> f64 {
    let deviations = population_deviations(partition, pop_series);
    let max = deviations.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = deviations.iter().copied().fold(f64::INFINITY, f64::min);
    max.abs() + min.abs()
}

/// The pair of adjacent parts with the largest population difference, ordered `(low, high)` by id.
pub fn most_imbalanced_pair(partition: &Partition, pop_series: &str) -> Option<(u32, u32)> {
    let totals = partition.part_totals(pop_series);

    let mut best = None;
    let mut best_gap = f64::NEG_INFINITY;
    for &(u, v) in partition.cut_edges() {
        let (a, b) = (partition.assignment(u as usize), partition.assignment(v as usize));
        let gap = (totals[a as usize] - totals[b as usize]).abs();
        if gap > best_gap {
            best_gap = gap;
            best = Some((a.min(b), a.max(b)));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc};

    use crate::graph::Graph;
    use super::*;

    /// Path 0 - 1 - 2 - 3 - 4 - 5 with the given populations.
    fn path(pops: Vec<i64>) -> Arc<Graph> {
        let n = pops.len();
        let edges = (0..n).map(|i| {
            let mut adj = Vec::new();
            if i > 0 { adj.push((i - 1) as u32) }
            if i + 1 < n { adj.push((i + 1) as u32) }
            adj
        }).collect::<Vec<_>>();
        Arc::new(Graph::new(&edges, HashMap::from([("pop".to_string(), pops)]), HashMap::new()))
    }

    #[test]
    fn deviation_sums_extremes() {
        // Ideal is 10; parts hold 12, 10, 8.
        let partition = Partition::new(path(vec![6, 6, 5, 5, 4, 4]), vec![0, 0, 1, 1, 2, 2]).unwrap();
        let deviations = population_deviations(&partition, "pop");
        assert!((deviations[0] - 0.2).abs() < 1e-12);
        assert!((deviations[2] + 0.2).abs() < 1e-12);
        assert!((population_deviation(&partition, "pop") - 0.4).abs() < 1e-12);
    }

    #[test]
    fn balanced_plan_has_zero_deviation() {
        let partition = Partition::new(path(vec![1; 6]), vec![0, 0, 1, 1, 2, 2]).unwrap();
        assert_eq!(population_deviation(&partition, "pop"), 0.0);
    }

    #[test]
    fn degenerate_population_is_zero() {
        let partition = Partition::new(path(vec![0; 6]), vec![0, 0, 0, 1, 1, 1]).unwrap();
        assert_eq!(population_deviation(&partition, "pop"), 0.0);
        assert_eq!(population_deviation(&partition, "missing"), 0.0);
    }

    #[test]
    fn imbalanced_pair_is_adjacent_extreme() {
        // Parts hold 14, 10, 8 along the path; 0 and 2 are not adjacent.
        let partition = Partition::new(path(vec![7, 7, 5, 5, 4, 4]), vec![0, 0, 1, 1, 2, 2]).unwrap();
        assert_eq!(most_imbalanced_pair(&partition, "pop"), Some((0, 1)));

        let single = Partition::new(path(vec![1; 6]), vec![0; 6]).unwrap();
        assert_eq!(most_imbalanced_pair(&single, "pop"), None);
    }

    #[test]
    fn metrics_are_idempotent() {
        let partition = Partition::new(path(vec![3, 1, 4, 1, 5, 9]), vec![0, 0, 1, 1, 1, 2]).unwrap();
        assert_eq!(population_deviation(&partition, "pop"), population_deviation(&partition, "pop"));
        assert_eq!(most_imbalanced_pair(&partition, "pop"), most_imbalanced_pair(&partition, "pop"));
    }
}
