use serde::Serialize;

use crate::{
    chain::Target,
    metrics::{self, Election, LocalitySplits},
    partition::Partition,
};

/// Metric snapshot of one partition.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Scores {
    pub population_deviation: f64,
    pub fracking: usize,
    pub splits: usize,
    /// Localities shared by the target pair (0 when the step had no explicit pair).
    pub shared_localities: usize,
    pub cut_edges: usize,
    pub seats: Option<f64>,
    pub proportional_deviation: Option<f64>,
}

/// Computes [`Scores`] for partitions under a fixed metric configuration.
#[derive(Clone, Debug)]
pub struct Scorer {
    pop_series: String,
    elections: Vec<Election>,
    win_volatility: f64,
    target_seats: Option<f64>,
}

impl Scorer {
    pub fn new(pop_series: impl Into<String>) -> Self {
        Self { pop_series: pop_series.into(), elections: Vec::new(), win_volatility: 0.0, target_seats: None }
    }

    /// Score seat outcomes over `elections` with the given win volatility.
    pub fn with_elections(mut self, elections: Vec<Election>, win_volatility: f64) -> Self {
        self.elections = elections;
        self.win_volatility = win_volatility;
        self
    }

    /// Also score the distance to `target_seats` expected wins.
    pub fn with_target_seats(mut self, target_seats: f64) -> Self {
        self.target_seats = Some(target_seats);
        self
    }

    #[inline] pub fn pop_series(&self) -> &str { &self.pop_series }

    #[inline] pub fn elections(&self) -> &[Election] { &self.elections }

    #[inline] pub fn has_elections(&self) -> bool { !self.elections.is_empty() }

    /// Score a partition; `target` supplies the pair for the shared-locality count.
    pub fn score(&self, partition: &Partition, target: &Target) -> Scores {
        let splits = LocalitySplits::new(partition);
        let seats = self.has_elections()
            .then(|| metrics::fractional_seat_wins(partition, &self.elections, self.win_volatility));

        Scores {
            population_deviation: metrics::population_deviation(partition, &self.pop_series),
            fracking: splits.fracking(),
            splits: splits.total_splits(),
            shared_localities: target.pair().map_or(0, |(a, b)| splits.shared_localities(a, b)),
            cut_edges: partition.num_cut_edges(),
            proportional_deviation: self.target_seats.zip(seats)
                .map(|(target, seats)| (target - seats).abs() / partition.num_parts() as f64),
            seats,
        }
    }
}
