use std::{fmt, sync::Arc};

use crate::{error::ChainError, metrics, partition::Partition};

type Predicate = Arc<dyn Fn(&Partition) -> bool + Send + Sync>;

/// A named hard constraint on partitions.
#[derive(Clone)]
pub struct Constraint {
    name: String,
    check: Predicate,
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Constraint {
    pub fn new(name: impl Into<String>, check: impl Fn(&Partition) -> bool + Send + Sync + 'static) -> Self {
        Self { name: name.into(), check: Arc::new(check) }
    }

    #[inline] pub fn name(&self) -> &str { &self.name }

    #[inline] pub fn check(&self, partition: &Partition) -> bool { (self.check)(partition) }

    /// Every part is connected.
    pub fn contiguous() -> Self {
        Self::new("contiguous", Partition::is_contiguous)
    }

    /// Population deviation at most `max_deviation`.
    pub fn population_within(pop_series: impl Into<String>, max_deviation: f64) -> Self {
        let pop_series = pop_series.into();
        Self::new("population_within", move |p| metrics::population_deviation(p, &pop_series) <= max_deviation)
    }

    /// No locality is fractured.
    pub fn no_fracking() -> Self {
        Self::new("no_fracking", |p| metrics::fracking(p) == 0)
    }

    /// At most `limit` cut edges.
    pub fn cut_edges_at_most(limit: usize) -> Self {
        Self::new("cut_edges_at_most", move |p| p.num_cut_edges() <= limit)
    }
}

/// A set of constraints checked together.
#[derive(Clone, Debug, Default)]
pub struct Validator {
    constraints: Vec<Constraint>,
}

impl Validator {
    pub fn new(constraints: Vec<Constraint>) -> Self { Self { constraints } }

    #[inline] pub fn constraints(&self) -> &[Constraint] { &self.constraints }

    /// Check every constraint, stopping at the first failure.
    pub fn is_valid(&self, partition: &Partition) -> bool {
        self.constraints.iter().all(|constraint| constraint.check(partition))
    }

    /// Names of every constraint the partition fails.
    pub fn failures(&self, partition: &Partition) -> Vec<String> {
        self.constraints.iter()
            .filter(|constraint| !constraint.check(partition))
            .map(|constraint| constraint.name.clone())
            .collect()
    }

    /// Error listing every failed constraint, if any.
    pub fn validate(&self, partition: &Partition) -> Result<(), ChainError> {
        let failed = self.failures(partition);
        if failed.is_empty() { Ok(()) } else { Err(ChainError::InvalidInitialState { failed }) }
    }
}

impl From<Vec<Constraint>> for Validator {
    fn from(constraints: Vec<Constraint>) -> Self { Self::new(constraints) }
}
