#![doc = "districtwalk public API"]
mod chain;
mod config;
mod error;
mod graph;
mod metrics;
mod parallel;
mod partition;

pub mod io;

#[doc(inline)]
pub use chain::{
    BoundaryRule, Chain, ChainParams, Constraint, Goal, Proposal, Scorer, Scores, Stage, StageStrategy,
    Step, Strategy, Target, Targeting, Validator, Verdict, cut_edge_ceiling,
};

#[doc(inline)]
pub use config::RunConfig;

#[doc(inline)]
pub use error::ChainError;

#[doc(inline)]
pub use graph::Graph;

#[doc(inline)]
pub use metrics::{
    Election, ElectionComposite, LocalitySplits, MergeSplits, find_split_pair, fracking, fracking_merge,
    fracking_total_splits, fractional_seat_wins, most_imbalanced_pair, population_deviation,
    population_deviations, proportional_deviation, proportional_frac_deviation, total_splits,
};

#[doc(inline)]
pub use parallel::{ArtifactWriter, Coordinator, SharedBest, WorkerReport, Workflow};

#[doc(inline)]
pub use partition::{Partition, Recom};
