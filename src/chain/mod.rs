mod chain;
mod constraints;
mod proposal;
mod scores;
mod stage;
mod strategy;

pub use chain::{Chain, ChainParams, Step};
pub use constraints::{Constraint, Validator};
pub use proposal::{Proposal, Target};
pub use scores::{Scorer, Scores};
pub use stage::Stage;
pub use strategy::{BoundaryRule, Goal, StageStrategy, Strategy, Targeting, Verdict, cut_edge_ceiling};
