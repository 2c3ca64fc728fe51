mod electoral;
mod locality;
mod population;

pub use electoral::{Election, ElectionComposite, fractional_seat_wins, proportional_deviation, proportional_frac_deviation};
pub use locality::{LocalitySplits, MergeSplits, find_split_pair, fracking, fracking_merge, fracking_total_splits, total_splits};
pub use population::{most_imbalanced_pair, population_deviation, population_deviations};
