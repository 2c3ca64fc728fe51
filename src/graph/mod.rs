mod graph;
mod weights;

pub use graph::Graph;
pub(crate) use weights::WeightMatrix;
