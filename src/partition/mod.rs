mod contiguity;
mod partition;
mod recombine;
mod structures;

pub(crate) use structures::PartitionSet;
pub use partition::Partition;
pub use recombine::Recom;
