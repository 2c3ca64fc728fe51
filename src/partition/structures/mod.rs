mod partition_set;

pub(crate) use partition_set::PartitionSet;
