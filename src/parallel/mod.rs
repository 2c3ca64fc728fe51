//! Parallel search: independent workers reconciling through a shared best.

mod artifact;
mod coordinator;
mod shared;
mod worker;
mod workflow;

pub use artifact::ArtifactWriter;
pub use coordinator::{Coordinator, WorkerReport};
pub use shared::SharedBest;
pub use workflow::Workflow;
