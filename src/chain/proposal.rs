use rand::rngs::StdRng;

use crate::partition::Partition;

/// Where a proposal should act.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// Recombine these two parts.
    Pair(u32, u32),
    /// Recombine two parts that share a fractured locality.
    Fracked(u32, u32),
    /// Let the generator choose.
    Anywhere,
}

impl Target {
    /// The explicit part pair, if any.
    pub fn pair(&self) -> Option<(u32, u32)> {
        match *self {
            Target::Pair(a, b) | Target::Fracked(a, b) => Some((a, b)),
            Target::Anywhere => None,
        }
    }
}

/// Generates a candidate repartition. Returning None means no valid candidate was found,
/// which the chain treats as a rejected step.
pub trait Proposal: Send + Sync {
    fn propose(&self, partition: &Partition, target: &Target, rng: &mut StdRng) -> Option<Partition>;
}

impl<F> Proposal for F
where
    F: Fn(&Partition, &Target, &mut StdRng) -> Option<Partition> + Send + Sync,
{
    fn propose(&self, partition: &Partition, target: &Target, rng: &mut StdRng) -> Option<Partition> {
        self(partition, target, rng)
    }
}
