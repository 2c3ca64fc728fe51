use std::sync::{
    Mutex, MutexGuard, PoisonError,
    atomic::{AtomicU32, AtomicU64, Ordering},
};

use crate::chain::Stage;

/// Best state observed across all workers.
///
/// Each stage has its own lower-is-better value cell, updated with a compare-and-swap
/// minimum so the value never regresses. The matching assignment lives in a separate slot.
/// Writers hold the slot's lock while they check the stage, lower the value and store the
/// assignment, so a stale stage never overwrites a later one. Readers do not: a reader may
/// briefly see a value whose assignment has not been stored yet.
#[derive(Debug)]
pub struct SharedBest {
    values: Vec<AtomicU64>, // f64 bits, one per stage
    stage: AtomicU32,
    assignment: Mutex<Vec<u32>>,
}

impl SharedBest {
    /// Start from the initial partition's stage, key and assignment.
    pub fn new(stage: Stage, value: f64, assignment: Vec<u32>) -> Self {
        let values = Stage::ALL.iter()
            .map(|&s| AtomicU64::new(if s == stage { value } else { f64::INFINITY }.to_bits()))
            .collect();
        Self { values, stage: AtomicU32::new(stage.index() as u32), assignment: Mutex::new(assignment) }
    }

    /// Highest stage any worker has reached.
    #[inline]
    pub fn stage(&self) -> Stage { Stage::from_index(self.stage.load(Ordering::Acquire) as usize) }

    /// Best value recorded for `stage`.
    #[inline]
    pub fn best(&self, stage: Stage) -> f64 {
        f64::from_bits(self.values[stage.index()].load(Ordering::Acquire))
    }

    /// Lower the best value for `stage` to `value`. Returns true if `value` was strictly better.
    pub fn offer(&self, stage: Stage, value: f64) -> bool {
        self.values[stage.index()]
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                (value < f64::from_bits(bits)).then_some(value.to_bits())
            })
            .is_ok()
    }

    /// Offer `value` and, if it wins, store `assignment` as the shared best.
    /// Publications for a stage behind the shared stage are ignored.
    pub fn publish(&self, stage: Stage, value: f64, assignment: &[u32]) -> bool {
        let mut slot = self.lock();
        if stage < self.stage() || !self.offer(stage, value) { return false }
        store(&mut slot, assignment);
        true
    }

    /// Move the shared stage forward to `stage`, seeding its best with `value` and `assignment`.
    /// Returns true if this call advanced the stage; otherwise the state is only published.
    pub fn advance(&self, stage: Stage, value: f64, assignment: &[u32]) -> bool {
        let mut slot = self.lock();
        let previous = self.stage.fetch_max(stage.index() as u32, Ordering::AcqRel);
        let advanced = previous < stage.index() as u32;
        let improved = previous <= stage.index() as u32 && self.offer(stage, value);
        if improved || advanced {
            store(&mut slot, assignment);
        }
        advanced
    }

    /// Copy of the shared best assignment.
    pub fn assignment(&self) -> Vec<u32> { self.lock().clone() }

    fn lock(&self) -> MutexGuard<'_, Vec<u32>> {
        self.assignment.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn store(slot: &mut Vec<u32>, assignment: &[u32]) {
    slot.clear();
    slot.extend_from_slice(assignment);
}
