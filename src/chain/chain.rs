use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    chain::{Proposal, Scorer, Scores, Stage, StageStrategy, Strategy, Target, Validator, Verdict},
    error::ChainError,
    partition::Partition,
};

/// Numeric knobs shared by every strategy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainParams {
    /// Proposal attempts (including the baseline) before the chain ends.
    pub total_steps: usize,
    /// Consecutive rejections per relaxation step of the cut-edge bound.
    pub cutoff: usize,
    /// Fractional relaxation of the cut-edge bound per `cutoff` rejections.
    pub margin: f64,
    /// Fixed cut-edge allowance for strategies with a fixed boundary rule.
    pub boundary_margin: f64,
    /// Maximum fractional growth of expected seats per accepted step.
    pub win_margin: Option<f64>,
    pub max_splits: Option<usize>,
    pub seat_floor: f64,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            total_steps: 1000,
            cutoff: 100,
            margin: 0.001,
            boundary_margin: 0.0,
            win_margin: None,
            max_splits: None,
            seat_floor: 0.0,
        }
    }
}

/// Record emitted for every step of the walk.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Step {
    pub counter: usize,
    pub stage: Stage,
    /// Kept and worth publishing.
    pub good: bool,
    /// The candidate replaced the current state.
    pub accepted: bool,
    /// Consecutive rejections after this step.
    pub tries: usize,
    /// Scores of the evaluated candidate, or of the current state if none was evaluated.
    pub scores: Scores,
}

type AcceptFn = Box<dyn Fn(&Partition) -> bool + Send + Sync>;

/// Staged acceptance controller: a resumable walk that yields one [`Step`] per proposal
/// attempt until the step budget is exhausted.
///
/// Only the current partition is retained; rejected candidates are dropped at the end
/// of their step.
pub struct Chain<'a, S: Strategy = StageStrategy> {
    proposal: &'a dyn Proposal,
    strategy: S,
    validator: Validator,
    accept: AcceptFn,
    scorer: &'a Scorer,
    params: ChainParams,
    rng: &'a mut StdRng,
    state: Partition,
    baseline: Scores,
    tries: usize,
    counter: usize,
}

impl<'a, S: Strategy> Chain<'a, S> {
    /// Build a chain from a valid initial state. Fails listing every constraint the state violates.
    pub fn new(
        proposal: &'a dyn Proposal,
        strategy: S,
        validator: Validator,
        scorer: &'a Scorer,
        params: ChainParams,
        initial: Partition,
        rng: &'a mut StdRng,
    ) -> Result<Self, ChainError> {
        validator.validate(&initial)?;

        let baseline = strategy.evaluate(&initial, &Target::Anywhere, scorer);
        Ok(Self {
            proposal,
            strategy,
            validator,
            accept: Box::new(|_: &Partition| true),
            scorer,
            params,
            rng,
            state: initial,
            baseline,
            tries: 0,
            counter: 0,
        })
    }

    /// Add a soft accept predicate, checked after the hard constraints.
    pub fn with_accept(mut self, accept: impl Fn(&Partition) -> bool + Send + Sync + 'static) -> Self {
        self.accept = Box::new(accept);
        self
    }

    #[inline] pub fn current(&self) -> &Partition { &self.state }

    /// Scores of the current comparison baseline.
    #[inline] pub fn baseline(&self) -> &Scores { &self.baseline }

    #[inline] pub fn strategy(&self) -> &S { &self.strategy }

    #[inline] pub fn stage(&self) -> Stage { self.strategy.stage() }

    #[inline] pub fn tries(&self) -> usize { self.tries }

    #[inline] pub fn counter(&self) -> usize { self.counter }

    #[inline] pub fn params(&self) -> &ChainParams { &self.params }

    /// Replace the current state (e.g. with a peer's better partition), re-scoring the
    /// baseline and clearing the stall counter. The step counter is kept.
    pub fn restart(&mut self, partition: Partition) {
        self.baseline = self.strategy.evaluate(&partition, &Target::Anywhere, self.scorer);
        self.state = partition;
        self.tries = 0;
    }

    fn rejected(&mut self, counter: usize, scores: Scores, reason: &str) -> Step {
        self.tries += 1;
        debug!(counter, tries = self.tries, reason, "rejected");
        Step { counter, stage: self.stage(), good: false, accepted: false, tries: self.tries, scores }
    }
}

impl<S: Strategy> Iterator for Chain<'_, S> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        if self.counter >= self.params.total_steps { return None }

        let counter = self.counter;
        self.counter += 1;

        if counter == 0 {
            return Some(Step {
                counter,
                stage: self.stage(),
                good: true,
                accepted: true,
                tries: 0,
                scores: self.baseline.clone(),
            });
        }

        let target = self.strategy.select_target(&self.state, self.scorer, self.rng);
        let Some(candidate) = self.proposal.propose(&self.state, &target, self.rng) else {
            return Some(self.rejected(counter, self.baseline.clone(), "no candidate"));
        };

        if !self.validator.is_valid(&candidate) || !(self.accept)(&candidate) {
            return Some(self.rejected(counter, self.baseline.clone(), "constraint"));
        }

        let scores = self.strategy.evaluate(&candidate, &target, self.scorer);
        match self.strategy.accept(&self.baseline, &scores, self.tries, &self.params) {
            Verdict::Reject => Some(self.rejected(counter, scores, "no improvement")),
            Verdict::Keep { reportable } => {
                debug!(counter, reportable, key = self.strategy.key(&scores), "accepted");
                self.baseline = self.strategy.rebase(&self.baseline, &scores);
                self.state = candidate;
                self.tries = 0;
                Some(Step { counter, stage: self.stage(), good: reportable, accepted: true, tries: 0, scores })
            }
        }
    }
}
