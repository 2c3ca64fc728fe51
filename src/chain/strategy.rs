use rand::{rngs::StdRng, seq::IndexedRandom};

use crate::{
    chain::{ChainParams, Scorer, Scores, Stage, Target},
    metrics,
    partition::Partition,
};

/// Outcome of comparing a candidate against the current state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Reject,
    /// Replace the current state. `reportable` steps are worth publishing.
    Keep { reportable: bool },
}

/// Objective and acceptance rule driving one chain.
pub trait Strategy: Send + Sync {
    /// Stage this strategy belongs to.
    fn stage(&self) -> Stage;

    /// Choose where the next proposal should act.
    fn select_target(&self, partition: &Partition, scorer: &Scorer, rng: &mut StdRng) -> Target;

    /// Score a candidate.
    fn evaluate(&self, candidate: &Partition, target: &Target, scorer: &Scorer) -> Scores {
        scorer.score(candidate, target)
    }

    /// Decide whether `new` replaces `old` after `tries` consecutive rejections.
    fn accept(&self, old: &Scores, new: &Scores, tries: usize, params: &ChainParams) -> Verdict;

    /// Baseline to compare future candidates against once `new` has been kept.
    fn rebase(&self, _old: &Scores, new: &Scores) -> Scores { new.clone() }

    /// Lower-is-better value used to rank states across workers.
    fn key(&self, scores: &Scores) -> f64;
}

/// Quantity a [`StageStrategy`] tries to improve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Goal {
    /// Population deviation strictly decreases.
    PopulationDeviation,
    /// Fracking strictly decreases.
    Fracking,
    /// Total splits stay within `max_splits`; reportable when cut edges strictly decrease.
    Smoothing,
    /// Cut edges strictly decrease.
    CutEdges,
    /// Proportional seat deviation strictly decreases.
    ProportionalDeviation,
    /// Splits never increase and seats never drop unless already at the floor;
    /// reportable when seats strictly increase.
    Polish,
    /// Total splits strictly decrease.
    TotalSplits,
}

/// How proposals are aimed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Targeting {
    /// The adjacent pair with the largest population gap.
    ImbalancedPair,
    /// A pair sharing a fractured locality.
    FrackedPair,
    /// The pair across a uniformly random cut edge.
    RandomCutEdge,
    /// No target.
    Anywhere,
}

/// Bound on the candidate's cut edges relative to the current state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryRule {
    /// `new <= old * (1 + floor(tries / cutoff) * margin)`.
    Relaxing,
    /// `new <= old * (1 + boundary_margin)`.
    Fixed,
    Unchecked,
}

/// Admissible cut-edge count after `tries` consecutive rejections. A zero cutoff never relaxes.
pub fn cut_edge_ceiling(old_cut_edges: usize, tries: usize, cutoff: usize, margin: f64) -> f64 {
    let steps = tries.checked_div(cutoff).unwrap_or(0);
    old_cut_edges as f64 * (1.0 + steps as f64 * margin)
}

/// The configurable strategy behind every stage and single-goal workflow.
#[derive(Clone, Debug)]
pub struct StageStrategy {
    pub stage: Stage,
    pub goal: Goal,
    pub targeting: Targeting,
    pub boundary: BoundaryRule,
    pub forbid_double_split: bool,
    pub require_unfracked: bool,
}

impl StageStrategy {
    fn of(stage: Stage, goal: Goal, targeting: Targeting, boundary: BoundaryRule) -> Self {
        Self { stage, goal, targeting, boundary, forbid_double_split: false, require_unfracked: false }
    }

    fn forbidding_double_split(mut self) -> Self {
        self.forbid_double_split = true;
        self
    }

    /// Stage 0 of the combined workflow.
    pub fn population_balance() -> Self {
        Self::of(Stage::PopulationBalance, Goal::PopulationDeviation, Targeting::ImbalancedPair, BoundaryRule::Relaxing)
            .forbidding_double_split()
    }

    /// Stage 1 of the combined workflow.
    pub fn defrack() -> Self {
        Self::of(Stage::Defrack, Goal::Fracking, Targeting::FrackedPair, BoundaryRule::Relaxing)
    }

    /// Stage 2 of the combined workflow.
    pub fn smoothing() -> Self {
        Self::of(Stage::Smoothing, Goal::Smoothing, Targeting::Anywhere, BoundaryRule::Relaxing)
    }

    pub fn balance_only() -> Self {
        Self::of(Stage::PopulationBalance, Goal::PopulationDeviation, Targeting::ImbalancedPair, BoundaryRule::Fixed)
            .forbidding_double_split()
    }

    pub fn defrack_only() -> Self {
        Self::of(Stage::Defrack, Goal::Fracking, Targeting::FrackedPair, BoundaryRule::Fixed)
    }

    pub fn compactness() -> Self {
        Self { require_unfracked: true, ..Self::of(Stage::Smoothing, Goal::CutEdges, Targeting::RandomCutEdge, BoundaryRule::Unchecked) }
            .forbidding_double_split()
    }

    pub fn proportional() -> Self {
        Self::of(Stage::Smoothing, Goal::ProportionalDeviation, Targeting::RandomCutEdge, BoundaryRule::Unchecked)
            .forbidding_double_split()
    }

    pub fn polish() -> Self {
        Self::of(Stage::Smoothing, Goal::Polish, Targeting::Anywhere, BoundaryRule::Unchecked)
    }

    pub fn split_reduction() -> Self {
        Self::of(Stage::Smoothing, Goal::TotalSplits, Targeting::Anywhere, BoundaryRule::Unchecked)
    }

    /// Strategy for a stage of the combined workflow, or None for `Terminal`.
    pub fn for_stage(stage: Stage) -> Option<Self> {
        match stage {
            Stage::PopulationBalance => Some(Self::population_balance()),
            Stage::Defrack => Some(Self::defrack()),
            Stage::Smoothing => Some(Self::smoothing()),
            Stage::Terminal => None,
        }
    }

    fn boundary_holds(&self, old: &Scores, new: &Scores, tries: usize, params: &ChainParams) -> bool {
        let new_cut_edges = new.cut_edges as f64;
        match self.boundary {
            BoundaryRule::Relaxing => new_cut_edges <= cut_edge_ceiling(old.cut_edges, tries, params.cutoff, params.margin),
            BoundaryRule::Fixed => new_cut_edges <= old.cut_edges as f64 * (1.0 + params.boundary_margin),
            BoundaryRule::Unchecked => true,
        }
    }
}

/// Seats may not grow past `old * (1 + win_margin)` when a margin and seat scores exist.
fn seats_stable(old: &Scores, new: &Scores, params: &ChainParams) -> bool {
    match (params.win_margin, old.seats, new.seats) {
        (Some(margin), Some(old_seats), Some(new_seats)) => new_seats <= old_seats * (1.0 + margin),
        _ => true,
    }
}

fn keep_if(improved: bool) -> Verdict {
    if improved { Verdict::Keep { reportable: true } } else { Verdict::Reject }
}

impl Strategy for StageStrategy {
    fn stage(&self) -> Stage { self.stage }

    fn select_target(&self, partition: &Partition, scorer: &Scorer, rng: &mut StdRng) -> Target {
        let target = match self.targeting {
            Targeting::ImbalancedPair => metrics::most_imbalanced_pair(partition, scorer.pop_series())
                .map(|(a, b)| Target::Pair(a, b)),
            Targeting::FrackedPair => metrics::find_split_pair(partition, rng)
                .map(|((a, b), _)| Target::Fracked(a, b)),
            Targeting::RandomCutEdge => partition.cut_edges().choose(rng).map(|&(u, v)| {
                let (a, b) = (partition.assignment(u as usize), partition.assignment(v as usize));
                Target::Pair(a.min(b), a.max(b))
            }),
            Targeting::Anywhere => None,
        };
        target.unwrap_or(Target::Anywhere)
    }

    fn accept(&self, old: &Scores, new: &Scores, tries: usize, params: &ChainParams) -> Verdict {
        if !seats_stable(old, new, params)
            || !self.boundary_holds(old, new, tries, params)
            || (self.forbid_double_split && new.shared_localities > 1)
            || (self.require_unfracked && new.fracking > 0)
        {
            return Verdict::Reject;
        }

        let max_splits = params.max_splits.unwrap_or(usize::MAX);
        match self.goal {
            Goal::PopulationDeviation => keep_if(new.population_deviation < old.population_deviation),
            Goal::Fracking => keep_if(new.fracking < old.fracking),
            Goal::CutEdges => keep_if(new.cut_edges < old.cut_edges),
            Goal::TotalSplits => keep_if(new.splits < old.splits),
            Goal::ProportionalDeviation => match (old.proportional_deviation, new.proportional_deviation) {
                (Some(old_dev), Some(new_dev)) => keep_if(new_dev < old_dev),
                _ => Verdict::Reject,
            },
            Goal::Smoothing => {
                if new.splits > max_splits { return Verdict::Reject }
                Verdict::Keep { reportable: new.cut_edges < old.cut_edges }
            }
            Goal::Polish => {
                if new.splits > old.splits || new.splits > max_splits { return Verdict::Reject }
                let (old_seats, new_seats) = (old.seats.unwrap_or(0.0), new.seats.unwrap_or(0.0));
                if new_seats < old_seats && new_seats > params.seat_floor { return Verdict::Reject }
                Verdict::Keep { reportable: new_seats > old_seats }
            }
        }
    }

    fn rebase(&self, old: &Scores, new: &Scores) -> Scores {
        match self.goal {
            // Smoothing compares against the best boundary seen, not the latest.
            Goal::Smoothing => Scores { cut_edges: old.cut_edges.min(new.cut_edges), ..new.clone() },
            _ => new.clone(),
        }
    }

    fn key(&self, scores: &Scores) -> f64 {
        match self.goal {
            Goal::PopulationDeviation => scores.population_deviation,
            Goal::Fracking => scores.fracking as f64,
            Goal::Smoothing | Goal::CutEdges => scores.cut_edges as f64,
            Goal::TotalSplits => scores.splits as f64,
            Goal::ProportionalDeviation => scores.proportional_deviation.unwrap_or(f64::INFINITY),
            Goal::Polish => -scores.seats.unwrap_or(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(population_deviation: f64, fracking: usize, splits: usize, cut_edges: usize) -> Scores {
        Scores {
            population_deviation,
            fracking,
            splits,
            shared_localities: 0,
            cut_edges,
            seats: None,
            proportional_deviation: None,
        }
    }

    #[test]
    fn ceiling_relaxes_every_cutoff_tries() {
        assert_eq!(cut_edge_ceiling(1000, 99, 100, 0.01), 1000.0);
        assert!((cut_edge_ceiling(1000, 250, 100, 0.01) - 1020.0).abs() < 1e-9);
        assert_eq!(cut_edge_ceiling(1000, 250, 0, 0.01), 1000.0);
    }

    #[test]
    fn population_balance_needs_strict_improvement_within_bound() {
        let strategy = StageStrategy::population_balance();
        let params = ChainParams::default();
        let old = scores(0.10, 0, 3, 100);

        assert_eq!(strategy.accept(&old, &scores(0.08, 0, 3, 100), 0, &params), Verdict::Keep { reportable: true });
        assert_eq!(strategy.accept(&old, &scores(0.10, 0, 3, 90), 0, &params), Verdict::Reject);
        assert_eq!(strategy.accept(&old, &scores(0.08, 0, 3, 101), 0, &params), Verdict::Reject);

        // Relaxed after enough stalled tries.
        let relaxed = ChainParams { cutoff: 10, margin: 0.01, ..ChainParams::default() };
        assert_eq!(strategy.accept(&old, &scores(0.08, 0, 3, 101), 10, &relaxed), Verdict::Keep { reportable: true });
    }

    #[test]
    fn population_balance_rejects_double_splits() {
        let strategy = StageStrategy::population_balance();
        let new = Scores { shared_localities: 2, ..scores(0.01, 0, 3, 50) };
        assert_eq!(strategy.accept(&scores(0.10, 0, 3, 100), &new, 0, &ChainParams::default()), Verdict::Reject);
    }

    #[test]
    fn smoothing_reports_only_shorter_boundaries() {
        let strategy = StageStrategy::smoothing();
        let params = ChainParams { max_splits: Some(3), ..ChainParams::default() };
        let old = scores(0.01, 0, 3, 100);

        assert_eq!(strategy.accept(&old, &scores(0.02, 0, 3, 100), 0, &params), Verdict::Keep { reportable: false });
        assert_eq!(strategy.accept(&old, &scores(0.02, 0, 3, 95), 0, &params), Verdict::Keep { reportable: true });
        assert_eq!(strategy.accept(&old, &scores(0.02, 0, 4, 95), 0, &params), Verdict::Reject);

        let rebased = strategy.rebase(&old, &scores(0.02, 0, 3, 100));
        assert_eq!(rebased.cut_edges, 100);
        assert_eq!(strategy.rebase(&old, &scores(0.02, 0, 3, 90)).cut_edges, 90);
    }

    #[test]
    fn win_margin_gates_every_goal() {
        let strategy = StageStrategy::defrack();
        let params = ChainParams { win_margin: Some(0.1), ..ChainParams::default() };
        let old = Scores { seats: Some(5.0), ..scores(0.0, 3, 3, 100) };

        let calm = Scores { seats: Some(5.4), ..scores(0.0, 2, 3, 100) };
        let swing = Scores { seats: Some(5.6), ..scores(0.0, 2, 3, 100) };
        assert_eq!(strategy.accept(&old, &calm, 0, &params), Verdict::Keep { reportable: true });
        assert_eq!(strategy.accept(&old, &swing, 0, &params), Verdict::Reject);
    }

    #[test]
    fn polish_respects_seat_floor() {
        let strategy = StageStrategy::polish();
        let params = ChainParams { seat_floor: 3.0, ..ChainParams::default() };
        let old = Scores { seats: Some(4.0), ..scores(0.0, 0, 3, 100) };

        let fewer = Scores { seats: Some(3.5), ..scores(0.0, 0, 3, 100) };
        let floor = Scores { seats: Some(2.5), ..scores(0.0, 0, 3, 100) };
        let more = Scores { seats: Some(4.5), ..scores(0.0, 0, 2, 100) };
        let split = Scores { seats: Some(4.5), ..scores(0.0, 0, 4, 100) };

        assert_eq!(strategy.accept(&old, &fewer, 0, &params), Verdict::Reject);
        assert_eq!(strategy.accept(&old, &floor, 0, &params), Verdict::Keep { reportable: false });
        assert_eq!(strategy.accept(&old, &more, 0, &params), Verdict::Keep { reportable: true });
        assert_eq!(strategy.accept(&old, &split, 0, &params), Verdict::Reject);
        assert_eq!(strategy.key(&more), -4.5);
    }

    #[test]
    fn compactness_requires_unfracked_plans() {
        let strategy = StageStrategy::compactness();
        let old = scores(0.0, 0, 3, 100);
        assert_eq!(strategy.accept(&old, &scores(0.0, 1, 3, 90), 0, &ChainParams::default()), Verdict::Reject);
        assert_eq!(strategy.accept(&old, &scores(0.0, 0, 3, 90), 0, &ChainParams::default()), Verdict::Keep { reportable: true });
    }

    #[test]
    fn single_goal_balancing_uses_a_fixed_boundary() {
        let params = ChainParams { boundary_margin: 0.1, cutoff: 1, margin: 1.0, ..ChainParams::default() };
        let old = scores(0.10, 2, 3, 100);

        let strategy = StageStrategy::balance_only();
        assert_eq!(strategy.accept(&old, &scores(0.08, 2, 3, 110), 0, &params), Verdict::Keep { reportable: true });
        assert_eq!(strategy.accept(&old, &scores(0.08, 2, 3, 111), 0, &params), Verdict::Reject);
        // Stalled tries do not relax a fixed boundary.
        assert_eq!(strategy.accept(&old, &scores(0.08, 2, 3, 111), 50, &params), Verdict::Reject);
        assert_eq!(strategy.accept(&old, &scores(0.10, 2, 3, 90), 0, &params), Verdict::Reject);
    }

    #[test]
    fn single_goal_defrack_uses_a_fixed_boundary() {
        let params = ChainParams { boundary_margin: 0.1, cutoff: 1, margin: 1.0, ..ChainParams::default() };
        let old = scores(0.10, 2, 3, 100);

        let strategy = StageStrategy::defrack_only();
        assert_eq!(strategy.accept(&old, &scores(0.20, 1, 3, 110), 0, &params), Verdict::Keep { reportable: true });
        assert_eq!(strategy.accept(&old, &scores(0.20, 1, 3, 111), 50, &params), Verdict::Reject);
        assert_eq!(strategy.accept(&old, &scores(0.20, 2, 3, 90), 0, &params), Verdict::Reject);
    }

    #[test]
    fn proportional_needs_a_strict_decrease_on_both_sides() {
        let strategy = StageStrategy::proportional();
        let params = ChainParams::default();
        let with = |deviation: Option<f64>| Scores { proportional_deviation: deviation, ..scores(0.0, 0, 3, 100) };

        assert_eq!(strategy.accept(&with(Some(0.3)), &with(Some(0.2)), 0, &params), Verdict::Keep { reportable: true });
        assert_eq!(strategy.accept(&with(Some(0.3)), &with(Some(0.3)), 0, &params), Verdict::Reject);
        assert_eq!(strategy.accept(&with(None), &with(Some(0.1)), 0, &params), Verdict::Reject);
        assert_eq!(strategy.accept(&with(Some(0.3)), &with(None), 0, &params), Verdict::Reject);
        assert_eq!(strategy.key(&with(None)), f64::INFINITY);
    }

    #[test]
    fn split_reduction_needs_fewer_splits() {
        let strategy = StageStrategy::split_reduction();
        let params = ChainParams::default();
        let old = scores(0.0, 0, 3, 100);

        assert_eq!(strategy.accept(&old, &scores(0.0, 0, 2, 140), 0, &params), Verdict::Keep { reportable: true });
        assert_eq!(strategy.accept(&old, &scores(0.0, 0, 3, 80), 0, &params), Verdict::Reject);
        assert_eq!(strategy.accept(&old, &scores(0.0, 0, 4, 80), 0, &params), Verdict::Reject);
    }
}
