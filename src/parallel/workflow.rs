use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    chain::{Constraint, Scores, Stage, StageStrategy, Validator},
    config::RunConfig,
    error::ChainError,
    parallel::SharedBest,
};

/// What a parallel run optimizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workflow {
    /// Population balance, then defracking, then smoothing.
    #[default]
    Combined,
    Balance,
    Defrack,
    Compactness,
    Proportional,
    Polish,
    SplitReduction,
}

impl Workflow {
    pub const ALL: [Workflow; 7] = [
        Workflow::Combined,
        Workflow::Balance,
        Workflow::Defrack,
        Workflow::Compactness,
        Workflow::Proportional,
        Workflow::Polish,
        Workflow::SplitReduction,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Workflow::Combined => "combined",
            Workflow::Balance => "balance",
            Workflow::Defrack => "defrack",
            Workflow::Compactness => "compactness",
            Workflow::Proportional => "proportional",
            Workflow::Polish => "polish",
            Workflow::SplitReduction => "splits",
        }
    }

    /// Strategy driving `stage`, or None once the workflow has nothing left to do.
    pub fn strategy(self, stage: Stage) -> Option<StageStrategy> {
        match self {
            Workflow::Combined => StageStrategy::for_stage(stage),
            Workflow::Balance => Some(StageStrategy::balance_only()),
            Workflow::Defrack => Some(StageStrategy::defrack_only()),
            Workflow::Compactness => Some(StageStrategy::compactness()),
            Workflow::Proportional => Some(StageStrategy::proportional()),
            Workflow::Polish => Some(StageStrategy::polish()),
            Workflow::SplitReduction => Some(StageStrategy::split_reduction()),
        }
    }

    /// Stage a run starts in, given the scores of its initial partition.
    /// The combined workflow skips stages the partition already satisfies.
    pub fn initial_stage(self, scores: &Scores, max_pop_deviation: f64) -> Stage {
        match self {
            Workflow::Combined => {
                let mut stage = Stage::PopulationBalance;
                while !stage.is_terminal() && self.advances(stage, scores, max_pop_deviation) {
                    stage = stage.next();
                }
                stage
            }
            _ => self.strategy(Stage::PopulationBalance).map_or(Stage::Terminal, |s| s.stage),
        }
    }

    /// Whether a kept state with `scores` completes `stage`.
    pub fn advances(self, stage: Stage, scores: &Scores, max_pop_deviation: f64) -> bool {
        match (self, stage) {
            (Workflow::Combined, Stage::PopulationBalance) => scores.population_deviation <= max_pop_deviation,
            (Workflow::Combined, Stage::Defrack) => scores.fracking == 0,
            _ => false,
        }
    }

    /// Whether every worker can stop because the best possible value is already shared.
    pub fn finished(self, shared: &SharedBest) -> bool {
        self == Workflow::Defrack && shared.best(Stage::Defrack) <= 0.0
    }

    /// Hard constraints for `stage`. `cut_edge_limit` bounds the single-goal workflows.
    pub fn validator(self, stage: Stage, config: &RunConfig, cut_edge_limit: usize) -> Validator {
        let mut constraints = vec![Constraint::contiguous()];
        let population = || Constraint::population_within(&config.pop_field, config.max_pop_deviation);

        match self {
            Workflow::Combined => {
                if stage >= Stage::Defrack { constraints.push(population()) }
                if stage == Stage::Smoothing { constraints.push(Constraint::no_fracking()) }
            }
            Workflow::Balance => constraints.push(Constraint::cut_edges_at_most(cut_edge_limit)),
            _ => {
                constraints.push(population());
                constraints.push(Constraint::cut_edges_at_most(cut_edge_limit));
            }
        }
        Validator::new(constraints)
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Workflow {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Workflow::ALL.into_iter()
            .find(|workflow| workflow.name() == s)
            .ok_or_else(|| ChainError::Config(format!("unknown workflow '{s}'")))
    }
}
