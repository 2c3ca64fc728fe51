use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::{
    chain::{Scorer, Stage, Strategy, Target},
    config::RunConfig,
    error::ChainError,
    graph::Graph,
    parallel::{ArtifactWriter, SharedBest, Workflow, worker},
    partition::{Partition, Recom},
};

/// Summary of one worker's run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    pub id: usize,
    /// Steps consumed from the worker's budget.
    pub steps: usize,
    /// Improvements this worker made to the shared best.
    pub published: usize,
    /// Times the worker adopted the shared best.
    pub restarts: usize,
    pub final_stage: Stage,
}

/// Runs `pool_size` independent chains that reconcile through a [`SharedBest`].
pub struct Coordinator {
    pub(super) graph: Arc<Graph>,
    pub(super) workflow: Workflow,
    pub(super) config: RunConfig,
    pub(super) scorer: Scorer,
    pub(super) recom: Recom,
    /// Cut-edge bound for single-goal workflows: twice the initial count.
    pub(super) cut_edge_limit: usize,
    pub(super) writer: Option<ArtifactWriter>,
    pub(super) shared: SharedBest,
    pub(super) seed: u64,
}

impl Coordinator {
    /// Prepare a run from `initial`. Fails if the configuration is invalid or the
    /// initial partition violates the constraints of its starting stage.
    pub fn new(initial: Partition, workflow: Workflow, config: RunConfig) -> Result<Self, ChainError> {
        config.validate()?;

        let mut scorer = Scorer::new(&config.pop_field);
        if !config.elections.is_empty() {
            scorer = scorer.with_elections(config.elections.clone(), config.win_volatility);
        }
        if workflow == Workflow::Proportional {
            let share = config.vote_share.filter(|_| scorer.has_elections()).ok_or_else(|| {
                ChainError::Config("the proportional workflow needs elections and a vote_share".into())
            })?;
            scorer = scorer.with_target_seats(share * initial.num_parts() as f64);
        }

        let scores = scorer.score(&initial, &Target::Anywhere);
        let stage = workflow.initial_stage(&scores, config.max_pop_deviation);
        let strategy = workflow.strategy(stage)
            .ok_or_else(|| ChainError::Config(format!("{workflow} has no strategy for stage {stage}")))?;

        let cut_edge_limit = 2 * initial.num_cut_edges();
        workflow.validator(stage, &config, cut_edge_limit).validate(&initial)?;

        let key = strategy.key(&strategy.evaluate(&initial, &Target::Anywhere, &scorer));
        let seed = config.seed.unwrap_or_else(rand::random);
        info!(%workflow, %stage, key, seed, workers = config.pool_size, "prepared run");

        Ok(Self {
            graph: initial.graph_handle(),
            workflow,
            recom: Recom::new(&config.pop_field, config.epsilon, config.node_repeats),
            scorer,
            cut_edge_limit,
            writer: None,
            shared: SharedBest::new(stage, key, initial.assignments()),
            seed,
            config,
        })
    }

    /// Write an artifact for every improvement published to the shared best.
    pub fn with_artifacts(mut self, writer: ArtifactWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    #[inline] pub fn workflow(&self) -> Workflow { self.workflow }

    #[inline] pub fn config(&self) -> &RunConfig { &self.config }

    #[inline] pub fn scorer(&self) -> &Scorer { &self.scorer }

    #[inline] pub fn shared(&self) -> &SharedBest { &self.shared }

    /// Base seed; worker `i` seeds its generator with `seed + i`.
    #[inline] pub fn seed(&self) -> u64 { self.seed }

    /// The shared best partition.
    pub fn best_partition(&self) -> Result<Partition, ChainError> {
        Partition::new(Arc::clone(&self.graph), self.shared.assignment())
    }

    /// Run every worker to completion on a dedicated pool and return their reports in id order.
    pub fn run(&self) -> Result<Vec<WorkerReport>, ChainError> {
        let workers = self.config.pool_size;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("districtwalk-worker-{i}"))
            .build()
            .map_err(|err| ChainError::Config(format!("failed to start worker pool: {err}")))?;

        let reports = pool.install(|| {
            (0..workers).into_par_iter()
                .with_max_len(1)
                .map(|id| worker::run(self, id))
                .collect::<Result<Vec<_>, _>>()
        })?;

        info!(
            stage = %self.shared.stage(),
            best = self.shared.best(self.shared.stage()),
            published = reports.iter().map(|r| r.published).sum::<usize>(),
            "run finished",
        );
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::metrics::Election;

    /// Two-by-two grid in two columns.
    fn initial() -> Partition {
        let graph = Graph::new(
            &[vec![1, 2], vec![0, 3], vec![0, 3], vec![1, 2]],
            HashMap::from([
                ("TOTPOP".to_string(), vec![1, 1, 1, 1]),
                ("D".to_string(), vec![3, 1, 3, 1]),
                ("R".to_string(), vec![1, 3, 1, 3]),
            ]),
            HashMap::new(),
        );
        Partition::new(graph, vec![0, 1, 0, 1]).unwrap()
    }

    #[test]
    fn starts_past_satisfied_stages() {
        let config = RunConfig { seed: Some(3), ..RunConfig::default() };
        let coordinator = Coordinator::new(initial(), Workflow::Combined, config).unwrap();

        assert_eq!(coordinator.shared().stage(), Stage::Smoothing);
        assert_eq!(coordinator.shared().best(Stage::Smoothing), 2.0);
        assert_eq!(coordinator.seed(), 3);
    }

    #[test]
    fn proportional_needs_a_vote_share() {
        let config = RunConfig { elections: vec![Election::new("e", "D", "R")], ..RunConfig::default() };
        let err = Coordinator::new(initial(), Workflow::Proportional, config.clone()).err().unwrap();
        assert!(matches!(err, ChainError::Config(_)));

        let config = RunConfig { vote_share: Some(0.5), ..config };
        assert!(Coordinator::new(initial(), Workflow::Proportional, config).is_ok());
    }

    #[test]
    fn invalid_initial_state_is_reported() {
        let config = RunConfig { max_pop_deviation: 0.0, ..RunConfig::default() };
        let graph = Graph::new(
            &[vec![1], vec![0, 2], vec![1]],
            HashMap::from([("TOTPOP".to_string(), vec![1, 1, 4])]),
            HashMap::new(),
        );
        let partition = Partition::new(graph, vec![0, 0, 1]).unwrap();

        let err = Coordinator::new(partition, Workflow::Defrack, config).err().unwrap();
        assert!(matches!(err, ChainError::InvalidInitialState { ref failed } if failed == &["population_within"]));
    }
}
