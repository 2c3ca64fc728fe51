use std::{sync::Arc, time::{Duration, Instant}};

use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info, info_span, warn};

use crate::{
    chain::{Chain, Stage, Strategy, Target},
    error::ChainError,
    metrics,
    parallel::{Coordinator, WorkerReport},
    partition::Partition,
};

/// How a chain handed control back to its worker.
enum Handoff {
    /// Continue at `stage` from `partition`, with a freshly built chain.
    Resume(Stage, Partition),
    /// The budget is spent or the workflow is finished; carries the chain's last state.
    Stop(Partition),
}

/// Run worker `id` until its step budget is spent.
///
/// The worker starts from the shared best, walks one chain per stage and:
/// publishes every good step that beats the shared best of its stage (writing an artifact);
/// advances the shared stage when a kept state completes its stage;
/// and, every check interval, adopts the shared best when a peer is ahead.
pub(super) fn run(coordinator: &Coordinator, id: usize) -> Result<WorkerReport, ChainError> {
    let span = info_span!("worker", id);
    let _entered = span.enter();

    let mut rng = StdRng::seed_from_u64(coordinator.seed.wrapping_add(id as u64));
    let mut stage = coordinator.shared.stage();
    let mut partition = Partition::new(Arc::clone(&coordinator.graph), coordinator.shared.assignment())?;
    let mut report = WorkerReport { id, steps: 0, published: 0, restarts: 0, final_stage: stage };

    while report.steps < coordinator.config.total_steps && !coordinator.workflow.finished(&coordinator.shared) {
        match walk_stage(coordinator, stage, partition, &mut rng, &mut report)? {
            Handoff::Resume(next_stage, next) => {
                stage = next_stage;
                partition = next;
            }
            Handoff::Stop(last) => {
                partition = last;
                break;
            }
        }
    }

    report.final_stage = stage;
    debug!(
        steps = report.steps,
        published = report.published,
        restarts = report.restarts,
        cut_edges = partition.num_cut_edges(),
        "worker done",
    );
    Ok(report)
}

/// Walk one chain at `stage` until it runs out of budget or hands off.
fn walk_stage(
    coordinator: &Coordinator,
    stage: Stage,
    partition: Partition,
    rng: &mut StdRng,
    report: &mut WorkerReport,
) -> Result<Handoff, ChainError> {
    let Coordinator { workflow, config, shared, .. } = coordinator;
    let Some(strategy) = workflow.strategy(stage) else { return Ok(Handoff::Stop(partition)) };

    let mut params = config.chain_params();
    params.total_steps = config.total_steps - report.steps;
    params.max_splits = params.max_splits.or_else(|| Some(metrics::total_splits(&partition)));

    let validator = workflow.validator(stage, config, coordinator.cut_edge_limit);
    let mut chain = Chain::new(&coordinator.recom, strategy, validator, &coordinator.scorer, params, partition, rng)?;
    let mut local_best = chain.strategy().key(chain.baseline());
    let mut next_check = next_check_in(config.check_interval());
    info!(%stage, local_best, "walking stage");

    while let Some(step) = chain.next() {
        report.steps += 1;

        if step.counter > 0 && step.good && shared.stage() == stage {
            let key = chain.strategy().key(&step.scores);
            let assignment = chain.current().assignments();
            if shared.publish(stage, key, &assignment) {
                local_best = key;
                report.published += 1;
                info!(%stage, key, step = report.steps, "published improvement");
                if let Some(writer) = &coordinator.writer {
                    writer.write(&assignment, &step.scores, report.id, report.steps);
                }
            }
        }

        if step.accepted && workflow.advances(stage, &step.scores, config.max_pop_deviation) {
            let next_stage = stage.next();
            let next = chain.current().clone();
            let key = workflow.strategy(next_stage).map_or(f64::INFINITY, |strategy| {
                strategy.key(&strategy.evaluate(&next, &Target::Anywhere, &coordinator.scorer))
            });
            if shared.advance(next_stage, key, &next.assignments()) {
                info!(from = %stage, to = %next_stage, key, "advanced shared stage");
            }
            return Ok(Handoff::Resume(next_stage, next));
        }

        if workflow.finished(shared) {
            info!("shared best is optimal; stopping");
            return Ok(Handoff::Stop(chain.current().clone()));
        }

        if next_check.is_some_and(|deadline| Instant::now() >= deadline) {
            next_check = next_check_in(config.check_interval());

            let shared_stage = shared.stage();
            if shared_stage <= stage && shared.best(stage) >= local_best { continue }

            let best = match Partition::new(Arc::clone(&coordinator.graph), shared.assignment()) {
                Ok(best) => best,
                Err(err) => {
                    warn!("shared assignment is unusable: {err}");
                    continue;
                }
            };
            if !workflow.validator(shared_stage, config, coordinator.cut_edge_limit).is_valid(&best) {
                debug!(%shared_stage, "shared assignment does not satisfy its stage yet; keeping local state");
                continue;
            }

            report.restarts += 1;
            if shared_stage > stage {
                info!(from = %stage, to = %shared_stage, "adopting shared best at a later stage");
                return Ok(Handoff::Resume(shared_stage, best));
            }
            chain.restart(best);
            local_best = chain.strategy().key(chain.baseline());
            info!(%stage, local_best, "adopted shared best");
        }
    }

    Ok(Handoff::Stop(chain.current().clone()))
}

/// Deadline of the next check-in, or `None` (never check) when it lies beyond the clock's range.
fn next_check_in(interval: Duration) -> Option<Instant> {
    Instant::now().checked_add(interval)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::{config::RunConfig, graph::Graph, parallel::Workflow};
    use super::*;

    /// 4x4 unit-population lattice.
    fn grid() -> Arc<Graph> {
        let edges = (0..16).map(|i| {
            let (r, c) = (i / 4, i % 4);
            let mut adj = Vec::new();
            if r > 0 { adj.push((i - 4) as u32) }
            if c > 0 { adj.push((i - 1) as u32) }
            if c < 3 { adj.push((i + 1) as u32) }
            if r < 3 { adj.push((i + 4) as u32) }
            adj
        }).collect::<Vec<_>>();
        Arc::new(Graph::new(&edges, HashMap::from([("TOTPOP".to_string(), vec![1; 16])]), HashMap::new()))
    }

    /// Column 0 against columns 1..=3.
    fn lopsided(graph: &Arc<Graph>) -> Partition {
        Partition::new(Arc::clone(graph), (0..16).map(|i| u32::from(i % 4 != 0)).collect()).unwrap()
    }

    /// Columns 0..=1 against columns 2..=3: perfectly balanced.
    fn halves() -> Vec<u32> {
        (0..16).map(|i| u32::from(i % 4 >= 2)).collect()
    }

    fn config() -> RunConfig {
        RunConfig {
            pool_size: 1,
            total_steps: 40,
            epsilon: 0.3,
            node_repeats: 4,
            max_pop_deviation: 0.26,
            check_interval: 0.0,
            seed: Some(5),
            ..RunConfig::default()
        }
    }

    fn report() -> WorkerReport {
        WorkerReport { id: 0, steps: 0, published: 0, restarts: 0, final_stage: Stage::PopulationBalance }
    }

    #[test]
    fn adopts_a_better_shared_best_at_the_same_stage() {
        let graph = grid();
        let coordinator = Coordinator::new(lopsided(&graph), Workflow::Balance, config()).unwrap();
        assert!(coordinator.shared().publish(Stage::PopulationBalance, 0.0, &halves()));

        let mut rng = StdRng::seed_from_u64(1);
        let mut report = report();
        let handoff = walk_stage(&coordinator, Stage::PopulationBalance, lopsided(&graph), &mut rng, &mut report).unwrap();

        assert_eq!(report.restarts, 1);
        assert_eq!(report.published, 0);
        assert_eq!(report.steps, 40);
        // Nothing beats a deviation of zero, so the adopted plan is still the chain's state.
        match handoff {
            Handoff::Stop(last) => assert_eq!(last.assignments(), halves()),
            Handoff::Resume(..) => panic!("balance never leaves its stage"),
        }
    }

    #[test]
    fn jumps_to_a_later_shared_stage() {
        let graph = grid();
        let coordinator = Coordinator::new(lopsided(&graph), Workflow::Combined, config()).unwrap();
        assert_eq!(coordinator.shared().stage(), Stage::PopulationBalance);
        assert!(coordinator.shared().advance(Stage::Defrack, 0.0, &halves()));

        let mut rng = StdRng::seed_from_u64(1);
        let mut report = report();
        let handoff = walk_stage(&coordinator, Stage::PopulationBalance, lopsided(&graph), &mut rng, &mut report).unwrap();

        assert_eq!(report.restarts, 1);
        assert_eq!(report.steps, 1);
        match handoff {
            Handoff::Resume(stage, partition) => {
                assert_eq!(stage, Stage::Defrack);
                assert_eq!(partition.assignments(), halves());
            }
            Handoff::Stop(_) => panic!("expected a handoff to the shared stage"),
        }
    }

    #[test]
    fn keeps_local_state_when_the_shared_best_is_not_ahead() {
        let graph = grid();
        let coordinator = Coordinator::new(lopsided(&graph), Workflow::Balance, config()).unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        let mut report = report();
        walk_stage(&coordinator, Stage::PopulationBalance, lopsided(&graph), &mut rng, &mut report).unwrap();
        assert_eq!(report.restarts, 0);
    }

    #[test]
    fn unreachable_check_in_never_fires() {
        assert!(next_check_in(Duration::MAX).is_none());
        assert!(next_check_in(Duration::ZERO).is_some_and(|deadline| deadline <= Instant::now()));
    }
}
