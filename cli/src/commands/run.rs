use anyhow::Result;
use districtwalk::{ArtifactWriter, Coordinator, Workflow};
use tracing::info;

use crate::{cli::{Cli, RunArgs}, commands::{Inputs, load_inputs}};

pub fn run(_cli: &Cli, args: &RunArgs) -> Result<()> {
    let Inputs { mut config, partition, labels } = load_inputs(&args.input)?;
    if let Some(dir) = &args.output { config.output_dir = dir.clone() }
    if let Some(seed) = args.seed { config.seed = Some(seed) }
    if let Some(workers) = args.workers { config.pool_size = workers }

    let writer = ArtifactWriter::new(
        &config.output_dir,
        &config.region,
        &config.apportionment_field,
        partition.graph_handle(),
        labels,
    )?;

    let workflow = Workflow::from(args.workflow);
    let coordinator = Coordinator::new(partition, workflow, config)?.with_artifacts(writer);
    let reports = coordinator.run()?;

    for report in &reports {
        info!(
            worker = report.id,
            steps = report.steps,
            published = report.published,
            restarts = report.restarts,
            stage = %report.final_stage,
            "worker finished",
        );
    }

    let shared = coordinator.shared();
    let stage = shared.stage();
    println!("{workflow}: stage {stage}, best {}", shared.best(stage));
    println!("artifacts in {}", coordinator.config().output_dir.display());
    Ok(())
}
