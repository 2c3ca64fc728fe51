pub(crate) mod run;
pub(crate) mod score;

use anyhow::{Context, Result, ensure};
use districtwalk::{
    Partition, RunConfig,
    io::{LoadedGraph, read_graph_json, read_plan_csv},
};

use crate::cli::InputArgs;

/// Configuration, graph and starting partition named by the common arguments.
pub(crate) struct Inputs {
    pub config: RunConfig,
    pub partition: Partition,
    pub labels: Vec<String>,
}

pub(crate) fn load_inputs(args: &InputArgs) -> Result<Inputs> {
    let config = match &args.config {
        Some(path) => RunConfig::from_json_file(path)?,
        None => RunConfig::default(),
    };

    let LoadedGraph { graph, assignment, labels } = read_graph_json(&args.graph, &config)?;
    let (assignment, labels) = match &args.plan {
        Some(path) => {
            let plan = read_plan_csv(path, &graph)?;
            (plan.assignment, plan.labels)
        }
        None => {
            let assignment = assignment.with_context(|| format!(
                "[cli] graph has no '{}' attribute on every node; pass --plan", config.apportionment_field,
            ))?;
            (assignment, labels)
        }
    };
    ensure!(!assignment.is_empty(), "[cli] graph has no nodes");

    let partition = Partition::new(graph, assignment)?;
    Ok(Inputs { config, partition, labels })
}
