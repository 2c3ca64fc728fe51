use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

use districtwalk::Workflow;

/// Staged Markov-chain redistricting
#[derive(Parser, Debug)]
#[command(name = "districtwalk", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Improve a plan with parallel chains, writing each published improvement
    Run(RunArgs),

    /// Print every metric of a plan
    Score(ScoreArgs),
}

#[derive(Args, Debug)]
pub struct InputArgs {
    /// Adjacency graph JSON with node attributes
    #[arg(value_hint = ValueHint::FilePath)]
    pub graph: PathBuf,

    /// Run configuration JSON (defaults apply to missing fields)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Starting plan as geo_id,district CSV (defaults to the graph's apportionment field)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub plan: Option<PathBuf>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, ValueEnum)]
pub enum WorkflowArg {
    #[default]
    Combined,
    Balance,
    Defrack,
    Compactness,
    Proportional,
    Polish,
    Splits,
}

impl From<WorkflowArg> for Workflow {
    fn from(arg: WorkflowArg) -> Self {
        match arg {
            WorkflowArg::Combined => Workflow::Combined,
            WorkflowArg::Balance => Workflow::Balance,
            WorkflowArg::Defrack => Workflow::Defrack,
            WorkflowArg::Compactness => Workflow::Compactness,
            WorkflowArg::Proportional => Workflow::Proportional,
            WorkflowArg::Polish => Workflow::Polish,
            WorkflowArg::Splits => Workflow::SplitReduction,
        }
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[arg(short, long, value_enum, default_value_t)]
    pub workflow: WorkflowArg,

    /// Directory for plan artifacts (overrides the configuration)
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Base random seed (overrides the configuration)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of workers (overrides the configuration)
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ScoreArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Print the scores as JSON
    #[arg(long)]
    pub json: bool,
}
