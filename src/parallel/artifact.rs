use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::{chain::Scores, graph::Graph, io::write_plan_csv};

/// Writes published plans as `geo_id,district` CSV files whose names carry their scores.
#[derive(Clone, Debug)]
pub struct ArtifactWriter {
    dir: PathBuf,
    region: String,
    scheme: String,
    graph: Arc<Graph>,
    labels: Vec<String>,
}

impl ArtifactWriter {
    /// Create the output directory if needed.
    pub fn new(
        dir: impl Into<PathBuf>,
        region: impl Into<String>,
        scheme: impl Into<String>,
        graph: Arc<Graph>,
        labels: Vec<String>,
    ) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("[parallel::artifact] Failed to create {}", dir.display()))?;
        Ok(Self { dir, region: region.into(), scheme: scheme.into(), graph, labels })
    }

    /// File name for a plan with the given scores, found by `worker` at `step`.
    pub fn file_name(&self, scores: &Scores, worker: usize, step: usize) -> String {
        format!(
            "{}_{}_pop_{:.4}_frack_{}_smooth_{}_splits_{}_{}_{}.csv",
            self.region, self.scheme, scores.population_deviation, scores.fracking,
            scores.cut_edges, scores.splits, worker, step,
        )
    }

    /// Write the plan. Failures are logged and otherwise ignored.
    pub fn write(&self, assignment: &[u32], scores: &Scores, worker: usize, step: usize) -> Option<PathBuf> {
        let path = self.dir.join(self.file_name(scores, worker, step));
        match write_plan_csv(&path, self.graph.geo_ids(), assignment, &self.labels) {
            Ok(()) => {
                debug!(path = %path.display(), "wrote artifact");
                Some(path)
            }
            Err(err) => {
                warn!(path = %path.display(), "failed to write artifact: {err:#}");
                None
            }
        }
    }
}
