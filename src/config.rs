use std::{fs::File, io::BufReader, path::{Path, PathBuf}, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{chain::ChainParams, error::ChainError, metrics::Election};

/// Everything a run needs besides the graph and the starting plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Region identifier used in artifact names (e.g. a state code).
    pub region: String,
    pub pop_field: String,
    pub node_id_field: String,
    /// Node attribute holding the starting district label; also the scheme name in artifacts.
    pub apportionment_field: String,
    /// Node attribute naming each node's locality (county). Detected when absent.
    pub county_field: Option<String>,
    pub elections: Vec<Election>,

    pub total_steps: usize,
    /// Allowed fractional population deviation of each half of a recombination.
    pub epsilon: f64,
    pub node_repeats: usize,
    /// Population deviation at which balancing is complete.
    pub max_pop_deviation: f64,
    pub win_volatility: f64,
    pub win_margin: Option<f64>,
    pub boundary_margin: f64,
    pub cutoff: usize,
    pub margin: f64,
    pub max_splits: Option<usize>,
    pub seat_floor: f64,
    /// Statewide democratic vote share; sets the proportional seat target.
    pub vote_share: Option<f64>,

    pub pool_size: usize,
    /// Seconds between comparisons against the shared best.
    pub check_interval: f64,
    pub seed: Option<u64>,
    pub output_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            region: "region".to_string(),
            pop_field: "TOTPOP".to_string(),
            node_id_field: "GEOID20".to_string(),
            apportionment_field: "district".to_string(),
            county_field: None,
            elections: Vec::new(),
            total_steps: 1000,
            epsilon: 0.06,
            node_repeats: 2,
            max_pop_deviation: 0.0075,
            win_volatility: 0.06,
            win_margin: Some(0.1),
            boundary_margin: 0.1,
            cutoff: 100,
            margin: 0.001,
            max_splits: None,
            seat_floor: 0.0,
            vote_share: None,
            pool_size: 6,
            check_interval: 20.0,
            seed: None,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl RunConfig {
    /// Read a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("[config] failed to open {}", path.display()))?;
        let config: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("[config] failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the chain cannot run with.
    pub fn validate(&self) -> Result<(), ChainError> {
        let fail = |msg: String| Err(ChainError::Config(msg));

        if self.pool_size == 0 { return fail("pool_size must be positive".into()) }
        if self.total_steps == 0 { return fail("total_steps must be positive".into()) }
        if self.node_repeats == 0 { return fail("node_repeats must be positive".into()) }
        if Duration::try_from_secs_f64(self.check_interval).is_err() {
            return fail(format!("check_interval must be a non-negative number of seconds, got {}", self.check_interval));
        }

        for (name, value) in [
            ("epsilon", self.epsilon),
            ("max_pop_deviation", self.max_pop_deviation),
            ("win_volatility", self.win_volatility),
            ("boundary_margin", self.boundary_margin),
            ("margin", self.margin),
            ("win_margin", self.win_margin.unwrap_or(0.0)),
        ] {
            if !(value >= 0.0) { return fail(format!("{name} must be non-negative, got {value}")) }
        }

        if let Some(share) = self.vote_share && !(0.0..=1.0).contains(&share) {
            return fail(format!("vote_share must lie in [0, 1], got {share}"));
        }
        Ok(())
    }

    /// Chain parameters derived from this configuration.
    pub fn chain_params(&self) -> ChainParams {
        ChainParams {
            total_steps: self.total_steps,
            cutoff: self.cutoff,
            margin: self.margin,
            boundary_margin: self.boundary_margin,
            win_margin: self.win_margin.filter(|_| !self.elections.is_empty()),
            max_splits: self.max_splits,
            seat_floor: self.seat_floor,
        }
    }

    /// Time between shared-best check-ins. Out-of-range values saturate to [`Duration::MAX`].
    #[inline] pub fn check_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.check_interval).unwrap_or(Duration::MAX)
    }
}
