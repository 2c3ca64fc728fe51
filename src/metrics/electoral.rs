use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::partition::Partition;

/// A two-party election, given as the names of the node weight series holding each party's votes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Election {
    pub name: String,
    pub dem_series: String,
    pub rep_series: String,
}

impl Election {
    pub fn new(name: impl Into<String>, dem_series: impl Into<String>, rep_series: impl Into<String>) -> Self {
        Self { name: name.into(), dem_series: dem_series.into(), rep_series: rep_series.into() }
    }

    /// Democratic share of the two-party vote in `part`, or None if the part has no votes.
    pub fn dem_share(&self, partition: &Partition, part: u32) -> Option<f64> {
        let dem = partition.part_total(&self.dem_series, part);
        let total = dem + partition.part_total(&self.rep_series, part);
        (total > 0.0).then(|| dem / total)
    }
}

/// A set of elections whose seat estimates are averaged together.
pub type ElectionComposite = [Election];

/// Standard normal cumulative distribution function.
fn normal_cdf(x: f64) -> f64 { 0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2)) }

/// Error function, Abramowitz and Stegun 7.1.26 (absolute error below 1.5e-7).
fn erf(x: f64) -> f64 {
    const P: f64 = 0.3275911;
    const A: [f64; 5] = [0.254829592, -0.284496736, 1.421413741, -1.453152027, 1.061405429];

    let sign = x.signum();
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let poly = A.iter().rev().fold(0.0, |acc, &a| acc * t + a) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

/// Probability that the democratic candidate carries a part with the given vote share.
/// A non-positive volatility makes the outcome deterministic.
fn win_probability(share: f64, volatility: f64) -> f64 {
    if volatility <= 0.0 {
        return match share.partial_cmp(&0.5) {
            Some(std::cmp::Ordering::Greater) => 1.0,
            Some(std::cmp::Ordering::Less) => 0.0,
            _ => 0.5,
        }
    }
    normal_cdf((share - 0.5) / volatility)
}

/// Expected number of democratic seat wins, summed over parts and averaged over elections.
pub fn fractional_seat_wins(partition: &Partition, composite: &ElectionComposite, win_volatility: f64) -> f64 {
    if composite.is_empty() {
        warn!("no elections configured; fractional seat wins reported as zero");
        return 0.0;
    }

    let total = composite.iter().map(|election| {
        (0..partition.num_parts()).map(|part| match election.dem_share(partition, part) {
            Some(share) => win_probability(share, win_volatility),
            None => {
                warn!(election = %election.name, part, "part has no votes; counted as a toss-up");
                0.5
            }
        }).sum::<f64>()
    }).sum::<f64>();

    total / composite.len() as f64
}

/// Distance between a target seat count and the expected seat wins, per part.
pub fn proportional_deviation(
    partition: &Partition,
    composite: &ElectionComposite,
    win_volatility: f64,
    target_seats: f64,
) -> f64 {
    (target_seats - fractional_seat_wins(partition, composite, win_volatility)).abs() / partition.num_parts() as f64
}

/// Proportional deviation where the target is the statewide vote share times the part count.
pub fn proportional_frac_deviation(
    partition: &Partition,
    composite: &ElectionComposite,
    win_volatility: f64,
    vote_share: f64,
) -> f64 {
    let target_seats = vote_share * partition.num_parts() as f64;
    proportional_deviation(partition, composite, win_volatility, target_seats)
}
