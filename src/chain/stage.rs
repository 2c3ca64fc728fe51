use std::fmt;

use serde::{Deserialize, Serialize};

/// Phase of the optimization walk. Stages only ever move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    PopulationBalance = 0,
    Defrack = 1,
    Smoothing = 2,
    Terminal = 3,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::PopulationBalance, Stage::Defrack, Stage::Smoothing, Stage::Terminal];

    #[inline] pub fn index(self) -> usize { self as usize }

    /// Stage for a numeric index, saturating at `Terminal`.
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or(Stage::Terminal)
    }

    /// The following stage (`Terminal` is absorbing).
    #[inline] pub fn next(self) -> Self { Self::from_index(self.index() + 1) }

    #[inline] pub fn is_terminal(self) -> bool { self == Stage::Terminal }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::PopulationBalance => "population_balance",
            Stage::Defrack => "defrack",
            Stage::Smoothing => "smoothing",
            Stage::Terminal => "terminal",
        })
    }
}
