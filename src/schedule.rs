use crate::network::Uid;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order in which agents take their turn within a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchedulePolicy {
    /// Insertion order, every step.
    #[default]
    Sequential,
    /// A fresh permutation every step, drawn from the world's seeded RNG.
    RandomPermutation,
}

impl SchedulePolicy {
    pub fn order<R: Rng + ?Sized>(&self, uids: &[Uid], rng: &mut R) -> Vec<Uid> {
        let mut order = uids.to_vec();
        if let Self::RandomPermutation = self {
            order.shuffle(rng);
        }
        order
    }
}

impl fmt::Display for SchedulePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => f.write_str("sequential"),
            Self::RandomPermutation => f.write_str("random-permutation"),
        }
    }
}

impl FromStr for SchedulePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" | "base" => Ok(Self::Sequential),
            "random" | "random-permutation" => Ok(Self::RandomPermutation),
            other => Err(format!("unknown schedule: {other}")),
        }
    }
}
