use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::team::AdvancementOdds;

/// Per-round win probabilities for one team, each conditional on the team
/// having reached that round.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundProbs {
    /// First-round win probability; NaN for the bye team, which never plays it
    pub first: f64,

    /// Second-round win probability given the team is in the second round
    pub second: f64,

    /// Third-round win probability given the team is in the third round
    pub third: f64,
}

/// Round win probabilities for every team in the input table.
///
/// Built once and shared read-only across groups and playouts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundWinProbs {
    probs: BTreeMap<String, RoundProbs>,
}

impl RoundWinProbs {
    pub fn get(&self, team: &str) -> Option<&RoundProbs> {
        self.probs.get(team)
    }

    pub fn insert(&mut self, team: impl Into<String>, probs: RoundProbs) {
        self.probs.insert(team.into(), probs);
    }

    pub fn len(&self) -> usize {
        self.probs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RoundProbs)> {
        self.probs.iter()
    }
}

/// `numerator / denominator`, or 0.0 when either side is missing or the
/// denominator is not positive. Clamped to [0, 1].
fn conditional(numerator: Option<f64>, denominator: Option<f64>) -> f64 {
    match (numerator, denominator) {
        (Some(num), Some(den)) if den > 0.0 && num.is_finite() => clamp_prob(num / den),
        _ => 0.0,
    }
}

fn clamp_prob(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

/// Convert one team's cumulative advancement odds into round win probabilities.
///
/// A team with a first-round game wins it with its chance to reach round two.
/// The bye team enters round two with certainty, so its round-two win
/// probability is its chance to reach round three. Any ratio whose
/// denominator is zero or missing is 0.0: the team never wins that game.
pub fn round_probs_for(odds: &AdvancementOdds) -> RoundProbs {
    let third = conditional(odds.reach_final, odds.reach_third);

    if odds.has_first_round_game {
        RoundProbs {
            first: odds.reach_second.map_or(0.0, clamp_prob),
            second: conditional(odds.reach_third, odds.reach_second),
            third,
        }
    } else {
        RoundProbs {
            first: f64::NAN,
            second: odds.reach_third.map_or(0.0, clamp_prob),
            third,
        }
    }
}

/// Build the round win probability table from the cumulative input table.
///
/// # Arguments
/// * `odds` - One row per team; later rows for the same team replace earlier ones
///
/// # Returns
/// Table keyed by team code
pub fn build_round_probs(odds: &[AdvancementOdds]) -> RoundWinProbs {
    let mut table = RoundWinProbs::default();
    for row in odds {
        table.insert(row.team.clone(), round_probs_for(row));
    }
    table
}
