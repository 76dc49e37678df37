use serde::{Deserialize, Serialize};
use std::fmt;

/// A team's place in its group's bracket.
///
/// Seeds are used only to break reseeding ties: lower number = better seed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Team {
    pub code: String,
    pub group: String,
    pub seed: u32,
}

impl Team {
    pub fn new(code: impl Into<String>, group: impl Into<String>, seed: u32) -> Self {
        Team {
            code: code.into(),
            group: group.into(),
            seed,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} #{})", self.code, self.group, self.seed)
    }
}

/// Cumulative advancement probabilities for one team.
///
/// Values are decimals in [0, 1]. `None` marks data the source table did
/// not provide, which is kept distinct from an explicit zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdvancementOdds {
    pub team: String,

    /// Chance to reach the second (divisional) round
    pub reach_second: Option<f64>,

    /// Chance to reach the third (conference championship) round
    pub reach_third: Option<f64>,

    /// Chance to reach the championship game beyond the group
    pub reach_final: Option<f64>,

    /// False for the team with a bye
    pub has_first_round_game: bool,
}

impl AdvancementOdds {
    pub fn new(
        team: impl Into<String>,
        reach_second: Option<f64>,
        reach_third: Option<f64>,
        reach_final: Option<f64>,
        has_first_round_game: bool,
    ) -> Self {
        AdvancementOdds {
            team: team.into(),
            reach_second,
            reach_third,
            reach_final,
            has_first_round_game,
        }
    }

    /// Odds for a bye team, which has no second-round entry chance to report.
    pub fn bye(team: impl Into<String>, reach_third: f64, reach_final: f64) -> Self {
        Self::new(team, Some(1.0), Some(reach_third), Some(reach_final), false)
    }

    /// Largest number of games the team can play, counting the final.
    pub fn max_games(&self) -> f64 {
        if self.has_first_round_game {
            crate::constants::MAX_GAMES_WITH_FIRST_ROUND
        } else {
            crate::constants::MAX_GAMES_WITH_BYE
        }
    }
}
