//! Bracket topology: which teams form each group, who has the bye, the fixed
//! first-round pairings and the reseeding rule for the second round.
//!
//! `BracketConfig` is the serde-facing description (compiled in or loaded
//! from TOML). `validate` turns it into index-based `GroupBracket`s that the
//! simulator walks without any map lookups.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::constants::MAX_GROUP_TEAMS;
use crate::error::ConfigError;
use crate::team::{AdvancementOdds, Team};

/// A team code with its seed inside the group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeededTeam {
    pub code: String,
    pub seed: u32,
}

/// Serialized description of one group's bracket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,

    #[serde(default)]
    pub bye: Option<String>,

    pub teams: Vec<SeededTeam>,

    /// First-round pairings; the first team of each pair is the favored slot
    pub first_round: Vec<(String, String)>,
}

/// Serialized description of every group in a deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketConfig {
    pub groups: Vec<GroupConfig>,
}

fn seeded(teams: &[(&str, u32)]) -> Vec<SeededTeam> {
    teams
        .iter()
        .map(|&(code, seed)| SeededTeam {
            code: code.to_string(),
            seed,
        })
        .collect()
}

fn pairs(matchups: &[(&str, &str)]) -> Vec<(String, String)> {
    matchups
        .iter()
        .map(|&(a, b)| (a.to_string(), b.to_string()))
        .collect()
}

impl BracketConfig {
    /// The NFL playoff field this deployment was built for.
    pub fn nfl() -> Self {
        BracketConfig {
            groups: vec![
                GroupConfig {
                    name: "NFC".to_string(),
                    bye: Some("SEA".to_string()),
                    teams: seeded(&[
                        ("SEA", 1),
                        ("CHI", 2),
                        ("PHI", 3),
                        ("CAR", 4),
                        ("LAR", 5),
                        ("SF", 6),
                        ("GB", 7),
                    ]),
                    first_round: pairs(&[("CHI", "GB"), ("PHI", "SF"), ("CAR", "LAR")]),
                },
                GroupConfig {
                    name: "AFC".to_string(),
                    bye: Some("DEN".to_string()),
                    teams: seeded(&[
                        ("DEN", 1),
                        ("NE", 2),
                        ("JAX", 3),
                        ("PIT", 4),
                        ("HOU", 5),
                        ("BUF", 6),
                        ("LAC", 7),
                    ]),
                    first_round: pairs(&[("NE", "LAC"), ("JAX", "BUF"), ("PIT", "HOU")]),
                },
            ],
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read a TOML bracket file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check every group and build the index-based topology.
    pub fn validate(&self) -> Result<ValidatedBracket, ConfigError> {
        let mut seen_codes: HashSet<&str> = HashSet::new();
        let mut groups = Vec::with_capacity(self.groups.len());

        for group in &self.groups {
            for team in &group.teams {
                if !seen_codes.insert(team.code.as_str()) {
                    return Err(ConfigError::DuplicateTeam {
                        team: team.code.clone(),
                    });
                }
            }
            groups.push(GroupBracket::from_config(group)?);
        }

        Ok(ValidatedBracket { groups })
    }
}

/// Immutable topology of one group, with teams addressed by index.
#[derive(Clone, Debug)]
pub struct GroupBracket {
    name: String,
    teams: Vec<String>,
    seeds: Vec<u32>,
    bye: Option<usize>,
    first_round: Vec<(usize, usize)>,
}

impl GroupBracket {
    fn from_config(config: &GroupConfig) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidTopology {
            group: config.name.clone(),
            reason,
        };

        if config.teams.len() > MAX_GROUP_TEAMS {
            return Err(invalid(format!(
                "{} teams exceeds the limit of {}",
                config.teams.len(),
                MAX_GROUP_TEAMS
            )));
        }

        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut seeds_seen = HashSet::new();
        for (i, team) in config.teams.iter().enumerate() {
            if !seeds_seen.insert(team.seed) {
                return Err(ConfigError::DuplicateSeed {
                    group: config.name.clone(),
                    seed: team.seed,
                });
            }
            index.insert(team.code.as_str(), i);
        }

        let lookup = |code: &str, context: &str| {
            index.get(code).copied().ok_or_else(|| ConfigError::UnknownTeam {
                team: code.to_string(),
                context: format!("{} of group {}", context, config.name),
            })
        };

        let bye = match &config.bye {
            Some(code) => Some(lookup(code.as_str(), "bye")?),
            None => None,
        };

        let expected_games = if bye.is_some() { 3 } else { 4 };
        if config.first_round.len() != expected_games {
            return Err(invalid(format!(
                "expected {} first-round matchups, found {}",
                expected_games,
                config.first_round.len()
            )));
        }

        let mut first_round = Vec::with_capacity(expected_games);
        let mut entrants = vec![false; config.teams.len()];
        for (a, b) in &config.first_round {
            let a = lookup(a.as_str(), "first round")?;
            let b = lookup(b.as_str(), "first round")?;
            for t in [a, b] {
                if Some(t) == bye {
                    return Err(invalid(format!(
                        "bye team {} is scheduled in the first round",
                        config.teams[t].code
                    )));
                }
                if entrants[t] {
                    return Err(invalid(format!(
                        "{} is scheduled twice in the first round",
                        config.teams[t].code
                    )));
                }
                entrants[t] = true;
            }
            first_round.push((a, b));
        }

        let expected_teams = 2 * expected_games + usize::from(bye.is_some());
        if config.teams.len() != expected_teams {
            return Err(invalid(format!(
                "expected {} teams, found {}",
                expected_teams,
                config.teams.len()
            )));
        }

        Ok(GroupBracket {
            name: config.name.clone(),
            teams: config.teams.iter().map(|t| t.code.clone()).collect(),
            seeds: config.teams.iter().map(|t| t.seed).collect(),
            bye,
            first_round,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Team codes in configuration order; positions are the team indices.
    pub fn teams(&self) -> &[String] {
        &self.teams
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    pub fn index_of(&self, code: &str) -> Option<usize> {
        self.teams.iter().position(|t| t == code)
    }

    pub fn seed(&self, team: usize) -> u32 {
        self.seeds[team]
    }

    pub fn bye(&self) -> Option<usize> {
        self.bye
    }

    pub fn first_round(&self) -> &[(usize, usize)] {
        &self.first_round
    }

    /// Total games in one playout of this group.
    pub fn games_per_playout(&self) -> usize {
        self.first_round.len() + 3
    }

    /// Reseeded second-round pairings for this playout's first-round winners.
    ///
    /// The bye team (or, without a bye, the best-seeded winner) meets the
    /// worst-seeded winner. The other two winners meet in first-round order.
    /// The first team of each returned pair is the favored slot.
    pub fn second_round_pairings(&self, winners: &[usize]) -> [(usize, usize); 2] {
        let mut entrants = [0usize; 4];
        let offset = match self.bye {
            Some(bye) => {
                entrants[0] = bye;
                1
            }
            None => 0,
        };
        entrants[offset..].copy_from_slice(winners);

        let anchor = if self.bye.is_some() {
            0
        } else {
            let mut best = 0;
            for i in 1..4 {
                if self.seeds[entrants[i]] < self.seeds[entrants[best]] {
                    best = i;
                }
            }
            best
        };

        let mut worst = usize::MAX;
        for i in 0..4 {
            if i == anchor {
                continue;
            }
            if worst == usize::MAX || self.seeds[entrants[i]] > self.seeds[entrants[worst]] {
                worst = i;
            }
        }

        let mut rest = [0usize; 2];
        let mut n = 0;
        for (i, &team) in entrants.iter().enumerate() {
            if i != anchor && i != worst {
                rest[n] = team;
                n += 1;
            }
        }

        [(entrants[anchor], entrants[worst]), (rest[0], rest[1])]
    }
}

/// Every group of a deployment, checked and indexed.
#[derive(Clone, Debug)]
pub struct ValidatedBracket {
    groups: Vec<GroupBracket>,
}

impl ValidatedBracket {
    pub fn groups(&self) -> &[GroupBracket] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Result<&GroupBracket, ConfigError> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| ConfigError::UnknownGroup(name.to_string()))
    }

    /// Name of the group a team belongs to.
    pub fn group_of(&self, code: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|g| g.index_of(code).is_some())
            .map(|g| g.name())
    }

    pub fn team(&self, code: &str) -> Option<Team> {
        self.groups.iter().find_map(|g| {
            g.index_of(code)
                .map(|i| Team::new(code, g.name.clone(), g.seeds[i]))
        })
    }

    /// Reject input rows for teams outside the bracket, repeated rows, and
    /// rows whose first-round flag contradicts the bye assignment.
    pub fn check_odds(&self, odds: &[AdvancementOdds]) -> Result<(), ConfigError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for row in odds {
            if !seen.insert(row.team.as_str()) {
                return Err(ConfigError::DuplicateOdds {
                    team: row.team.clone(),
                });
            }

            let group = self
                .groups
                .iter()
                .find(|g| g.index_of(&row.team).is_some())
                .ok_or_else(|| ConfigError::UnknownTeam {
                    team: row.team.clone(),
                    context: "the input table".to_string(),
                })?;

            let is_bye = group
                .bye
                .map_or(false, |b| group.teams[b] == row.team);
            if is_bye == row.has_first_round_game {
                return Err(ConfigError::ByeMismatch {
                    team: row.team.clone(),
                    has_first_round_game: row.has_first_round_game,
                });
            }
        }
        Ok(())
    }
}
