//! Draft board: combines player projections with the simulated conditional
//! game counts.
//!
//! Each group may be "locked" to the team assumed to win it: by default the
//! team of the first drafted player from that group, or an explicit
//! override. Teams in a locked group are valued on the games they play when
//! the lock wins; everyone else on the games they play when they do not win.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::bracket::ValidatedBracket;
use crate::constants::BOOSTERS;
use crate::error::ConfigError;
use crate::loader::PlayerProjection;
use crate::scoring::{ceiling_if_champion, ceiling_with_effective_games, expected_points};
use crate::simulation::ConditionalGames;
use crate::team::AdvancementOdds;

/// Lock state of one group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GroupLock {
    pub group: String,

    /// Team of the first drafted player from this group
    pub auto: Option<String>,

    /// Lock in effect: the override if one was given, else `auto`
    pub using: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BoardRow {
    pub player: String,
    pub team: String,
    pub group: String,
    pub seed: u32,
    pub position: String,
    pub expected_points: f64,
    pub ceiling_if_champion: f64,
    pub effective_games_if_not_champion: f64,
    pub ceiling_if_not_champion: f64,
    pub draft_pool_ceiling: f64,
    pub boosted: Vec<f64>,
    pub ceiling_rank: Option<u32>,
    pub adp_rank: Option<f64>,
    pub value_gap: Option<f64>,
    pub drafted: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct Board {
    pub rows: Vec<BoardRow>,
    pub locks: Vec<GroupLock>,
}

/// Everything the board needs besides the player list.
pub struct BoardInputs<'a> {
    pub bracket: &'a ValidatedBracket,
    pub odds: &'a [AdvancementOdds],
    /// Simulation results keyed by group name
    pub results: &'a BTreeMap<String, ConditionalGames>,
    /// ADP rank keyed by player name
    pub adp: &'a HashMap<String, f64>,
}

/// First drafted team per group, in draft order.
pub fn first_team_lock_by_group(
    bracket: &ValidatedBracket,
    drafted_in_order: &[String],
    player_to_team: &HashMap<&str, &str>,
) -> BTreeMap<String, String> {
    let mut locks = BTreeMap::new();
    for name in drafted_in_order {
        let Some(team) = player_to_team.get(name.as_str()) else {
            continue;
        };
        if let Some(group) = bracket.group_of(team) {
            locks
                .entry(group.to_string())
                .or_insert_with(|| team.to_string());
        }
    }
    locks
}

/// Resolve the lock in effect for every group.
pub fn resolve_locks(
    bracket: &ValidatedBracket,
    auto: &BTreeMap<String, String>,
    overrides: &BTreeMap<String, String>,
) -> Result<Vec<GroupLock>, ConfigError> {
    for (group, team) in overrides {
        let g = bracket.group(group)?;
        if g.index_of(team).is_none() {
            return Err(ConfigError::UnknownTeam {
                team: team.clone(),
                context: format!("lock override for group {}", group),
            });
        }
    }

    Ok(bracket
        .groups()
        .iter()
        .map(|g| {
            let auto = auto.get(g.name()).cloned();
            let using = overrides.get(g.name()).cloned().or_else(|| auto.clone());
            GroupLock {
                group: g.name().to_string(),
                auto,
                using,
            }
        })
        .collect())
}

/// Games a team is expected to play within its group, under the group's lock.
///
/// NaN when the needed conditional has no data.
pub fn effective_games(team: &str, lock: Option<&str>, results: Option<&ConditionalGames>) -> f64 {
    let Some(results) = results else {
        return f64::NAN;
    };
    match lock {
        Some(lock) if lock != team => results
            .expected_given_champion(lock, team)
            .unwrap_or(f64::NAN),
        _ => results.expected_if_not_champion(team),
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Build the draft board, sorted by draft-pool ceiling, best first.
///
/// # Arguments
/// * `players` - Player projections
/// * `inputs` - Bracket, odds, simulation results and ADP ranks
/// * `drafted_in_order` - Names of drafted players, earliest first
/// * `lock_overrides` - Group name to locked team, replacing the automatic lock
pub fn build_board(
    players: &[PlayerProjection],
    inputs: &BoardInputs<'_>,
    drafted_in_order: &[String],
    lock_overrides: &BTreeMap<String, String>,
) -> Result<Board, ConfigError> {
    let odds_by_team: HashMap<&str, &AdvancementOdds> =
        inputs.odds.iter().map(|o| (o.team.as_str(), o)).collect();
    let player_to_team: HashMap<&str, &str> = players
        .iter()
        .map(|p| (p.player.as_str(), p.team.as_str()))
        .collect();

    let auto = first_team_lock_by_group(inputs.bracket, drafted_in_order, &player_to_team);
    let locks = resolve_locks(inputs.bracket, &auto, lock_overrides)?;
    let lock_of: HashMap<&str, Option<&str>> = locks
        .iter()
        .map(|l| (l.group.as_str(), l.using.as_deref()))
        .collect();

    let mut rows = Vec::with_capacity(players.len());
    for p in players {
        let team = inputs
            .bracket
            .team(&p.team)
            .ok_or_else(|| ConfigError::UnknownTeam {
                team: p.team.clone(),
                context: format!("player {}", p.player),
            })?;
        let group = team.group.as_str();
        let odds = odds_by_team
            .get(p.team.as_str())
            .copied()
            .ok_or_else(|| ConfigError::UnknownTeam {
                team: p.team.clone(),
                context: "the win-odds table".to_string(),
            })?;
        let lock = lock_of.get(group).copied().flatten();

        let eff = effective_games(&p.team, lock, inputs.results.get(group));
        let champ_ceiling = ceiling_if_champion(p, odds);
        let not_champ_ceiling = ceiling_with_effective_games(p, odds, eff);
        let draft_pool_ceiling = match lock {
            Some(lock) if lock != p.team => not_champ_ceiling,
            _ => champ_ceiling,
        };

        if eff.is_nan() {
            debug!(team = %team, player = %p.player, "no conditional data, ceiling uses max games");
        }

        let adp_rank = inputs.adp.get(&p.player).copied().filter(|r| !r.is_nan());
        rows.push(BoardRow {
            player: p.player.clone(),
            team: p.team.clone(),
            group: group.to_string(),
            seed: team.seed,
            position: p.position.clone(),
            expected_points: expected_points(p, odds),
            ceiling_if_champion: champ_ceiling,
            effective_games_if_not_champion: eff,
            ceiling_if_not_champion: not_champ_ceiling,
            draft_pool_ceiling,
            boosted: BOOSTERS.iter().map(|m| draft_pool_ceiling * m).collect(),
            ceiling_rank: None,
            adp_rank,
            value_gap: None,
            drafted: drafted_in_order.iter().any(|d| *d == p.player),
        });
    }

    // min-method rank: ties share the best rank
    let ceilings: Vec<f64> = rows.iter().map(|r| r.draft_pool_ceiling).collect();
    for row in &mut rows {
        if row.draft_pool_ceiling.is_nan() {
            continue;
        }
        let better = ceilings
            .iter()
            .filter(|&&c| !c.is_nan() && c > row.draft_pool_ceiling)
            .count();
        let rank = better as u32 + 1;
        row.ceiling_rank = Some(rank);
        row.value_gap = row.adp_rank.map(|adp| adp - f64::from(rank));
    }

    rows.sort_by(|a, b| descending(a.draft_pool_ceiling, b.draft_pool_ceiling));
    debug!(rows = rows.len(), ?locks, "built draft board");

    Ok(Board { rows, locks })
}
