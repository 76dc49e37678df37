//! CSV loaders for the win-odds table, player projections and ADP ranks.
//!
//! Odds columns hold either plain decimals or percent strings. A column
//! containing any text (such as `"61.2%"`) is read as percentages and divided
//! by 100; a purely numeric column is taken as decimals. `N/A`-style
//! sentinels and unparseable cells become missing values, never zero.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::team::AdvancementOdds;

pub const COL_TEAM: &str = "Team";
pub const COL_WILD_CARD_PICK: &str = "Pick to Win Popularity (Wild Card)";
pub const COL_REACH_DIV: &str = "Chance to Make Div Round";
pub const COL_REACH_CONF: &str = "Chance to Make Conf. Champ.";
pub const COL_REACH_FINAL: &str = "Chance to Make Super Bowl";

pub const COL_PLAYER: &str = "Player";
pub const COL_POSITION: &str = "Position";
pub const COL_ROLE: &str = "Role";
pub const COL_WC_MEAN: &str = "Wild Card Mean FPTS";
pub const COL_LATER_MEAN: &str = "Div, Conf, SB Mean FPTS";
pub const COL_WC_CEILING: &str = "Wild Card Ceiling FPTS";
// two spaces, as exported by the projections source
pub const COL_LATER_CEILING: &str = "Div, Conf, SB  Ceiling FPTS";

pub const COL_ADP_NAME: &str = "Name";
pub const COL_ADP_RANK: &str = "Rank";

const MISSING_SENTINELS: [&str; 4] = ["", "N/A", "NA/", "nan"];

/// One player's fantasy projections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerProjection {
    pub player: String,
    pub team: String,
    pub position: String,
    pub role: Option<String>,
    pub wild_card_mean: f64,
    pub later_mean: f64,
    pub wild_card_ceiling: f64,
    pub later_ceiling: f64,
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader)
}

fn column(headers: &csv::StringRecord, name: &str) -> Result<usize, LoadError> {
    optional_column(headers, name).ok_or_else(|| LoadError::MissingColumn(name.to_string()))
}

fn optional_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn is_missing(raw: &str) -> bool {
    MISSING_SENTINELS.contains(&raw)
}

/// Parse a probability cell. `percent` selects percent-string mode.
///
/// Returns `None` for missing or unparseable cells.
pub fn parse_probability(raw: &str, percent: bool) -> Option<f64> {
    let raw = raw.trim();
    if is_missing(raw) {
        return None;
    }
    if percent {
        raw.trim_end_matches('%')
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| v / 100.0)
    } else {
        raw.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

/// A column is in percent mode when any present cell is not a plain number.
fn is_percent_column(records: &[csv::StringRecord], col: usize) -> bool {
    records.iter().any(|r| {
        let raw = r.get(col).unwrap_or("");
        !is_missing(raw) && raw.parse::<f64>().is_err()
    })
}

/// Read the win-odds table from any CSV source.
pub fn read_win_odds<R: Read>(reader: R) -> Result<Vec<AdvancementOdds>, LoadError> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers()?.clone();

    let team_col = column(&headers, COL_TEAM)?;
    let prob_cols = [
        column(&headers, COL_WILD_CARD_PICK)?,
        column(&headers, COL_REACH_DIV)?,
        column(&headers, COL_REACH_CONF)?,
        column(&headers, COL_REACH_FINAL)?,
    ];

    let records = rdr.records().collect::<Result<Vec<_>, _>>()?;
    let percent = prob_cols.map(|col| is_percent_column(&records, col));

    let mut odds = Vec::with_capacity(records.len());
    for (row, record) in records.iter().enumerate() {
        let team = record.get(team_col).unwrap_or("").to_string();
        if team.is_empty() {
            warn!(row = row + 1, "skipping win-odds row without a team");
            continue;
        }

        let mut values = [None; 4];
        for (k, &col) in prob_cols.iter().enumerate() {
            let raw = record.get(col).unwrap_or("");
            values[k] = parse_probability(raw, percent[k]);
            if values[k].is_none() && !is_missing(raw.trim()) {
                warn!(row = row + 1, team = %team, value = raw, "unparseable probability treated as missing");
            }
        }

        let [wild_card_pick, reach_second, reach_third, reach_final] = values;
        odds.push(AdvancementOdds::new(
            team,
            reach_second,
            reach_third,
            reach_final,
            wild_card_pick.is_some(),
        ));
    }

    debug!(teams = odds.len(), "loaded win odds");
    Ok(odds)
}

pub fn load_win_odds(path: &Path) -> Result<Vec<AdvancementOdds>, LoadError> {
    read_win_odds(open(path)?)
}

fn parse_points(record: &csv::StringRecord, col: usize, name: &str, row: usize) -> Result<f64, LoadError> {
    let raw = record.get(col).unwrap_or("");
    if is_missing(raw) {
        return Ok(f64::NAN);
    }
    raw.parse::<f64>().map_err(|_| LoadError::InvalidValue {
        row,
        column: name.to_string(),
        value: raw.to_string(),
    })
}

/// Read player projections from any CSV source.
pub fn read_players<R: Read>(reader: R) -> Result<Vec<PlayerProjection>, LoadError> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers()?.clone();

    let player_col = column(&headers, COL_PLAYER)?;
    let team_col = column(&headers, COL_TEAM)?;
    let position_col = column(&headers, COL_POSITION)?;
    let role_col = optional_column(&headers, COL_ROLE);
    let wc_mean = column(&headers, COL_WC_MEAN)?;
    let later_mean = column(&headers, COL_LATER_MEAN)?;
    let wc_ceiling = column(&headers, COL_WC_CEILING)?;
    let later_ceiling = column(&headers, COL_LATER_CEILING)?;

    let mut players = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        players.push(PlayerProjection {
            player: record.get(player_col).unwrap_or("").to_string(),
            team: record.get(team_col).unwrap_or("").to_string(),
            position: record.get(position_col).unwrap_or("").to_string(),
            role: role_col
                .and_then(|col| record.get(col))
                .filter(|r| !r.is_empty())
                .map(str::to_string),
            wild_card_mean: parse_points(&record, wc_mean, COL_WC_MEAN, row)?,
            later_mean: parse_points(&record, later_mean, COL_LATER_MEAN, row)?,
            wild_card_ceiling: parse_points(&record, wc_ceiling, COL_WC_CEILING, row)?,
            later_ceiling: parse_points(&record, later_ceiling, COL_LATER_CEILING, row)?,
        });
    }

    debug!(players = players.len(), "loaded player projections");
    Ok(players)
}

pub fn load_players(path: &Path) -> Result<Vec<PlayerProjection>, LoadError> {
    read_players(open(path)?)
}

/// Read ADP ranks keyed by player name. A file without `Name` and `Rank`
/// columns yields no ranks.
pub fn read_adp<R: Read>(reader: R) -> Result<HashMap<String, f64>, LoadError> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers()?.clone();

    let (Some(name_col), Some(rank_col)) = (
        optional_column(&headers, COL_ADP_NAME),
        optional_column(&headers, COL_ADP_RANK),
    ) else {
        warn!("ADP file has no Name/Rank columns; ranks unavailable");
        return Ok(HashMap::new());
    };

    let mut ranks = HashMap::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let name = record.get(name_col).unwrap_or("");
        if name.is_empty() {
            continue;
        }
        let rank = parse_points(&record, rank_col, COL_ADP_RANK, i + 1)?;
        ranks.insert(name.to_string(), rank);
    }
    Ok(ranks)
}

pub fn load_adp(path: &Path) -> Result<HashMap<String, f64>, LoadError> {
    read_adp(open(path)?)
}
