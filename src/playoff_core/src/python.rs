use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::bracket::{BracketConfig, ValidatedBracket};
use crate::constants::{DEFAULT_SEED, DEFAULT_TRIALS};
use crate::error::{ConfigError, LoadError};
use crate::round_probs::build_round_probs;
use crate::simulation::{simulate_all_groups, simulate_conditionals, ConditionalGames, SimulationConfig};
use crate::team::AdvancementOdds;

/// (reach second round, reach third round, reach final, has first-round game)
type OddsRow = (Option<f64>, Option<f64>, Option<f64>, bool);

type Conditionals = (
    BTreeMap<String, BTreeMap<String, f64>>,
    BTreeMap<String, f64>,
    BTreeMap<String, u64>,
);

fn config_err(e: ConfigError) -> PyErr {
    match e {
        ConfigError::Io { .. } => PyIOError::new_err(e.to_string()),
        _ => PyValueError::new_err(e.to_string()),
    }
}

fn load_err(e: LoadError) -> PyErr {
    match e {
        LoadError::Io { .. } => PyIOError::new_err(e.to_string()),
        _ => PyValueError::new_err(e.to_string()),
    }
}

fn to_odds(odds: HashMap<String, OddsRow>) -> Vec<AdvancementOdds> {
    let mut rows: Vec<AdvancementOdds> = odds
        .into_iter()
        .map(|(team, (second, third, fin, has_wc))| AdvancementOdds::new(team, second, third, fin, has_wc))
        .collect();
    rows.sort_by(|a, b| a.team.cmp(&b.team));
    rows
}

fn load_bracket(bracket_path: Option<&str>) -> PyResult<ValidatedBracket> {
    let config = match bracket_path {
        Some(path) => BracketConfig::from_path(Path::new(path)).map_err(config_err)?,
        None => BracketConfig::nfl(),
    };
    config.validate().map_err(config_err)
}

fn into_tuple(result: ConditionalGames) -> Conditionals {
    (
        result.cond_by_champion,
        result.expected_if_not_champion,
        result.champion_counts,
    )
}

/// Per-round win probabilities: team -> (first, second, third).
#[pyfunction]
#[pyo3(name = "build_round_probs")]
fn py_build_round_probs(odds: HashMap<String, OddsRow>) -> BTreeMap<String, (f64, f64, f64)> {
    build_round_probs(&to_odds(odds))
        .iter()
        .map(|(team, p)| (team.clone(), (p.first, p.second, p.third)))
        .collect()
}

/// Read a win-odds CSV into team -> (second, third, final, has first-round game).
#[pyfunction]
#[pyo3(name = "load_win_odds")]
fn py_load_win_odds(path: &str) -> PyResult<BTreeMap<String, OddsRow>> {
    let odds = crate::loader::load_win_odds(Path::new(path)).map_err(load_err)?;
    Ok(odds
        .into_iter()
        .map(|o| {
            (
                o.team,
                (o.reach_second, o.reach_third, o.reach_final, o.has_first_round_game),
            )
        })
        .collect())
}

/// Simulate one group.
///
/// Returns (cond_by_champion, expected_if_not_champion, champion_counts).
#[pyfunction]
#[pyo3(name = "simulate_conditionals")]
#[pyo3(signature = (group, odds, n_sims = DEFAULT_TRIALS, seed = DEFAULT_SEED, bracket_path = None))]
fn py_simulate_conditionals(
    py: Python<'_>,
    group: &str,
    odds: HashMap<String, OddsRow>,
    n_sims: u64,
    seed: u64,
    bracket_path: Option<&str>,
) -> PyResult<Conditionals> {
    let bracket = load_bracket(bracket_path)?;
    let odds = to_odds(odds);
    bracket.check_odds(&odds).map_err(config_err)?;
    let probs = build_round_probs(&odds);
    let group = bracket.group(group).map_err(config_err)?;

    let result = py
        .allow_threads(|| simulate_conditionals(group, &probs, n_sims, seed))
        .map_err(config_err)?;
    Ok(into_tuple(result))
}

/// Simulate every group; group `i` uses `seed + i`.
#[pyfunction]
#[pyo3(name = "simulate_all_groups")]
#[pyo3(signature = (odds, n_sims = DEFAULT_TRIALS, seed = DEFAULT_SEED, bracket_path = None))]
fn py_simulate_all_groups(
    py: Python<'_>,
    odds: HashMap<String, OddsRow>,
    n_sims: u64,
    seed: u64,
    bracket_path: Option<&str>,
) -> PyResult<BTreeMap<String, Conditionals>> {
    let bracket = load_bracket(bracket_path)?;
    let odds = to_odds(odds);
    bracket.check_odds(&odds).map_err(config_err)?;
    let probs = build_round_probs(&odds);
    let config = SimulationConfig { trials: n_sims, seed };

    let results = py
        .allow_threads(|| simulate_all_groups(&bracket, &probs, &config))
        .map_err(config_err)?;
    Ok(results
        .into_iter()
        .map(|(name, result)| (name, into_tuple(result)))
        .collect())
}

/// Python module definition
#[pymodule]
fn playoff_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_build_round_probs, m)?)?;
    m.add_function(wrap_pyfunction!(py_load_win_odds, m)?)?;
    m.add_function(wrap_pyfunction!(py_simulate_conditionals, m)?)?;
    m.add_function(wrap_pyfunction!(py_simulate_all_groups, m)?)?;

    m.add("DEFAULT_TRIALS", DEFAULT_TRIALS)?;
    m.add("DEFAULT_SEED", DEFAULT_SEED)?;

    Ok(())
}
