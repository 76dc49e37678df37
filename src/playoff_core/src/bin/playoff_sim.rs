//! Playoff simulation CLI
//!
//! Simulates every group of the bracket from a win-odds CSV and prints the
//! conditional game counts, or a draft board built from them, as JSON.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use playoff_core::constants::{DEFAULT_CONFIDENCE, MIN_STABLE_CHAMPION_COUNT};
use playoff_core::{
    build_board, build_round_probs, champion_shares, load_adp, load_players, load_win_odds,
    simulate_all_groups, unstable_champions, BoardInputs, BracketConfig, ChampionShare,
    ConditionalGames, SimulationConfig, ValidatedBracket, DEFAULT_SEED, DEFAULT_TRIALS,
};

#[derive(Parser)]
#[command(name = "playoff_sim")]
#[command(about = "Conditional expected games for reseeded playoff brackets", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SimArgs {
    /// Win-odds CSV (Team, Pick to Win Popularity (Wild Card), Chance to Make ...)
    #[arg(long)]
    odds: PathBuf,

    /// TOML bracket configuration; defaults to the built-in NFL field
    #[arg(long)]
    bracket: Option<PathBuf>,

    /// Monte Carlo playouts per group
    #[arg(long, default_value_t = DEFAULT_TRIALS)]
    trials: u64,

    /// RNG seed; group i uses seed + i
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate every group and print conditional expectations
    Simulate {
        #[command(flatten)]
        sim: SimArgs,

        /// Confidence level for champion-share intervals
        #[arg(long, default_value_t = DEFAULT_CONFIDENCE, value_parser = parse_confidence)]
        confidence: f64,

        /// Champion count below which a conditional map is flagged unstable
        #[arg(long, default_value_t = MIN_STABLE_CHAMPION_COUNT)]
        min_count: u64,
    },

    /// Build a draft board from player projections
    Board {
        #[command(flatten)]
        sim: SimArgs,

        /// Player projections CSV
        #[arg(long)]
        players: PathBuf,

        /// ADP CSV with Name and Rank columns
        #[arg(long)]
        adp: Option<PathBuf>,

        /// Drafted players in draft order, comma separated
        #[arg(long, value_delimiter = ',')]
        drafted: Vec<String>,

        /// Lock override as GROUP=TEAM, repeatable
        #[arg(long)]
        lock: Vec<String>,
    },
}

#[derive(Serialize)]
struct GroupReport<'a> {
    #[serde(flatten)]
    results: &'a ConditionalGames,
    champion_shares: Vec<ChampionShare>,
    unstable_champions: Vec<String>,
}

fn parse_confidence(raw: &str) -> Result<f64, String> {
    let confidence: f64 = raw.parse().map_err(|e| format!("{}", e))?;
    if confidence > 0.0 && confidence < 1.0 {
        Ok(confidence)
    } else {
        Err(format!("confidence must lie strictly between 0 and 1, got {}", raw))
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_bracket(path: Option<&Path>) -> Result<ValidatedBracket> {
    let config = match path {
        Some(path) => BracketConfig::from_path(path)?,
        None => BracketConfig::nfl(),
    };
    Ok(config.validate()?)
}

fn run_simulation(
    sim: &SimArgs,
) -> Result<(ValidatedBracket, Vec<playoff_core::AdvancementOdds>, BTreeMap<String, ConditionalGames>)> {
    let bracket = load_bracket(sim.bracket.as_deref())?;
    let odds = load_win_odds(&sim.odds)
        .with_context(|| format!("Failed to load win odds: {}", sim.odds.display()))?;
    bracket.check_odds(&odds)?;

    let probs = build_round_probs(&odds);
    let config = SimulationConfig {
        trials: sim.trials,
        seed: sim.seed,
    };
    info!(groups = bracket.groups().len(), trials = config.trials, seed = config.seed, "running simulation");
    let results = simulate_all_groups(&bracket, &probs, &config)?;

    Ok((bracket, odds, results))
}

fn parse_locks(locks: &[String]) -> Result<BTreeMap<String, String>> {
    let mut parsed = BTreeMap::new();
    for lock in locks {
        let Some((group, team)) = lock.split_once('=') else {
            bail!("lock override {:?} is not GROUP=TEAM", lock);
        };
        parsed.insert(group.trim().to_string(), team.trim().to_string());
    }
    Ok(parsed)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Simulate {
            sim,
            confidence,
            min_count,
        } => {
            let (_, _, results) = run_simulation(&sim)?;

            let report: BTreeMap<&str, GroupReport<'_>> = results
                .iter()
                .map(|(name, r)| {
                    (
                        name.as_str(),
                        GroupReport {
                            results: r,
                            champion_shares: champion_shares(r, confidence),
                            unstable_champions: unstable_champions(r, min_count),
                        },
                    )
                })
                .collect();

            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Board {
            sim,
            players,
            adp,
            drafted,
            lock,
        } => {
            let (bracket, odds, results) = run_simulation(&sim)?;
            let players = load_players(&players)
                .with_context(|| format!("Failed to load players: {}", players.display()))?;
            let adp = match adp {
                Some(path) => load_adp(&path)
                    .with_context(|| format!("Failed to load ADP: {}", path.display()))?,
                None => HashMap::new(),
            };

            let inputs = BoardInputs {
                bracket: &bracket,
                odds: &odds,
                results: &results,
                adp: &adp,
            };
            let board = build_board(&players, &inputs, &drafted, &parse_locks(&lock)?)?;

            println!("{}", serde_json::to_string_pretty(&board)?);
        }
    }

    Ok(())
}
