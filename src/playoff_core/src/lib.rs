//! Playoff Core - conditional expected games for single-elimination playoff
//! brackets with reseeding.
//!
//! Cumulative "chance to reach round N" odds are turned into per-round win
//! probabilities, then Monte Carlo playouts of each group's bracket estimate
//! every team's expected games played given each possible group champion.
//! Python bindings are available behind the `python` feature.

pub mod board;
pub mod bracket;
pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod loader;
pub mod round_probs;
pub mod scoring;
pub mod simulation;
pub mod team;

#[cfg(feature = "python")]
mod python;

pub use board::{build_board, Board, BoardInputs, BoardRow, GroupLock};
pub use bracket::{BracketConfig, GroupBracket, GroupConfig, SeededTeam, ValidatedBracket};
pub use constants::{DEFAULT_SEED, DEFAULT_TRIALS, TRIALS_PER_CHUNK};
pub use diagnostics::{champion_shares, unstable_champions, ChampionShare};
pub use error::{ConfigError, LoadError};
pub use loader::{load_adp, load_players, load_win_odds, PlayerProjection};
pub use round_probs::{build_round_probs, RoundProbs, RoundWinProbs};
pub use scoring::{ceiling_if_champion, ceiling_with_effective_games, expected_games, expected_points};
pub use simulation::{
    simulate_all_groups, simulate_conditionals, simulate_conditionals_with, ConditionalGames,
    GameResolver, RandomResolver, SimulationConfig,
};
pub use team::{AdvancementOdds, Team};
