/// Default number of Monte Carlo playouts per group
pub const DEFAULT_TRIALS: u64 = 200_000;

/// Default RNG seed; group `i` of a multi-group run uses `seed + i`
pub const DEFAULT_SEED: u64 = 1;

/// Playouts per RNG stream. Fixed so results do not depend on the worker count.
pub const TRIALS_PER_CHUNK: u64 = 16_384;

/// Largest group a bracket may hold (four first-round games, no bye)
pub const MAX_GROUP_TEAMS: usize = 8;

/// Games a team can play when it has a first-round game (includes the final)
pub const MAX_GAMES_WITH_FIRST_ROUND: f64 = 4.0;

/// Games a bye team can play (includes the final)
pub const MAX_GAMES_WITH_BYE: f64 = 3.0;

/// Champion count below which a conditional map is flagged as unstable
pub const MIN_STABLE_CHAMPION_COUNT: u64 = 100;

/// Default confidence level for champion-share intervals
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// Draft-slot booster multipliers applied to the draft-pool ceiling
pub const BOOSTERS: [f64; 6] = [2.0, 1.75, 1.5, 1.25, 1.0, 1.0];
