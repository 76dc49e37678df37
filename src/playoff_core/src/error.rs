use std::path::PathBuf;

/// Bracket, input-table and simulation configuration errors.
///
/// All of these are fatal and are raised before any playout runs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown team {team:?} referenced by {context}")]
    UnknownTeam { team: String, context: String },

    #[error("team {team:?} appears more than once in the bracket configuration")]
    DuplicateTeam { team: String },

    #[error("team {team:?} appears more than once in the input table")]
    DuplicateOdds { team: String },

    #[error("group {group}: seed {seed} is assigned to more than one team")]
    DuplicateSeed { group: String, seed: u32 },

    #[error("group {group}: {reason}")]
    InvalidTopology { group: String, reason: String },

    #[error("team {team:?}: bye in the bracket disagrees with has_first_round_game={has_first_round_game}")]
    ByeMismatch {
        team: String,
        has_first_round_game: bool,
    },

    #[error("unknown group {0:?}")]
    UnknownGroup(String),

    #[error("no round probabilities for team {team:?}")]
    MissingProbabilities { team: String },

    #[error("trial count must be positive")]
    ZeroTrials,

    #[error("failed to read bracket configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid bracket configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// CSV input loading errors.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column {0:?}")]
    MissingColumn(String),

    #[error("row {row}: invalid value {value:?} in column {column:?}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },
}
