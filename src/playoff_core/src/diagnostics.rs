use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::warn;

use crate::constants::DEFAULT_CONFIDENCE;
use crate::simulation::ConditionalGames;

/// Observed champion frequency for one team with its sampling uncertainty.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChampionShare {
    pub team: String,
    pub count: u64,
    pub share: f64,
    pub std_error: f64,
    pub ci_low: f64,
    pub ci_high: f64,
}

/// Two-sided z value for a confidence level, e.g. 1.96 for 0.95.
///
/// Levels outside (0, 1), NaN included, fall back to `DEFAULT_CONFIDENCE`.
fn z_value(confidence: f64) -> f64 {
    let normal = Normal::new(0.0, 1.0).unwrap();
    let confidence = if confidence > 0.0 && confidence < 1.0 {
        confidence
    } else {
        warn!(confidence, fallback = DEFAULT_CONFIDENCE, "confidence level outside (0, 1)");
        DEFAULT_CONFIDENCE
    };
    normal.inverse_cdf(0.5 + confidence / 2.0)
}

/// Champion shares with normal-approximation binomial confidence intervals.
///
/// # Arguments
/// * `results` - One group's simulation output
/// * `confidence` - Two-sided confidence level in (0, 1)
///
/// # Returns
/// One entry per team, ordered by descending count
pub fn champion_shares(results: &ConditionalGames, confidence: f64) -> Vec<ChampionShare> {
    let z = z_value(confidence);
    let n = results.trials as f64;

    let mut shares: Vec<ChampionShare> = results
        .champion_counts
        .iter()
        .map(|(team, &count)| {
            let share = if n > 0.0 { count as f64 / n } else { 0.0 };
            let std_error = if n > 0.0 {
                (share * (1.0 - share) / n).sqrt()
            } else {
                0.0
            };
            ChampionShare {
                team: team.clone(),
                count,
                share,
                std_error,
                ci_low: (share - z * std_error).max(0.0),
                ci_high: (share + z * std_error).min(1.0),
            }
        })
        .collect();

    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.team.cmp(&b.team)));
    shares
}

/// Champions whose conditional maps rest on fewer than `min_count` trials.
///
/// Teams that never won are included: there is no map to condition on.
pub fn unstable_champions(results: &ConditionalGames, min_count: u64) -> Vec<String> {
    results
        .champion_counts
        .iter()
        .filter(|(_, &count)| count < min_count)
        .map(|(team, _)| team.clone())
        .collect()
}
