use crate::loader::PlayerProjection;
use crate::team::AdvancementOdds;

/// Expected games played (xGP) from the cumulative advancement odds.
///
/// Every team plays its first game; each further round adds the chance of
/// reaching it. Capped at the team's maximum game count. NaN when a needed
/// input is missing.
pub fn expected_games(odds: &AdvancementOdds) -> f64 {
    let later = match (odds.reach_third, odds.reach_final) {
        (Some(third), Some(fin)) => third + fin,
        _ => return f64::NAN,
    };

    let total = if odds.has_first_round_game {
        match odds.reach_second {
            Some(second) => 1.0 + second + later,
            None => return f64::NAN,
        }
    } else {
        1.0 + later
    };

    total.min(odds.max_games())
}

/// Expected fantasy points over the whole playoff run.
///
/// The wild-card game is projected separately; every later game uses the
/// later-round per-game projection.
pub fn expected_points(player: &PlayerProjection, odds: &AdvancementOdds) -> f64 {
    let xgp = expected_games(odds);
    if odds.has_first_round_game {
        player.wild_card_mean + (xgp - 1.0) * player.later_mean
    } else {
        xgp * player.later_mean
    }
}

/// Ceiling points for a player whose team plays every possible game.
pub fn ceiling_if_champion(player: &PlayerProjection, odds: &AdvancementOdds) -> f64 {
    ceiling_for_games(player, odds, odds.max_games())
}

/// Ceiling points over `effective_games` games. NaN falls back to the
/// team's maximum game count.
pub fn ceiling_with_effective_games(
    player: &PlayerProjection,
    odds: &AdvancementOdds,
    effective_games: f64,
) -> f64 {
    let games = if effective_games.is_nan() {
        odds.max_games()
    } else {
        effective_games
    };
    ceiling_for_games(player, odds, games)
}

fn ceiling_for_games(player: &PlayerProjection, odds: &AdvancementOdds, games: f64) -> f64 {
    if odds.has_first_round_game {
        player.wild_card_ceiling + (games - 1.0) * player.later_ceiling
    } else {
        games * player.later_ceiling
    }
}
