//! Monte Carlo playouts of a group bracket and the conditional game-count
//! estimates built from them.
//!
//! Trials are split into fixed-size chunks, each with its own ChaCha stream
//! (`seed`, stream = chunk index). Chunks run on rayon workers with local
//! accumulators that merge by elementwise addition. All sums are integer game
//! counts, so the result for a given seed is bit-identical regardless of how
//! many threads ran it.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::bracket::{GroupBracket, ValidatedBracket};
use crate::constants::{
    DEFAULT_SEED, DEFAULT_TRIALS, MAX_GROUP_TEAMS, MIN_STABLE_CHAMPION_COUNT, TRIALS_PER_CHUNK,
};
use crate::error::ConfigError;
use crate::round_probs::{RoundProbs, RoundWinProbs};

/// Decides the winner of a single game.
pub trait GameResolver {
    /// Winner of `favored` against `opponent`, where `p` is the favored
    /// slot's win probability.
    fn resolve(&mut self, favored: usize, opponent: usize, p: f64) -> usize;
}

/// Resolves games by drawing a uniform value in [0, 1): the favored slot
/// wins iff the draw is below its win probability.
pub struct RandomResolver<R> {
    rng: R,
}

impl<R: Rng> RandomResolver<R> {
    pub fn new(rng: R) -> Self {
        RandomResolver { rng }
    }
}

impl<R: Rng> GameResolver for RandomResolver<R> {
    fn resolve(&mut self, favored: usize, opponent: usize, p: f64) -> usize {
        if self.rng.gen::<f64>() < p {
            favored
        } else {
            opponent
        }
    }
}

/// Trial count and seed for a simulation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub trials: u64,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            trials: DEFAULT_TRIALS,
            seed: DEFAULT_SEED,
        }
    }
}

/// Result of one playout: games played per team index, and the champion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Playout {
    pub champion: usize,
    pub games: [u8; MAX_GROUP_TEAMS],
}

/// Round probabilities for a group's teams, in the group's index order.
///
/// Only the bye team may lack a first-round probability (NaN); any other
/// NaN would make that team lose every first-round draw.
pub fn group_probs(group: &GroupBracket, probs: &RoundWinProbs) -> Result<Vec<RoundProbs>, ConfigError> {
    group
        .teams()
        .iter()
        .enumerate()
        .map(|(i, team)| {
            let p = probs
                .get(team)
                .copied()
                .ok_or_else(|| ConfigError::MissingProbabilities { team: team.clone() })?;
            if p.first.is_nan() != (group.bye() == Some(i)) {
                return Err(ConfigError::ByeMismatch {
                    team: team.clone(),
                    has_first_round_game: !p.first.is_nan(),
                });
            }
            Ok(p)
        })
        .collect()
}

/// Play one bracket from the first round to the group champion.
///
/// Second-round pairings are re-derived from this playout's first-round
/// winners every time.
pub fn simulate_once<G: GameResolver>(
    group: &GroupBracket,
    probs: &[RoundProbs],
    resolver: &mut G,
) -> Playout {
    let mut games = [0u8; MAX_GROUP_TEAMS];

    let first_round = group.first_round();
    let mut first_winners = [0usize; 4];
    for (i, &(home, away)) in first_round.iter().enumerate() {
        games[home] += 1;
        games[away] += 1;
        first_winners[i] = resolver.resolve(home, away, probs[home].first);
    }

    let mut second_winners = [0usize; 2];
    let pairings = group.second_round_pairings(&first_winners[..first_round.len()]);
    for (i, &(a, b)) in pairings.iter().enumerate() {
        games[a] += 1;
        games[b] += 1;
        second_winners[i] = resolver.resolve(a, b, probs[a].second);
    }

    let [a, b] = second_winners;
    games[a] += 1;
    games[b] += 1;
    let champion = resolver.resolve(a, b, probs[a].third);

    Playout { champion, games }
}

/// Running sums of games played, keyed by realized champion.
///
/// Per-champion sums are a flat `champion * teams + team` array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConditionalAccumulator {
    teams: usize,
    trials: u64,
    sums_by_champion: Vec<u64>,
    champion_counts: Vec<u64>,
    sums_not_champion: Vec<u64>,
    not_champion_counts: Vec<u64>,
}

impl ConditionalAccumulator {
    pub fn new(teams: usize) -> Self {
        ConditionalAccumulator {
            teams,
            trials: 0,
            sums_by_champion: vec![0; teams * teams],
            champion_counts: vec![0; teams],
            sums_not_champion: vec![0; teams],
            not_champion_counts: vec![0; teams],
        }
    }

    pub fn record(&mut self, playout: &Playout) {
        let champ = playout.champion;
        self.trials += 1;
        self.champion_counts[champ] += 1;

        let row = &mut self.sums_by_champion[champ * self.teams..(champ + 1) * self.teams];
        for (t, sum) in row.iter_mut().enumerate() {
            let g = u64::from(playout.games[t]);
            *sum += g;
            if t != champ {
                self.sums_not_champion[t] += g;
                self.not_champion_counts[t] += 1;
            }
        }
    }

    /// Elementwise sum of two accumulators over the same group.
    pub fn merge(mut self, other: Self) -> Self {
        debug_assert_eq!(self.teams, other.teams);
        self.trials += other.trials;
        add_into(&mut self.sums_by_champion, &other.sums_by_champion);
        add_into(&mut self.champion_counts, &other.champion_counts);
        add_into(&mut self.sums_not_champion, &other.sums_not_champion);
        add_into(&mut self.not_champion_counts, &other.not_champion_counts);
        self
    }

    /// Divide the sums out into per-team expectations keyed by team code.
    pub fn finish(&self, group: &GroupBracket) -> ConditionalGames {
        let names = group.teams();
        let mut cond_by_champion = BTreeMap::new();
        let mut champion_counts = BTreeMap::new();
        let mut expected_if_not_champion = BTreeMap::new();
        let mut not_champion_counts = BTreeMap::new();

        for (c, champ) in names.iter().enumerate() {
            let count = self.champion_counts[c];
            champion_counts.insert(champ.clone(), count);
            if count > 0 {
                let row = &self.sums_by_champion[c * self.teams..(c + 1) * self.teams];
                let expectations = names
                    .iter()
                    .zip(row)
                    .map(|(team, &sum)| (team.clone(), sum as f64 / count as f64))
                    .collect();
                cond_by_champion.insert(champ.clone(), expectations);
            }
        }

        for (t, team) in names.iter().enumerate() {
            let count = self.not_champion_counts[t];
            let expected = if count > 0 {
                self.sums_not_champion[t] as f64 / count as f64
            } else {
                f64::NAN
            };
            expected_if_not_champion.insert(team.clone(), expected);
            not_champion_counts.insert(team.clone(), count);
        }

        ConditionalGames {
            group: group.name().to_string(),
            trials: self.trials,
            cond_by_champion,
            expected_if_not_champion,
            champion_counts,
            not_champion_counts,
        }
    }
}

fn add_into(acc: &mut [u64], other: &[u64]) {
    for (a, b) in acc.iter_mut().zip(other) {
        *a += b;
    }
}

/// Conditional game-count estimates for one group.
///
/// A champion with no observed trials has no `cond_by_champion` entry;
/// callers must not condition on it. `expected_if_not_champion` is NaN for a
/// team that was never observed as a non-champion; `not_champion_counts`
/// and `champion_counts` tell a deterministic champion apart from too few
/// trials.
#[derive(Clone, Debug, Serialize)]
pub struct ConditionalGames {
    pub group: String,
    pub trials: u64,

    /// `cond_by_champion[champ][team]` = E[games(team) | champ wins the group]
    pub cond_by_champion: BTreeMap<String, BTreeMap<String, f64>>,

    /// `expected_if_not_champion[team]` = E[games(team) | team does not win]
    pub expected_if_not_champion: BTreeMap<String, f64>,

    pub champion_counts: BTreeMap<String, u64>,

    pub not_champion_counts: BTreeMap<String, u64>,
}

impl ConditionalGames {
    /// E[games(team) | champion], or `None` if `champion` never won.
    pub fn expected_given_champion(&self, champion: &str, team: &str) -> Option<f64> {
        self.cond_by_champion.get(champion)?.get(team).copied()
    }

    /// E[games(team) | team does not win]; NaN when undefined or unknown.
    pub fn expected_if_not_champion(&self, team: &str) -> f64 {
        self.expected_if_not_champion
            .get(team)
            .copied()
            .unwrap_or(f64::NAN)
    }

    pub fn champion_count(&self, team: &str) -> u64 {
        self.champion_counts.get(team).copied().unwrap_or(0)
    }
}

/// Run `trials` playouts of one group and reduce them into conditional
/// expectations.
///
/// # Arguments
/// * `group` - Validated topology of the group
/// * `probs` - Round win probabilities; every team of the group must be present
/// * `trials` - Number of playouts, must be positive
/// * `seed` - Seed of the random stream; equal seeds give identical results
pub fn simulate_conditionals(
    group: &GroupBracket,
    probs: &RoundWinProbs,
    trials: u64,
    seed: u64,
) -> Result<ConditionalGames, ConfigError> {
    if trials == 0 {
        return Err(ConfigError::ZeroTrials);
    }
    let team_probs = group_probs(group, probs)?;
    let chunks = trials.div_ceil(TRIALS_PER_CHUNK);
    let teams = group.team_count();

    info!(group = group.name(), trials, seed, chunks, "simulating group");

    let acc = (0..chunks)
        .into_par_iter()
        .map(|chunk| {
            let start = chunk * TRIALS_PER_CHUNK;
            let n = TRIALS_PER_CHUNK.min(trials - start);

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(chunk);
            let mut resolver = RandomResolver::new(rng);

            let mut acc = ConditionalAccumulator::new(teams);
            for _ in 0..n {
                acc.record(&simulate_once(group, &team_probs, &mut resolver));
            }
            acc
        })
        .reduce(|| ConditionalAccumulator::new(teams), ConditionalAccumulator::merge);

    let result = acc.finish(group);
    log_summary(&result);
    Ok(result)
}

/// Sequential variant of [`simulate_conditionals`] driven by a caller-supplied
/// resolver.
pub fn simulate_conditionals_with<G: GameResolver>(
    group: &GroupBracket,
    probs: &RoundWinProbs,
    trials: u64,
    resolver: &mut G,
) -> Result<ConditionalGames, ConfigError> {
    if trials == 0 {
        return Err(ConfigError::ZeroTrials);
    }
    let team_probs = group_probs(group, probs)?;

    let mut acc = ConditionalAccumulator::new(group.team_count());
    for _ in 0..trials {
        acc.record(&simulate_once(group, &team_probs, resolver));
    }

    let result = acc.finish(group);
    log_summary(&result);
    Ok(result)
}

/// Simulate every group concurrently. Group `i` uses seed `config.seed + i`.
pub fn simulate_all_groups(
    bracket: &ValidatedBracket,
    probs: &RoundWinProbs,
    config: &SimulationConfig,
) -> Result<BTreeMap<String, ConditionalGames>, ConfigError> {
    if config.trials == 0 {
        return Err(ConfigError::ZeroTrials);
    }
    if let Some((team, _)) = probs.iter().find(|(team, _)| bracket.group_of(team).is_none()) {
        return Err(ConfigError::UnknownTeam {
            team: team.clone(),
            context: "the round probability table".to_string(),
        });
    }

    bracket
        .groups()
        .par_iter()
        .enumerate()
        .map(|(i, group)| {
            let seed = config.seed.wrapping_add(i as u64);
            simulate_conditionals(group, probs, config.trials, seed)
                .map(|result| (group.name().to_string(), result))
        })
        .collect()
}

fn log_summary(result: &ConditionalGames) {
    debug!(
        group = %result.group,
        trials = result.trials,
        champions = ?result.champion_counts,
        "group simulation complete"
    );
    for (team, &count) in &result.champion_counts {
        if count > 0 && count < MIN_STABLE_CHAMPION_COUNT {
            warn!(
                group = %result.group,
                team = %team,
                count,
                "few trials behind this champion's conditional expectations"
            );
        }
    }
    for (team, &count) in &result.not_champion_counts {
        if count == 0 {
            warn!(
                group = %result.group,
                team = %team,
                "team never observed as a non-champion; expectation is undefined"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{BracketConfig, GroupConfig, SeededTeam};
    use crate::round_probs::build_round_probs;
    use crate::team::AdvancementOdds;
    use statrs::statistics::Statistics;
    use std::collections::HashSet;

    fn nfl() -> ValidatedBracket {
        BracketConfig::nfl().validate().unwrap()
    }

    fn nfc_odds() -> Vec<AdvancementOdds> {
        vec![
            AdvancementOdds::bye("SEA", 0.62, 0.36),
            AdvancementOdds::new("CHI", Some(0.55), Some(0.24), Some(0.11), true),
            AdvancementOdds::new("PHI", Some(0.63), Some(0.30), Some(0.15), true),
            AdvancementOdds::new("CAR", Some(0.41), Some(0.12), Some(0.04), true),
            AdvancementOdds::new("LAR", Some(0.59), Some(0.27), Some(0.14), true),
            AdvancementOdds::new("SF", Some(0.37), Some(0.14), Some(0.06), true),
            AdvancementOdds::new("GB", Some(0.45), Some(0.17), Some(0.08), true),
        ]
    }

    fn flat_probs(group: &GroupBracket, p: f64) -> RoundWinProbs {
        let mut table = RoundWinProbs::default();
        for (i, team) in group.teams().iter().enumerate() {
            let first = if group.bye() == Some(i) { f64::NAN } else { p };
            table.insert(
                team.clone(),
                RoundProbs {
                    first,
                    second: p,
                    third: p,
                },
            );
        }
        table
    }

    fn eight_team_group() -> GroupBracket {
        let config = BracketConfig {
            groups: vec![GroupConfig {
                name: "East".to_string(),
                bye: None,
                teams: (1..=8)
                    .map(|seed| SeededTeam {
                        code: format!("T{}", seed),
                        seed,
                    })
                    .collect(),
                first_round: vec![
                    ("T1".to_string(), "T8".to_string()),
                    ("T2".to_string(), "T7".to_string()),
                    ("T3".to_string(), "T6".to_string()),
                    ("T4".to_string(), "T5".to_string()),
                ],
            }],
        };
        config.validate().unwrap().groups()[0].clone()
    }

    fn assert_bit_identical(a: &ConditionalGames, b: &ConditionalGames) {
        assert_eq!(a.champion_counts, b.champion_counts);
        assert_eq!(a.not_champion_counts, b.not_champion_counts);
        for (team, x) in &a.expected_if_not_champion {
            assert_eq!(x.to_bits(), b.expected_if_not_champion[team].to_bits());
        }
        assert_eq!(a.cond_by_champion.len(), b.cond_by_champion.len());
        for (champ, row) in &a.cond_by_champion {
            for (team, x) in row {
                assert_eq!(x.to_bits(), b.cond_by_champion[champ][team].to_bits());
            }
        }
    }

    /// Forces the listed teams to win every game they play and records each
    /// pairing it is asked to resolve.
    struct ScriptedResolver {
        winners: HashSet<usize>,
        games: Vec<(usize, usize)>,
    }

    impl GameResolver for ScriptedResolver {
        fn resolve(&mut self, favored: usize, opponent: usize, _p: f64) -> usize {
            self.games.push((favored, opponent));
            if self.winners.contains(&opponent) {
                opponent
            } else {
                favored
            }
        }
    }

    #[test]
    fn test_reproducible_with_same_seed() {
        let bracket = nfl();
        let nfc = bracket.group("NFC").unwrap();
        let probs = build_round_probs(&nfc_odds());

        let a = simulate_conditionals(nfc, &probs, 40_000, 7).unwrap();
        let b = simulate_conditionals(nfc, &probs, 40_000, 7).unwrap();
        assert_bit_identical(&a, &b);

        let c = simulate_conditionals(nfc, &probs, 40_000, 8).unwrap();
        assert_ne!(a.champion_counts, c.champion_counts);
    }

    #[test]
    fn test_trial_accounting() {
        let bracket = nfl();
        let nfc = bracket.group("NFC").unwrap();
        let probs = build_round_probs(&nfc_odds());

        // not a multiple of the chunk size
        let trials = 2 * TRIALS_PER_CHUNK + 1_234;
        let result = simulate_conditionals(nfc, &probs, trials, 3).unwrap();

        assert_eq!(result.trials, trials);
        assert_eq!(result.champion_counts.values().sum::<u64>(), trials);
        for team in nfc.teams() {
            assert_eq!(
                result.champion_counts[team] + result.not_champion_counts[team],
                trials
            );
        }

        // six games per playout, two participants each
        let total: f64 = result
            .cond_by_champion
            .iter()
            .map(|(champ, row)| result.champion_counts[champ] as f64 * row.values().sum::<f64>())
            .sum();
        assert!((total - 12.0 * trials as f64).abs() < 1e-6 * trials as f64);
    }

    #[test]
    fn test_games_played_bounds() {
        let bracket = nfl();
        let nfc = bracket.group("NFC").unwrap();
        let team_probs = group_probs(nfc, &build_round_probs(&nfc_odds())).unwrap();
        let bye = nfc.bye().unwrap();
        let mut resolver = RandomResolver::new(ChaCha8Rng::seed_from_u64(11));

        for _ in 0..5_000 {
            let playout = simulate_once(nfc, &team_probs, &mut resolver);
            let total: u32 = playout.games.iter().map(|&g| u32::from(g)).sum();
            assert_eq!(total as usize, 2 * nfc.games_per_playout());
            for t in 0..nfc.team_count() {
                let g = playout.games[t];
                if t == bye {
                    assert!((1..=2).contains(&g));
                } else {
                    assert!((1..=3).contains(&g));
                }
            }
            assert!(playout.games[playout.champion] >= 2);
        }

        let east = eight_team_group();
        let team_probs = group_probs(&east, &flat_probs(&east, 0.5)).unwrap();
        for _ in 0..1_000 {
            let playout = simulate_once(&east, &team_probs, &mut resolver);
            let total: u32 = playout.games.iter().map(|&g| u32::from(g)).sum();
            assert_eq!(total, 14);
            assert_eq!(playout.games[playout.champion], 3);
        }
    }

    #[test]
    fn test_deterministic_favorite() {
        let bracket = nfl();
        let nfc = bracket.group("NFC").unwrap();
        let mut probs = flat_probs(nfc, 0.0);
        probs.insert(
            "GB",
            RoundProbs {
                first: 1.0,
                second: 1.0,
                third: 1.0,
            },
        );

        for trials in [1, 17, 30_000] {
            let result = simulate_conditionals(nfc, &probs, trials, 5).unwrap();
            assert_eq!(result.champion_count("GB"), trials);
            for team in nfc.teams().iter().filter(|t| *t != "GB") {
                assert_eq!(result.champion_count(team), 0);
                assert!(!result.cond_by_champion.contains_key(team));
            }
            assert!(result.expected_if_not_champion("GB").is_nan());
            assert_eq!(result.not_champion_counts["GB"], 0);

            // GB is the worst seed, so it always visits the bye team
            assert_eq!(result.expected_given_champion("GB", "GB"), Some(3.0));
            assert_eq!(result.expected_given_champion("GB", "SEA"), Some(1.0));
            assert_eq!(result.expected_given_champion("SEA", "GB"), None);
        }
    }

    #[test]
    fn test_symmetric_group_converges_to_uniform() {
        let east = eight_team_group();
        let trials = 400_000;
        let result = simulate_conditionals(&east, &flat_probs(&east, 0.5), trials, 99).unwrap();

        let p = 1.0 / 8.0;
        let expected = trials as f64 * p;
        let sigma = (trials as f64 * p * (1.0 - p)).sqrt();
        for team in east.teams() {
            let count = result.champion_count(team) as f64;
            assert!(
                (count - expected).abs() < 5.0 * sigma,
                "{} won {} times, expected about {}",
                team,
                count,
                expected
            );
        }
    }

    #[test]
    fn test_symmetric_group_with_bye() {
        let bracket = nfl();
        let nfc = bracket.group("NFC").unwrap();
        let trials = 200_000;
        let result = simulate_conditionals(nfc, &flat_probs(nfc, 0.5), trials, 4).unwrap();

        for team in nfc.teams() {
            // the bye team needs two wins, everyone else three
            let p = if team == "SEA" { 0.25 } else { 0.125 };
            let sigma = (trials as f64 * p * (1.0 - p)).sqrt();
            let count = result.champion_count(team) as f64;
            assert!((count - trials as f64 * p).abs() < 5.0 * sigma);
        }
    }

    #[test]
    fn test_reseeding_pairs_bye_with_worst_winner() {
        let bracket = nfl();
        let nfc = bracket.group("NFC").unwrap();
        let team_probs = group_probs(nfc, &flat_probs(nfc, 0.5)).unwrap();
        let bye = nfc.bye().unwrap();

        // every combination of first-round results
        for mask in 0..8u32 {
            let wc_winners: Vec<usize> = nfc
                .first_round()
                .iter()
                .enumerate()
                .map(|(i, &(home, away))| if mask & (1 << i) == 0 { home } else { away })
                .collect();

            let mut resolver = ScriptedResolver {
                winners: wc_winners.iter().copied().collect(),
                games: Vec::new(),
            };
            simulate_once(nfc, &team_probs, &mut resolver);

            let worst = *wc_winners.iter().max_by_key(|&&t| nfc.seed(t)).unwrap();
            let best = *wc_winners.iter().min_by_key(|&&t| nfc.seed(t)).unwrap();
            let divisional = &resolver.games[3..5];
            assert_eq!(divisional[0], (bye, worst));
            assert_ne!(divisional[0].1, best);

            let mut others: Vec<usize> = wc_winners.into_iter().filter(|&t| t != worst).collect();
            let mut pair = vec![divisional[1].0, divisional[1].1];
            others.sort_unstable();
            pair.sort_unstable();
            assert_eq!(pair, others);
        }
    }

    #[test]
    fn test_scripted_run_conditions_on_champion() {
        let bracket = nfl();
        let nfc = bracket.group("NFC").unwrap();
        let probs = flat_probs(nfc, 0.5);
        let idx = |c: &str| nfc.index_of(c).unwrap();

        // PHI and LAR beat everyone, CHI wins its first-round game
        let mut resolver = ScriptedResolver {
            winners: [idx("PHI"), idx("LAR"), idx("CHI")].into_iter().collect(),
            games: Vec::new(),
        };
        let result = simulate_conditionals_with(nfc, &probs, 10, &mut resolver).unwrap();

        // SEA hosts LAR (worst seed), CHI meets PHI, then PHI beats LAR
        assert_eq!(result.champion_count("PHI"), 10);
        assert_eq!(result.cond_by_champion.len(), 1);
        assert_eq!(result.expected_given_champion("PHI", "SEA"), Some(1.0));
        assert_eq!(result.expected_given_champion("PHI", "PHI"), Some(3.0));
        assert_eq!(result.expected_given_champion("PHI", "LAR"), Some(3.0));
        assert_eq!(result.expected_given_champion("PHI", "CHI"), Some(2.0));
        assert_eq!(result.expected_given_champion("PHI", "GB"), Some(1.0));
        assert_eq!(result.expected_if_not_champion("LAR"), 3.0);
        assert!(result.expected_if_not_champion("PHI").is_nan());
    }

    #[test]
    fn test_convergence_reduces_spread() {
        let bracket = nfl();
        let nfc = bracket.group("NFC").unwrap();
        let probs = build_round_probs(&nfc_odds());

        let estimate = |trials: u64, seed: u64| {
            simulate_conditionals(nfc, &probs, trials, seed)
                .unwrap()
                .expected_given_champion("SEA", "CHI")
                .unwrap()
        };

        let small: Vec<f64> = (0..16).map(|s| estimate(2_000, 100 + s)).collect();
        let large: Vec<f64> = (0..16).map(|s| estimate(20_000, 200 + s)).collect();

        assert!(large.iter().std_dev() < small.iter().std_dev());
    }

    #[test]
    fn test_zero_trials_is_an_error() {
        let bracket = nfl();
        let nfc = bracket.group("NFC").unwrap();
        let probs = build_round_probs(&nfc_odds());
        assert!(matches!(
            simulate_conditionals(nfc, &probs, 0, 1),
            Err(ConfigError::ZeroTrials)
        ));
        assert!(matches!(
            simulate_all_groups(&bracket, &probs, &SimulationConfig { trials: 0, seed: 1 }),
            Err(ConfigError::ZeroTrials)
        ));
    }

    #[test]
    fn test_missing_probabilities_is_an_error() {
        let bracket = nfl();
        let afc = bracket.group("AFC").unwrap();
        let probs = build_round_probs(&nfc_odds());
        assert!(matches!(
            simulate_conditionals(afc, &probs, 10, 1),
            Err(ConfigError::MissingProbabilities { .. })
        ));
    }

    #[test]
    fn test_first_round_team_without_first_round_probability() {
        let bracket = nfl();
        let nfc = bracket.group("NFC").unwrap();
        let mut odds = nfc_odds();
        odds[1] = AdvancementOdds::bye("CHI", 0.24, 0.11);
        let probs = build_round_probs(&odds);

        match simulate_conditionals(nfc, &probs, 10_000, 1) {
            Err(ConfigError::ByeMismatch {
                team,
                has_first_round_game,
            }) => {
                assert_eq!(team, "CHI");
                assert!(!has_first_round_game);
            }
            other => panic!("expected ByeMismatch, got {:?}", other.map(|r| r.champion_counts)),
        }
    }

    #[test]
    fn test_bye_team_with_first_round_probability() {
        let bracket = nfl();
        let nfc = bracket.group("NFC").unwrap();
        let mut odds = nfc_odds();
        odds[0] = AdvancementOdds::new("SEA", Some(0.9), Some(0.62), Some(0.36), true);
        let probs = build_round_probs(&odds);

        assert!(matches!(
            group_probs(nfc, &probs),
            Err(ConfigError::ByeMismatch { team, has_first_round_game: true }) if team == "SEA"
        ));
    }

    #[test]
    fn test_simulate_all_groups_rejects_team_outside_bracket() {
        let bracket = nfl();
        let mut table = flat_probs(bracket.group("NFC").unwrap(), 0.5);
        for (team, p) in flat_probs(bracket.group("AFC").unwrap(), 0.5).iter() {
            table.insert(team.clone(), *p);
        }
        table.insert(
            "KC",
            RoundProbs {
                first: 0.5,
                second: 0.5,
                third: 0.5,
            },
        );

        let config = SimulationConfig {
            trials: 1_000,
            seed: 1,
        };
        assert!(matches!(
            simulate_all_groups(&bracket, &table, &config),
            Err(ConfigError::UnknownTeam { team, .. }) if team == "KC"
        ));
    }

    #[test]
    fn test_result_independent_of_thread_count() {
        let bracket = nfl();
        let nfc = bracket.group("NFC").unwrap();
        let probs = build_round_probs(&nfc_odds());
        let trials = 3 * TRIALS_PER_CHUNK + 77;

        let run = |threads: usize| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap()
                .install(|| simulate_conditionals(nfc, &probs, trials, 11).unwrap())
        };

        let single = run(1);
        assert_eq!(single.trials, trials);
        assert_bit_identical(&single, &run(4));
        assert_bit_identical(&single, &run(8));
    }

    #[test]
    fn test_simulate_all_groups_uses_distinct_seeds() {
        let bracket = nfl();
        let mut table = flat_probs(bracket.group("NFC").unwrap(), 0.5);
        for (team, p) in flat_probs(bracket.group("AFC").unwrap(), 0.5).iter() {
            table.insert(team.clone(), *p);
        }
        let config = SimulationConfig {
            trials: 20_000,
            seed: 42,
        };
        let results = simulate_all_groups(&bracket, &table, &config).unwrap();
        assert_eq!(results.len(), 2);

        let nfc = simulate_conditionals(bracket.group("NFC").unwrap(), &table, 20_000, 42).unwrap();
        let afc = simulate_conditionals(bracket.group("AFC").unwrap(), &table, 20_000, 43).unwrap();
        assert_bit_identical(&results["NFC"], &nfc);
        assert_bit_identical(&results["AFC"], &afc);

        // same bracket shape and probabilities, different streams
        let counts = |name: &str| -> Vec<u64> {
            bracket
                .group(name)
                .unwrap()
                .teams()
                .iter()
                .map(|team| results[name].champion_counts[team])
                .collect()
        };
        assert_ne!(counts("NFC"), counts("AFC"));
    }

    #[test]
    fn test_accumulator_merge_matches_sequential() {
        let bracket = nfl();
        let nfc = bracket.group("NFC").unwrap();
        let team_probs = group_probs(nfc, &build_round_probs(&nfc_odds())).unwrap();
        let mut resolver = RandomResolver::new(ChaCha8Rng::seed_from_u64(21));

        let playouts: Vec<Playout> = (0..500)
            .map(|_| simulate_once(nfc, &team_probs, &mut resolver))
            .collect();

        let mut whole = ConditionalAccumulator::new(nfc.team_count());
        let mut left = ConditionalAccumulator::new(nfc.team_count());
        let mut right = ConditionalAccumulator::new(nfc.team_count());
        for (i, p) in playouts.iter().enumerate() {
            whole.record(p);
            if i % 3 == 0 {
                left.record(p);
            } else {
                right.record(p);
            }
        }

        assert_eq!(right.clone().merge(left.clone()), whole);
        assert_eq!(left.merge(right), whole);
    }
}
