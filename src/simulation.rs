use std::fmt;

use rand::{Rng, SeedableRng, rngs::StdRng};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use rustc_hash::FxHashMap;

use crate::{
    config::EngineConfig,
    error::TournamentError,
    format::FormatRegistry,
    score::{Score, SetScore},
    slot::Slot,
    status::State,
    team::{Team, TeamId},
    tournament::{Tournament, TournamentSettings},
};

fn random_set<R: Rng + ?Sized>(rng: &mut R, winner: Slot) -> SetScore {
    let (won, lost) = match rng.random_range(0..10) {
        0 => (7, 6),
        1 => (7, 5),
        _ => (6, rng.random_range(0..=4)),
    };

    match winner {
        Slot::Team1 => SetScore {
            team_1: won,
            team_2: lost,
        },
        Slot::Team2 => SetScore {
            team_1: lost,
            team_2: won,
        },
    }
}

/// A best of three score with a winner.
pub fn random_score<R: Rng + ?Sized>(rng: &mut R) -> Score {
    let winner = if rng.random_bool(0.5) {
        Slot::Team1
    } else {
        Slot::Team2
    };

    let sets = match rng.random_range(0..5) {
        0 => vec![winner, winner.opposite(), winner],
        1 => vec![winner.opposite(), winner, winner],
        _ => vec![winner, winner],
    };

    let sets = sets.into_iter().map(|slot| random_set(rng, slot)).collect();
    Score::new(sets).unwrap_or_default()
}

/// Registers `teams` made up teams and plays the tournament to the end with
/// random scores.
///
/// # Errors
///
/// If any step of the tournament refuses to go on.
pub fn simulate<R: Rng + ?Sized>(
    teams: u16,
    mut settings: TournamentSettings,
    registry: &FormatRegistry,
    config: &EngineConfig,
    rng: &mut R,
) -> Result<Tournament, TournamentError> {
    settings.total_slots = settings.total_slots.max(teams);
    let registered_at = settings.registration_deadline;

    let mut tournament = Tournament::new(1, settings, config)?;
    for id in 1..=u64::from(teams) {
        let team = Team::new(TeamId(id), &format!("Drive {id}"), &format!("Reves {id}"));
        tournament.register(&team, registered_at)?;
    }

    tournament.start(registry, config, rng)?;

    for group in 0..tournament.groups.len() {
        for index in 0..tournament.groups[group].matches.len() {
            tournament.record_group_score(group, index, random_score(rng))?;
        }
    }

    tournament.generate_bracket(registry, config, rng)?;

    while let Some(index) = tournament
        .bracket
        .as_ref()
        .and_then(|bracket| bracket.playable().next())
    {
        tournament.record_bracket_score(index, random_score(rng))?;
    }

    Ok(tournament)
}

#[derive(Clone, Debug, Default)]
pub struct Summary {
    pub runs: u64,
    pub finished: u64,
    pub failed: Vec<String>,
    pub champions: FxHashMap<TeamId, u64>,
    pub bracket_matches: FxHashMap<usize, u64>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "runs: {}, finished: {}, failed: {}",
            self.runs,
            self.finished,
            self.failed.len()
        )?;

        let mut matches: Vec<_> = self.bracket_matches.iter().collect();
        matches.sort_unstable();
        for (count, runs) in matches {
            writeln!(f, "bracket of {count} matches: {runs} runs")?;
        }

        let mut champions: Vec<_> = self.champions.iter().collect();
        champions.sort_unstable_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        for (team, titles) in champions {
            writeln!(f, "{team}: {titles} titles")?;
        }

        for error in &self.failed {
            writeln!(f, "error: {error}")?;
        }

        Ok(())
    }
}

/// Runs `runs` independent simulations in parallel, run `n` seeded with
/// `seed + n`.
#[must_use]
pub fn simulate_many(
    runs: u64,
    teams: u16,
    seed: u64,
    settings: &TournamentSettings,
    registry: &FormatRegistry,
    config: &EngineConfig,
) -> Summary {
    let results: Vec<_> = (0..runs)
        .into_par_iter()
        .map(|run| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(run));
            simulate(teams, settings.clone(), registry, config, &mut rng)
        })
        .collect();

    let mut summary = Summary {
        runs,
        ..Summary::default()
    };

    for result in results {
        match result {
            Ok(tournament) => {
                if tournament.state == State::Finished {
                    summary.finished += 1;
                }
                if let Some(team) = tournament.winning_team {
                    *summary.champions.entry(team).or_default() += 1;
                }
                if let Some(bracket) = &tournament.bracket {
                    *summary.bracket_matches.entry(bracket.len()).or_default() += 1;
                }
            }
            Err(error) => {
                log::error!("simulation: {error}");
                summary.failed.push(error.to_string());
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::status::FormatKind;

    fn settings() -> TournamentSettings {
        TournamentSettings {
            name: "Simulacro".to_string(),
            registration_deadline: Utc::now() + Duration::days(1),
            ..TournamentSettings::default()
        }
    }

    #[test]
    fn random_scores_have_a_winner() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..200 {
            let score = random_score(&mut rng);
            assert!(score.winner().is_some());
            assert!(score.check_best_of_three().is_ok());
            assert!((2..=3).contains(&score.sets().len()));
        }
    }

    #[test]
    fn every_builtin_count_finishes() -> anyhow::Result<()> {
        let registry = FormatRegistry::builtin()?;
        let config = EngineConfig::default();

        for teams in registry.team_counts() {
            let mut rng = StdRng::seed_from_u64(u64::from(teams));
            let tournament = simulate(teams, settings(), &registry, &config, &mut rng)?;
            assert_eq!(tournament.state, State::Finished, "{teams} teams");
            assert!(tournament.winning_team.is_some());
        }

        Ok(())
    }

    #[test]
    fn generic_counts_finish() -> anyhow::Result<()> {
        let registry = FormatRegistry::from_ron("[]")?;
        let config = EngineConfig::default();

        for teams in [6, 9, 12, 16, 20, 24] {
            let mut rng = StdRng::seed_from_u64(u64::from(teams));
            let tournament = simulate(teams, settings(), &registry, &config, &mut rng)?;
            assert_eq!(tournament.state, State::Finished, "{teams} teams");
        }

        Ok(())
    }

    #[test]
    fn elimination_finishes() -> anyhow::Result<()> {
        let registry = FormatRegistry::builtin()?;
        let settings = TournamentSettings {
            kind: FormatKind::Elimination,
            ..settings()
        };
        let mut rng = StdRng::seed_from_u64(21);

        let tournament = simulate(11, settings, &registry, &EngineConfig::default(), &mut rng)?;
        assert_eq!(tournament.state, State::Finished);
        assert_eq!(tournament.bracket.map(|bracket| bracket.len()), Some(15));

        Ok(())
    }

    #[test]
    fn seeded_runs_repeat() -> anyhow::Result<()> {
        let registry = FormatRegistry::builtin()?;
        let config = EngineConfig::default();

        let summary = simulate_many(8, 10, 42, &settings(), &registry, &config);
        assert_eq!(summary.runs, 8);
        assert_eq!(summary.finished, 8);
        assert!(summary.failed.is_empty());
        assert_eq!(summary.champions.values().sum::<u64>(), 8);
        assert_eq!(summary.bracket_matches.get(&6), Some(&8));

        let again = simulate_many(8, 10, 42, &settings(), &registry, &config);
        assert_eq!(again.champions, summary.champions);

        Ok(())
    }
}
