//! Team records across tournaments: wins, titles, streaks and ranking
//! points, computed from the results stored in each [`Tournament`].

use std::{cmp::Reverse, fmt};

use chrono::NaiveDate;
use itertools::Itertools;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{Id, bracket::MatchState, team::TeamId, tournament::Tournament};

pub const POINTS_PER_WIN: u32 = 3;
pub const POINTS_PER_TITLE: u32 = 50;
/// Earned with a win rate of [`BONUS_WIN_RATE`] or better over at least
/// [`BONUS_MIN_MATCHES`] matches.
pub const WIN_RATE_BONUS: u32 = 20;
pub const BONUS_WIN_RATE: f64 = 75.0;
pub const BONUS_MIN_MATCHES: u32 = 5;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Stage {
    Group,
    Bracket,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group => write!(f, "group"),
            Self::Bracket => write!(f, "bracket"),
        }
    }
}

/// One decided match seen from one team.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MatchResult {
    pub tournament: Id,
    pub tournament_name: String,
    pub start_date: NaiveDate,
    pub stage: Stage,
    /// The bracket round, 0 for group matches.
    pub round: u8,
    pub opponent: Option<TeamId>,
    pub won: bool,
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.won { "won" } else { "lost" };
        match self.opponent {
            Some(opponent) => write!(f, "{outcome} against {opponent}")?,
            None => write!(f, "{outcome}")?,
        }

        write!(f, " ({}, {})", self.tournament_name, self.stage)
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Streak {
    #[default]
    None,
    Winning(u32),
    Losing(u32),
}

impl fmt::Display for Streak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "no matches"),
            Self::Winning(1) => write!(f, "1 win"),
            Self::Winning(count) => write!(f, "{count} wins"),
            Self::Losing(1) => write!(f, "1 loss"),
            Self::Losing(count) => write!(f, "{count} losses"),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct TeamRecord {
    pub team: TeamId,
    pub played: u32,
    pub won: u32,
    pub lost: u32,
    pub titles: u32,
    pub streak: Streak,
}

impl TeamRecord {
    /// The share of matches won in percent, rounded to one decimal.
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        if self.played == 0 {
            return 0.0;
        }

        let rate = f64::from(self.won) * 100.0 / f64::from(self.played);
        (rate * 10.0).round() / 10.0
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        let mut points = self.won * POINTS_PER_WIN + self.titles * POINTS_PER_TITLE;
        if self.played >= BONUS_MIN_MATCHES && self.win_rate() >= BONUS_WIN_RATE {
            points += WIN_RATE_BONUS;
        }

        points
    }
}

impl fmt::Display for TeamRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} points won {} lost {} titles {} win rate {}% streak {}",
            self.team,
            self.points(),
            self.won,
            self.lost,
            self.titles,
            self.win_rate(),
            self.streak
        )
    }
}

/// Every decided match `team` played, newest tournament first. Within a
/// tournament bracket matches come before group matches, later rounds and
/// later group matches first. Byes are not matches.
#[must_use]
pub fn results(tournaments: &[Tournament], team: TeamId) -> Vec<MatchResult> {
    let mut results = Vec::new();

    for tournament in tournaments
        .iter()
        .sorted_by_key(|tournament| Reverse(tournament.settings.start_date))
    {
        let result = |stage, round, opponent, won| MatchResult {
            tournament: tournament.id,
            tournament_name: tournament.settings.name.clone(),
            start_date: tournament.settings.start_date,
            stage,
            round,
            opponent,
            won,
        };

        if let Some(bracket) = &tournament.bracket {
            let decided = bracket
                .matches()
                .filter_map(|(_, m)| match m.state {
                    MatchState::Decided(winner) => Some((m, winner)),
                    _ => None,
                })
                .filter_map(|(m, winner)| {
                    let slot = m.slot_of(team)?;
                    let opponent = m.teams[slot.opposite().index()];
                    Some((m.round, opponent, winner == team))
                })
                .sorted_by_key(|(round, _, _)| Reverse(*round));

            for (round, opponent, won) in decided {
                results.push(result(Stage::Bracket, round, opponent, won));
            }
        }

        for group_match in tournament.groups.iter().flat_map(|g| g.matches.iter().rev()) {
            let (Some(winner), Some(slot)) = (group_match.winner, group_match.side_of(team))
            else {
                continue;
            };

            let opponent = group_match.team(slot.opposite());
            results.push(result(Stage::Group, 0, Some(opponent), winner == team));
        }
    }

    results
}

/// The newest `limit` results of `team`.
#[must_use]
pub fn last_results(tournaments: &[Tournament], team: TeamId, limit: usize) -> Vec<MatchResult> {
    let mut results = results(tournaments, team);
    results.truncate(limit);
    results
}

/// The run of equal outcomes at the head of `results`.
#[must_use]
pub fn streak(results: &[MatchResult]) -> Streak {
    let Some(first) = results.first() else {
        return Streak::None;
    };

    let length = results
        .iter()
        .take_while(|result| result.won == first.won)
        .count();
    let length = u32::try_from(length).unwrap_or(u32::MAX);

    if first.won {
        Streak::Winning(length)
    } else {
        Streak::Losing(length)
    }
}

#[must_use]
pub fn team_record(tournaments: &[Tournament], team: TeamId) -> TeamRecord {
    let results = results(tournaments, team);
    let won = results.iter().filter(|result| result.won).count();
    let titles = tournaments
        .iter()
        .filter(|tournament| tournament.winning_team == Some(team))
        .count();

    let played = u32::try_from(results.len()).unwrap_or(u32::MAX);
    let won = u32::try_from(won).unwrap_or(u32::MAX);

    TeamRecord {
        team,
        played,
        won,
        lost: played - won,
        titles: u32::try_from(titles).unwrap_or(u32::MAX),
        streak: streak(&results),
    }
}

/// Records for every team registered to any of `tournaments`, most points
/// first, then most wins, then team id.
#[must_use]
pub fn ranking(tournaments: &[Tournament]) -> Vec<TeamRecord> {
    let mut records: FxHashMap<TeamId, TeamRecord> = FxHashMap::default();

    for registration in tournaments.iter().flat_map(|t| &t.registrations) {
        let team = registration.team.id;
        records
            .entry(team)
            .or_insert_with(|| team_record(tournaments, team));
    }

    log::debug!("ranking: {} teams over {} tournaments", records.len(), tournaments.len());

    records
        .into_values()
        .sorted_by_key(|record| (Reverse(record.points()), Reverse(record.won), record.team))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::{Duration, Utc};
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        bracket::MatchIndex, config::EngineConfig, format::FormatRegistry, score::Score,
        team::Team, tournament::TournamentSettings,
    };

    /// Four teams in one group, the lower id wins every group match, the top
    /// two meet in the final and `champion` takes it.
    fn played(id: Id, day: u32, champion: u64) -> anyhow::Result<Tournament> {
        let registry = FormatRegistry::from_ron("[]")?;
        let config = EngineConfig {
            min_bracket_teams: 2,
            ..EngineConfig::default()
        };
        let settings = TournamentSettings {
            name: format!("Open {id}"),
            start_date: NaiveDate::from_ymd_opt(2026, 5, day).unwrap_or_default(),
            registration_deadline: Utc::now() + Duration::days(1),
            group_size: 4,
            ..TournamentSettings::default()
        };

        let mut tournament = Tournament::new(id, settings, &config)?;
        for team in 1..=4 {
            let team = Team::new(TeamId(team), "Lebrón", "Galán");
            tournament.register(&team, Utc::now())?;
        }

        let mut rng = StdRng::seed_from_u64(id);
        tournament.start(&registry, &config, &mut rng)?;
        for index in 0..tournament.groups[0].matches.len() {
            let group_match = &tournament.groups[0].matches[index];
            let score = if group_match.team_1 < group_match.team_2 {
                "6-1 6-1"
            } else {
                "1-6 1-6"
            };
            tournament.record_group_score(0, index, Score::from_str(score)?)?;
        }

        tournament.generate_bracket(&registry, &config, &mut rng)?;
        tournament.set_bracket_winner(MatchIndex(0), TeamId(champion))?;

        Ok(tournament)
    }

    #[test]
    fn one_tournament() -> anyhow::Result<()> {
        let tournaments = [played(1, 2, 1)?];

        let record = team_record(&tournaments, TeamId(1));
        assert_eq!((record.played, record.won, record.lost), (4, 4, 0));
        assert_eq!(record.titles, 1);
        assert_eq!(record.streak, Streak::Winning(4));
        // Too few matches for the win rate bonus.
        assert_eq!(record.points(), 4 * 3 + 50);

        let record = team_record(&tournaments, TeamId(2));
        assert_eq!((record.played, record.won), (4, 2));
        assert_eq!(record.streak, Streak::Losing(1));
        assert!((record.win_rate() - 50.0).abs() < f64::EPSILON);
        assert_eq!(record.points(), 6);

        Ok(())
    }

    #[test]
    fn records_add_up_across_tournaments() -> anyhow::Result<()> {
        // The second tournament starts later and 2 wins its final.
        let tournaments = [played(2, 9, 2)?, played(1, 2, 1)?];

        let one = team_record(&tournaments, TeamId(1));
        assert_eq!((one.played, one.won, one.titles), (8, 7, 1));
        assert!((one.win_rate() - 87.5).abs() < f64::EPSILON);
        assert_eq!(one.points(), 7 * 3 + 50 + 20);
        assert_eq!(one.streak, Streak::Losing(1));

        let four = team_record(&tournaments, TeamId(4));
        assert_eq!(four.streak, Streak::Losing(6));
        assert_eq!(four.points(), 0);
        assert_eq!(four.streak.to_string(), "6 losses");

        let ranked: Vec<_> = ranking(&tournaments).iter().map(|r| r.team).collect();
        assert_eq!(ranked, vec![TeamId(1), TeamId(2), TeamId(3), TeamId(4)]);

        Ok(())
    }

    #[test]
    fn newest_results_first() -> anyhow::Result<()> {
        let tournaments = [played(1, 2, 1)?, played(2, 9, 2)?];

        let last = last_results(&tournaments, TeamId(1), 2);
        assert_eq!(last.len(), 2);
        assert_eq!(last[0].tournament, 2);
        assert_eq!(last[0].stage, Stage::Bracket);
        assert_eq!(last[0].opponent, Some(TeamId(2)));
        assert!(!last[0].won);
        assert_eq!(last[0].to_string(), "lost against #2 (Open 2, bracket)");
        assert_eq!(last[1].stage, Stage::Group);
        assert!(last[1].won);

        assert_eq!(results(&tournaments, TeamId(1)).len(), 8);
        assert!(last_results(&tournaments, TeamId(9), 5).is_empty());
        assert_eq!(team_record(&tournaments, TeamId(9)).streak, Streak::None);

        Ok(())
    }
}
