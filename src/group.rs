use std::{cmp::Reverse, fmt};

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    error::TournamentError,
    score::{Score, Tally},
    slot::Slot,
    team::TeamId,
};

pub const MAX_GROUPS: usize = 26;

const LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[must_use]
pub fn group_letter(index: usize) -> Option<char> {
    LETTERS.chars().nth(index)
}

#[must_use]
pub fn letter_index(letter: char) -> Option<usize> {
    LETTERS.find(letter)
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct GroupMatch {
    pub team_1: TeamId,
    pub team_2: TeamId,
    pub score: Score,
    pub tally: Tally,
    pub winner: Option<TeamId>,
    pub scheduled: Option<DateTime<Utc>>,
}

impl GroupMatch {
    #[must_use]
    pub fn new(team_1: TeamId, team_2: TeamId) -> Self {
        Self {
            team_1,
            team_2,
            ..Self::default()
        }
    }

    /// Stores the score, the winner comes from the sets alone.
    pub fn record(&mut self, score: Score) {
        self.tally = score.tally();
        self.winner = score.winner().map(|slot| self.team(slot));
        self.score = score;
    }

    pub fn schedule(&mut self, time: DateTime<Utc>) {
        self.scheduled = Some(time);
    }

    #[must_use]
    pub fn team(&self, slot: Slot) -> TeamId {
        match slot {
            Slot::Team1 => self.team_1,
            Slot::Team2 => self.team_2,
        }
    }

    #[must_use]
    pub fn side_of(&self, team: TeamId) -> Option<Slot> {
        if team == self.team_1 {
            Some(Slot::Team1)
        } else if team == self.team_2 {
            Some(Slot::Team2)
        } else {
            None
        }
    }

    #[must_use]
    pub fn involves(&self, team: TeamId) -> bool {
        self.side_of(team).is_some()
    }

    #[must_use]
    pub fn is_decided(&self) -> bool {
        self.winner.is_some()
    }
}

impl fmt::Display for GroupMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.team_1, self.team_2)?;
        if !self.score.is_empty() {
            write!(f, ": {}", self.score)?;
        }

        Ok(())
    }
}

/// One row of a group table.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct GroupStanding {
    pub team: TeamId,
    /// The 1-based slot the team was drawn into, as in "A1".
    pub number: u8,
    pub played: u16,
    pub won: u16,
    pub lost: u16,
    pub sets_for: u16,
    pub sets_against: u16,
    pub games_for: u32,
    pub games_against: u32,
}

impl GroupStanding {
    #[must_use]
    pub fn new(team: TeamId, number: u8) -> Self {
        Self {
            team,
            number,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn set_difference(&self) -> i32 {
        i32::from(self.sets_for) - i32::from(self.sets_against)
    }

    #[must_use]
    pub fn game_difference(&self) -> i64 {
        i64::from(self.games_for) - i64::from(self.games_against)
    }

    fn reset(&mut self) {
        *self = Self::new(self.team, self.number);
    }

    fn add(&mut self, group_match: &GroupMatch, slot: Slot) {
        let (sets_for, sets_against, games_for, games_against) = group_match.tally.seen_from(slot);

        self.played = self.played.saturating_add(1);
        if group_match.winner == Some(self.team) {
            self.won = self.won.saturating_add(1);
        } else {
            self.lost = self.lost.saturating_add(1);
        }

        self.sets_for = self.sets_for.saturating_add(u16::from(sets_for));
        self.sets_against = self.sets_against.saturating_add(u16::from(sets_against));
        self.games_for = self.games_for.saturating_add(u32::from(games_for));
        self.games_against = self.games_against.saturating_add(u32::from(games_against));
    }
}

impl fmt::Display for GroupStanding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} played {} won {} lost {} sets {}:{} games {}:{}",
            self.team,
            self.played,
            self.won,
            self.lost,
            self.sets_for,
            self.sets_against,
            self.games_for,
            self.games_against
        )
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Group {
    pub letter: char,
    pub name: String,
    /// In slot number order.
    pub standings: Vec<GroupStanding>,
    pub matches: Vec<GroupMatch>,
}

impl Group {
    /// Numbers the teams 1..k in the order given and pairs every team with
    /// every other team once.
    #[must_use]
    pub fn new(letter: char, teams: &[TeamId]) -> Self {
        let standings = teams
            .iter()
            .zip(1..=u8::MAX)
            .map(|(team, number)| GroupStanding::new(*team, number))
            .collect();

        let matches = teams
            .iter()
            .tuple_combinations()
            .map(|(team_1, team_2)| GroupMatch::new(*team_1, *team_2))
            .collect();

        Self {
            letter,
            name: format!("Group {letter}"),
            standings,
            matches,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Rebuilds every row from the decided matches.
    pub fn recompute_standings(&mut self) {
        for standing in &mut self.standings {
            standing.reset();

            for group_match in self.matches.iter().filter(|m| m.is_decided()) {
                if let Some(slot) = group_match.side_of(standing.team) {
                    standing.add(group_match, slot);
                }
            }

            log::trace!("{}: {standing}", self.name);
        }
    }

    /// # Errors
    ///
    /// If there is no match at `index`.
    pub fn record_score(&mut self, index: usize, score: Score) -> Result<(), TournamentError> {
        let Some(group_match) = self.matches.get_mut(index) else {
            return Err(TournamentError::NoGroupMatch {
                group: self.letter,
                index,
            });
        };

        group_match.record(score);
        self.recompute_standings();
        Ok(())
    }

    /// Sorted by wins, then set difference, then fewest sets against, then
    /// slot number.
    #[must_use]
    pub fn table(&self) -> Vec<&GroupStanding> {
        let mut table: Vec<_> = self.standings.iter().collect();
        table.sort_by_key(|standing| {
            (
                Reverse(standing.won),
                Reverse(standing.set_difference()),
                standing.sets_against,
                standing.number,
            )
        });

        table
    }

    /// The team at the 1-based `rank` of the table.
    #[must_use]
    pub fn team_at(&self, rank: u8) -> Option<TeamId> {
        let index = usize::from(rank).checked_sub(1)?;
        self.table().get(index).map(|standing| standing.team)
    }

    #[must_use]
    pub fn number_of(&self, team: TeamId) -> Option<u8> {
        self.standings
            .iter()
            .find(|standing| standing.team == team)
            .map(|standing| standing.number)
    }

    #[must_use]
    pub fn contains(&self, team: TeamId) -> bool {
        self.number_of(team).is_some()
    }

    #[must_use]
    pub fn pending_matches(&self) -> usize {
        self.matches.iter().filter(|m| !m.is_decided()).count()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.pending_matches() == 0
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        for (rank, standing) in self.table().iter().enumerate() {
            writeln!(f, "{:>2}. {standing}", rank + 1)?;
        }

        Ok(())
    }
}

/// Slices the already shuffled `teams` into consecutive groups of `sizes`.
///
/// Returns `None` if the sizes don't cover the teams exactly or there are
/// more groups than letters.
#[must_use]
pub fn partition(teams: &[TeamId], sizes: &[u8]) -> Option<Vec<Group>> {
    let total: usize = sizes.iter().copied().map(usize::from).sum();
    if total != teams.len() || sizes.len() > MAX_GROUPS {
        return None;
    }

    let mut groups = Vec::with_capacity(sizes.len());
    let mut rest = teams;

    for (index, size) in sizes.iter().enumerate() {
        let (members, tail) = rest.split_at(usize::from(*size));
        groups.push(Group::new(group_letter(index)?, members));
        rest = tail;
    }

    Some(groups)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn ids(range: std::ops::RangeInclusive<u64>) -> Vec<TeamId> {
        range.map(TeamId).collect()
    }

    #[test]
    fn round_robin_pairs() {
        for k in 2..=6 {
            let group = Group::new('A', &ids(1..=k));
            let k = usize::try_from(k).unwrap_or_default();
            assert_eq!(group.matches.len(), k * (k - 1) / 2);
            assert_eq!(group.standings.len(), k);
        }

        let group = Group::new('B', &ids(1..=3));
        let pairs: Vec<_> = group.matches.iter().map(|m| (m.team_1.0, m.team_2.0)).collect();
        assert_eq!(pairs, vec![(1, 2), (1, 3), (2, 3)]);
        assert_eq!(group.name, "Group B");
        assert_eq!(group.number_of(TeamId(3)), Some(3));
    }

    #[test]
    fn standings_follow_the_scores() -> anyhow::Result<()> {
        let mut group = Group::new('A', &ids(1..=3));
        group.record_score(0, Score::from_str("6-4 6-2")?)?;
        group.record_score(1, Score::from_str("3-6 6-3 4-6")?)?;

        let one = &group.standings[0];
        assert_eq!((one.played, one.won, one.lost), (2, 1, 1));
        assert_eq!((one.sets_for, one.sets_against), (3, 2));
        assert_eq!((one.games_for, one.games_against), (25, 21));
        assert_eq!(one.set_difference(), 1);
        assert_eq!(one.game_difference(), 4);

        assert_eq!(group.pending_matches(), 1);
        assert!(!group.is_complete());

        Ok(())
    }

    #[test]
    fn undecided_scores_are_not_counted() -> anyhow::Result<()> {
        let mut group = Group::new('A', &ids(1..=2));
        group.record_score(0, Score::from_str("6-3 3-6")?)?;

        assert_eq!(group.matches[0].winner, None);
        assert_eq!(group.standings[0].played, 0);
        assert_eq!(group.pending_matches(), 1);

        Ok(())
    }

    #[test]
    fn recompute_is_idempotent() -> anyhow::Result<()> {
        let mut group = Group::new('C', &ids(1..=4));
        for (index, score) in ["6-1 6-1", "1-6 1-6", "6-4 4-6 7-5"].iter().enumerate() {
            group.record_score(index, Score::from_str(score)?)?;
        }

        let before = group.standings.clone();
        group.recompute_standings();
        group.recompute_standings();
        assert_eq!(group.standings, before);

        Ok(())
    }

    #[test]
    fn correcting_a_score_rebuilds_the_table() -> anyhow::Result<()> {
        let mut group = Group::new('A', &ids(1..=2));
        group.record_score(0, Score::from_str("6-0 6-0")?)?;
        assert_eq!(group.team_at(1), Some(TeamId(1)));

        group.record_score(0, Score::from_str("0-6 0-6")?)?;
        assert_eq!(group.team_at(1), Some(TeamId(2)));
        assert_eq!(group.standings[0].won, 0);
        assert_eq!(group.standings[0].lost, 1);

        Ok(())
    }

    #[test]
    fn tie_breakers() -> anyhow::Result<()> {
        // 1 beats 2, 2 beats 3, 3 beats 1: everyone has one win.
        let mut group = Group::new('A', &ids(1..=3));
        group.record_score(0, Score::from_str("6-0 6-0")?)?;
        group.record_score(1, Score::from_str("4-6 6-4 4-6")?)?;
        group.record_score(2, Score::from_str("6-2 6-2")?)?;

        // Set differences: 1 is +1, 2 is 0, 3 is -1.
        assert_eq!(group.team_at(1), Some(TeamId(1)));
        assert_eq!(group.team_at(2), Some(TeamId(2)));
        assert_eq!(group.team_at(3), Some(TeamId(3)));
        assert_eq!(group.team_at(0), None);
        assert_eq!(group.team_at(4), None);

        Ok(())
    }

    #[test]
    fn fewer_sets_against_breaks_set_difference_ties() -> anyhow::Result<()> {
        // 1 and 2 both win twice with a set difference of +2, 1 goes 5:3 and
        // 2 goes 4:2.
        let mut group = Group::new('A', &ids(1..=4));
        group.record_score(0, Score::from_str("6-3 6-3")?)?;
        group.record_score(1, Score::from_str("6-3 3-6 6-3")?)?;
        group.record_score(2, Score::from_str("6-3 3-6 3-6")?)?;
        group.record_score(3, Score::from_str("6-2 6-2")?)?;
        group.record_score(4, Score::from_str("6-2 6-2")?)?;
        group.record_score(5, Score::from_str("6-4 6-4")?)?;

        let (one, two) = (&group.standings[0], &group.standings[1]);
        assert_eq!((one.won, one.set_difference(), one.sets_against), (2, 2, 3));
        assert_eq!((two.won, two.set_difference(), two.sets_against), (2, 2, 2));

        assert_eq!(group.team_at(1), Some(TeamId(2)));
        assert_eq!(group.team_at(2), Some(TeamId(1)));

        Ok(())
    }

    #[test]
    fn large_groups_count_past_a_byte() -> anyhow::Result<()> {
        let mut group = Group::new('A', &ids(1..=90));
        for index in 0..group.matches.len() {
            group.record_score(index, Score::from_str("6-0 6-0 6-0")?)?;
        }

        let first = &group.standings[0];
        assert_eq!(first.played, 89);
        assert_eq!(first.won, 89);
        assert_eq!(first.sets_for, 267);
        assert_eq!(first.games_for, 1602);
        assert_eq!(group.standings[89].sets_against, 267);
        assert_eq!(group.team_at(1), Some(TeamId(1)));

        Ok(())
    }

    #[test]
    fn slot_number_breaks_full_ties() {
        let group = Group::new('D', &ids(5..=8));
        let ranked: Vec<_> = (1..=4).filter_map(|rank| group.team_at(rank)).collect();
        assert_eq!(ranked, ids(5..=8));
    }

    #[test]
    fn missing_match() {
        let mut group = Group::new('A', &ids(1..=2));
        assert_eq!(
            group
                .record_score(1, Score::default())
                .map_err(|error| error.to_string()),
            Err("score: group A has no match 1".to_string())
        );
    }

    #[test]
    fn partition_slices_in_order() {
        let teams = ids(1..=10);
        let Some(groups) = partition(&teams, &[4, 3, 3]) else {
            panic!("the sizes cover the teams");
        };

        let letters: Vec<_> = groups.iter().map(|g| g.letter).collect();
        assert_eq!(letters, vec!['A', 'B', 'C']);
        assert_eq!(groups[1].number_of(TeamId(5)), Some(1));
        assert_eq!(groups[2].standings.len(), 3);

        let total: usize = groups.iter().map(|g| g.standings.len()).sum();
        assert_eq!(total, 10);
        assert!(partition(&teams, &[4, 4]).is_none());
    }

    #[test]
    fn letters() {
        assert_eq!(group_letter(0), Some('A'));
        assert_eq!(group_letter(25), Some('Z'));
        assert_eq!(group_letter(26), None);
        assert_eq!(letter_index('F'), Some(5));
        assert_eq!(letter_index('a'), None);
    }
}
