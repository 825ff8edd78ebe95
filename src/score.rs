// This file is part of padel-tournament.
//
// padel-tournament is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// padel-tournament is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error::ScoreError, slot::Slot};

pub const MAX_SETS: usize = 3;
pub const MAX_GAMES_PER_SET: u8 = 7;

/// Games won by each side in one set.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct SetScore {
    pub team_1: u8,
    pub team_2: u8,
}

impl SetScore {
    /// # Errors
    ///
    /// If either side has more than [`MAX_GAMES_PER_SET`] games.
    pub fn new(team_1: u8, team_2: u8) -> Result<Self, ScoreError> {
        for games in [team_1, team_2] {
            if games > MAX_GAMES_PER_SET {
                return Err(ScoreError::TooManyGames(games));
            }
        }

        Ok(Self { team_1, team_2 })
    }

    #[must_use]
    pub fn winner(&self) -> Option<Slot> {
        match self.team_1.cmp(&self.team_2) {
            Ordering::Greater => Some(Slot::Team1),
            Ordering::Less => Some(Slot::Team2),
            Ordering::Equal => None,
        }
    }
}

impl fmt::Display for SetScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.team_1, self.team_2)
    }
}

/// Sets and games won by each side over a whole match.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Tally {
    pub sets_1: u8,
    pub sets_2: u8,
    pub games_1: u16,
    pub games_2: u16,
}

impl Tally {
    /// Sets won, sets lost, games won and games lost seen from `slot`.
    #[must_use]
    pub fn seen_from(&self, slot: Slot) -> (u8, u8, u16, u16) {
        match slot {
            Slot::Team1 => (self.sets_1, self.sets_2, self.games_1, self.games_2),
            Slot::Team2 => (self.sets_2, self.sets_1, self.games_2, self.games_1),
        }
    }
}

/// Up to three sets of a padel match, in the order they were played.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Score(Vec<SetScore>);

impl Score {
    /// # Errors
    ///
    /// If more than [`MAX_SETS`] sets are given.
    pub fn new(sets: Vec<SetScore>) -> Result<Self, ScoreError> {
        if sets.len() > MAX_SETS {
            return Err(ScoreError::TooManySets);
        }

        Ok(Self(sets))
    }

    #[must_use]
    pub fn sets(&self) -> &[SetScore] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn tally(&self) -> Tally {
        let mut tally = Tally::default();

        for set in &self.0 {
            tally.games_1 += u16::from(set.team_1);
            tally.games_2 += u16::from(set.team_2);

            match set.winner() {
                Some(Slot::Team1) => tally.sets_1 += 1,
                Some(Slot::Team2) => tally.sets_2 += 1,
                None => {}
            }
        }

        tally
    }

    /// The side that won more sets, `None` while the sets are level.
    #[must_use]
    pub fn winner(&self) -> Option<Slot> {
        let tally = self.tally();

        match tally.sets_1.cmp(&tally.sets_2) {
            Ordering::Greater => Some(Slot::Team1),
            Ordering::Less => Some(Slot::Team2),
            Ordering::Equal => None,
        }
    }

    /// Bracket matches are best of three.
    ///
    /// # Errors
    ///
    /// If a side is credited with more than two sets.
    pub fn check_best_of_three(&self) -> Result<(), ScoreError> {
        let tally = self.tally();
        if tally.sets_1 > 2 || tally.sets_2 > 2 {
            return Err(ScoreError::BestOfThree);
        }

        Ok(())
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sets: Vec<_> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", sets.join(", "))
    }
}

impl FromStr for Score {
    type Err = ScoreError;

    fn from_str(string: &str) -> Result<Self, ScoreError> {
        let mut sets = Vec::new();

        for (number, set) in string
            .split(|c: char| c == ',' || c.is_ascii_whitespace())
            .filter(|set| !set.is_empty())
            .enumerate()
        {
            let Some((team_1, team_2)) = set.split_once('-') else {
                return Err(ScoreError::InvalidSet(set.to_string()));
            };

            if team_1.is_empty() || team_2.is_empty() {
                return Err(ScoreError::IncompleteSet(number + 1));
            }

            let (Ok(team_1), Ok(team_2)) = (team_1.parse(), team_2.parse()) else {
                return Err(ScoreError::InvalidSet(set.to_string()));
            };

            sets.push(SetScore::new(team_1, team_2)?);
        }

        Score::new(sets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_sets() -> anyhow::Result<()> {
        let score = Score::from_str("6-4 6-2")?;
        assert_eq!(
            score.tally(),
            Tally {
                sets_1: 2,
                sets_2: 0,
                games_1: 12,
                games_2: 6,
            }
        );
        assert_eq!(score.winner(), Some(Slot::Team1));
        assert_eq!(score.to_string(), "6-4, 6-2");

        Ok(())
    }

    #[test]
    fn three_sets_with_commas() -> anyhow::Result<()> {
        let score = Score::from_str("4-6, 7-6, 3-6")?;
        assert_eq!(score.winner(), Some(Slot::Team2));
        assert_eq!(score.tally().seen_from(Slot::Team2), (2, 1, 18, 14));

        Ok(())
    }

    #[test]
    fn level_sets_have_no_winner() -> anyhow::Result<()> {
        assert_eq!(Score::from_str("6-3 3-6")?.winner(), None);
        assert_eq!(Score::from_str("")?.winner(), None);
        assert_eq!(Score::from_str("5-5")?.winner(), None);

        Ok(())
    }

    #[test]
    fn malformed_scores() {
        assert!(matches!(
            Score::from_str("6-"),
            Err(ScoreError::IncompleteSet(1))
        ));
        assert!(matches!(
            Score::from_str("6-4 64"),
            Err(ScoreError::InvalidSet(_))
        ));
        assert!(matches!(
            Score::from_str("6-4 6-4 6-4 6-4"),
            Err(ScoreError::TooManySets)
        ));
        assert!(matches!(
            Score::from_str("9-4"),
            Err(ScoreError::TooManyGames(9))
        ));
    }

    #[test]
    fn best_of_three() -> anyhow::Result<()> {
        assert!(Score::from_str("6-1 6-1")?.check_best_of_three().is_ok());
        assert!(matches!(
            Score::from_str("6-1 6-1 6-1")?.check_best_of_three(),
            Err(ScoreError::BestOfThree)
        ));

        Ok(())
    }
}
