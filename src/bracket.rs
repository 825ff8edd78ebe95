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

use std::fmt;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{
    error::BracketError,
    format::{BracketSource, GroupRank, MatchDescriptor},
    score::Score,
    slot::Slot,
    team::TeamId,
};

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct MatchIndex(pub usize);

impl fmt::Display for MatchIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The slot of a later match the winner of this one fills.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Feed {
    pub to: MatchIndex,
    pub slot: Slot,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum MatchState {
    #[default]
    Pending,
    Decided(TeamId),
    /// The match had a single team and no feeder, the team walks through.
    Bye(TeamId),
}

impl MatchState {
    #[must_use]
    pub fn winner(&self) -> Option<TeamId> {
        match self {
            MatchState::Pending => None,
            MatchState::Decided(team) | MatchState::Bye(team) => Some(*team),
        }
    }

    #[must_use]
    pub fn is_bye(&self) -> bool {
        matches!(self, MatchState::Bye(_))
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, MatchState::Pending)
    }
}

/// What happened to the bracket after a result was entered.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Progress {
    /// `team` moved from match `from` into match `to`.
    Advanced { team: TeamId, from: u32, to: u32 },
    /// The final was decided.
    Champion(TeamId),
    /// A decided match lost one of its teams and is pending again.
    Invalidated(u32),
    /// The final was reset, `TeamId` is no longer the champion.
    Revoked(TeamId),
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::Advanced { team, from, to } => {
                write!(f, "{team} advances from match {from} to match {to}")
            }
            Progress::Champion(team) => write!(f, "{team} is the champion"),
            Progress::Invalidated(label) => write!(f, "match {label} has to be replayed"),
            Progress::Revoked(team) => write!(f, "{team} is no longer the champion"),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct BracketMatch {
    pub label: u32,
    pub round: u8,
    /// 1-based position within the round.
    pub order: u32,
    pub teams: [Option<TeamId>; 2],
    /// What each slot is waiting for, as in "1A" or "W58".
    pub placeholders: [Option<String>; 2],
    pub state: MatchState,
    pub score: Score,
    pub next: Option<Feed>,
    pub scheduled: Option<DateTime<Utc>>,
}

impl BracketMatch {
    #[must_use]
    pub fn slot_of(&self, team: TeamId) -> Option<Slot> {
        Slot::BOTH
            .into_iter()
            .find(|slot| self.teams[slot.index()] == Some(team))
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.teams.iter().all(Option::is_some)
    }

    fn describe_slot(&self, slot: Slot) -> String {
        match (self.teams[slot.index()], &self.placeholders[slot.index()]) {
            (Some(team), _) => team.to_string(),
            (None, Some(placeholder)) => placeholder.clone(),
            (None, None) => "TBD".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Bracket {
    matches: Vec<BracketMatch>,
    rounds: u8,
}

impl Bracket {
    /// A power-of-two ladder over `seeds`.
    ///
    /// The first half of the seeds meets the second half; byes go to the
    /// seeds left over once the real matches are filled, so two byes never
    /// meet. Seeds listed as group winners followed by the rotated
    /// runners-up make `top[k]` against `bottom[k]` the winner against
    /// runner-up interleave; with byes only the last seeds are moved, to
    /// the second round.
    ///
    /// # Errors
    ///
    /// If there are fewer than two seeds.
    pub fn ladder(seeds: &[TeamId]) -> Result<(Self, Vec<Progress>), BracketError> {
        let teams = seeds.len();
        if teams < 2 {
            return Err(BracketError::TooFewTeams(teams));
        }

        let first_round = teams.next_power_of_two() / 2;
        let real_pairs = teams - first_round;
        let (top, bottom) = seeds.split_at(teams.div_ceil(2));

        let mut pairs: Vec<[Option<TeamId>; 2]> = top
            .iter()
            .zip(bottom)
            .take(real_pairs)
            .map(|(team_1, team_2)| [Some(*team_1), Some(*team_2)])
            .collect();

        for team in top.iter().skip(real_pairs).chain(bottom.iter().skip(real_pairs)) {
            pairs.push([Some(*team), None]);
        }

        Self::build_ladder(pairs, Vec::new())
    }

    /// A first round made of the given crossings with a plain ladder above it.
    ///
    /// # Errors
    ///
    /// If there are no crossings.
    pub fn from_crossings(
        crossings: &[(GroupRank, GroupRank)],
        resolve: impl Fn(GroupRank) -> Option<TeamId>,
    ) -> Result<(Self, Vec<Progress>), BracketError> {
        if crossings.is_empty() {
            return Err(BracketError::TooFewTeams(0));
        }

        let pairs = crossings
            .iter()
            .map(|(team_1, team_2)| [resolve(*team_1), resolve(*team_2)])
            .collect();
        let placeholders = crossings
            .iter()
            .map(|(team_1, team_2)| [Some(team_1.to_string()), Some(team_2.to_string())])
            .collect();

        Self::build_ladder(pairs, placeholders)
    }

    fn build_ladder(
        pairs: Vec<[Option<TeamId>; 2]>,
        placeholders: Vec<[Option<String>; 2]>,
    ) -> Result<(Self, Vec<Progress>), BracketError> {
        let mut matches = Vec::new();
        let mut in_round = pairs.len().next_power_of_two();
        let mut round = 1;
        let mut label = 1;

        let mut pairs = pairs.into_iter();
        let mut placeholders = placeholders.into_iter();

        while in_round > 0 {
            let offset = matches.len();

            for order in 1..=u32::try_from(in_round).map_err(|_| BracketError::TooFewTeams(0))? {
                let next = (in_round > 1).then(|| {
                    let position = usize::try_from(order.div_ceil(2)).unwrap_or_default();
                    Feed {
                        to: MatchIndex(offset + in_round + position - 1),
                        slot: Slot::from_order(order),
                    }
                });

                let (teams, slots) = if round == 1 {
                    (
                        pairs.next().unwrap_or_default(),
                        placeholders.next().unwrap_or_default(),
                    )
                } else {
                    ([None, None], [None, None])
                };

                matches.push(BracketMatch {
                    label,
                    round,
                    order,
                    teams,
                    placeholders: slots,
                    next,
                    ..BracketMatch::default()
                });
                label += 1;
            }

            in_round /= 2;
            round += 1;
        }

        let mut bracket = Self {
            matches,
            rounds: round - 1,
        };
        let events = bracket.resolve_byes()?;
        Ok((bracket, events))
    }

    /// One match per descriptor, labeled with the descriptor id and wired
    /// through the `MatchWinner` sources.
    ///
    /// # Errors
    ///
    /// If a `next` link names a missing match or the linked match doesn't
    /// take the winner.
    pub fn from_structure(
        descriptors: &[MatchDescriptor],
        resolve: impl Fn(GroupRank) -> Option<TeamId>,
    ) -> Result<(Self, Vec<Progress>), BracketError> {
        let mut sorted: Vec<_> = descriptors.iter().collect();
        sorted.sort_by_key(|descriptor| descriptor.round);

        let mut index_of = FxHashMap::default();
        let mut orders: FxHashMap<u8, u32> = FxHashMap::default();
        let mut matches = Vec::with_capacity(sorted.len());

        for descriptor in &sorted {
            let order = orders.entry(descriptor.round).or_default();
            *order += 1;

            index_of.insert(descriptor.id, MatchIndex(matches.len()));
            matches.push(BracketMatch {
                label: descriptor.id,
                round: descriptor.round,
                order: *order,
                teams: descriptor
                    .sources()
                    .map(|source| source.group_rank().and_then(&resolve)),
                placeholders: descriptor.sources().map(|source| Some(source.to_string())),
                ..BracketMatch::default()
            });
        }

        for descriptor in &sorted {
            let Some(next) = descriptor.next else {
                continue;
            };
            let (Some(from), Some(to)) = (index_of.get(&descriptor.id), index_of.get(&next))
            else {
                return Err(BracketError::MissingNext(descriptor.id, next));
            };
            let target = descriptors
                .iter()
                .find(|target| target.id == next)
                .ok_or(BracketError::MissingNext(descriptor.id, next))?;
            let slot = Slot::BOTH
                .into_iter()
                .find(|slot| {
                    target.sources()[slot.index()] == BracketSource::MatchWinner(descriptor.id)
                })
                .ok_or(BracketError::Unwired {
                    from: descriptor.id,
                    next,
                })?;

            if let Some(feeder) = matches.get_mut(from.0) {
                feeder.next = Some(Feed { to: *to, slot });
            }
        }

        let rounds = matches.iter().map(|m| m.round).max().unwrap_or_default();
        let mut bracket = Self { matches, rounds };
        let events = bracket.resolve_byes()?;
        Ok((bracket, events))
    }

    fn fed_slots(&self, index: MatchIndex) -> [bool; 2] {
        let mut fed = [false, false];
        for feed in self.matches.iter().filter_map(|m| m.next) {
            if feed.to == index {
                fed[feed.slot.index()] = true;
            }
        }

        fed
    }

    /// A match nothing feeds that holds a single team is won by that team.
    fn resolve_byes(&mut self) -> Result<Vec<Progress>, BracketError> {
        let mut events = Vec::new();

        for index in 0..self.matches.len() {
            let index = MatchIndex(index);
            if self.fed_slots(index) != [false, false] {
                continue;
            }

            let Some(bracket_match) = self.matches.get_mut(index.0) else {
                continue;
            };
            let team = match bracket_match.teams {
                [Some(team), None] | [None, Some(team)] => team,
                _ => continue,
            };

            bracket_match.state = MatchState::Bye(team);
            let (label, next) = (bracket_match.label, bracket_match.next);
            log::debug!("match {label}: {team} has a bye");

            match next {
                Some(feed) => self.place(feed, Some(team), label, &mut events)?,
                None => events.push(Progress::Champion(team)),
            }
        }

        Ok(events)
    }

    /// Decides match `index` for `team` and moves the team forward.
    ///
    /// # Errors
    ///
    /// If there is no such match, it is a bye, the team doesn't play it or
    /// the match is still waiting for a team.
    pub fn set_winner(
        &mut self,
        index: MatchIndex,
        team: TeamId,
    ) -> Result<Vec<Progress>, BracketError> {
        let bracket_match = self
            .matches
            .get_mut(index.0)
            .ok_or(BracketError::NoMatch(index.0))?;

        if bracket_match.state.is_bye() {
            return Err(BracketError::Bye(bracket_match.label));
        }
        if bracket_match.slot_of(team).is_none() {
            return Err(BracketError::NotInMatch {
                team,
                label: bracket_match.label,
            });
        }

        let previous = bracket_match.state.winner();
        let (label, next) = (bracket_match.label, bracket_match.next);

        if previous == Some(team) {
            return Ok(match next {
                Some(_) => Vec::new(),
                None => vec![Progress::Champion(team)],
            });
        }
        if !bracket_match.is_ready() {
            return Err(BracketError::WaitingForTeams(label));
        }

        bracket_match.state = MatchState::Decided(team);
        log::debug!("match {label}: won by {team}");

        let mut events = Vec::new();
        match next {
            Some(feed) => self.place(feed, Some(team), label, &mut events)?,
            None => events.push(Progress::Champion(team)),
        }

        Ok(events)
    }

    /// Puts match `index` back to pending and takes its winner out of the
    /// next match.
    ///
    /// # Errors
    ///
    /// If there is no such match.
    pub fn clear_result(&mut self, index: MatchIndex) -> Result<Vec<Progress>, BracketError> {
        let bracket_match = self
            .matches
            .get_mut(index.0)
            .ok_or(BracketError::NoMatch(index.0))?;

        let MatchState::Decided(previous) = bracket_match.state else {
            return Ok(Vec::new());
        };

        bracket_match.state = MatchState::Pending;
        bracket_match.score = Score::default();
        let (label, next) = (bracket_match.label, bracket_match.next);
        log::debug!("match {label}: result cleared");

        let mut events = Vec::new();
        match next {
            Some(feed) => self.place(feed, None, label, &mut events)?,
            None => events.push(Progress::Revoked(previous)),
        }

        Ok(events)
    }

    /// Stores a best of three score and decides the match from it.
    ///
    /// # Errors
    ///
    /// If the score awards more than two sets to a side, the match is a
    /// bye, the winning slot is still empty or [`Bracket::set_winner`]
    /// fails.
    pub fn record_score(
        &mut self,
        index: MatchIndex,
        score: Score,
    ) -> Result<Vec<Progress>, BracketError> {
        score.check_best_of_three()?;

        let bracket_match = self.get(index).ok_or(BracketError::NoMatch(index.0))?;
        if bracket_match.state.is_bye() {
            return Err(BracketError::Bye(bracket_match.label));
        }

        let events = match score.winner() {
            Some(slot) => {
                let team = bracket_match.teams[slot.index()]
                    .ok_or(BracketError::WaitingForTeams(bracket_match.label))?;
                self.set_winner(index, team)?
            }
            None => self.clear_result(index)?,
        };

        if let Some(bracket_match) = self.matches.get_mut(index.0) {
            bracket_match.score = score;
        }

        Ok(events)
    }

    /// Writes `team` into the slot `feed` names. A decided match that loses
    /// a team goes back to pending and its winner is taken out of the match
    /// after it, all the way up to the final.
    fn place(
        &mut self,
        feed: Feed,
        team: Option<TeamId>,
        from: u32,
        events: &mut Vec<Progress>,
    ) -> Result<(), BracketError> {
        let target = self
            .matches
            .get_mut(feed.to.0)
            .ok_or(BracketError::NoMatch(feed.to.0))?;

        let slot = &mut target.teams[feed.slot.index()];
        if *slot == team {
            return Ok(());
        }
        *slot = team;

        if let Some(team) = team {
            events.push(Progress::Advanced {
                team,
                from,
                to: target.label,
            });
        }

        let Some(winner) = target.state.winner() else {
            return Ok(());
        };

        target.state = MatchState::Pending;
        target.score = Score::default();
        let (label, next) = (target.label, target.next);
        log::debug!("match {label}: lost a team, the result is cleared");
        events.push(Progress::Invalidated(label));

        match next {
            Some(next) => self.place(next, None, label, events),
            None => {
                events.push(Progress::Revoked(winner));
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn get(&self, index: MatchIndex) -> Option<&BracketMatch> {
        self.matches.get(index.0)
    }

    /// # Errors
    ///
    /// If there is no such match.
    pub fn schedule(&mut self, index: MatchIndex, time: DateTime<Utc>) -> Result<(), BracketError> {
        let bracket_match = self
            .matches
            .get_mut(index.0)
            .ok_or(BracketError::NoMatch(index.0))?;
        bracket_match.scheduled = Some(time);

        Ok(())
    }

    #[must_use]
    pub fn find(&self, label: u32) -> Option<MatchIndex> {
        self.matches
            .iter()
            .position(|m| m.label == label)
            .map(MatchIndex)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    #[must_use]
    pub fn rounds(&self) -> u8 {
        self.rounds
    }

    /// The matches of `round` in order.
    pub fn round(&self, round: u8) -> impl Iterator<Item = (MatchIndex, &BracketMatch)> {
        self.matches().filter(move |(_, m)| m.round == round)
    }

    pub fn matches(&self) -> impl Iterator<Item = (MatchIndex, &BracketMatch)> {
        self.matches
            .iter()
            .enumerate()
            .map(|(index, m)| (MatchIndex(index), m))
    }

    /// Matches with both teams set and no result yet.
    pub fn playable(&self) -> impl Iterator<Item = MatchIndex> {
        self.matches()
            .filter(|(_, m)| m.state.is_pending() && m.is_ready())
            .map(|(index, _)| index)
    }

    #[must_use]
    pub fn final_match(&self) -> Option<(MatchIndex, &BracketMatch)> {
        self.matches().find(|(_, m)| m.next.is_none())
    }

    #[must_use]
    pub fn champion(&self) -> Option<TeamId> {
        self.final_match().and_then(|(_, m)| m.state.winner())
    }

    #[must_use]
    pub fn round_name(&self, round: u8) -> String {
        match self.rounds.checked_sub(round) {
            Some(0) => "Final".to_string(),
            Some(1) => "Semifinal".to_string(),
            Some(2) => "Quarterfinal".to_string(),
            Some(3) => "Round of 16".to_string(),
            Some(4) => "Round of 32".to_string(),
            _ => format!("Round {round}"),
        }
    }
}

impl fmt::Display for Bracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (_, m) in self.matches() {
            write!(
                f,
                "{} {}: {} vs {}",
                self.round_name(m.round),
                m.label,
                m.describe_slot(Slot::Team1),
                m.describe_slot(Slot::Team2)
            )?;

            match m.state {
                MatchState::Pending => {}
                MatchState::Decided(team) if m.score.is_empty() => write!(f, ", won by {team}")?,
                MatchState::Decided(team) => write!(f, ", won by {team} {}", m.score)?,
                MatchState::Bye(team) => write!(f, ", bye for {team}")?,
            }

            writeln!(f)?;
        }

        Ok(())
    }
}
