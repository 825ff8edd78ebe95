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

use std::io;

use ron::error::SpannedError;
use thiserror::Error;

use crate::team::{Category, Division, TeamId};

#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("score: '{0}' is not a set, write it like 6-4")]
    InvalidSet(String),
    #[error("score: both sides of set {0} have to be entered")]
    IncompleteSet(usize),
    #[error("score: at most 3 sets can be played")]
    TooManySets,
    #[error("score: a side wins a set with at most 7 games, got {0}")]
    TooManyGames(u8),
    #[error("score: a side can win at most 2 sets")]
    BestOfThree,
}

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("formats: RON: {0}")]
    Ron(#[from] SpannedError),
    #[error("formats: {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("formats: {0} teams are listed more than once")]
    Duplicate(u16),
    #[error("formats: {teams} teams: {reason}")]
    Invalid { teams: u16, reason: String },
}

#[derive(Error, Debug)]
pub enum BracketError {
    #[error("bracket: there is no match at index {0}")]
    NoMatch(usize),
    #[error("bracket: team {team} does not play match {label}")]
    NotInMatch { team: TeamId, label: u32 },
    #[error("bracket: match {0} is a bye, it takes no score")]
    Bye(u32),
    #[error("bracket: match {0} is still waiting for a team")]
    WaitingForTeams(u32),
    #[error("bracket: at least 2 teams are needed, there are {0}")]
    TooFewTeams(usize),
    #[error("bracket: match {0} links to match {1}, which does not exist")]
    MissingNext(u32, u32),
    #[error("bracket: match {next} has no slot for the winner of match {from}")]
    Unwired { from: u32, next: u32 },
    #[error(transparent)]
    Score(#[from] ScoreError),
}

#[derive(Error, Debug)]
pub enum TournamentError {
    #[error("settings: the group size has to be at least 2, got {0}")]
    GroupSize(u8),
    #[error("settings: the tournament needs room for at least {required} teams, it has {slots}")]
    Slots { slots: u16, required: usize },
    #[error("register: the tournament is not open")]
    RegistrationClosed,
    #[error("register: the registration deadline has passed")]
    DeadlinePassed,
    #[error("register: the tournament is full")]
    Full,
    #[error("register: team {0} is already registered")]
    AlreadyRegistered(TeamId),
    #[error("register: team {team} plays in {team_division}, the tournament is for {division}")]
    WrongDivision {
        team: TeamId,
        team_division: String,
        division: Division,
    },
    #[error("register: a {team} team can't enter a {tournament} tournament")]
    WrongCategory {
        team: Category,
        tournament: Category,
    },
    #[error("unregister: team {0} is not registered")]
    NotRegistered(TeamId),
    #[error("{0}: the tournament is not open")]
    NotOpen(&'static str),
    #[error("start: at least {required} teams are needed, there are {count}")]
    InsufficientTeams { count: usize, required: usize },
    #[error(
        "start: groups of 3 need the team count to be divisible by 3, register {missing} more teams (there are {count})"
    )]
    NotDivisibleByThree { count: usize, missing: usize },
    #[error("start: {0} groups are more than there are group letters")]
    TooManyGroups(usize),
    #[error("{0}: the tournament is not in progress")]
    NotInProgress(&'static str),
    #[error("{0}: the tournament has not started")]
    NotStarted(&'static str),
    #[error("generate_bracket: the bracket was already generated")]
    BracketAlreadyGenerated,
    #[error("generate_bracket: {0} group matches are still pending")]
    GroupStageIncomplete(usize),
    #[error("generate_bracket: only {count} teams classified, at least {required} are needed")]
    InsufficientClassifiers { count: usize, required: usize },
    #[error("generate_bracket: the {teams} team format expects {expected} groups, there are {found}")]
    TopologyMismatch {
        teams: usize,
        expected: u8,
        found: usize,
    },
    #[error("{0}: there is no bracket yet")]
    NoBracket(&'static str),
    #[error("score: there is no group {0}")]
    NoGroup(usize),
    #[error("score: group {group} has no match {index}")]
    NoGroupMatch { group: char, index: usize },
    #[error(transparent)]
    Bracket(#[from] BracketError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error("snapshot: RON: {0}")]
    Serialize(#[from] ron::Error),
    #[error("snapshot: RON: {0}")]
    Deserialize(#[from] SpannedError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config: {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("config: RON: {0}")]
    Ron(#[from] SpannedError),
    #[error("config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Format(#[from] FormatError),
}
