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

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info, warn};
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::{
    Id,
    bracket::{Bracket, MatchIndex, Progress},
    config::EngineConfig,
    error::TournamentError,
    format::{BracketWiring, FormatRegistry, GroupRank},
    group::{Group, MAX_GROUPS, letter_index, partition},
    score::Score,
    status::{FormatKind, State},
    team::{Category, Division, Team, TeamId},
};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TournamentSettings {
    pub name: String,
    /// Only teams of this division may register, any team if `None`.
    pub division: Option<Division>,
    pub category: Category,
    pub start_date: NaiveDate,
    pub registration_deadline: DateTime<Utc>,
    pub total_slots: u16,
    /// Teams per group when no topology is registered for the team count.
    pub group_size: u8,
    pub force_groups_of_3: bool,
    pub kind: FormatKind,
}

impl Default for TournamentSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            division: None,
            category: Category::default(),
            start_date: NaiveDate::default(),
            registration_deadline: DateTime::default(),
            total_slots: 16,
            group_size: 3,
            force_groups_of_3: false,
            kind: FormatKind::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Registration {
    pub team: Team,
    pub registered_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Tournament {
    pub id: Id,
    pub settings: TournamentSettings,
    pub state: State,
    pub registrations: Vec<Registration>,
    pub groups: Vec<Group>,
    pub bracket: Option<Bracket>,
    pub winning_team: Option<TeamId>,
}

impl Tournament {
    /// # Errors
    ///
    /// If the group size is below 2 or there are fewer slots than the
    /// teams needed to start.
    pub fn new(
        id: Id,
        settings: TournamentSettings,
        config: &EngineConfig,
    ) -> Result<Self, TournamentError> {
        if settings.group_size < 2 {
            return Err(TournamentError::GroupSize(settings.group_size));
        }
        if usize::from(settings.total_slots) < config.min_teams {
            return Err(TournamentError::Slots {
                slots: settings.total_slots,
                required: config.min_teams,
            });
        }

        Ok(Self {
            id,
            settings,
            state: State::Open,
            registrations: Vec::new(),
            groups: Vec::new(),
            bracket: None,
            winning_team: None,
        })
    }

    /// # Errors
    ///
    /// If the tournament is not open, the deadline has passed, the team is
    /// already in, plays another division or category, or the tournament
    /// is full.
    pub fn register(&mut self, team: &Team, now: DateTime<Utc>) -> Result<(), TournamentError> {
        if self.state != State::Open {
            return Err(TournamentError::RegistrationClosed);
        }
        if self.is_registered(team.id) {
            return Err(TournamentError::AlreadyRegistered(team.id));
        }
        if now > self.settings.registration_deadline {
            return Err(TournamentError::DeadlinePassed);
        }
        if let Some(division) = &self.settings.division
            && team.division.as_ref() != Some(division)
        {
            return Err(TournamentError::WrongDivision {
                team: team.id,
                team_division: team
                    .division
                    .as_ref()
                    .map_or_else(|| "no division".to_string(), ToString::to_string),
                division: division.clone(),
            });
        }
        if !self.settings.category.admits(team.category) {
            return Err(TournamentError::WrongCategory {
                team: team.category,
                tournament: self.settings.category,
            });
        }
        if self.registrations.len() >= usize::from(self.settings.total_slots) {
            return Err(TournamentError::Full);
        }

        self.registrations.push(Registration {
            team: team.clone(),
            registered_at: now,
        });
        info!("{} register: {team}", self.id);

        Ok(())
    }

    /// # Errors
    ///
    /// If the tournament is not open or the team is not registered.
    pub fn unregister(&mut self, team: TeamId) -> Result<(), TournamentError> {
        if self.state != State::Open {
            return Err(TournamentError::NotOpen("unregister"));
        }

        let Some(position) = self
            .registrations
            .iter()
            .position(|registration| registration.team.id == team)
        else {
            return Err(TournamentError::NotRegistered(team));
        };

        self.registrations.remove(position);
        info!("{} unregister: {team}", self.id);

        Ok(())
    }

    #[must_use]
    pub fn is_registered(&self, team: TeamId) -> bool {
        self.registrations
            .iter()
            .any(|registration| registration.team.id == team)
    }

    #[must_use]
    pub fn team(&self, team: TeamId) -> Option<&Team> {
        self.registrations
            .iter()
            .map(|registration| &registration.team)
            .find(|registered| registered.id == team)
    }

    #[must_use]
    pub fn team_count(&self) -> usize {
        self.registrations.len()
    }

    /// Draws the groups and closes the registration.
    ///
    /// # Errors
    ///
    /// If the tournament is not open, too few teams registered or the team
    /// count can't be split the way the settings ask for.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        registry: &FormatRegistry,
        config: &EngineConfig,
        rng: &mut R,
    ) -> Result<(), TournamentError> {
        if self.state != State::Open {
            warn!("{} start: the tournament is {}", self.id, self.state);
            return Err(TournamentError::NotOpen("start"));
        }

        self.groups.clear();

        let count = self.team_count();
        if count < config.min_teams {
            warn!("{} start: only {count} teams registered", self.id);
            return Err(TournamentError::InsufficientTeams {
                count,
                required: config.min_teams,
            });
        }

        if self.settings.kind == FormatKind::GroupsPlusElimination {
            let mut teams: Vec<_> = self.registrations.iter().map(|r| r.team.id).collect();
            teams.shuffle(rng);
            self.groups = self.draw_groups(&teams, registry)?;

            info!(
                "{} start: {count} teams drawn into {} groups",
                self.id,
                self.groups.len()
            );
        } else {
            info!("{} start: {count} teams go straight to the bracket", self.id);
        }

        self.state = State::InProgress;
        Ok(())
    }

    fn draw_groups(
        &self,
        teams: &[TeamId],
        registry: &FormatRegistry,
    ) -> Result<Vec<Group>, TournamentError> {
        let count = teams.len();

        let (sizes, names) = if let Some(format) = registry.get_format(count) {
            debug!("{} start: using the {count} team format", self.id);
            (format.group_sizes(), format.group_names.clone())
        } else if self.settings.force_groups_of_3 {
            if count % 3 != 0 {
                return Err(TournamentError::NotDivisibleByThree {
                    count,
                    missing: 3 - count % 3,
                });
            }
            (vec![3; count / 3], None)
        } else {
            let size = self.settings.group_size;
            let mut sizes = vec![size; count / usize::from(size)];
            if let Ok(rest) = u8::try_from(count % usize::from(size))
                && rest > 0
            {
                sizes.push(rest);
            }
            (sizes, None)
        };

        if sizes.len() > MAX_GROUPS {
            return Err(TournamentError::TooManyGroups(sizes.len()));
        }
        let mut groups =
            partition(teams, &sizes).ok_or(TournamentError::TooManyGroups(sizes.len()))?;

        if let Some(names) = names {
            groups = groups
                .into_iter()
                .zip(names)
                .map(|(group, name)| group.with_name(&name))
                .collect();
        }

        Ok(groups)
    }

    /// The generic bracket seeds: the top teams of every group, rank by
    /// rank. Each rank list is rotated by one more place than the rank
    /// above it, so group winners don't meet their own runner-up.
    #[must_use]
    pub fn classifiers(&self, config: &EngineConfig) -> Vec<TeamId> {
        let mut seeds = Vec::new();

        for (rotation, rank) in (1..=config.classifiers_per_group).enumerate() {
            let mut teams: Vec<_> = self
                .groups
                .iter()
                .filter_map(|group| group.team_at(rank))
                .collect();
            if !teams.is_empty() {
                let rotation = rotation % teams.len();
                teams.rotate_left(rotation);
            }
            seeds.extend(teams);
        }

        seeds
    }

    #[must_use]
    pub fn pending_group_matches(&self) -> usize {
        self.groups.iter().map(Group::pending_matches).sum()
    }

    /// # Errors
    ///
    /// If the tournament is not in progress, a bracket already exists,
    /// group matches are pending or too few teams classified.
    pub fn generate_bracket<R: Rng + ?Sized>(
        &mut self,
        registry: &FormatRegistry,
        config: &EngineConfig,
        rng: &mut R,
    ) -> Result<Vec<Progress>, TournamentError> {
        if self.state != State::InProgress {
            warn!("{} generate_bracket: the tournament is {}", self.id, self.state);
            return Err(TournamentError::NotInProgress("generate_bracket"));
        }
        if self.bracket.is_some() {
            warn!("{} generate_bracket: the bracket was already generated", self.id);
            return Err(TournamentError::BracketAlreadyGenerated);
        }

        let (bracket, events) = match self.settings.kind {
            FormatKind::Elimination => {
                let mut seeds: Vec<_> = self.registrations.iter().map(|r| r.team.id).collect();
                seeds.shuffle(rng);
                Bracket::ladder(&seeds)?
            }
            FormatKind::GroupsPlusElimination => self.bracket_from_groups(registry, config)?,
        };

        info!(
            "{} generate_bracket: {} matches in {} rounds",
            self.id,
            bracket.len(),
            bracket.rounds()
        );
        self.bracket = Some(bracket);
        self.apply(&events);

        Ok(events)
    }

    fn bracket_from_groups(
        &self,
        registry: &FormatRegistry,
        config: &EngineConfig,
    ) -> Result<(Bracket, Vec<Progress>), TournamentError> {
        let pending = self.pending_group_matches();
        if config.require_complete_groups && pending > 0 {
            warn!("{} generate_bracket: {pending} group matches pending", self.id);
            return Err(TournamentError::GroupStageIncomplete(pending));
        }

        let teams = self.team_count();
        if let Some(format) = registry.get_format(teams) {
            if usize::from(format.groups) != self.groups.len() {
                return Err(TournamentError::TopologyMismatch {
                    teams,
                    expected: format.groups,
                    found: self.groups.len(),
                });
            }

            let resolve = |rank: GroupRank| {
                letter_index(rank.group())
                    .and_then(|index| self.groups.get(index))
                    .and_then(|group| group.team_at(rank.rank()))
            };

            debug!("{} generate_bracket: using the {teams} team format", self.id);
            let bracket = match &format.wiring {
                BracketWiring::Crossings(crossings) => Bracket::from_crossings(crossings, resolve)?,
                BracketWiring::Structure(descriptors) => {
                    Bracket::from_structure(descriptors, resolve)?
                }
            };

            return Ok(bracket);
        }

        let seeds = self.classifiers(config);
        if seeds.len() < config.min_bracket_teams {
            warn!(
                "{} generate_bracket: only {} teams classified",
                self.id,
                seeds.len()
            );
            return Err(TournamentError::InsufficientClassifiers {
                count: seeds.len(),
                required: config.min_bracket_teams,
            });
        }

        Ok(Bracket::ladder(&seeds)?)
    }

    /// Drops the bracket so it can be generated again.
    ///
    /// # Errors
    ///
    /// If the tournament has not started or there is no bracket.
    pub fn reset_bracket(&mut self) -> Result<(), TournamentError> {
        if self.state == State::Open {
            return Err(TournamentError::NotStarted("reset_bracket"));
        }
        if self.bracket.take().is_none() {
            return Err(TournamentError::NoBracket("reset_bracket"));
        }

        self.winning_team = None;
        self.state = State::InProgress;
        info!("{} reset_bracket: the bracket was dropped", self.id);

        Ok(())
    }

    /// # Errors
    ///
    /// If the tournament has not started.
    pub fn finalize(&mut self) -> Result<(), TournamentError> {
        if self.state == State::Open {
            warn!("{} finalize: the tournament is open", self.id);
            return Err(TournamentError::NotStarted("finalize"));
        }

        self.state = State::Finished;
        info!("{} finalize: the tournament is finished", self.id);

        Ok(())
    }

    /// # Errors
    ///
    /// If the tournament is not in progress or the match doesn't exist.
    pub fn record_group_score(
        &mut self,
        group: usize,
        index: usize,
        score: Score,
    ) -> Result<(), TournamentError> {
        if self.state != State::InProgress {
            return Err(TournamentError::NotInProgress("record_group_score"));
        }

        let id = self.id;
        let group = self
            .groups
            .get_mut(group)
            .ok_or(TournamentError::NoGroup(group))?;
        group.record_score(index, score)?;

        if let Some(group_match) = group.matches.get(index) {
            debug!("{id} record_group_score: {}: {group_match}", group.name);
        }

        Ok(())
    }

    /// # Errors
    ///
    /// If there is no bracket or the bracket refuses the score.
    pub fn record_bracket_score(
        &mut self,
        index: MatchIndex,
        score: Score,
    ) -> Result<Vec<Progress>, TournamentError> {
        let events = self
            .bracket_mut("record_bracket_score")?
            .record_score(index, score)?;
        self.apply(&events);

        Ok(events)
    }

    /// # Errors
    ///
    /// If there is no bracket or the team doesn't play the match.
    pub fn set_bracket_winner(
        &mut self,
        index: MatchIndex,
        team: TeamId,
    ) -> Result<Vec<Progress>, TournamentError> {
        let events = self
            .bracket_mut("set_bracket_winner")?
            .set_winner(index, team)?;
        self.apply(&events);

        Ok(events)
    }

    /// # Errors
    ///
    /// If there is no bracket or no such match.
    pub fn clear_bracket_result(
        &mut self,
        index: MatchIndex,
    ) -> Result<Vec<Progress>, TournamentError> {
        let events = self
            .bracket_mut("clear_bracket_result")?
            .clear_result(index)?;
        self.apply(&events);

        Ok(events)
    }

    fn bracket_mut(&mut self, action: &'static str) -> Result<&mut Bracket, TournamentError> {
        if self.state == State::Open {
            return Err(TournamentError::NotStarted(action));
        }

        self.bracket
            .as_mut()
            .ok_or(TournamentError::NoBracket(action))
    }

    fn apply(&mut self, events: &[Progress]) {
        for event in events {
            match event {
                Progress::Advanced { .. } => debug!("{} {event}", self.id),
                Progress::Invalidated(_) => info!("{} {event}", self.id),
                Progress::Champion(team) => {
                    self.winning_team = Some(*team);
                    self.state = State::Finished;
                    info!("{} {event}", self.id);
                }
                Progress::Revoked(team) => {
                    if self.winning_team == Some(*team) {
                        self.winning_team = None;
                        self.state = State::InProgress;
                    }
                    info!("{} {event}", self.id);
                }
            }
        }
    }

    /// # Errors
    ///
    /// If the tournament can't be serialized.
    pub fn to_ron(&self) -> Result<String, TournamentError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// # Errors
    ///
    /// If the string is not a RON tournament.
    pub fn from_ron(string: &str) -> Result<Self, TournamentError> {
        Ok(ron::from_str(string)?)
    }
}

impl fmt::Display for Tournament {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ({}): {} teams",
            self.settings.name,
            self.state,
            self.team_count()
        )?;

        for group in &self.groups {
            writeln!(f)?;
            write!(f, "{group}")?;
        }

        if let Some(bracket) = &self.bracket {
            writeln!(f)?;
            write!(f, "{bracket}")?;
        }

        if let Some(team) = self.winning_team.and_then(|team| self.team(team)) {
            writeln!(f)?;
            writeln!(f, "Champion: {team}")?;
        }

        Ok(())
    }
}
