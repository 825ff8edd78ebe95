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

use std::{fmt, fs, path::Path};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::{
    error::FormatError,
    group::{MAX_GROUPS, letter_index},
};

const BUILTIN_FORMATS: &str = include_str!("formats.ron");

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum GroupSizes {
    Fixed(u8),
    PerGroup(Vec<u8>),
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum BracketType {
    Semis,
    Quarters,
    RoundOf16,
    RoundOf32,
    #[default]
    Custom,
}

impl fmt::Display for BracketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketType::Semis => write!(f, "semifinals"),
            BracketType::Quarters => write!(f, "quarterfinals"),
            BracketType::RoundOf16 => write!(f, "round of 16"),
            BracketType::RoundOf32 => write!(f, "round of 32"),
            BracketType::Custom => write!(f, "custom"),
        }
    }
}

/// The team finishing at `rank` in the group with the letter `group`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct GroupRank(pub char, pub u8);

impl GroupRank {
    #[must_use]
    pub fn group(&self) -> char {
        self.0
    }

    #[must_use]
    pub fn rank(&self) -> u8 {
        self.1
    }
}

impl fmt::Display for GroupRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.1, self.0)
    }
}

/// Where the team in one slot of a bracket match comes from.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum BracketSource {
    GroupRank(char, u8),
    MatchWinner(u32),
}

impl BracketSource {
    #[must_use]
    pub fn group_rank(&self) -> Option<GroupRank> {
        match self {
            BracketSource::GroupRank(group, rank) => Some(GroupRank(*group, *rank)),
            BracketSource::MatchWinner(_) => None,
        }
    }
}

impl fmt::Display for BracketSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketSource::GroupRank(group, rank) => write!(f, "{rank}{group}"),
            BracketSource::MatchWinner(id) => write!(f, "W{id}"),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MatchDescriptor {
    pub id: u32,
    pub round: u8,
    pub team_1: BracketSource,
    pub team_2: BracketSource,
    pub next: Option<u32>,
}

impl MatchDescriptor {
    #[must_use]
    pub fn sources(&self) -> [BracketSource; 2] {
        [self.team_1, self.team_2]
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum BracketWiring {
    /// First round pairings; every later round is a plain ladder.
    Crossings(Vec<(GroupRank, GroupRank)>),
    /// Every match of the bracket, wired through `next`.
    Structure(Vec<MatchDescriptor>),
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TournamentFormat {
    pub teams: u16,
    pub groups: u8,
    pub teams_per_group: GroupSizes,
    #[serde(default)]
    pub bracket_type: BracketType,
    pub wiring: BracketWiring,
    #[serde(default)]
    pub group_names: Option<Vec<String>>,
}

impl TournamentFormat {
    /// One size per group, in group letter order.
    #[must_use]
    pub fn group_sizes(&self) -> Vec<u8> {
        match &self.teams_per_group {
            GroupSizes::Fixed(size) => vec![*size; usize::from(self.groups)],
            GroupSizes::PerGroup(sizes) => sizes.clone(),
        }
    }

    #[must_use]
    pub fn bracket_matches(&self) -> usize {
        match &self.wiring {
            BracketWiring::Crossings(crossings) => (crossings.len() * 2).saturating_sub(1),
            BracketWiring::Structure(descriptors) => descriptors.len(),
        }
    }

    fn invalid(&self, reason: String) -> FormatError {
        FormatError::Invalid {
            teams: self.teams,
            reason,
        }
    }

    /// Checks the group sizes and the bracket graph.
    ///
    /// # Errors
    ///
    /// If the sizes don't add up to the team count, a source names a group
    /// or rank that doesn't exist or the bracket graph is malformed.
    pub fn validate(&self) -> Result<(), FormatError> {
        let sizes = self.group_sizes();
        if sizes.len() != usize::from(self.groups) {
            return Err(self.invalid(format!(
                "{} group sizes are listed for {} groups",
                sizes.len(),
                self.groups
            )));
        }
        if sizes.contains(&0) {
            return Err(self.invalid("a group can't be empty".to_string()));
        }
        if sizes.len() > MAX_GROUPS {
            return Err(self.invalid(format!("{} groups don't have a letter each", sizes.len())));
        }

        let total: u16 = sizes.iter().copied().map(u16::from).sum();
        if total != self.teams {
            return Err(self.invalid(format!("the groups hold {total} teams")));
        }

        if let Some(names) = &self.group_names
            && names.len() != sizes.len()
        {
            return Err(self.invalid(format!(
                "{} group names are listed for {} groups",
                names.len(),
                sizes.len()
            )));
        }

        match &self.wiring {
            BracketWiring::Crossings(crossings) => {
                if !crossings.len().is_power_of_two() {
                    return Err(self.invalid(format!(
                        "{} crossings can't start a bracket, a power of two is needed",
                        crossings.len()
                    )));
                }

                self.check_ranks(&sizes, crossings.iter().flat_map(|(a, b)| [*a, *b]))
            }
            BracketWiring::Structure(descriptors) => {
                self.check_structure(descriptors)?;
                self.check_ranks(
                    &sizes,
                    descriptors
                        .iter()
                        .flat_map(MatchDescriptor::sources)
                        .filter_map(|source| source.group_rank()),
                )
            }
        }
    }

    fn check_ranks(
        &self,
        sizes: &[u8],
        ranks: impl Iterator<Item = GroupRank>,
    ) -> Result<(), FormatError> {
        let mut seen = FxHashSet::default();

        for rank in ranks {
            let Some(size) = letter_index(rank.group()).and_then(|index| sizes.get(index)) else {
                return Err(self.invalid(format!("{rank} names a group that doesn't exist")));
            };
            if rank.rank() == 0 || rank.rank() > *size {
                return Err(self.invalid(format!(
                    "{rank} is out of range, group {} has {size} teams",
                    rank.group()
                )));
            }
            if !seen.insert(rank) {
                return Err(self.invalid(format!("{rank} is placed in the bracket twice")));
            }
        }

        Ok(())
    }

    fn check_structure(&self, descriptors: &[MatchDescriptor]) -> Result<(), FormatError> {
        let mut by_id = FxHashMap::default();
        for descriptor in descriptors {
            if by_id.insert(descriptor.id, descriptor).is_some() {
                return Err(self.invalid(format!("match {} is listed twice", descriptor.id)));
            }
        }

        let finals = descriptors.iter().filter(|d| d.next.is_none()).count();
        if finals != 1 {
            return Err(self.invalid(format!(
                "{finals} matches have no next match, there has to be exactly one final"
            )));
        }

        for descriptor in descriptors {
            if descriptor.team_1 == descriptor.team_2 {
                return Err(self.invalid(format!(
                    "match {} takes {} in both slots",
                    descriptor.id, descriptor.team_1
                )));
            }

            // Rounds strictly increase along `next`, so the graph has no cycles.
            if let Some(next) = descriptor.next {
                let Some(target) = by_id.get(&next) else {
                    return Err(self.invalid(format!(
                        "match {} links to match {next}, which is not listed",
                        descriptor.id
                    )));
                };
                if target.round <= descriptor.round {
                    return Err(self.invalid(format!(
                        "match {} in round {} links to match {next} in round {}",
                        descriptor.id, descriptor.round, target.round
                    )));
                }

                let named = target
                    .sources()
                    .iter()
                    .filter(|source| **source == BracketSource::MatchWinner(descriptor.id))
                    .count();
                if named != 1 {
                    return Err(self.invalid(format!(
                        "match {next} takes the winner of match {} {named} times",
                        descriptor.id
                    )));
                }
            }

            for source in descriptor.sources() {
                if let BracketSource::MatchWinner(from) = source {
                    match by_id.get(&from) {
                        Some(feeder) if feeder.next == Some(descriptor.id) => {}
                        _ => {
                            return Err(self.invalid(format!(
                                "match {} takes the winner of match {from}, which doesn't link to it",
                                descriptor.id
                            )));
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for TournamentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sizes: Vec<_> = self.group_sizes().iter().map(ToString::to_string).collect();

        write!(
            f,
            "{} teams: {} groups ({}), {} bracket, {} matches",
            self.teams,
            self.groups,
            sizes.join(", "),
            self.bracket_type,
            self.bracket_matches()
        )
    }
}

/// Group and bracket topologies keyed by the registered team count.
#[derive(Clone, Debug, Default)]
pub struct FormatRegistry(FxHashMap<u16, TournamentFormat>);

impl FormatRegistry {
    /// The topologies shipped in `src/formats.ron`.
    ///
    /// # Errors
    ///
    /// If the embedded table doesn't validate.
    pub fn builtin() -> Result<Self, FormatError> {
        Self::from_ron(BUILTIN_FORMATS)
    }

    /// # Errors
    ///
    /// If the string is not a RON list of formats or a format doesn't validate.
    pub fn from_ron(string: &str) -> Result<Self, FormatError> {
        let formats: Vec<TournamentFormat> = ron::from_str(string)?;
        Self::from_formats(formats)
    }

    /// # Errors
    ///
    /// If the file can't be read or doesn't hold a valid table.
    pub fn from_path(path: &Path) -> Result<Self, FormatError> {
        let string = fs::read_to_string(path).map_err(|source| FormatError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_ron(&string)
    }

    /// # Errors
    ///
    /// If a format doesn't validate or a team count is listed twice.
    pub fn from_formats(formats: Vec<TournamentFormat>) -> Result<Self, FormatError> {
        let mut registry = FxHashMap::default();

        for format in formats {
            format.validate()?;
            let teams = format.teams;
            if registry.insert(teams, format).is_some() {
                return Err(FormatError::Duplicate(teams));
            }
        }

        log::debug!("loaded {} tournament formats", registry.len());
        Ok(Self(registry))
    }

    #[must_use]
    pub fn get_format(&self, teams: usize) -> Option<&TournamentFormat> {
        u16::try_from(teams)
            .ok()
            .and_then(|teams| self.0.get(&teams))
    }

    #[must_use]
    pub fn team_counts(&self) -> Vec<u16> {
        let mut counts: Vec<_> = self.0.keys().copied().collect();
        counts.sort_unstable();
        counts
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(
        id: u32,
        round: u8,
        team_1: BracketSource,
        team_2: BracketSource,
        next: Option<u32>,
    ) -> MatchDescriptor {
        MatchDescriptor {
            id,
            round,
            team_1,
            team_2,
            next,
        }
    }

    fn eight_teams() -> anyhow::Result<TournamentFormat> {
        let registry = FormatRegistry::builtin()?;
        registry
            .get_format(8)
            .cloned()
            .ok_or_else(|| anyhow::Error::msg("the 8 team format is built in"))
    }

    #[test]
    fn builtin_counts() -> anyhow::Result<()> {
        let registry = FormatRegistry::builtin()?;
        assert_eq!(
            registry.team_counts(),
            (6..=19).collect::<Vec<u16>>()
        );
        assert!(registry.get_format(5).is_none());
        assert!(registry.get_format(20).is_none());
        assert!(registry.get_format(usize::MAX).is_none());

        Ok(())
    }

    #[test]
    fn group_sizes_add_up() -> anyhow::Result<()> {
        let registry = FormatRegistry::builtin()?;

        for teams in registry.team_counts() {
            let Some(format) = registry.get_format(usize::from(teams)) else {
                panic!("{teams} teams should be registered");
            };
            let sizes = format.group_sizes();
            assert_eq!(sizes.len(), usize::from(format.groups));
            assert_eq!(sizes.iter().copied().map(u16::from).sum::<u16>(), teams);
            assert_eq!(registry.get_format(usize::from(teams)), Some(format));
        }

        Ok(())
    }

    #[test]
    fn seven_teams() -> anyhow::Result<()> {
        let registry = FormatRegistry::builtin()?;
        let Some(format) = registry.get_format(7) else {
            panic!("7 teams should be registered");
        };

        assert_eq!(format.group_sizes(), vec![4, 3]);
        assert_eq!(format.bracket_matches(), 4);
        assert_eq!(
            format.to_string(),
            "7 teams: 2 groups (4, 3), custom bracket, 4 matches"
        );

        Ok(())
    }

    #[test]
    fn crossings_count_the_whole_ladder() -> anyhow::Result<()> {
        let registry = FormatRegistry::builtin()?;
        let twelve = registry.get_format(12).map(TournamentFormat::bracket_matches);
        assert_eq!(twelve, Some(7));

        Ok(())
    }

    #[test]
    fn sources_display() {
        assert_eq!(BracketSource::GroupRank('B', 2).to_string(), "2B");
        assert_eq!(BracketSource::MatchWinner(58).to_string(), "W58");
        assert_eq!(GroupRank('A', 1).to_string(), "1A");
    }

    #[test]
    fn duplicate_counts_are_refused() -> anyhow::Result<()> {
        let format = eight_teams()?;
        assert!(matches!(
            FormatRegistry::from_formats(vec![format.clone(), format]),
            Err(FormatError::Duplicate(8))
        ));

        Ok(())
    }

    #[test]
    fn wrong_group_total() -> anyhow::Result<()> {
        let mut format = eight_teams()?;
        format.teams_per_group = GroupSizes::PerGroup(vec![4, 3]);
        assert_eq!(
            format.validate().map_err(|error| error.to_string()),
            Err("formats: 8 teams: the groups hold 7 teams".to_string())
        );

        Ok(())
    }

    #[test]
    fn rank_out_of_range() -> anyhow::Result<()> {
        let mut format = eight_teams()?;
        let BracketWiring::Structure(descriptors) = &mut format.wiring else {
            panic!("8 teams use a structure");
        };
        descriptors[0].team_1 = BracketSource::GroupRank('A', 5);

        assert_eq!(
            format.validate().map_err(|error| error.to_string()),
            Err("formats: 8 teams: 5A is out of range, group A has 4 teams".to_string())
        );

        Ok(())
    }

    #[test]
    fn unknown_group() -> anyhow::Result<()> {
        let mut format = eight_teams()?;
        let BracketWiring::Structure(descriptors) = &mut format.wiring else {
            panic!("8 teams use a structure");
        };
        descriptors[0].team_1 = BracketSource::GroupRank('C', 1);

        assert!(format.validate().is_err());

        Ok(())
    }

    #[test]
    fn two_finals_are_refused() {
        let format = TournamentFormat {
            teams: 4,
            groups: 2,
            teams_per_group: GroupSizes::Fixed(2),
            bracket_type: BracketType::Custom,
            wiring: BracketWiring::Structure(vec![
                descriptor(
                    1,
                    1,
                    BracketSource::GroupRank('A', 1),
                    BracketSource::GroupRank('B', 2),
                    None,
                ),
                descriptor(
                    2,
                    1,
                    BracketSource::GroupRank('B', 1),
                    BracketSource::GroupRank('A', 2),
                    Some(3),
                ),
                descriptor(
                    3,
                    2,
                    BracketSource::MatchWinner(1),
                    BracketSource::MatchWinner(2),
                    None,
                ),
            ]),
            group_names: None,
        };

        assert_eq!(
            format.validate().map_err(|error| error.to_string()),
            Err(
                "formats: 4 teams: 2 matches have no next match, there has to be exactly one final"
                    .to_string()
            )
        );
    }

    #[test]
    fn backwards_link() {
        let format = TournamentFormat {
            teams: 4,
            groups: 2,
            teams_per_group: GroupSizes::Fixed(2),
            bracket_type: BracketType::Custom,
            wiring: BracketWiring::Structure(vec![
                descriptor(
                    1,
                    2,
                    BracketSource::GroupRank('A', 1),
                    BracketSource::GroupRank('B', 2),
                    Some(3),
                ),
                descriptor(
                    2,
                    1,
                    BracketSource::GroupRank('B', 1),
                    BracketSource::GroupRank('A', 2),
                    Some(3),
                ),
                descriptor(
                    3,
                    2,
                    BracketSource::MatchWinner(1),
                    BracketSource::MatchWinner(2),
                    None,
                ),
            ]),
            group_names: None,
        };

        assert_eq!(
            format.validate().map_err(|error| error.to_string()),
            Err("formats: 4 teams: match 1 in round 2 links to match 3 in round 2".to_string())
        );
    }

    #[test]
    fn crossings_need_a_power_of_two() {
        let format = TournamentFormat {
            teams: 9,
            groups: 3,
            teams_per_group: GroupSizes::Fixed(3),
            bracket_type: BracketType::Quarters,
            wiring: BracketWiring::Crossings(vec![
                (GroupRank('A', 1), GroupRank('B', 2)),
                (GroupRank('B', 1), GroupRank('C', 2)),
                (GroupRank('C', 1), GroupRank('A', 2)),
            ]),
            group_names: None,
        };

        assert!(format.validate().is_err());
    }

    #[test]
    fn table_from_ron() -> anyhow::Result<()> {
        let registry = FormatRegistry::from_ron(
            "[
                TournamentFormat(
                    teams: 4,
                    groups: 2,
                    teams_per_group: Fixed(2),
                    wiring: Crossings([(('A', 1), ('B', 2)), (('B', 1), ('A', 2))]),
                ),
            ]",
        )?;

        assert_eq!(registry.team_counts(), vec![4]);
        assert_eq!(
            registry.get_format(4).map(|format| format.bracket_type),
            Some(BracketType::Custom)
        );
        assert!(FormatRegistry::from_ron("[]")?.is_empty());

        Ok(())
    }
}
