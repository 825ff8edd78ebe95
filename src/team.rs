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

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Id;

/// The engine only ever compares teams by identity.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct TeamId(pub Id);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Division(pub String);

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Category {
    Male,
    Female,
    #[default]
    Mixed,
}

impl Category {
    /// Whether a team of `category` may enter a tournament of this category.
    #[must_use]
    pub fn admits(&self, category: Category) -> bool {
        *self == Category::Mixed || *self == category
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Male => write!(f, "male"),
            Category::Female => write!(f, "female"),
            Category::Mixed => write!(f, "mixed"),
        }
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(string: &str) -> anyhow::Result<Self> {
        let string = string.to_lowercase();

        match string.as_str() {
            "m" | "male" => Ok(Self::Male),
            "f" | "female" => Ok(Self::Female),
            "x" | "mixed" => Ok(Self::Mixed),
            _ => Err(anyhow::Error::msg(format!(
                "Error trying to convert '{string}' to a Category!"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub players: [String; 2],
    #[serde(default)]
    pub division: Option<Division>,
    #[serde(default)]
    pub category: Category,
}

impl Team {
    #[must_use]
    pub fn new(id: TeamId, player_1: &str, player_2: &str) -> Self {
        Self {
            id,
            name: format!("{player_1} / {player_2}"),
            players: [player_1.to_string(), player_2.to_string()],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_division(mut self, division: &str) -> Self {
        self.division = Some(Division(division.to_string()));
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.division {
            Some(division) => write!(f, "{} {} ({division})", self.id, self.name),
            None => write!(f, "{} {}", self.id, self.name),
        }
    }
}
