// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Where a tournament is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum State {
    #[default]
    Open,
    InProgress,
    Finished,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

impl FromStr for State {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "finished" => Ok(Self::Finished),
            _ => Err(anyhow::Error::msg(format!("invalid state: {value}"))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum FormatKind {
    /// Straight to the bracket, seeded with the registered teams.
    Elimination,
    /// Round-robin groups first, the classified teams play the bracket.
    #[default]
    GroupsPlusElimination,
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Elimination => write!(f, "elimination"),
            Self::GroupsPlusElimination => write!(f, "groups_plus_elimination"),
        }
    }
}

impl FromStr for FormatKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.to_lowercase().as_str() {
            "e" | "elimination" => Ok(Self::Elimination),
            "g" | "groups" | "groups_plus_elimination" => Ok(Self::GroupsPlusElimination),
            _ => Err(anyhow::Error::msg(format!("invalid format kind: {value}"))),
        }
    }
}
