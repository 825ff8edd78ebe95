use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// One of the two sides of a match.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum Slot {
    #[default]
    Team1,
    Team2,
}

impl Slot {
    pub const BOTH: [Slot; 2] = [Slot::Team1, Slot::Team2];

    /// The slot a match's winner fills in the next match: odd orders within
    /// a round go to team 1, even orders to team 2.
    #[must_use]
    pub fn from_order(order: u32) -> Self {
        if order % 2 == 1 {
            Self::Team1
        } else {
            Self::Team2
        }
    }

    #[must_use]
    pub fn opposite(&self) -> Self {
        match self {
            Self::Team1 => Self::Team2,
            Self::Team2 => Self::Team1,
        }
    }

    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Team1 => 0,
            Self::Team2 => 1,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Team1 => write!(f, "team_1"),
            Slot::Team2 => write!(f, "team_2"),
        }
    }
}

impl FromStr for Slot {
    type Err = anyhow::Error;

    fn from_str(string: &str) -> anyhow::Result<Self> {
        let string = string.to_lowercase();

        match string.as_str() {
            "1" | "team_1" | "team1" => Ok(Self::Team1),
            "2" | "team_2" | "team2" => Ok(Self::Team2),
            _ => Err(anyhow::Error::msg(format!(
                "Error trying to convert '{string}' to a Slot!"
            ))),
        }
    }
}
