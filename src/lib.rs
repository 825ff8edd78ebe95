//! A group stage and single elimination engine for amateur padel tournaments.
//!
//! The engine takes the teams registered to a tournament, splits them into
//! round-robin groups, keeps the group standings up to date as scores come in
//! and then builds the elimination bracket, either from a hand designed
//! topology for the registered team count or from a generic power-of-two
//! ladder. Bracket winners move forward on their own until the final decides
//! the champion.
//!
//! ## Feature Flags
//!
//! * bench - enable the `criterion` benchmarks
//!
//! ## Topologies
//!
//! The built-in topology table lives in `src/formats.ron`. Get more
//! information about the [format registry].
//!
//! [format registry]: format::FormatRegistry

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

#![deny(clippy::panic)]

pub mod bracket;
pub mod config;
pub mod error;
pub mod format;
pub mod group;
pub mod ranking;
pub mod score;
pub mod simulation;
pub mod slot;
pub mod status;
pub mod team;
pub mod tournament;
pub mod utils;

pub type Id = u64;

pub const COPYRIGHT: &str = r".SH COPYRIGHT
This program is free software: you can redistribute it and/or modify
it under the terms of the GNU Affero General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU Affero General Public License for more details.

You should have received a copy of the GNU Affero General Public License
along with this program.  If not, see <https://www.gnu.org/licenses/>.
";

pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "
Licensed under the AGPLv3"
);
