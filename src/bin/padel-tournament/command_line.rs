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

use std::{io::Write as _, path::PathBuf};

use clap::{CommandFactory, Parser};
use padel_tournament::{COPYRIGHT, LONG_VERSION};

/// Padel Tournament
///
/// Draws the groups for a number of made up teams, plays every match with
/// random scores and prints the groups and the bracket.
#[allow(clippy::struct_excessive_bools)]
#[derive(Parser, Debug)]
#[command(long_version = LONG_VERSION, about = "Padel Tournament")]
pub(crate) struct Args {
    /// The number of teams that register
    #[arg(long, default_value_t = 8)]
    pub teams: u16,

    /// Seed the draw and the scores, random if not given
    #[arg(long)]
    pub seed: Option<u64>,

    /// Play this many tournaments in parallel and print a summary
    #[arg(long, default_value_t = 1)]
    pub runs: u64,

    /// Teams per group when no format is registered for the team count
    #[arg(long, default_value_t = 3)]
    pub group_size: u8,

    /// Only allow groups of 3
    #[arg(long)]
    pub force_groups_of_3: bool,

    /// Skip the group stage
    #[arg(long)]
    pub elimination: bool,

    /// The tournament name
    #[arg(default_value = "Padel Open", long)]
    pub name: String,

    /// A RON file with the engine settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// A RON file with the tournament formats
    #[arg(long)]
    pub formats: Option<PathBuf>,

    /// Print the registered tournament formats and exit
    #[arg(long)]
    pub list_formats: bool,

    /// Save the finished tournament as RON
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Print saved tournaments and the team ranking over them, then exit
    #[arg(long, num_args = 1..)]
    pub load: Vec<PathBuf>,

    /// Whether to log on the debug level
    #[arg(long)]
    pub debug: bool,

    /// Whether the application is being run by systemd
    #[arg(long)]
    pub systemd: bool,

    /// Build the manpage
    #[arg(long)]
    pub man: bool,
}

impl Args {
    pub(crate) fn generate_man_page() -> anyhow::Result<()> {
        let mut buffer: Vec<u8> = Vec::default();
        let cmd = Self::command()
            .name("padel-tournament")
            .long_version(None);
        let man = clap_mangen::Man::new(cmd).date("2026-10-19");

        man.render(&mut buffer)?;
        write!(buffer, "{COPYRIGHT}")?;

        std::fs::write("padel-tournament.1", buffer)?;
        Ok(())
    }
}
