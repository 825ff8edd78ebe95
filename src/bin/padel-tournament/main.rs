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

mod command_line;

use std::fs;

use chrono::{Duration, Utc};
use clap::Parser;
use log::{debug, info};
use padel_tournament::{
    config::EngineConfig,
    ranking::ranking,
    simulation::{simulate, simulate_many},
    status::FormatKind,
    tournament::{Tournament, TournamentSettings},
    utils,
};
use rand::{SeedableRng, rngs::StdRng};

use crate::command_line::Args;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    utils::init_logger(args.debug, args.systemd);

    if args.man {
        return Args::generate_man_page();
    }

    if !args.load.is_empty() {
        let mut tournaments = Vec::new();
        for path in &args.load {
            let tournament = Tournament::from_ron(&fs::read_to_string(path)?)?;
            print!("{tournament}");
            tournaments.push(tournament);
        }

        println!("ranking:");
        for (place, record) in ranking(&tournaments).iter().enumerate() {
            println!("{}. {record}", place + 1);
        }
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    if let Some(formats) = args.formats {
        config.formats = Some(formats);
    }
    debug!("{config:?}");

    let registry = config.registry()?;
    if args.list_formats {
        for count in registry.team_counts() {
            if let Some(format) = registry.get_format(usize::from(count)) {
                println!("{format}");
            }
        }
        return Ok(());
    }

    let settings = TournamentSettings {
        name: args.name,
        registration_deadline: Utc::now() + Duration::days(1),
        total_slots: args.teams,
        group_size: args.group_size,
        force_groups_of_3: args.force_groups_of_3,
        kind: if args.elimination {
            FormatKind::Elimination
        } else {
            FormatKind::GroupsPlusElimination
        },
        ..TournamentSettings::default()
    };

    let seed = args.seed.unwrap_or_else(rand::random);
    info!("seed: {seed}");

    if args.runs > 1 {
        let summary = simulate_many(args.runs, args.teams, seed, &settings, &registry, &config);
        print!("{summary}");
        return Ok(());
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let tournament = simulate(args.teams, settings, &registry, &config, &mut rng)?;
    print!("{tournament}");

    if let Some(path) = &args.save {
        fs::write(path, tournament.to_ron()?)?;
        info!("saved the tournament to {}", path.display());
    }

    Ok(())
}
