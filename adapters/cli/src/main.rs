#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a headless civsim game and prints the standings.

use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use civsim_cli::{load_ruleset, CivReport, Game, GameConfig};
use civsim_core::CivId;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless civilization simulation")]
struct Cli {
    /// Number of full rounds to play.
    #[arg(long, default_value_t = 100)]
    rounds: u32,
    /// Seed for the map generator and the autoplayer.
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Map width in tiles.
    #[arg(long, default_value_t = 48)]
    width: i32,
    /// Map height in tiles.
    #[arg(long, default_value_t = 32)]
    height: i32,
    /// Number of nations taken from the rule set.
    #[arg(long, default_value_t = 3)]
    civs: usize,
    /// Rule set to load instead of the built-in one.
    #[arg(long)]
    rules: Option<PathBuf>,
    /// Civilization whose cities and research are traced at debug level.
    #[arg(long)]
    debug_civ: Option<u32>,
    /// Print every message as a JSON line while playing.
    #[arg(long)]
    messages: bool,
    /// Print the final standings as JSON.
    #[arg(long)]
    json: bool,
}

/// Entry point for the civsim command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    ensure!(
        cli.width > 0 && cli.height > 0,
        "map dimensions must be positive"
    );

    let ruleset = load_ruleset(cli.rules.as_deref())?;
    let config = GameConfig {
        width: cli.width,
        height: cli.height,
        seed: cli.seed,
        civs: cli.civs,
        debug_civ: cli.debug_civ.map(CivId::new),
    };
    let mut game = Game::new(&config, ruleset).context("failed to set up the game")?;

    while game.round_number() <= cli.rounds {
        if game.play_turn().is_none() {
            break;
        }
        for line in game.drain_messages() {
            if cli.messages {
                println!("{}", serde_json::to_string(&line)?);
            }
        }
    }

    let standings = game.report();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&standings)?);
    } else {
        print_standings(&standings);
    }
    Ok(())
}

fn print_standings(standings: &[CivReport]) {
    for civ in standings {
        let status = if civ.eliminated { " (eliminated)" } else { "" };
        println!(
            "{}{}: {} points, {} cities, {} gold, {} advances",
            civ.name, status, civ.points, civ.cities, civ.gold, civ.advances
        );
        for (unit, built) in &civ.built {
            let lost = civ.lost.get(unit).copied().unwrap_or(0);
            println!("  {unit}: built {built}, lost {lost}");
        }
    }
}
