#![warn(clippy::unwrap_used, clippy::pedantic)]
#![allow(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::doc_markdown
)]
use std::{fs, path::Path, path::PathBuf};

use clap::Parser;
use color_eyre::eyre::{self, WrapErr};
use itertools::Itertools;
use kerbroids::{
    config::{AsteroidConfig, SystemConfig},
    spawner,
    time::UT,
};
use serde::de::DeserializeOwned;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod sim;

#[derive(Parser)]
#[command(author, version, about = "Simulate procedural asteroid spawning")]
struct Cli {
    /// Solar system definition (TOML)
    #[arg(long, default_value = "data/kerbol.toml")]
    system: PathBuf,

    /// Asteroid sets and options (TOML)
    #[arg(long, default_value = "data/asteroids.toml")]
    asteroids: PathBuf,

    /// Kerbin days to simulate
    #[arg(long, default_value_t = 100.0)]
    days: f64,

    /// Random seed, overriding the one in the asteroid file
    #[arg(long)]
    seed: Option<u64>,

    /// Bodies the player has already reached (repeatable)
    #[arg(long)]
    reached: Vec<String>,
}

fn load<T: DeserializeOwned>(path: &Path) -> eyre::Result<T> {
    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("could not read {}", path.display()))?;
    toml::from_str(&text).wrap_err_with(|| format!("could not parse {}", path.display()))
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();

    let system = load::<SystemConfig>(&cli.system)?.build()?;
    let mut config: AsteroidConfig = load(&cli.asteroids)?;
    if cli.seed.is_some() {
        config.options.seed = cli.seed;
    }
    let options = config.options.clone();
    let manager = config.into_manager(&system);
    if manager.is_empty() {
        eyre::bail!("no asteroid set could be loaded from {}", cli.asteroids.display());
    }
    let mut spawner = spawner::from_options(&options, manager);

    let mut game = sim::Game::new(system, cli.reached);
    let end = UT::new_days(cli.days);
    let mut now = UT::ZERO;
    while now < end {
        now += spawner.tick(now, &mut game);
    }

    info!(
        spawned = game.spawned,
        lost = game.lost,
        present = game.asteroids.len(),
        "simulation finished at {now}"
    );
    for (set, count) in game.by_set.iter().sorted() {
        println!("{set:>24}: {count}");
    }
    for asteroid in &game.asteroids {
        println!(
            "{} ({}) around {}: a = {:.0} m, e = {:.4}, lost at day {:.1}",
            asteroid.name,
            asteroid.class,
            asteroid.orbit.body,
            asteroid.orbit.sma,
            asteroid.orbit.e,
            asteroid.expires.as_days()
        );
    }
    Ok(())
}
