//! Schedulers that decide when new asteroids appear.

use time::Duration;
use tracing::info;

use crate::{
    bodies::Bodies,
    condition::ProgressTracker,
    config::{Options, SpawnerKind},
    manager::{Asteroid, AsteroidManager},
    random::RandomSource,
    time::UT,
};

pub mod fixed_rate;
pub mod stockalike;

pub use fixed_rate::{FixedRateSpawner, FixedRateState};
pub use stockalike::StockalikeSpawner;

/// Shortest delay a scheduler asks for before its next tick.
pub const MIN_DELAY: Duration = Duration::milliseconds(100);

/// An asteroid nobody is tracking yet.
#[derive(Clone, Debug, PartialEq)]
pub struct Untracked {
    pub name: String,
    pub expires: UT,
}

/// The game the schedulers place asteroids in.
pub trait Host {
    fn bodies(&self) -> &dyn Bodies;

    fn progress(&self) -> &dyn ProgressTracker;

    fn untracked(&self) -> Vec<Untracked>;

    fn spawn(&mut self, asteroid: Asteroid);

    fn despawn(&mut self, name: &str);
}

pub trait Spawner {
    /// Spawn and despawn whatever is due at `now`; returns how long to
    /// wait before the next tick.
    fn tick(&mut self, now: UT, host: &mut dyn Host) -> Duration;

    fn manager(&self) -> &AsteroidManager;
}

/// Remove untracked asteroids whose time is up.
pub fn despawn_expired(now: UT, host: &mut dyn Host) -> usize {
    let expired: Vec<_> = host
        .untracked()
        .into_iter()
        .filter(|a| a.expires <= now)
        .collect();
    for asteroid in &expired {
        info!(asteroid = %asteroid.name, %now, "untracked asteroid lost");
        host.despawn(&asteroid.name);
    }
    expired.len()
}

/// Draw one asteroid and hand it to the host.
fn spawn_one(
    manager: &AsteroidManager,
    rng: &mut RandomSource,
    now: UT,
    host: &mut dyn Host,
) -> bool {
    let asteroid = {
        let ctx = manager.context(host.bodies(), host.progress(), now);
        manager.draw_asteroid(&ctx, rng)
    };
    match asteroid {
        Some(asteroid) => {
            info!(
                asteroid = %asteroid.name,
                set = %asteroid.set,
                around = %asteroid.orbit.body,
                %now,
                "asteroid spawned"
            );
            host.spawn(asteroid);
            true
        }
        None => false,
    }
}

fn total_rate(manager: &AsteroidManager, now: UT, host: &dyn Host) -> f64 {
    manager.total_rate(&manager.context(host.bodies(), host.progress(), now))
}

/// The scheduler selected in `options`.
pub fn from_options(options: &Options, manager: AsteroidManager) -> Box<dyn Spawner> {
    let rng = match options.seed {
        Some(seed) => RandomSource::seed_from_u64(seed),
        None => RandomSource::from_entropy(),
    };
    match options.spawner {
        SpawnerKind::FixedRate => Box::new(FixedRateSpawner::new(manager, rng, options)),
        SpawnerKind::Stockalike => Box::new(StockalikeSpawner::new(manager, rng, options)),
    }
}
