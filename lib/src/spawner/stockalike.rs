//! The stock game's spawning policy: keep a small, random number of
//! untracked asteroids in the sky.

use time::Duration;
use tracing::trace;

use super::{despawn_expired, spawn_one, Host, Spawner, MIN_DELAY};
use crate::{config::Options, manager::AsteroidManager, random::RandomSource, time::UT};

#[derive(Debug)]
pub struct StockalikeSpawner {
    manager: AsteroidManager,
    rng: RandomSource,
    min_group: u32,
    max_group: u32,
    odds_against: u32,
    interval: Duration,
}

impl StockalikeSpawner {
    pub fn new(manager: AsteroidManager, rng: RandomSource, options: &Options) -> Self {
        Self {
            manager,
            rng,
            min_group: options.min_group.min(options.max_group),
            max_group: options.max_group.max(options.min_group),
            odds_against: options.odds_against,
            interval: Duration::seconds_f64(options.spawn_interval).max(MIN_DELAY),
        }
    }
}

impl Spawner for StockalikeSpawner {
    fn tick(&mut self, now: UT, host: &mut dyn Host) -> Duration {
        despawn_expired(now, host);

        let untracked = host.untracked().len();
        let limit = self.rng.int_inclusive(self.min_group, self.max_group) as usize;
        let roll = self.rng.uniform();
        let odds = 1.0 / (1.0 + f64::from(self.odds_against));
        trace!(untracked, limit, roll, "stock spawn check");
        if untracked < limit && roll < odds {
            spawn_one(&self.manager, &mut self.rng, now, host);
        }
        self.interval
    }

    fn manager(&self) -> &AsteroidManager {
        &self.manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bodies::testing::kerbol, frame::Frames, manager::testing::belt,
        spawner::testing::MemoryHost,
    };

    fn spawner(options: &Options) -> (StockalikeSpawner, MemoryHost) {
        let sys = kerbol();
        let mut manager = AsteroidManager::new(Frames::default(), options);
        manager.add_sets([belt("belt", 1.0)], &sys);
        (
            StockalikeSpawner::new(manager, RandomSource::seed_from_u64(77), options),
            MemoryHost::new(sys),
        )
    }

    #[test]
    fn group_size_is_capped() {
        let opts = Options {
            min_untracked_days: 1000.0,
            max_untracked_days: 1000.0,
            ..Options::default()
        };
        let (mut spawner, mut host) = spawner(&opts);
        let mut now = UT::ZERO;
        for _ in 0..2000 {
            let delay = spawner.tick(now, &mut host);
            assert_eq!(delay, Duration::seconds(15));
            now += delay;
            assert!(host.asteroids.len() <= 8);
        }
        // With nothing expiring the group fills up to at least the minimum.
        assert!(host.asteroids.len() >= 3);
    }

    #[test]
    fn odds_thin_out_spawns() {
        let opts = Options {
            min_group: 10_000,
            max_group: 10_000,
            odds_against: 3,
            ..Options::default()
        };
        let (mut spawner, mut host) = spawner(&opts);
        let n = 4000;
        for _ in 0..n {
            spawner.tick(UT::ZERO, &mut host);
        }
        let frac = host.asteroids.len() as f64 / f64::from(n);
        assert!((frac - 0.25).abs() < 0.03, "{frac}");
    }

    #[test]
    fn expired_asteroids_make_room() {
        let (mut spawner, mut host) = spawner(&Options::default());
        let mut now = UT::ZERO;
        for _ in 0..500 {
            now += spawner.tick(now, &mut host);
        }
        assert!(!host.asteroids.is_empty());
        spawner.tick(now + crate::time::days(25.0), &mut host);
        assert!(host.asteroids.len() <= 1);
        assert!(!host.despawned.is_empty());
    }
}
