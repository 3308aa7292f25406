//! Poisson arrivals at the combined rate of every asteroid set.

use serde::{Deserialize, Serialize};
use time::Duration;
use tracing::{debug, warn};

use super::{despawn_expired, spawn_one, total_rate, Host, Spawner, MIN_DELAY};
use crate::{
    config::Options,
    distribution::exponential,
    manager::AsteroidManager,
    random::RandomSource,
    time::{self as ut, UT},
};

/// What a fixed-rate scheduler needs to carry across save games.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FixedRateState {
    /// When the next asteroid is due; `None` while nothing can spawn.
    pub next_arrival: Option<UT>,
}

#[derive(Debug)]
pub struct FixedRateSpawner {
    manager: AsteroidManager,
    rng: RandomSource,
    state: FixedRateState,
    check_interval: Duration,
}

impl FixedRateSpawner {
    pub fn new(manager: AsteroidManager, rng: RandomSource, options: &Options) -> Self {
        Self {
            manager,
            rng,
            state: FixedRateState::default(),
            check_interval: Duration::seconds_f64(options.check_interval).max(MIN_DELAY),
        }
    }

    pub fn state(&self) -> &FixedRateState {
        &self.state
    }

    /// Resume from a saved schedule.
    pub fn restore(&mut self, state: FixedRateState) {
        self.state = state;
    }

    /// Arrival after `from` for a process with `rate` arrivals per day,
    /// or `None` if it would never come.
    fn arrival_after(&mut self, from: UT, rate: f64) -> Option<UT> {
        let days = match exponential(&mut self.rng, 1.0 / rate) {
            Ok(days) => days,
            Err(err) => {
                warn!("could not schedule the next asteroid: {err}");
                return None;
            }
        };
        let next = ut::checked_days(days).and_then(|dt| from.checked_add(dt));
        if next.is_none() {
            warn!(rate, days, "next asteroid is too far in the future to schedule");
        }
        next
    }
}

impl Spawner for FixedRateSpawner {
    fn tick(&mut self, now: UT, host: &mut dyn Host) -> Duration {
        despawn_expired(now, host);

        while let Some(next) = self.state.next_arrival.filter(|&t| now > t) {
            let rate = total_rate(&self.manager, now, host);
            if rate <= 0.0 {
                self.state.next_arrival = None;
                break;
            }
            spawn_one(&self.manager, &mut self.rng, now, host);
            self.state.next_arrival = self.arrival_after(next, rate);
        }

        if self.state.next_arrival.is_none() {
            let rate = total_rate(&self.manager, now, host);
            if rate > 0.0 {
                self.state.next_arrival = self.arrival_after(now, rate);
                debug!(rate, next = ?self.state.next_arrival, "scheduled next asteroid");
            }
        }

        match self.state.next_arrival {
            Some(next) => (next - now).clamp(MIN_DELAY, self.check_interval),
            None => self.check_interval,
        }
    }

    fn manager(&self) -> &AsteroidManager {
        &self.manager
    }
}
