//! A stand-in for the game: it only remembers which asteroids exist.

use std::collections::{HashMap, HashSet};

use kerbroids::{
    bodies::{Bodies, SolarSystem},
    condition::{Milestone, ProgressTracker},
    manager::Asteroid,
    spawner::{Host, Untracked},
};

struct Progress {
    reached: HashSet<String>,
}

impl ProgressTracker for Progress {
    fn achieved(&self, body: &str, milestone: Milestone) -> bool {
        milestone == Milestone::Reached && self.reached.contains(body)
    }

    fn vessels_at(&self, _body: &str) -> usize {
        0
    }
}

pub struct Game {
    system: SolarSystem,
    progress: Progress,
    pub asteroids: Vec<Asteroid>,
    pub by_set: HashMap<String, usize>,
    pub spawned: usize,
    pub lost: usize,
}

impl Game {
    pub fn new(system: SolarSystem, reached: impl IntoIterator<Item = String>) -> Self {
        Self {
            system,
            progress: Progress {
                reached: reached.into_iter().collect(),
            },
            asteroids: Vec::new(),
            by_set: HashMap::new(),
            spawned: 0,
            lost: 0,
        }
    }
}

impl Host for Game {
    fn bodies(&self) -> &dyn Bodies {
        &self.system
    }

    fn progress(&self) -> &dyn ProgressTracker {
        &self.progress
    }

    fn untracked(&self) -> Vec<Untracked> {
        self.asteroids
            .iter()
            .map(|a| Untracked {
                name: a.name.clone(),
                expires: a.expires,
            })
            .collect()
    }

    fn spawn(&mut self, asteroid: Asteroid) {
        self.spawned += 1;
        *self.by_set.entry(asteroid.set.clone()).or_default() += 1;
        self.asteroids.push(asteroid);
    }

    fn despawn(&mut self, name: &str) {
        if let Some(i) = self.asteroids.iter().position(|a| a.name == name) {
            self.asteroids.remove(i);
            self.lost += 1;
        }
    }
}
