//! The registry of asteroid sets and the generation of individual
//! asteroids from them.

use color_eyre::eyre::{self, WrapErr};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{
    bodies::Bodies,
    condition::ProgressTracker,
    config::Options,
    error::{Error, Result},
    frame::Frames,
    kepler::orbits::Orbit,
    random::RandomSource,
    range::ValueRange,
    select::weighted_select,
    sets::{AsteroidSet, Context},
    time::UT,
};

/// A freshly generated asteroid, ready to be placed in the game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Asteroid {
    pub name: String,
    /// Name of the set it was drawn from.
    pub set: String,
    pub class: String,
    pub orbit: Orbit,
    pub discovered: UT,
    /// When the asteroid is lost unless someone tracks it.
    pub expires: UT,
}

/// A stock-style designation such as `XKD-402`.
pub fn designation(rng: &mut RandomSource) -> String {
    let mut s = String::with_capacity(7);
    for _ in 0..3 {
        s.push(char::from(b'A' + rng.int_inclusive(0, 25) as u8));
    }
    s.push('-');
    for _ in 0..3 {
        s.push(char::from(b'0' + rng.int_inclusive(0, 9) as u8));
    }
    s
}

#[derive(Debug)]
pub struct AsteroidManager {
    sets: Vec<Box<dyn AsteroidSet>>,
    frames: Frames,
    default_lifetime: ValueRange,
    rename: bool,
}

impl AsteroidManager {
    pub fn new(frames: Frames, options: &Options) -> Self {
        Self {
            sets: Vec::new(),
            frames,
            default_lifetime: ValueRange::uniform(
                options.min_untracked_days,
                options.max_untracked_days,
            ),
            rename: options.rename_asteroids,
        }
    }

    pub fn frames(&self) -> &Frames {
        &self.frames
    }

    /// Build the context asteroid sets draw in.
    pub fn context<'a>(
        &'a self,
        bodies: &'a dyn Bodies,
        progress: &'a dyn ProgressTracker,
        now: UT,
    ) -> Context<'a> {
        Context {
            bodies,
            frames: &self.frames,
            progress,
            now,
        }
    }

    /// Validate and register a set. A set that fails is not added.
    pub fn add_set(&mut self, mut set: Box<dyn AsteroidSet>, bodies: &dyn Bodies) -> eyre::Result<()> {
        if self.sets.iter().any(|s| s.name() == set.name()) {
            return Err(Error::invalid_operation(format!(
                "duplicate asteroid set name {:?}",
                set.name()
            )))
            .wrap_err("could not load asteroid set");
        }
        set.resolve(bodies, &self.frames, &self.default_lifetime)?;
        debug!(set = set.name(), "loaded asteroid set");
        self.sets.push(set);
        Ok(())
    }

    /// Register every set that loads, logging the ones that don't.
    pub fn add_sets(
        &mut self,
        sets: impl IntoIterator<Item = Box<dyn AsteroidSet>>,
        bodies: &dyn Bodies,
    ) -> usize {
        let mut failed = 0;
        for set in sets {
            let name = set.name().to_owned();
            if let Err(err) = self.add_set(set, bodies) {
                error!(set = %name, "skipping asteroid set: {err:?}");
                failed += 1;
            }
        }
        info!(
            sets = %self.sets.iter().map(|s| s.name()).join(", "),
            failed,
            "asteroid sets loaded"
        );
        failed
    }

    /// Re-evaluate every set after the bodies changed. A set that no
    /// longer resolves keeps all of its previous numbers.
    pub fn refresh(&mut self, bodies: &dyn Bodies) {
        for set in &mut self.sets {
            if let Err(err) = set.resolve(bodies, &self.frames, &self.default_lifetime) {
                error!(set = set.name(), "could not refresh asteroid set: {err:?}");
            }
        }
    }

    pub fn sets(&self) -> impl Iterator<Item = &dyn AsteroidSet> {
        self.sets.iter().map(|s| &**s)
    }

    pub fn get(&self, name: &str) -> Result<&dyn AsteroidSet> {
        self.sets()
            .find(|s| s.name() == name)
            .ok_or_else(|| Error::lookup(format!("unknown asteroid set {name:?}")))
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Combined spawn rate of every set (asteroids per day).
    pub fn total_rate(&self, ctx: &Context<'_>) -> f64 {
        self.sets().map(|s| s.spawn_rate(ctx)).sum()
    }

    /// Pick a set with probability proportional to its spawn rate.
    pub fn draw_set(&self, ctx: &Context<'_>, rng: &mut RandomSource) -> Result<&dyn AsteroidSet> {
        let set = weighted_select(self.sets.iter().map(|s| (s, s.spawn_rate(ctx))), rng)?;
        Ok(set.as_ref())
    }

    /// Generate an asteroid from a randomly chosen set. Failures are
    /// logged and produce nothing, so one broken set never stops the
    /// others from spawning.
    pub fn draw_asteroid(&self, ctx: &Context<'_>, rng: &mut RandomSource) -> Option<Asteroid> {
        let set = match self.draw_set(ctx, rng) {
            Ok(set) => set,
            Err(err) => {
                warn!("no asteroid set can spawn: {err}");
                return None;
            }
        };
        match self.generate(set, ctx, rng) {
            Ok(asteroid) => Some(asteroid),
            Err(err) => {
                error!(set = set.name(), "could not generate asteroid: {err:?}");
                None
            }
        }
    }

    /// Generate an asteroid from a particular set.
    pub fn generate(
        &self,
        set: &dyn AsteroidSet,
        ctx: &Context<'_>,
        rng: &mut RandomSource,
    ) -> eyre::Result<Asteroid> {
        let orbit = set.draw_orbit(ctx, rng)?;
        let class = set.draw_physical_class(rng)?;
        let lifetime = set.draw_tracking_lifetime(rng)?;
        let designation = designation(rng);
        let name = if self.rename {
            format!("{} {designation}", set.title())
        } else {
            format!("Ast. {designation}")
        };
        let expires = ctx.now.checked_add(lifetime).ok_or_else(|| {
            Error::invalid_operation(format!("untracked lifetime of {} runs past the end of time", set.name()))
        })?;
        Ok(Asteroid {
            name,
            set: set.name().to_owned(),
            class,
            orbit,
            discovered: ctx.now,
            expires,
        })
    }
}
