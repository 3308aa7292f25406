//! Asteroid sets: families of orbits that asteroids are drawn from.

use std::fmt;

use color_eyre::eyre::{self, WrapErr};
use serde::Deserialize;
use time::Duration;

use crate::{
    bodies::Bodies,
    condition::{Condition, ProgressTracker},
    error::Error,
    frame::Frames,
    kepler::orbits::Orbit,
    random::RandomSource,
    range::ValueRange,
    select::weighted_select,
    time::{self as ut, UT},
};

pub mod flyby;
pub mod population;
pub mod stockalike;

pub use flyby::Flyby;
pub use population::Population;
pub use stockalike::{StockalikeDef, StockalikeSet};

/// Everything an asteroid set needs to know about the game when drawing.
#[derive(Copy, Clone)]
pub struct Context<'a> {
    pub bodies: &'a dyn Bodies,
    pub frames: &'a Frames,
    pub progress: &'a dyn ProgressTracker,
    pub now: UT,
}

/// The stock asteroid part, used when a set lists no classes.
pub const DEFAULT_CLASS: &str = "PotatoRoid";

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ClassWeight {
    pub class: String,
    #[serde(default = "one")]
    pub weight: f64,
}

fn one() -> f64 {
    1.0
}

/// Properties shared by every kind of asteroid set.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SetInfo {
    /// Unique identifier.
    pub name: String,
    /// Name shown to players; defaults to `name`.
    #[serde(default)]
    pub title: Option<String>,
    /// Asteroids per Kerbin day.
    pub spawn_rate: f64,
    /// Only spawn while this holds.
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub classes: Vec<ClassWeight>,
    /// How long an asteroid stays visible without being tracked (days).
    #[serde(default)]
    pub untracked_lifetime: Option<ValueRange>,
}

impl SetInfo {
    pub fn new(name: impl Into<String>, spawn_rate: f64) -> Self {
        Self {
            name: name.into(),
            spawn_rate,
            ..Self::default()
        }
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    pub fn spawn_rate(&self, progress: &dyn ProgressTracker) -> f64 {
        match &self.condition {
            Some(cond) if !cond.check(progress) => 0.0,
            _ => self.spawn_rate,
        }
    }

    /// Check and resolve the shared fields. `default_lifetime` is used
    /// when the set has no lifetime of its own.
    pub fn resolve(&mut self, bodies: &dyn Bodies, default_lifetime: &ValueRange) -> eyre::Result<()> {
        if !(self.spawn_rate >= 0.0 && self.spawn_rate.is_finite()) {
            return Err(Error::invalid_operation(format!(
                "spawn rate must be a non-negative number, got {}",
                self.spawn_rate
            )))
            .wrap_err_with(|| format!("asteroid set {} is invalid", self.name));
        }
        if let Some(c) = self.classes.iter().find(|c| !(c.weight >= 0.0)) {
            return Err(Error::invalid_operation(format!(
                "class {} has negative weight {}",
                c.class, c.weight
            )))
            .wrap_err_with(|| format!("asteroid set {} is invalid", self.name));
        }
        let lifetime = self
            .untracked_lifetime
            .get_or_insert_with(|| default_lifetime.clone());
        lifetime
            .resolve(bodies, false)
            .wrap_err_with(|| format!("could not resolve untracked lifetime of {}", self.name))
    }

    pub fn draw_physical_class(&self, rng: &mut RandomSource) -> eyre::Result<String> {
        if self.classes.is_empty() {
            return Ok(DEFAULT_CLASS.to_owned());
        }
        let class = weighted_select(self.classes.iter().map(|c| (&c.class, c.weight)), rng)
            .wrap_err_with(|| format!("could not draw asteroid class for {}", self.name))?;
        Ok(class.clone())
    }

    pub fn draw_tracking_lifetime(&self, rng: &mut RandomSource) -> eyre::Result<Duration> {
        let range = self.untracked_lifetime.as_ref().ok_or_else(|| {
            Error::invalid_operation(format!("{} has no untracked lifetime", self.name))
        })?;
        let days = range.draw_for("untracked lifetime", &self.name, rng)?;
        if days < 0.0 {
            return Err(Error::invalid_operation(format!(
                "negative untracked lifetime {days}"
            )))
            .wrap_err_with(|| format!("could not draw untracked lifetime for {}", self.name));
        }
        ut::checked_days(days)
            .ok_or_else(|| Error::invalid_operation(format!("untracked lifetime {days} days is out of range")))
            .wrap_err_with(|| format!("could not draw untracked lifetime for {}", self.name))
    }
}

/// A family of asteroid orbits.
pub trait AsteroidSet: fmt::Debug {
    fn info(&self) -> &SetInfo;

    /// Check references and evaluate every range against the current
    /// bodies.
    fn resolve(
        &mut self,
        bodies: &dyn Bodies,
        frames: &Frames,
        default_lifetime: &ValueRange,
    ) -> eyre::Result<()>;

    /// Draw a new orbit in the default frame.
    fn draw_orbit(&self, ctx: &Context<'_>, rng: &mut RandomSource) -> eyre::Result<Orbit>;

    fn name(&self) -> &str {
        &self.info().name
    }

    fn title(&self) -> &str {
        self.info().title()
    }

    /// Asteroids per Kerbin day; zero while the set's condition fails.
    fn spawn_rate(&self, ctx: &Context<'_>) -> f64 {
        self.info().spawn_rate(ctx.progress)
    }

    fn draw_physical_class(&self, rng: &mut RandomSource) -> eyre::Result<String> {
        self.info().draw_physical_class(rng)
    }

    fn draw_tracking_lifetime(&self, rng: &mut RandomSource) -> eyre::Result<Duration> {
        self.info().draw_tracking_lifetime(rng)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::condition::NoProgress;

    pub fn context<'a>(bodies: &'a dyn Bodies, frames: &'a Frames, now: UT) -> Context<'a> {
        Context {
            bodies,
            frames,
            progress: &NoProgress,
            now,
        }
    }

    pub fn lifetime() -> ValueRange {
        ValueRange::uniform(1.0, 20.0)
    }
}
