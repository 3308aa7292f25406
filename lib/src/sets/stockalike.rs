//! The stock game's asteroids: a single family of home-planet intercepts.

use color_eyre::eyre;
use serde::Deserialize;

use super::{AsteroidSet, Context, Flyby, SetInfo};
use crate::{
    bodies::Bodies,
    frame::Frames,
    kepler::orbits::Orbit,
    random::RandomSource,
    range::{ApproachRange, ApproachType, ValueRange},
};

fn default_name() -> String {
    "stockalike".to_owned()
}

fn default_title() -> String {
    "Ast.".to_owned()
}

fn default_target() -> String {
    "Kerbin".to_owned()
}

fn default_spawn_rate() -> f64 {
    1.0
}

fn default_max_impact() -> f64 {
    0.1
}

fn default_min_speed() -> f64 {
    200.0
}

fn default_max_speed() -> f64 {
    500.0
}

fn default_min_warning() -> f64 {
    12.0
}

fn default_max_warning() -> f64 {
    40.0
}

/// Configuration of the stock-like set. Everything has a default.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct StockalikeDef {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default = "default_spawn_rate")]
    pub spawn_rate: f64,
    /// Largest impact parameter, as a fraction of the target's SOI.
    #[serde(default = "default_max_impact")]
    pub max_impact: f64,
    /// Excess speed bounds (m/s).
    #[serde(default = "default_min_speed")]
    pub min_speed: f64,
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
    /// Warning time bounds (days).
    #[serde(default = "default_min_warning")]
    pub min_warning: f64,
    #[serde(default = "default_max_warning")]
    pub max_warning: f64,
}

impl Default for StockalikeDef {
    fn default() -> Self {
        Self {
            name: default_name(),
            title: default_title(),
            target: default_target(),
            spawn_rate: default_spawn_rate(),
            max_impact: default_max_impact(),
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
            min_warning: default_min_warning(),
            max_warning: default_max_warning(),
        }
    }
}

/// Uniformly distributed intercepts of a single target.
#[derive(Clone, Debug, PartialEq)]
pub struct StockalikeSet {
    flyby: Flyby,
}

impl StockalikeSet {
    pub fn new(def: &StockalikeDef) -> Self {
        let mut info = SetInfo::new(def.name.clone(), def.spawn_rate);
        info.title = Some(def.title.clone());
        Self {
            flyby: Flyby {
                info,
                target: def.target.clone(),
                approach: ApproachRange {
                    range: ValueRange::uniform(
                        0.0,
                        format!("Ratio({}.soi, {})", def.target, def.max_impact),
                    ),
                    kind: ApproachType::ImpactParameter,
                },
                speed: ValueRange::uniform(def.min_speed, def.max_speed),
                warning_time: ValueRange::uniform(def.min_warning, def.max_warning),
            },
        }
    }

    pub fn target(&self) -> &str {
        &self.flyby.target
    }
}

impl AsteroidSet for StockalikeSet {
    fn info(&self) -> &SetInfo {
        &self.flyby.info
    }

    fn resolve(
        &mut self,
        bodies: &dyn Bodies,
        frames: &Frames,
        default_lifetime: &ValueRange,
    ) -> eyre::Result<()> {
        self.flyby.resolve(bodies, frames, default_lifetime)
    }

    fn draw_orbit(&self, ctx: &Context<'_>, rng: &mut RandomSource) -> eyre::Result<Orbit> {
        self.flyby.draw_orbit(ctx, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bodies::testing::kerbol,
        sets::testing::{context, lifetime},
        time::{self, UT},
    };

    #[test]
    fn defaults_target_kerbin() {
        let def: StockalikeDef = toml::from_str("max_warning = 20.0").unwrap();
        assert_eq!(def.max_warning, 20.0);
        assert_eq!(def.min_warning, 12.0);
        let set = StockalikeSet::new(&def);
        assert_eq!(set.target(), "Kerbin");
        assert_eq!(set.title(), "Ast.");
        assert_eq!(set.name(), "stockalike");
    }

    #[test]
    fn draws_kerbin_intercepts() {
        let sys = kerbol();
        let frames = Frames::default();
        let mut set = StockalikeSet::new(&StockalikeDef::default());
        set.resolve(&sys, &frames, &lifetime()).unwrap();
        let now = UT::new_days(7.0);
        let ctx = context(&sys, &frames, now);
        let mut rng = RandomSource::seed_from_u64(21);
        let sun = sys.body("Sun").unwrap();
        let kerbin = sys.body("Kerbin").unwrap();
        for _ in 0..20 {
            let orbit = set.draw_orbit(&ctx, &mut rng).unwrap();
            // Twelve days out is far beyond Kerbin's SOI.
            assert_eq!(&*orbit.body, "Sun");
            let r = orbit.position_at(now, sun.mu).unwrap();
            let planet = kerbin
                .ephem
                .as_ref()
                .unwrap()
                .position_at(now, sun.mu)
                .unwrap();
            assert!((r - planet).norm() > kerbin.soi);
            assert!(orbit.epoch <= now + time::days(40.0));
        }
    }
}
