//! Configuration records. Files are read by the caller; everything here
//! only needs `serde::Deserialize`.

use std::{collections::HashMap, sync::Arc};

use color_eyre::eyre::{self, WrapErr};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::{
    bodies::{Bodies, Body, SolarSystem},
    error::Error,
    frame::{FrameDef, Frames, ReferenceFrame},
    kepler::orbits::Orbit,
    manager::AsteroidManager,
    sets::{AsteroidSet, Flyby, Population, StockalikeDef, StockalikeSet},
    time::UT,
};

/// Which scheduler decides when asteroids appear.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpawnerKind {
    /// Poisson arrivals at the combined rate of all sets.
    #[default]
    FixedRate,
    /// The stock game's policy: keep a small group of untracked
    /// asteroids around.
    Stockalike,
}

/// Global options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub spawner: SpawnerKind,
    /// Name asteroids after their set instead of the stock "Ast." prefix.
    pub rename_asteroids: bool,
    /// Untracked lifetime bounds (days) for sets without their own.
    pub min_untracked_days: f64,
    pub max_untracked_days: f64,
    /// Seed for reproducible runs; entropy if absent.
    pub seed: Option<u64>,
    /// Longest wait between fixed-rate checks (`sec`).
    pub check_interval: f64,
    /// Stock group size bounds: a new asteroid can appear while fewer than
    /// a random number in this range are untracked.
    pub min_group: u32,
    pub max_group: u32,
    /// Odds against a spawn on each stock check.
    pub odds_against: u32,
    /// Time between stock checks (`sec`).
    pub spawn_interval: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            spawner: SpawnerKind::FixedRate,
            rename_asteroids: true,
            min_untracked_days: 1.0,
            max_untracked_days: 20.0,
            seed: None,
            check_interval: 60.0,
            min_group: 3,
            max_group: 8,
            odds_against: 2,
            spawn_interval: 15.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FrameConfig {
    pub name: String,
    #[serde(flatten)]
    pub def: FrameDef,
}

/// Everything that describes where asteroids come from.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct AsteroidConfig {
    #[serde(default)]
    pub options: Options,
    #[serde(default, rename = "frame")]
    pub frames: Vec<FrameConfig>,
    #[serde(default, rename = "population")]
    pub populations: Vec<Population>,
    #[serde(default, rename = "flyby")]
    pub flybys: Vec<Flyby>,
    #[serde(default)]
    pub stockalike: Option<StockalikeDef>,
}

impl AsteroidConfig {
    /// Build the named frames. Frames that fail are logged and left out.
    pub fn frames(&self) -> Frames {
        let mut frames = Frames::default();
        for cfg in &self.frames {
            match ReferenceFrame::from_def(cfg.name.clone(), &cfg.def) {
                Ok(frame) => {
                    if frames.insert(frame).is_some() {
                        warn!(frame = %cfg.name, "frame defined twice, keeping the last one");
                    }
                }
                Err(err) => error!(frame = %cfg.name, "skipping reference frame: {err}"),
            }
        }
        frames
    }

    /// Load every set into a manager, skipping (and logging) the ones
    /// that fail validation.
    pub fn into_manager(self, bodies: &dyn Bodies) -> AsteroidManager {
        let mut manager = AsteroidManager::new(self.frames(), &self.options);
        let populations = self
            .populations
            .into_iter()
            .map(|p| Box::new(p) as Box<dyn AsteroidSet>);
        let flybys = self
            .flybys
            .into_iter()
            .map(|f| Box::new(f) as Box<dyn AsteroidSet>);
        let stockalike = self
            .stockalike
            .iter()
            .map(|def| Box::new(StockalikeSet::new(def)) as Box<dyn AsteroidSet>);
        manager.add_sets(populations.chain(flybys).chain(stockalike), bodies);
        manager
    }
}

/// Orbital elements of a body. Angles in degrees.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ElementsConfig {
    pub sma: f64,
    pub ecc: f64,
    pub inc: f64,
    pub lan: f64,
    pub argpe: f64,
    /// Mean anomaly at game start.
    pub mna: f64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct BodyConfig {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    /// Gravitational parameter (`m^3/s^2`).
    pub mu: f64,
    pub radius: f64,
    /// Derived from the orbit if absent.
    #[serde(default)]
    pub soi: Option<f64>,
    /// Sidereal rotation period (`sec`).
    pub rotation_period: f64,
    #[serde(default)]
    pub orbit: Option<ElementsConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SystemConfig {
    #[serde(rename = "body")]
    pub bodies: Vec<BodyConfig>,
}

impl SystemConfig {
    pub fn build(&self) -> eyre::Result<SolarSystem> {
        let dupes = self.bodies.iter().map(|b| b.name.as_str()).duplicates().join(", ");
        if !dupes.is_empty() {
            return Err(Error::invalid_operation(format!("bodies defined twice: {dupes}")))
                .wrap_err("invalid solar system");
        }
        let roots = self.bodies.iter().filter(|b| b.parent.is_none()).collect_vec();
        if roots.len() != 1 {
            return Err(Error::invalid_operation(format!(
                "a solar system needs exactly one body without a parent, found {}",
                roots.iter().map(|b| &b.name).join(", ")
            )))
            .wrap_err("invalid solar system");
        }

        let by_name: HashMap<&str, &BodyConfig> =
            self.bodies.iter().map(|b| (b.name.as_str(), b)).collect();
        let mut bodies = Vec::with_capacity(self.bodies.len());
        for cfg in &self.bodies {
            let body = build_body(cfg, &by_name, &self.bodies)
                .wrap_err_with(|| format!("invalid body {}", cfg.name))?;
            bodies.push(body);
        }
        Ok(SolarSystem::new(bodies))
    }
}

fn build_body(
    cfg: &BodyConfig,
    by_name: &HashMap<&str, &BodyConfig>,
    all: &[BodyConfig],
) -> crate::error::Result<Body> {
    let parent = cfg
        .parent
        .as_deref()
        .map(|p| {
            by_name
                .get(p)
                .copied()
                .ok_or_else(|| Error::lookup(format!("unknown parent body {p:?}")))
        })
        .transpose()?;

    let ephem = match (parent, &cfg.orbit) {
        (None, None) => None,
        (Some(parent), Some(el)) => {
            if !(el.sma > 0.0 && (0.0..1.0).contains(&el.ecc)) {
                return Err(Error::invalid_operation(format!(
                    "bodies need bound orbits, got a = {} m, e = {}",
                    el.sma, el.ecc
                )));
            }
            Some(Orbit {
                sma: el.sma,
                e: el.ecc,
                i: el.inc.to_radians(),
                lan: el.lan.to_radians(),
                argpe: el.argpe.to_radians(),
                mna: el.mna.to_radians(),
                epoch: UT::ZERO,
                body: parent.name.as_str().into(),
            })
        }
        (None, Some(_)) => {
            return Err(Error::invalid_operation("the root body cannot have an orbit"));
        }
        (Some(_), None) => {
            return Err(Error::invalid_operation("an orbit is required around the parent"));
        }
    };

    let soi = match (cfg.soi, parent, &ephem) {
        (Some(soi), _, _) => soi,
        (None, Some(parent), Some(orbit)) => orbit.sma * (cfg.mu / parent.mu).powf(0.4),
        _ => f64::INFINITY,
    };
    let satellites: Arc<[Arc<str>]> = all
        .iter()
        .filter(|b| b.parent.as_deref() == Some(cfg.name.as_str()))
        .map(|b| Arc::from(b.name.as_str()))
        .collect();

    Ok(Body {
        mu: cfg.mu,
        radius: cfg.radius,
        ephem,
        rotperiod: cfg.rotation_period,
        satellites,
        parent: cfg.parent.as_deref().map(Into::into),
        name: cfg.name.as_str().into(),
        is_star: parent.is_none(),
        soi,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::Property;

    const SYSTEM: &str = r#"
        [[body]]
        name = "Sun"
        mu = 1.1723328e18
        radius = 261600000
        rotation_period = 432000

        [[body]]
        name = "Kerbin"
        parent = "Sun"
        mu = 3.5316e12
        radius = 600000
        rotation_period = 21549.425
        orbit = { sma = 13599840256, mna = 180 }

        [[body]]
        name = "Mun"
        parent = "Kerbin"
        mu = 6.5138398e10
        radius = 200000
        soi = 2429559.1
        rotation_period = 138984.38
        orbit = { sma = 12000000, mna = 97.4 }
    "#;

    #[test]
    fn builds_a_solar_system() {
        let cfg: SystemConfig = toml::from_str(SYSTEM).unwrap();
        let sys = cfg.build().unwrap();
        assert_eq!(&*sys.root().unwrap().name, "Sun");
        let kerbin = sys.body("Kerbin").unwrap();
        assert_eq!(&*kerbin.satellites, [Arc::<str>::from("Mun")]);
        // Laplace sphere of influence
        assert!((kerbin.soi - 84_159_286.0).abs() / 84_159_286.0 < 1e-3, "{}", kerbin.soi);
        assert_eq!(sys.body("Mun").unwrap().soi, 2_429_559.1);
        assert!(sys.body("Sun").unwrap().soi.is_infinite());
        let mna = sys.property("Kerbin", Property::MeanAnomalyAtEpoch).unwrap();
        assert!((mna - 180.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_malformed_systems() {
        let mut cfg: SystemConfig = toml::from_str(SYSTEM).unwrap();
        cfg.bodies[2].parent = Some("Kerbal".into());
        let err = cfg.build().unwrap_err();
        assert!(err.to_string().contains("Mun"), "{err}");
        assert!(matches!(Error::root_of(&err), Some(Error::Lookup(_))));

        let mut cfg: SystemConfig = toml::from_str(SYSTEM).unwrap();
        cfg.bodies[1].parent = None;
        cfg.bodies[1].orbit = None;
        assert!(cfg.build().is_err());

        let mut cfg: SystemConfig = toml::from_str(SYSTEM).unwrap();
        cfg.bodies[2].name = "Kerbin".into();
        assert!(cfg.build().is_err());
    }

    #[test]
    fn options_have_defaults() {
        let cfg: AsteroidConfig = toml::from_str(
            r#"
            [options]
            spawner = "stockalike"
            seed = 42
            "#,
        )
        .unwrap();
        assert_eq!(cfg.options.spawner, SpawnerKind::Stockalike);
        assert_eq!(cfg.options.seed, Some(42));
        assert_eq!(cfg.options.max_group, 8);
        assert!(cfg.options.rename_asteroids);
        assert!(cfg.populations.is_empty() && cfg.stockalike.is_none());
    }

    #[test]
    fn loads_sets_and_frames() {
        let system: SystemConfig = toml::from_str(SYSTEM).unwrap();
        let sys = system.build().unwrap();
        let cfg: AsteroidConfig = toml::from_str(
            r#"
            [[frame]]
            name = "tilted"
            type = "angles"
            inc = 15.0

            [[frame]]
            name = "broken"
            type = "vectors"
            normal = [0.0, 0.0, 0.0]
            reference = [1.0, 0.0, 0.0]

            [[population]]
            name = "belt"
            spawn_rate = 1.0
            central_body = "Sun"
            frame = "tilted"
            size = { min = 1e10, max = 2e10 }

            [[population]]
            name = "ghosts"
            spawn_rate = 1.0
            central_body = "Sun"
            frame = "broken"
            size = { min = 1e10, max = 2e10 }

            [[flyby]]
            name = "kerbin-close"
            spawn_rate = 0.2
            target = "Kerbin"
            approach = { type = "periapsis", min = 700000, max = 2000000 }
            speed = { min = 100, max = 300 }
            warning_time = { min = 5, max = 10 }

            [stockalike]
            "#,
        )
        .unwrap();
        let frames = cfg.frames();
        assert_eq!(frames.len(), 1);
        let manager = cfg.into_manager(&sys);
        assert_eq!(
            manager.sets().map(|s| s.name()).collect_vec(),
            ["belt", "kerbin-close", "stockalike"]
        );
    }
}
