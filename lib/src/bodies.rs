//! Definitions of celestial bodies.

use std::{collections::HashMap, f64::consts, fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    kepler::orbits::Orbit,
};

/// A celestial body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Standard gravitational parameter (`m^3/s^2`)
    pub mu: f64,
    /// Mean radius of the body's sphere (`m`)
    pub radius: f64,
    /// Orbit around the parent body, absent for the root star
    pub ephem: Option<Orbit>,
    /// Rotational period, length of sidereal day (`sec`)
    pub rotperiod: f64,
    /// A list of names of bodies orbiting this body.
    pub satellites: Arc<[Arc<str>]>,
    /// The name of the parent body of this body, if any.
    pub parent: Option<Arc<str>>,
    /// Name of this body as displayed in KSP
    pub name: Arc<str>,
    /// Is this a star?
    pub is_star: bool,
    /// Radius of this body's sphere of influence (`m`), infinite for
    /// the root star
    pub soi: f64,
}

/// A numeric body property that value expressions may refer to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    Radius,
    SphereOfInfluence,
    SemimajorAxis,
    Eccentricity,
    Inclination,
    ArgPeriapsis,
    LongPeriapsis,
    AscendingNode,
    MeanAnomalyAtEpoch,
    MeanLongitudeAtEpoch,
    RotationPeriod,
    SolarDay,
    Period,
    Apoapsis,
    Periapsis,
    EscapeSpeed,
    OrbitalSpeed,
    ApoapsisSpeed,
    PeriapsisSpeed,
}

impl Property {
    pub const ALL: [Property; 19] = [
        Property::Radius,
        Property::SphereOfInfluence,
        Property::SemimajorAxis,
        Property::Eccentricity,
        Property::Inclination,
        Property::ArgPeriapsis,
        Property::LongPeriapsis,
        Property::AscendingNode,
        Property::MeanAnomalyAtEpoch,
        Property::MeanLongitudeAtEpoch,
        Property::RotationPeriod,
        Property::SolarDay,
        Property::Period,
        Property::Apoapsis,
        Property::Periapsis,
        Property::EscapeSpeed,
        Property::OrbitalSpeed,
        Property::ApoapsisSpeed,
        Property::PeriapsisSpeed,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Property::Radius => "rad",
            Property::SphereOfInfluence => "soi",
            Property::SemimajorAxis => "sma",
            Property::Eccentricity => "ecc",
            Property::Inclination => "inc",
            Property::ArgPeriapsis => "ape",
            Property::LongPeriapsis => "lpe",
            Property::AscendingNode => "lan",
            Property::MeanAnomalyAtEpoch => "mna0",
            Property::MeanLongitudeAtEpoch => "mnl0",
            Property::RotationPeriod => "prot",
            Property::SolarDay => "psol",
            Property::Period => "per",
            Property::Apoapsis => "apo",
            Property::Periapsis => "peri",
            Property::EscapeSpeed => "vesc",
            Property::OrbitalSpeed => "vorb",
            Property::ApoapsisSpeed => "vmin",
            Property::PeriapsisSpeed => "vmax",
        }
    }
}

impl FromStr for Property {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim();
        Property::ALL
            .into_iter()
            .find(|p| p.key().eq_ignore_ascii_case(key))
            .ok_or_else(|| Error::lookup(format!("unknown body property {key:?}")))
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Read-only access to the celestial bodies of the game.
pub trait Bodies {
    fn get(&self, name: &str) -> Option<&Body>;

    fn body(&self, name: &str) -> Result<&Body> {
        self.get(name)
            .ok_or_else(|| Error::lookup(format!("unknown body {name:?}")))
    }

    fn parent_of(&self, body: &Body) -> Result<Option<&Body>> {
        body.parent.as_deref().map(|p| self.body(p)).transpose()
    }

    /// Look up a numeric property of a body. Angles are in degrees,
    /// distances in metres, times in seconds and speeds in m/s.
    fn property(&self, name: &str, prop: Property) -> Result<f64> {
        let body = self.body(name)?;
        let elements = || -> Result<(&Orbit, f64)> {
            let undefined = || Error::lookup(format!("{name} has no orbit, so {prop} is undefined"));
            let orbit = body.ephem.as_ref().ok_or_else(undefined)?;
            let parent = self.parent_of(body)?.ok_or_else(undefined)?;
            Ok((orbit, parent.mu))
        };
        Ok(match prop {
            Property::Radius => body.radius,
            Property::SphereOfInfluence => body.soi,
            Property::RotationPeriod => body.rotperiod,
            Property::EscapeSpeed => libm::sqrt(2.0 * body.mu / body.radius),
            Property::SolarDay => solar_day(self, body)?,
            Property::SemimajorAxis => elements()?.0.sma,
            Property::Eccentricity => elements()?.0.e,
            Property::Inclination => elements()?.0.i.to_degrees(),
            Property::ArgPeriapsis => elements()?.0.argpe.to_degrees(),
            Property::LongPeriapsis => {
                let (orbit, _) = elements()?;
                (orbit.argpe + orbit.lan).to_degrees()
            }
            Property::AscendingNode => elements()?.0.lan.to_degrees(),
            Property::MeanAnomalyAtEpoch => elements()?.0.mna.to_degrees(),
            Property::MeanLongitudeAtEpoch => {
                let (orbit, _) = elements()?;
                (orbit.mna + orbit.argpe + orbit.lan).to_degrees()
            }
            Property::Period => {
                let (orbit, mu) = elements()?;
                orbit.period(mu)
            }
            Property::Apoapsis => elements()?.0.apoapsis_radius(),
            Property::Periapsis => elements()?.0.periapsis_radius(),
            Property::OrbitalSpeed => {
                let (orbit, mu) = elements()?;
                2.0 * consts::PI * orbit.sma / orbit.period(mu)
            }
            Property::ApoapsisSpeed => {
                let (orbit, mu) = elements()?;
                vis_viva(mu, orbit.apoapsis_radius(), orbit.sma)
            }
            Property::PeriapsisSpeed => {
                let (orbit, mu) = elements()?;
                vis_viva(mu, orbit.periapsis_radius(), orbit.sma)
            }
        })
    }
}

fn vis_viva(mu: f64, r: f64, sma: f64) -> f64 {
    libm::sqrt(mu * (2.0 / r - 1.0 / sma))
}

/// Length of a solar day: the rotation relative to the star the body
/// (or its planet) orbits.
fn solar_day<B: Bodies + ?Sized>(bodies: &B, body: &Body) -> Result<f64> {
    let mut planet = body;
    loop {
        let Some(parent) = bodies.parent_of(planet)? else {
            return Err(Error::lookup(format!(
                "{} does not orbit a star, so psol is undefined",
                body.name
            )));
        };
        if parent.is_star {
            break;
        }
        planet = parent;
    }
    let star = bodies.body(planet.parent.as_deref().unwrap_or_default())?;
    let year = planet
        .ephem
        .as_ref()
        .map(|o| o.period(star.mu))
        .ok_or_else(|| Error::lookup(format!("{} has no orbit", planet.name)))?;
    let rate = 1.0 / body.rotperiod - 1.0 / year;
    if rate.abs() < 1e-12 {
        return Err(Error::lookup(format!(
            "{} is tidally locked, so psol is undefined",
            body.name
        )));
    }
    Ok(1.0 / rate)
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SolarSystem {
    pub bodies: HashMap<Arc<str>, Arc<Body>>,
}

impl SolarSystem {
    pub fn new(bodies: impl IntoIterator<Item = Body>) -> Self {
        Self {
            bodies: bodies
                .into_iter()
                .map(|b| (b.name.clone(), Arc::new(b)))
                .collect(),
        }
    }

    /// The body with no parent.
    pub fn root(&self) -> Option<&Body> {
        self.bodies
            .values()
            .find(|b| b.parent.is_none())
            .map(Arc::as_ref)
    }
}

impl Bodies for SolarSystem {
    fn get(&self, name: &str) -> Option<&Body> {
        self.bodies.get(name).map(Arc::as_ref)
    }
}
