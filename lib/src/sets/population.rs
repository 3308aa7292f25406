//! Populations of asteroids on bound orbits around a single body.

use color_eyre::eyre::{self, WrapErr};
use serde::Deserialize;
use tracing::trace;

use super::{AsteroidSet, Context, SetInfo};
use crate::{
    bodies::Bodies,
    error::Error,
    frame::Frames,
    kepler::orbits::{wrap_2pi, Orbit},
    random::RandomSource,
    range::{
        EpochType, PeriapsisRange, PeriapsisType, PhaseRange, PhaseType, SizeRange, SizeType,
        ValueRange,
    },
    time::UT,
};

fn full_circle() -> ValueRange {
    ValueRange::uniform(0.0, 360.0)
}

fn zero() -> ValueRange {
    ValueRange::constant(0.0)
}

fn any_periapsis() -> PeriapsisRange {
    PeriapsisRange {
        range: full_circle(),
        kind: PeriapsisType::Argument,
    }
}

fn any_phase() -> PhaseRange {
    PhaseRange {
        range: full_circle(),
        ..PhaseRange::default()
    }
}

/// Asteroids on stable orbits around `central_body`. Angles are in
/// degrees, the size in metres.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Population {
    #[serde(flatten)]
    pub info: SetInfo,
    pub central_body: String,
    /// Frame the orbital elements are given in; the default frame if
    /// absent.
    #[serde(default)]
    pub frame: Option<String>,
    pub size: SizeRange,
    #[serde(default = "zero")]
    pub eccentricity: ValueRange,
    #[serde(default = "zero")]
    pub inclination: ValueRange,
    #[serde(default = "any_periapsis")]
    pub periapsis: PeriapsisRange,
    #[serde(default = "full_circle")]
    pub ascending_node: ValueRange,
    #[serde(default = "any_phase")]
    pub phase: PhaseRange,
}

impl Population {
    /// A population of circular equatorial orbits with uniformly
    /// distributed semimajor axes; adjust the public fields from there.
    pub fn new(info: SetInfo, central_body: impl Into<String>, size: SizeRange) -> Self {
        Self {
            info,
            central_body: central_body.into(),
            frame: None,
            size,
            eccentricity: zero(),
            inclination: zero(),
            periapsis: any_periapsis(),
            ascending_node: full_circle(),
            phase: any_phase(),
        }
    }

    fn ranges_mut(&mut self) -> [(&'static str, &mut ValueRange, bool); 6] {
        [
            ("size", &mut self.size.range, true),
            ("eccentricity", &mut self.eccentricity, false),
            ("inclination", &mut self.inclination, false),
            ("periapsis", &mut self.periapsis.range, false),
            ("ascending node", &mut self.ascending_node, false),
            ("phase", &mut self.phase.range, false),
        ]
    }
}

impl AsteroidSet for Population {
    fn info(&self) -> &SetInfo {
        &self.info
    }

    fn resolve(
        &mut self,
        bodies: &dyn Bodies,
        frames: &Frames,
        default_lifetime: &ValueRange,
    ) -> eyre::Result<()> {
        // Resolve a copy so a failure leaves every range as it was.
        let mut fresh = self.clone();
        let name = fresh.info.name.clone();
        fresh.info.resolve(bodies, default_lifetime)?;
        bodies
            .body(&fresh.central_body)
            .wrap_err_with(|| format!("asteroid set {name} orbits an unknown body"))?;
        if let Some(frame) = &fresh.frame {
            frames
                .get(frame)
                .wrap_err_with(|| format!("asteroid set {name} uses an unknown frame"))?;
        }
        for (element, range, allow_resonance) in fresh.ranges_mut() {
            range
                .resolve(bodies, allow_resonance)
                .wrap_err_with(|| format!("could not resolve {element} of asteroid set {name}"))?;
        }
        *self = fresh;
        Ok(())
    }

    fn draw_orbit(&self, ctx: &Context<'_>, rng: &mut RandomSource) -> eyre::Result<Orbit> {
        let name = &self.info.name;
        let central = ctx
            .bodies
            .body(&self.central_body)
            .wrap_err_with(|| format!("asteroid set {name} orbits an unknown body"))?;
        let invalid = |msg: String| -> eyre::Result<Orbit> {
            Err(Error::invalid_operation(msg))
                .wrap_err_with(|| format!("could not draw an orbit for asteroid set {name}"))
        };

        let e = self.eccentricity.draw_for("eccentricity", name, rng)?;
        if !(e >= 0.0) {
            return invalid(format!("eccentricity must be non-negative, got {e}"));
        }
        if e == 1.0 {
            return invalid("parabolic orbits are not supported".to_owned());
        }
        let i = self.inclination.draw_for("inclination", name, rng)?;
        let lan = self.ascending_node.draw_for("ascending node", name, rng)?;
        let peri = self.periapsis.range.draw_for("periapsis", name, rng)?;
        let argpe = match self.periapsis.kind {
            PeriapsisType::Argument => peri,
            PeriapsisType::Longitude => peri - lan,
        };

        let size = self.size.range.draw_for("size", name, rng)?;
        let mut sma = match self.size.kind {
            SizeType::SemimajorAxis => size,
            SizeType::Periapsis => size / (1.0 - e),
            SizeType::Apoapsis if e > 1.0 => {
                return invalid(format!("unbound orbit (e = {e}) has no apoapsis"));
            }
            SizeType::Apoapsis => size / (1.0 + e),
        };
        // A hyperbolic periapsis only exists on the branch with a < 0.
        if sma * (1.0 - e) < 0.0 {
            sma = -sma;
        }
        if !(sma.is_finite() && sma != 0.0) {
            return invalid(format!("degenerate semimajor axis {sma}"));
        }

        let phase = self.phase.range.draw_for("phase", name, rng)?;
        let mna = match self.phase.kind {
            PhaseType::MeanAnomaly => phase,
            PhaseType::MeanLongitude => longitude_to_mean_anomaly(phase, i, lan, argpe),
        };
        let epoch = match self.phase.epoch {
            EpochType::GameStart => UT::ZERO,
            EpochType::Now => ctx.now,
        };

        let orbit = Orbit {
            sma,
            e,
            i: i.to_radians(),
            lan: wrap_2pi(lan.to_radians()),
            argpe: wrap_2pi(argpe.to_radians()),
            mna: if e < 1.0 {
                wrap_2pi(mna.to_radians())
            } else {
                mna.to_radians()
            },
            epoch,
            body: central.name.clone(),
        };
        trace!(set = %name, ?orbit, "drew orbit");

        match &self.frame {
            None => Ok(orbit),
            Some(frame) => ctx
                .frames
                .get(frame)
                .and_then(|f| f.orbit_to_default_frame(&orbit, central.mu, ctx.now))
                .wrap_err_with(|| format!("could not draw an orbit for asteroid set {name}")),
        }
    }
}

/// Convert a mean longitude into a mean anomaly (all in degrees).
///
/// The longitude is measured along the reference plane to the node and
/// then along the orbit, so the in-plane part is projected back onto the
/// orbital plane before the argument of periapsis is taken off.
pub fn longitude_to_mean_anomaly(longitude: f64, i: f64, lan: f64, argpe: f64) -> f64 {
    let phi = (longitude - lan).to_radians();
    let cos_i = i.to_radians().cos();
    let (y, x) = if cos_i < 0.0 {
        (-phi.sin(), -cos_i * phi.cos())
    } else {
        (phi.sin(), cos_i * phi.cos())
    };
    let arg_lat = libm::atan2(y, x).to_degrees();
    (arg_lat - argpe).rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bodies::testing::kerbol,
        frame::ReferenceFrame,
        range::RawValue,
        sets::testing::{context, lifetime},
    };

    fn belt(kind: SizeType, size: f64, e: f64) -> Population {
        let mut pop = Population::new(
            SetInfo::new("belt", 1.0),
            "Sun",
            SizeRange {
                range: ValueRange::constant(size),
                kind,
            },
        );
        pop.eccentricity = ValueRange::constant(e);
        pop
    }

    fn draw(pop: &mut Population, frames: &Frames, seed: u64) -> eyre::Result<Orbit> {
        let sys = kerbol();
        pop.resolve(&sys, frames, &lifetime())?;
        let ctx = context(&sys, frames, UT::new_days(100.0));
        pop.draw_orbit(&ctx, &mut RandomSource::seed_from_u64(seed))
    }

    #[test]
    fn size_types_set_the_semimajor_axis() {
        let frames = Frames::default();
        let e = 0.25;
        let q = 1.0e10;
        let by_pe = draw(&mut belt(SizeType::Periapsis, q, e), &frames, 1).unwrap();
        assert!((by_pe.sma - q / (1.0 - e)).abs() < 1e-3);
        assert!((by_pe.periapsis_radius() - q).abs() < 1e-3);

        let big_q = q * (1.0 + e) / (1.0 - e);
        let by_ap = draw(&mut belt(SizeType::Apoapsis, big_q, e), &frames, 1).unwrap();
        assert!((by_ap.sma - big_q / (1.0 + e)).abs() < 1e-3);
        assert!((by_ap.sma - by_pe.sma).abs() < 1e-3);

        let by_a = draw(&mut belt(SizeType::SemimajorAxis, 3.0e9, e), &frames, 1).unwrap();
        assert_eq!(by_a.sma, 3.0e9);
        assert_eq!(&*by_a.body, "Sun");
    }

    #[test]
    fn unbound_populations() {
        let frames = Frames::default();
        let hyp = draw(&mut belt(SizeType::Periapsis, 1.0e10, 1.5), &frames, 2).unwrap();
        assert!(hyp.sma < 0.0);
        assert!((hyp.periapsis_radius() - 1.0e10).abs() < 1e-3);

        let err = draw(&mut belt(SizeType::Apoapsis, 1.0e10, 1.5), &frames, 2).unwrap_err();
        assert!(matches!(
            Error::root_of(&err),
            Some(Error::InvalidOperation(_))
        ));
        let err = draw(&mut belt(SizeType::Periapsis, 1.0e10, -0.1), &frames, 2).unwrap_err();
        assert!(err.to_string().contains("belt"), "{err}");
    }

    #[test]
    fn symbolic_sizes_resolve_against_bodies() {
        let frames = Frames::default();
        let mut pop = belt(SizeType::SemimajorAxis, 0.0, 0.0);
        pop.size.range = ValueRange::uniform("Resonance(Jool, 1:2)", "Resonance(Jool, 1:2)");
        let orbit = draw(&mut pop, &frames, 3).unwrap();
        let sys = kerbol();
        let jool = sys.body("Jool").unwrap().ephem.clone().unwrap();
        let sun = sys.body("Sun").unwrap();
        let ratio = orbit.period(sun.mu) / jool.period(sun.mu);
        // One asteroid orbit per two of Jool's.
        assert!((ratio - 2.0).abs() < 1e-9, "{ratio}");
    }

    #[test]
    fn resonances_only_allowed_in_sizes() {
        let sys = kerbol();
        let mut pop = belt(SizeType::SemimajorAxis, 1.0e10, 0.0);
        pop.inclination = ValueRange::uniform(RawValue::from("Resonance(Jool, 1:2)"), 10.0);
        let err = pop.resolve(&sys, &Frames::default(), &lifetime()).unwrap_err();
        assert!(err.to_string().contains("inclination"), "{err}");
        assert!(matches!(Error::root_of(&err), Some(Error::Parse { .. })));
    }

    #[test]
    fn angles_are_converted_and_wrapped() {
        let frames = Frames::default();
        let mut pop = belt(SizeType::SemimajorAxis, 1.0e10, 0.1);
        pop.inclination = ValueRange::constant(10.0);
        pop.ascending_node = ValueRange::constant(300.0);
        pop.periapsis = PeriapsisRange {
            range: ValueRange::constant(100.0),
            kind: PeriapsisType::Longitude,
        };
        pop.phase = PhaseRange {
            range: ValueRange::constant(45.0),
            kind: PhaseType::MeanAnomaly,
            epoch: EpochType::Now,
        };
        let orbit = draw(&mut pop, &frames, 4).unwrap();
        assert!((orbit.i.to_degrees() - 10.0).abs() < 1e-9);
        assert!((orbit.lan.to_degrees() - 300.0).abs() < 1e-9);
        assert!((orbit.argpe.to_degrees() - 160.0).abs() < 1e-9);
        assert!((orbit.mna.to_degrees() - 45.0).abs() < 1e-9);
        assert_eq!(orbit.epoch, UT::new_days(100.0));
    }

    #[test]
    fn mean_longitude_in_the_plane() {
        // Without inclination the longitude is just lan + argpe + M.
        let m = longitude_to_mean_anomaly(200.0, 0.0, 30.0, 50.0);
        assert!((m - 120.0).abs() < 1e-9);
        // Retrograde orbits count the in-plane angle backwards.
        let m = longitude_to_mean_anomaly(100.0, 180.0, 30.0, 0.0);
        assert!((m - 290.0).abs() < 1e-9, "{m}");
        // At the node the argument of latitude is zero whatever the tilt.
        let m = longitude_to_mean_anomaly(30.0, 60.0, 30.0, 10.0);
        assert!((m - 350.0).abs() < 1e-9);
    }

    #[test]
    fn frames_tilt_the_population() {
        let mut frames = Frames::default();
        frames.insert(ReferenceFrame::from_angles("tilted", 30.0, 0.0, 0.0).unwrap());
        let mut pop = belt(SizeType::SemimajorAxis, 1.0e10, 0.1);
        pop.frame = Some("tilted".into());
        let orbit = draw(&mut pop, &frames, 5).unwrap();
        assert!((orbit.i.to_degrees() - 30.0).abs() < 1e-6);
        assert_eq!(orbit.epoch, UT::new_days(100.0));

        pop.frame = Some("missing".into());
        let err = draw(&mut pop, &frames, 5).unwrap_err();
        assert!(matches!(Error::root_of(&err), Some(Error::Lookup(_))));
    }

    #[test]
    fn deserializes_with_defaults() {
        let pop: Population = toml::from_str(
            r#"
            name = "outer-belt"
            title = "Outer Belt"
            spawn_rate = 0.4
            central_body = "Sun"
            size = { dist = "loguniform", min = "Ratio(Jool.sma, 0.5)", max = "Ratio(Jool.sma, 0.8)" }
            eccentricity = { dist = "rayleigh", avg = 0.05 }
            "#,
        )
        .unwrap();
        assert_eq!(pop.info.title(), "Outer Belt");
        assert_eq!(pop.size.kind, SizeType::SemimajorAxis);
        assert_eq!(pop.inclination, zero());
        assert_eq!(pop.phase.epoch, EpochType::GameStart);

        let sys = kerbol();
        let frames = Frames::default();
        let mut pop = pop;
        pop.resolve(&sys, &frames, &lifetime()).unwrap();
        let ctx = context(&sys, &frames, UT::ZERO);
        let mut rng = RandomSource::seed_from_u64(6);
        for _ in 0..100 {
            let orbit = pop.draw_orbit(&ctx, &mut rng).unwrap();
            assert!(orbit.e >= 0.0 && orbit.e < 1.0);
        }
    }
}
