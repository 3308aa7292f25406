//! Asteroids on hyperbolic intercept trajectories.

use std::f64::consts;

use color_eyre::eyre::{self, WrapErr};
use serde::Deserialize;
use tracing::trace;

use super::{AsteroidSet, Context, SetInfo};
use crate::{
    bodies::Bodies,
    distribution::isotropic,
    error::Error,
    frame::Frames,
    kepler::{orbits::Orbit, patch::patch_to_soi},
    random::RandomSource,
    range::{ApproachRange, ApproachType, ValueRange},
    time,
};

/// Asteroids that pass close to `target`.
///
/// The approach distance is in metres, the excess speed (speed at
/// infinity relative to the target) in m/s, and the warning time (how
/// long until closest approach) in Kerbin days.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Flyby {
    #[serde(flatten)]
    pub info: SetInfo,
    pub target: String,
    pub approach: ApproachRange,
    pub speed: ValueRange,
    pub warning_time: ValueRange,
}

impl Flyby {
    fn ranges_mut(&mut self) -> [(&'static str, &mut ValueRange); 3] {
        [
            ("approach", &mut self.approach.range),
            ("speed", &mut self.speed),
            ("warning time", &mut self.warning_time),
        ]
    }
}

impl AsteroidSet for Flyby {
    fn info(&self) -> &SetInfo {
        &self.info
    }

    fn resolve(
        &mut self,
        bodies: &dyn Bodies,
        _frames: &Frames,
        default_lifetime: &ValueRange,
    ) -> eyre::Result<()> {
        let mut fresh = self.clone();
        let name = fresh.info.name.clone();
        fresh.info.resolve(bodies, default_lifetime)?;
        bodies
            .body(&fresh.target)
            .wrap_err_with(|| format!("asteroid set {name} targets an unknown body"))?;
        for (element, range) in fresh.ranges_mut() {
            range
                .resolve(bodies, false)
                .wrap_err_with(|| format!("could not resolve {element} of asteroid set {name}"))?;
        }
        *self = fresh;
        Ok(())
    }

    fn draw_orbit(&self, ctx: &Context<'_>, rng: &mut RandomSource) -> eyre::Result<Orbit> {
        let name = &self.info.name;
        let context = || format!("could not draw an orbit for asteroid set {name}");
        let target = ctx
            .bodies
            .body(&self.target)
            .wrap_err_with(|| format!("asteroid set {name} targets an unknown body"))?;

        let vinf = self.speed.draw_for("speed", name, rng)?;
        if !(vinf > 0.0) {
            return Err(Error::invalid_operation(format!(
                "excess speed must be positive, got {vinf}"
            )))
            .wrap_err_with(context);
        }
        let warning = self.warning_time.draw_for("warning time", name, rng)?;
        let approach = self.approach.range.draw_for("approach", name, rng)?;

        let sma = -target.mu / vinf.powi(2);
        let periapsis = match self.approach.kind {
            // Impact parameter b and periapsis q satisfy b^2 = q^2 - 2aq.
            ApproachType::ImpactParameter => sma * (1.0 - libm::sqrt((approach / sma).powi(2) + 1.0)),
            ApproachType::Periapsis => approach,
        };
        if !(periapsis > 0.0) {
            return Err(Error::invalid_operation(format!(
                "closest approach must be above the center of {}, got periapsis {periapsis} m",
                target.name
            )))
            .wrap_err_with(context);
        }

        let epoch = time::checked_days(warning)
            .and_then(|dt| ctx.now.checked_add(dt))
            .ok_or_else(|| Error::invalid_operation(format!("warning time {warning} days is out of range")))
            .wrap_err_with(context)?;

        let orbit = Orbit {
            sma,
            e: 1.0 - periapsis / sma,
            i: isotropic(rng).to_radians(),
            lan: rng.uniform_range(0.0, 2.0 * consts::PI),
            argpe: rng.uniform_range(0.0, 2.0 * consts::PI),
            mna: 0.0,
            epoch,
            body: target.name.clone(),
        };
        trace!(set = %name, ?orbit, "drew flyby");
        patch_to_soi(orbit, ctx.bodies, ctx.now).wrap_err_with(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bodies::testing::kerbol,
        sets::testing::{context, lifetime},
        time::UT,
    };

    fn kerbin_flyby(approach: ApproachRange, warning: f64) -> Flyby {
        Flyby {
            info: SetInfo::new("kerbin-flybys", 1.0),
            target: "Kerbin".into(),
            approach,
            speed: ValueRange::uniform(200.0, 700.0),
            warning_time: ValueRange::constant(warning),
        }
    }

    fn periapsis(q: f64) -> ApproachRange {
        ApproachRange {
            range: ValueRange::constant(q),
            kind: ApproachType::Periapsis,
        }
    }

    #[test]
    fn periapsis_approach_sets_closest_distance() {
        let sys = kerbol();
        let frames = Frames::default();
        let mut flyby = kerbin_flyby(periapsis(1.0e6), 0.01);
        flyby.resolve(&sys, &frames, &lifetime()).unwrap();
        let now = UT::new_days(3.0);
        let ctx = context(&sys, &frames, now);
        let mut rng = RandomSource::seed_from_u64(11);
        for _ in 0..20 {
            // Too close to have left Kerbin's SOI yet.
            let orbit = flyby.draw_orbit(&ctx, &mut rng).unwrap();
            assert_eq!(&*orbit.body, "Kerbin");
            assert!(orbit.is_hyperbolic());
            assert!((orbit.periapsis_radius() - 1.0e6).abs() < 1e-3);
            assert_eq!(orbit.epoch, now + time::days(0.01));
            let vinf = libm::sqrt(-sys.body("Kerbin").unwrap().mu / orbit.sma);
            assert!(vinf > 200.0 - 1e-6 && vinf < 700.0 + 1e-6, "{vinf}");
        }
    }

    #[test]
    fn impact_parameter_is_converted() {
        let sys = kerbol();
        let frames = Frames::default();
        let b = 5.0e6;
        let mut flyby = kerbin_flyby(
            ApproachRange {
                range: ValueRange::constant(b),
                kind: ApproachType::ImpactParameter,
            },
            0.0,
        );
        flyby.speed = ValueRange::constant(500.0);
        flyby.resolve(&sys, &frames, &lifetime()).unwrap();
        let ctx = context(&sys, &frames, UT::ZERO);
        let orbit = flyby
            .draw_orbit(&ctx, &mut RandomSource::seed_from_u64(1))
            .unwrap();
        let q = orbit.periapsis_radius();
        let a = orbit.sma;
        assert!((q * q - 2.0 * a * q - b * b).abs() / (b * b) < 1e-9);
        // Gravitational focusing pulls the periapsis inside b.
        assert!(q < b);
    }

    #[test]
    fn distant_flybys_start_in_the_parent_soi() {
        let sys = kerbol();
        let frames = Frames::default();
        let mut flyby = kerbin_flyby(periapsis(2.0e6), 30.0);
        flyby.resolve(&sys, &frames, &lifetime()).unwrap();
        let now = UT::new_days(50.0);
        let ctx = context(&sys, &frames, now);
        let mut rng = RandomSource::seed_from_u64(12);
        for _ in 0..10 {
            let orbit = flyby.draw_orbit(&ctx, &mut rng).unwrap();
            assert_eq!(&*orbit.body, "Sun");
            let sun = sys.body("Sun").unwrap();
            let kerbin = sys.body("Kerbin").unwrap();
            let r = orbit.position_at(now, sun.mu).unwrap();
            let planet = kerbin.ephem.as_ref().unwrap().position_at(now, sun.mu).unwrap();
            assert!((r - planet).norm() > kerbin.soi);
        }
    }

    #[test]
    fn fast_flybys_are_patched_to_the_sun() {
        let sys = kerbol();
        let frames = Frames::default();
        let mut flyby = kerbin_flyby(periapsis(1.0e6), 5.0);
        flyby.speed = ValueRange::constant(5000.0);
        flyby.resolve(&sys, &frames, &lifetime()).unwrap();
        let now = UT::ZERO;
        let ctx = context(&sys, &frames, now);
        let mut rng = RandomSource::seed_from_u64(14);
        for _ in 0..5 {
            let orbit = flyby.draw_orbit(&ctx, &mut rng).unwrap();
            assert_eq!(&*orbit.body, "Sun");
            let sun = sys.body("Sun").unwrap();
            let kerbin = sys.body("Kerbin").unwrap();
            let r = orbit.position_at(now, sun.mu).unwrap();
            let planet = kerbin.ephem.as_ref().unwrap().position_at(now, sun.mu).unwrap();
            assert!((r - planet).norm() > kerbin.soi);
        }
    }

    #[test]
    fn absurd_warning_times_fail_the_draw() {
        let sys = kerbol();
        let frames = Frames::default();
        let mut flyby = kerbin_flyby(periapsis(1.0e6), 1e300);
        flyby.resolve(&sys, &frames, &lifetime()).unwrap();
        let ctx = context(&sys, &frames, UT::ZERO);
        let err = flyby
            .draw_orbit(&ctx, &mut RandomSource::seed_from_u64(0))
            .unwrap_err();
        assert!(err.to_string().contains("kerbin-flybys"), "{err}");
        assert!(matches!(
            Error::root_of(&err),
            Some(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn moon_flybys_patch_through_the_planet() {
        let sys = kerbol();
        let frames = Frames::default();
        let mut flyby = kerbin_flyby(periapsis(300_000.0), 0.5);
        flyby.target = "Mun".into();
        flyby.speed = ValueRange::constant(300.0);
        flyby.resolve(&sys, &frames, &lifetime()).unwrap();
        let now = UT::ZERO;
        let ctx = context(&sys, &frames, now);
        let orbit = flyby
            .draw_orbit(&ctx, &mut RandomSource::seed_from_u64(13))
            .unwrap();
        // Half a day at 300 m/s is well outside the Mun's SOI.
        assert_ne!(&*orbit.body, "Mun");
        let body = sys.body(&orbit.body).unwrap();
        assert!(orbit.position_at(now, body.mu).unwrap().norm() <= body.soi);
    }

    #[test]
    fn bad_draws_are_attributed() {
        let sys = kerbol();
        let frames = Frames::default();
        let mut flyby = kerbin_flyby(periapsis(-5.0), 1.0);
        flyby.resolve(&sys, &frames, &lifetime()).unwrap();
        let ctx = context(&sys, &frames, UT::ZERO);
        let err = flyby
            .draw_orbit(&ctx, &mut RandomSource::seed_from_u64(0))
            .unwrap_err();
        assert!(err.to_string().contains("kerbin-flybys"), "{err}");
        assert!(matches!(
            Error::root_of(&err),
            Some(Error::InvalidOperation(_))
        ));

        let mut flyby = kerbin_flyby(periapsis(1.0e6), 1.0);
        flyby.target = "Vulcan".into();
        let err = flyby.resolve(&sys, &frames, &lifetime()).unwrap_err();
        assert!(matches!(Error::root_of(&err), Some(Error::Lookup(_))));
    }
}
