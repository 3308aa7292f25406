//! Patching trajectories across sphere-of-influence boundaries.

use tracing::debug;

use super::orbits::{Orbit, StateVector};
use crate::{
    bodies::{Bodies, Body},
    error::{Error, Result},
    time::UT,
};

/// Bisection stops once the crossing is bracketed this tightly (`sec`).
pub const CROSSING_TOL: f64 = 1.0;
/// Doublings of the search step before giving up on finding a point
/// outside the SOI. Any hyperbola leaves the SOI long before this.
const MAX_EXPANSIONS: usize = 128;
/// Deepest body hierarchy a trajectory is patched through.
const MAX_DEPTH: usize = 16;

/// Find when `orbit` crosses the SOI of `body`.
///
/// If the periapsis passage nearest the orbit's epoch is still ahead of
/// `now`, this is the entry crossing before it, otherwise the exit
/// crossing after it. A trajectory that never dips inside the SOI is
/// treated as crossing at periapsis. The returned time is the bracket
/// end just outside the SOI.
pub fn soi_crossing(orbit: &Orbit, body: &Body, now: UT) -> Result<UT> {
    if !body.soi.is_finite() {
        return Err(Error::invalid_operation(format!(
            "{} has no SOI boundary to cross",
            body.name
        )));
    }
    let mu = body.mu;
    let radius = |t: f64| -> Result<f64> {
        let ut = UT::checked_seconds(t).ok_or_else(|| {
            Error::invalid_operation(format!(
                "SOI crossing search around {} ran past the representable time",
                body.name
            ))
        })?;
        Ok(orbit.position_at(ut, mu)?.norm())
    };

    let pe_time = orbit.periapsis_time(mu);
    let t_pe = pe_time.as_seconds();
    if radius(t_pe)? >= body.soi {
        return Ok(pe_time);
    }

    if !orbit.is_hyperbolic() && orbit.apoapsis_radius() <= body.soi {
        return Err(Error::invalid_operation(format!(
            "orbit around {} never leaves its SOI",
            body.name
        )));
    }

    // The step starts at half a period and doubles until the bracket
    // reaches outside the SOI.
    let dir = if pe_time > now { -1.0 } else { 1.0 };
    let mut step = dir * orbit.period(mu) / 2.0;
    let mut inner = t_pe;
    let mut outer = t_pe + step;
    let mut expansions = 0;
    while radius(outer)? <= body.soi {
        expansions += 1;
        if expansions > MAX_EXPANSIONS {
            return Err(Error::invalid_operation(format!(
                "orbit around {} never leaves its SOI",
                body.name
            )));
        }
        inner = outer;
        step *= 2.0;
        outer += step;
    }

    while (outer - inner).abs() > CROSSING_TOL {
        let mid = 0.5 * (inner + outer);
        if radius(mid)? > body.soi {
            outer = mid;
        } else {
            inner = mid;
        }
    }
    Ok(UT::new_seconds(outer))
}

/// Re-express `orbit` around successive parent bodies until the position
/// at `now` lies inside the SOI of the orbit's reference body.
pub fn patch_to_soi<B: Bodies + ?Sized>(mut orbit: Orbit, bodies: &B, now: UT) -> Result<Orbit> {
    for _ in 0..MAX_DEPTH {
        let body = bodies.body(&orbit.body)?;
        if !body.soi.is_finite() {
            return Ok(orbit);
        }
        let r = orbit.position_at(now, body.mu)?.norm();
        if r <= body.soi {
            return Ok(orbit);
        }

        let parent = bodies.parent_of(body)?.ok_or_else(|| {
            Error::invalid_operation(format!(
                "trajectory leaves the SOI of {}, which has no parent",
                body.name
            ))
        })?;
        let ephem = body.ephem.as_ref().ok_or_else(|| {
            Error::invalid_operation(format!("{} has no orbit to patch onto", body.name))
        })?;

        let crossing = soi_crossing(&orbit, body, now)?;
        let local = orbit.sv_at(crossing, body.mu)?;
        let frame = ephem.sv_at(crossing, parent.mu)?;
        debug!(
            from = %body.name,
            to = %parent.name,
            %crossing,
            "patching trajectory at SOI boundary"
        );
        orbit = StateVector {
            body: parent.name.clone(),
            position: local.position + frame.position,
            velocity: local.velocity + frame.velocity,
            time: crossing,
        }
        .into_orbit(parent.mu, 1e-8)?;
    }
    Err(Error::invalid_operation(format!(
        "body hierarchy above {} is deeper than {MAX_DEPTH} levels",
        orbit.body
    )))
}
