//! Keplerian orbits.

use std::{f64::consts, sync::Arc};

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    time::UT,
};

/// Newton iteration tolerance for Kepler's equation.
pub const KEPLER_TOL: f64 = 1e-12;
/// Newton iteration limit for Kepler's equation.
pub const KEPLER_MAXITER: u64 = 100;

/// A Keplerian orbit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Orbit {
    /// Semi-major axis (`m`). Negative for hyperbolic orbits.
    pub sma: f64,
    /// Eccentricity (dimensionless).
    pub e: f64,
    /// Inclination (radians).
    pub i: f64,
    /// Longitude of ascending node (radians).
    pub lan: f64,
    /// Argument of periapsis (radians).
    pub argpe: f64,
    /// Mean anomaly at `epoch` (radians).
    pub mna: f64,
    /// The epoch at which `mna` is measured.
    pub epoch: UT,
    /// Name of the body being orbited.
    pub body: Arc<str>,
}

impl Orbit {
    pub fn is_hyperbolic(&self) -> bool {
        self.e > 1.0
    }

    /// Semi-latus rectum (`m`).
    pub fn p(&self) -> f64 {
        self.sma * (1.0 - self.e.powi(2))
    }

    pub fn periapsis_radius(&self) -> f64 {
        self.sma * (1.0 - self.e)
    }

    /// Apoapsis radius; infinite for unbound orbits.
    pub fn apoapsis_radius(&self) -> f64 {
        if self.e >= 1.0 {
            f64::INFINITY
        } else {
            self.sma * (1.0 + self.e)
        }
    }

    pub fn mean_motion(&self, mu: f64) -> f64 {
        libm::sqrt(mu / self.sma.abs().powi(3))
    }

    /// Orbital period (`sec`). For hyperbolic orbits this is the period
    /// of the circular orbit with the same `|a|`, which still sets the
    /// time scale of the trajectory.
    pub fn period(&self, mu: f64) -> f64 {
        2.0 * consts::PI / self.mean_motion(mu)
    }

    pub fn mean_anomaly_at(&self, ut: UT, mu: f64) -> f64 {
        self.mna + self.mean_motion(mu) * (ut - self.epoch).as_seconds_f64()
    }

    /// Time of the periapsis passage closest to `epoch`.
    pub fn periapsis_time(&self, mu: f64) -> UT {
        let ma = if self.is_hyperbolic() {
            self.mna
        } else {
            wrap_pi(self.mna)
        };
        UT::new_seconds(self.epoch.as_seconds() - ma / self.mean_motion(mu))
    }

    /// True anomaly at the given time.
    pub fn true_anomaly_at(&self, ut: UT, mu: f64) -> Result<f64> {
        ma_to_ta(
            self.mean_anomaly_at(ut, mu),
            self.e,
            KEPLER_TOL,
            KEPLER_MAXITER,
        )
    }

    /// Calculate the position and velocity in the perifocal
    /// coordinate system PQW at the given true anomaly.
    fn sv_pqw(&self, ta: f64, mu: f64) -> (Vector3<f64>, Vector3<f64>) {
        let p = self.p();
        let r = p / (1.0 + self.e * libm::cos(ta));
        let rv = r * libm::cos(ta) * Vector3::new(1.0, 0.0, 0.0)
            + r * libm::sin(ta) * Vector3::new(0.0, 1.0, 0.0);
        let vv = libm::sqrt(mu / p)
            * (-libm::sin(ta) * Vector3::new(1.0, 0.0, 0.0)
                + (self.e + libm::cos(ta)) * Vector3::new(0.0, 1.0, 0.0));
        (rv, vv)
    }

    fn pqw_ijk_matrix(&self) -> Matrix3<f64> {
        let (sl, cl) = (libm::sin(self.lan), libm::cos(self.lan));
        let (sw, cw) = (libm::sin(self.argpe), libm::cos(self.argpe));
        let (si, ci) = (libm::sin(self.i), libm::cos(self.i));

        Matrix3::new(
            cl * cw - sl * sw * ci,
            -cl * sw - sl * cw * ci,
            sl * si,
            sl * cw + cl * sw * ci,
            -sl * sw + cl * cw * ci,
            -cl * si,
            sw * si,
            cw * si,
            ci,
        )
    }

    /// Position and velocity relative to the orbited body at `ut`.
    pub fn sv_at(&self, ut: UT, mu: f64) -> Result<StateVector> {
        let ta = self.true_anomaly_at(ut, mu)?;
        let (rv, vv) = self.sv_pqw(ta, mu);
        let mat = self.pqw_ijk_matrix();
        Ok(StateVector {
            body: self.body.clone(),
            position: mat * rv,
            velocity: mat * vv,
            time: ut,
        })
    }

    pub fn position_at(&self, ut: UT, mu: f64) -> Result<Vector3<f64>> {
        Ok(self.sv_at(ut, mu)?.position)
    }
}

/// A body-centered inertial state vector.
#[derive(Clone, Debug, PartialEq)]
pub struct StateVector {
    /// Name of the body the vectors are relative to.
    pub body: Arc<str>,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub time: UT,
}

impl StateVector {
    /// Convert this state vector into an [`Orbit`] with its epoch at
    /// the state vector's time.
    ///
    /// Recommended tolerance (`tol`): `1e-8`.
    pub fn into_orbit(self, mu: f64, tol: f64) -> Result<Orbit> {
        let rv = self.position;
        let r = rv.norm();
        let vv = self.velocity;
        let v = vv.norm();
        let hv = rv.cross(&vv);
        let h = hv.norm();
        if r == 0.0 || h == 0.0 {
            return Err(Error::invalid_operation(format!(
                "degenerate state vector around {}: r = {rv:?}, v = {vv:?}",
                self.body
            )));
        }
        let nv = Vector3::new(0.0, 0.0, 1.0).cross(&hv);
        let ev = 1.0 / mu * ((v.powi(2) - mu / r) * rv - rv.dot(&vv) * vv);
        let p = h.powi(2) / mu;
        let e = ev.norm();
        let i = libm::acos((hv[2] / h).clamp(-1.0, 1.0));

        if (e - 1.0).abs() < tol {
            return Err(Error::invalid_operation(format!(
                "parabolic trajectory around {} (e = {e})",
                self.body
            )));
        }

        let circular = e < tol;
        let equatorial = nv.norm() < tol * h;
        // Longitudes on retrograde equatorial orbits run clockwise.
        let dir = if hv[2] < 0.0 { -1.0 } else { 1.0 };

        let (lan, argpe, ta) = if equatorial && !circular {
            (
                0.0,
                // Longitude of periapsis
                libm::atan2(dir * ev[1], ev[0]),
                libm::atan2(hv.dot(&ev.cross(&rv)) / h, rv.dot(&ev)),
            )
        } else if !equatorial && circular {
            (
                libm::atan2(nv[1], nv[0]),
                0.0,
                // Argument of latitude
                libm::atan2(rv.dot(&hv.cross(&nv)) / h, rv.dot(&nv)),
            )
        } else if equatorial && circular {
            (
                0.0,
                0.0,
                // True longitude
                libm::atan2(dir * rv[1], rv[0]),
            )
        } else {
            let ta = libm::atan2(hv.dot(&ev.cross(&rv)) / h, rv.dot(&ev));
            let lan = libm::atan2(nv[1], nv[0]);
            let px = rv.dot(&nv);
            let py = (rv.dot(&hv.cross(&nv))) / h;
            let argpe = libm::atan2(py, px) - ta;

            (lan, argpe, ta)
        };

        Ok(Orbit {
            sma: p / (1.0 - e.powi(2)),
            e,
            i,
            lan: wrap_2pi(lan),
            argpe: wrap_2pi(argpe),
            mna: ta_to_ma(ta, e),
            epoch: self.time,
            body: self.body,
        })
    }
}

/// Wrap an angle into `[0, 2π)`.
pub fn wrap_2pi(x: f64) -> f64 {
    x.rem_euclid(2.0 * consts::PI)
}

/// Wrap an angle into `[-π, π)`.
pub fn wrap_pi(x: f64) -> f64 {
    (x + consts::PI).rem_euclid(2.0 * consts::PI) - consts::PI
}

fn e_to_ta(ea: f64, ecc: f64) -> f64 {
    let beta = ecc / (1.0 + libm::sqrt(1.0 - ecc.powi(2)));
    ea + 2.0 * libm::atan2(beta * libm::sin(ea), 1.0 - beta * libm::cos(ea))
}

fn f_to_ta(f: f64, ecc: f64) -> f64 {
    2.0 * libm::atan(libm::sqrt((ecc + 1.0) / (ecc - 1.0)) * libm::tanh(f / 2.0))
}

/// Convert a mean anomaly to a true anomaly for elliptic or
/// hyperbolic orbits.
pub fn ma_to_ta(ma: f64, e: f64, tol: f64, maxiter: u64) -> Result<f64> {
    if e < 0.0 {
        return Err(Error::invalid_operation(format!(
            "negative eccentricity {e}"
        )));
    }
    if e < 1.0 {
        let ea = ma_to_ea(wrap_pi(ma), e, tol, maxiter)?;
        Ok(e_to_ta(ea, e))
    } else if e > 1.0 {
        let ha = ma_to_ha(ma, e, tol, maxiter)?;
        Ok(f_to_ta(ha, e))
    } else {
        Err(Error::invalid_operation("parabolic orbits have no mean anomaly"))
    }
}

/// Convert a true anomaly to a mean anomaly.
pub fn ta_to_ma(ta: f64, e: f64) -> f64 {
    if e < 1.0 {
        let ea = libm::atan2(
            libm::sqrt(1.0 - e.powi(2)) * libm::sin(ta),
            e + libm::cos(ta),
        );
        ea - e * libm::sin(ea)
    } else {
        let ha = 2.0 * libm::atanh(libm::sqrt((e - 1.0) / (e + 1.0)) * libm::tan(ta / 2.0));
        e * libm::sinh(ha) - ha
    }
}

/// Solve Kepler's equation `M = E - e sin E`.
pub fn ma_to_ea(ma: f64, e: f64, tol: f64, maxiter: u64) -> Result<f64> {
    let mut ea_new = if -consts::PI < ma && ma < 0.0 || ma > consts::PI {
        ma - e
    } else {
        ma + e
    };

    let mut ea;
    for _ in 0..maxiter {
        ea = ea_new;
        ea_new = ea + (ma - ea + e * libm::sin(ea)) / (1.0 - e * libm::cos(ea));

        if (ea_new - ea).abs() < tol {
            return Ok(ea_new);
        }
    }
    Err(Error::invalid_operation(format!(
        "ma_to_ea({ma}, {e}): failed to converge"
    )))
}

/// Solve the hyperbolic Kepler equation `M = e sinh H - H`.
pub fn ma_to_ha(ma: f64, e: f64, tol: f64, maxiter: u64) -> Result<f64> {
    let mut ha_new = ma.signum() * libm::log(2.0 * ma.abs() / e + 1.8);

    let mut ha;
    for _ in 0..maxiter {
        ha = ha_new;
        ha_new = ha - (e * libm::sinh(ha) - ha - ma) / (e * libm::cosh(ha) - 1.0);

        if (ha_new - ha).abs() < tol * ha_new.abs().max(1.0) {
            return Ok(ha_new);
        }
    }
    Err(Error::invalid_operation(format!(
        "ma_to_ha({ma}, {e}): failed to converge"
    )))
}
