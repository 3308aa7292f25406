//! Reference frames for asteroid populations.
//!
//! A population may describe its orbits relative to a plane other than
//! the default one (e.g. the invariable plane of a planet's moons). The
//! frame is a rotation that takes vectors from that plane to the default
//! frame.

use std::collections::HashMap;

use nalgebra::{Matrix3, Rotation3, Vector3};
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    kepler::orbits::{Orbit, StateVector},
    time::UT,
};

/// How a reference frame is defined in configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FrameDef {
    /// The plane with the given inclination and longitude of ascending
    /// node, with its reference direction `arg` degrees past the node.
    Angles {
        #[serde(default)]
        inc: f64,
        #[serde(default)]
        lan: f64,
        #[serde(default)]
        arg: f64,
    },
    /// The plane perpendicular to `normal`; the in-plane part of
    /// `reference` gives the reference direction.
    Vectors { normal: [f64; 3], reference: [f64; 3] },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceFrame {
    pub name: String,
    rotation: Rotation3<f64>,
}

impl ReferenceFrame {
    /// Frame from angles in degrees, applied as successive rotations
    /// about z (node), x (inclination) and z (argument).
    pub fn from_angles(name: impl Into<String>, inc: f64, lan: f64, arg: f64) -> Result<Self> {
        if !(inc.is_finite() && lan.is_finite() && arg.is_finite()) {
            return Err(Error::invalid_operation(format!(
                "frame angles must be finite, got inc = {inc}, lan = {lan}, arg = {arg}"
            )));
        }
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), lan.to_radians())
            * Rotation3::from_axis_angle(&Vector3::x_axis(), inc.to_radians())
            * Rotation3::from_axis_angle(&Vector3::z_axis(), arg.to_radians());
        Ok(Self {
            name: name.into(),
            rotation,
        })
    }

    pub fn from_vectors(
        name: impl Into<String>,
        normal: Vector3<f64>,
        reference: Vector3<f64>,
    ) -> Result<Self> {
        let name = name.into();
        if !(normal.iter().all(|c| c.is_finite()) && reference.iter().all(|c| c.is_finite())) {
            return Err(Error::invalid_operation(format!(
                "frame {name} vectors must be finite, got normal = {normal:?}, reference = {reference:?}"
            )));
        }
        let z = normal.try_normalize(f64::EPSILON).ok_or_else(|| {
            Error::invalid_operation(format!("frame {name} has a zero normal vector"))
        })?;
        if reference.norm() <= f64::EPSILON {
            return Err(Error::invalid_operation(format!(
                "frame {name} has a zero reference vector"
            )));
        }
        let in_plane = reference - reference.dot(&z) * z;
        let x = in_plane
            .try_normalize(1e-9 * reference.norm())
            .ok_or_else(|| {
                Error::invalid_operation(format!(
                    "frame {name} has a reference vector parallel to its normal"
                ))
            })?;
        let y = z.cross(&x);
        let rotation = Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[x, y, z]));
        Ok(Self { name, rotation })
    }

    pub fn from_def(name: impl Into<String>, def: &FrameDef) -> Result<Self> {
        match def {
            FrameDef::Angles { inc, lan, arg } => Self::from_angles(name, *inc, *lan, *arg),
            FrameDef::Vectors { normal, reference } => Self::from_vectors(
                name,
                Vector3::from_column_slice(normal),
                Vector3::from_column_slice(reference),
            ),
        }
    }

    pub fn to_default_frame(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * v
    }

    /// Re-express an orbit given in this frame in the default frame,
    /// using its state at `now`.
    pub fn orbit_to_default_frame(&self, orbit: &Orbit, mu: f64, now: UT) -> Result<Orbit> {
        let sv = orbit.sv_at(now, mu)?;
        StateVector {
            position: self.to_default_frame(&sv.position),
            velocity: self.to_default_frame(&sv.velocity),
            ..sv
        }
        .into_orbit(mu, 1e-8)
    }
}

/// Named reference frames.
#[derive(Clone, Debug, Default)]
pub struct Frames {
    frames: HashMap<String, ReferenceFrame>,
}

impl Frames {
    pub fn insert(&mut self, frame: ReferenceFrame) -> Option<ReferenceFrame> {
        self.frames.insert(frame.name.clone(), frame)
    }

    pub fn get(&self, name: &str) -> Result<&ReferenceFrame> {
        self.frames
            .get(name)
            .ok_or_else(|| Error::lookup(format!("unknown reference frame {name:?}")))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
