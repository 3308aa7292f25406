//! Parameter ranges: a distribution plus (possibly symbolic) bounds.

use std::fmt;

use color_eyre::eyre::{self, WrapErr};
use serde::{Deserialize, Serialize};

use crate::{
    bodies::Bodies,
    distribution::{Distribution, Params},
    error::{Error, Result},
    formula::Formula,
    random::RandomSource,
};

/// A raw value as written in a configuration file: a number or a value
/// expression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Expr(String),
}

impl RawValue {
    fn resolve<B: Bodies + ?Sized>(&self, bodies: &B, allow_resonance: bool) -> Result<f64> {
        match self {
            RawValue::Number(x) => Ok(*x),
            RawValue::Expr(s) => Formula::parse(s, allow_resonance)?.eval(bodies),
        }
    }
}

impl From<f64> for RawValue {
    fn from(x: f64) -> Self {
        RawValue::Number(x)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Expr(s.to_owned())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Expr(s)
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(x) => write!(f, "{x}"),
            RawValue::Expr(s) => f.write_str(s),
        }
    }
}

/// A distribution with raw bounds. The bounds are evaluated once by
/// [`ValueRange::resolve`] and reused for every draw until
/// [`ValueRange::invalidate`] is called.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    #[serde(default)]
    pub dist: Distribution,
    #[serde(default)]
    pub min: Option<RawValue>,
    #[serde(default)]
    pub max: Option<RawValue>,
    #[serde(default)]
    pub avg: Option<RawValue>,
    #[serde(default)]
    pub stddev: Option<RawValue>,
    #[serde(skip)]
    resolved: Option<Params>,
}

impl ValueRange {
    pub fn new(dist: Distribution) -> Self {
        Self {
            dist,
            ..Self::default()
        }
    }

    pub fn uniform(min: impl Into<RawValue>, max: impl Into<RawValue>) -> Self {
        Self::new(Distribution::Uniform).min(min).max(max)
    }

    /// A range that always draws `x`.
    pub fn constant(x: f64) -> Self {
        Self::uniform(x, x)
    }

    #[must_use]
    pub fn min(mut self, x: impl Into<RawValue>) -> Self {
        self.min = Some(x.into());
        self.resolved = None;
        self
    }

    #[must_use]
    pub fn max(mut self, x: impl Into<RawValue>) -> Self {
        self.max = Some(x.into());
        self.resolved = None;
        self
    }

    #[must_use]
    pub fn avg(mut self, x: impl Into<RawValue>) -> Self {
        self.avg = Some(x.into());
        self.resolved = None;
        self
    }

    #[must_use]
    pub fn stddev(mut self, x: impl Into<RawValue>) -> Self {
        self.stddev = Some(x.into());
        self.resolved = None;
        self
    }

    pub fn resolved(&self) -> Option<&Params> {
        self.resolved.as_ref()
    }

    /// Evaluate the raw bounds. On failure the previously resolved
    /// numbers, if any, are kept.
    pub fn resolve<B: Bodies + ?Sized>(&mut self, bodies: &B, allow_resonance: bool) -> eyre::Result<()> {
        let field = |name: &'static str, raw: &Option<RawValue>| -> eyre::Result<Option<f64>> {
            raw.as_ref()
                .map(|v| v.resolve(bodies, allow_resonance))
                .transpose()
                .wrap_err_with(|| format!("invalid value for {name}"))
        };
        let params = Params {
            min: field("min", &self.min)?,
            max: field("max", &self.max)?,
            avg: field("avg", &self.avg)?,
            stddev: field("stddev", &self.stddev)?,
        };
        self.resolved = Some(params);
        Ok(())
    }

    /// Forget the resolved numbers, e.g. after the bodies changed.
    pub fn invalidate(&mut self) {
        self.resolved = None;
    }

    /// Draw a value using the resolved bounds.
    pub fn draw(&self, rng: &mut RandomSource) -> Result<f64> {
        let params = self.resolved.as_ref().ok_or_else(|| {
            Error::invalid_operation(format!("{} range was drawn before being resolved", self.dist))
        })?;
        self.dist.draw(params, rng)
    }

    /// Draw a value, attributing any failure to `element` of the set
    /// named `owner`.
    pub fn draw_for(&self, element: &str, owner: &str, rng: &mut RandomSource) -> eyre::Result<f64> {
        self.draw(rng)
            .wrap_err_with(|| format!("could not draw {element} for asteroid set {owner}"))
    }
}

/// What the size of an orbit describes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizeType {
    #[default]
    SemimajorAxis,
    Periapsis,
    Apoapsis,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeRange {
    #[serde(flatten)]
    pub range: ValueRange,
    #[serde(default, rename = "type")]
    pub kind: SizeType,
}

/// How the position of periapsis is given.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PeriapsisType {
    #[default]
    Argument,
    Longitude,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriapsisRange {
    #[serde(flatten)]
    pub range: ValueRange,
    #[serde(default, rename = "type")]
    pub kind: PeriapsisType,
}

/// How the position along the orbit is given.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseType {
    #[default]
    MeanAnomaly,
    MeanLongitude,
}

/// When the phase is measured.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EpochType {
    #[default]
    GameStart,
    Now,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseRange {
    #[serde(flatten)]
    pub range: ValueRange,
    #[serde(default, rename = "type")]
    pub kind: PhaseType,
    #[serde(default)]
    pub epoch: EpochType,
}

/// How close a flyby comes to its target.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApproachType {
    #[default]
    ImpactParameter,
    Periapsis,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApproachRange {
    #[serde(flatten)]
    pub range: ValueRange,
    #[serde(default, rename = "type")]
    pub kind: ApproachType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bodies::{testing::kerbol, Property},
        error::Error,
    };

    #[test]
    fn resolves_once() {
        let sys = kerbol();
        let mut range = ValueRange::uniform("Ratio(Jool.sma, 0.5)", "Ratio(Jool.sma, 0.75)");
        assert!(range.resolved().is_none());
        range.resolve(&sys, false).unwrap();
        let sma = sys.property("Jool", Property::SemimajorAxis).unwrap();
        let params = range.resolved().copied().unwrap();
        assert_eq!(params.min, Some(sma * 0.5));
        assert_eq!(params.max, Some(sma * 0.75));
        assert_eq!(params.avg, None);

        let mut rng = RandomSource::seed_from_u64(2);
        for _ in 0..1000 {
            let x = range.draw(&mut rng).unwrap();
            assert!(x >= sma * 0.5 && x <= sma * 0.75);
        }

        range.invalidate();
        assert!(matches!(
            range.draw(&mut rng),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn failed_resolution_keeps_previous_numbers() {
        let sys = kerbol();
        let mut range = ValueRange::uniform(1.0, 2.0);
        range.resolve(&sys, false).unwrap();
        let before = range.resolved().copied();

        range.max = Some("Ratio(Vulcan.rad, 2)".into());
        let err = range.resolve(&sys, false).unwrap_err();
        assert!(err.to_string().contains("max"), "{err}");
        assert!(matches!(Error::root_of(&err), Some(Error::Lookup(_))));
        assert_eq!(range.resolved().copied(), before);
    }

    #[test]
    fn draw_errors_name_the_element_and_set() {
        let sys = kerbol();
        let mut range = ValueRange::new(Distribution::Beta)
            .min(0.0)
            .max(1.0)
            .avg(1.0)
            .stddev(0.1);
        range.resolve(&sys, false).unwrap();
        let mut rng = RandomSource::seed_from_u64(0);
        let err = range.draw_for("eccentricity", "Outer Belt", &mut rng).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("eccentricity") && msg.contains("Outer Belt"), "{msg}");
        assert!(matches!(
            Error::root_of(&err),
            Some(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn deserializes_with_subtypes() {
        let size: SizeRange = toml::from_str(
            r#"
            dist = "loguniform"
            min = "Resonance(Jool, 1:2)"
            max = 1e11
            type = "apoapsis"
            "#,
        )
        .unwrap();
        assert_eq!(size.kind, SizeType::Apoapsis);
        assert_eq!(size.range.dist, Distribution::LogUniform);
        assert_eq!(size.range.max, Some(RawValue::Number(1e11)));

        let phase: PhaseRange = toml::from_str(
            r#"
            min = 0
            max = 360
            type = "mean-longitude"
            epoch = "now"
            "#,
        )
        .unwrap();
        assert_eq!(phase.kind, PhaseType::MeanLongitude);
        assert_eq!(phase.epoch, EpochType::Now);
        assert_eq!(phase.range.dist, Distribution::Uniform);
        assert_eq!(phase.range.max, Some(RawValue::Number(360.0)));
    }
}
