//! Probability distributions for orbital parameters.
//!
//! Every distribution is described by the same four user-facing
//! numbers (`min`, `max`, `avg`, `stddev`); each kind uses the subset it
//! needs and converts them into its own canonical parameters.

use std::{f64::consts, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    random::RandomSource,
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    #[default]
    Uniform,
    #[serde(alias = "log-uniform")]
    LogUniform,
    Gaussian,
    Normal,
    #[serde(alias = "log-normal")]
    LogNormal,
    Rayleigh,
    Exponential,
    Gamma,
    Beta,
    Isotropic,
}

/// Resolved numeric parameters. Fields a distribution does not use may
/// be left empty.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Params {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub stddev: Option<f64>,
}

impl Params {
    fn get(value: Option<f64>, name: &str, dist: Distribution) -> Result<f64> {
        match value {
            Some(x) if x.is_nan() => Err(Error::invalid_parameter(format!(
                "{dist} distribution got NaN for {name}"
            ))),
            Some(x) => Ok(x),
            None => Err(Error::invalid_parameter(format!(
                "{dist} distribution requires {name}"
            ))),
        }
    }

    fn min(&self, dist: Distribution) -> Result<f64> {
        Self::get(self.min, "min", dist)
    }

    fn max(&self, dist: Distribution) -> Result<f64> {
        Self::get(self.max, "max", dist)
    }

    fn avg(&self, dist: Distribution) -> Result<f64> {
        Self::get(self.avg, "avg", dist)
    }

    fn stddev(&self, dist: Distribution) -> Result<f64> {
        Self::get(self.stddev, "stddev", dist)
    }
}

impl Distribution {
    /// Draw one value.
    pub fn draw(self, params: &Params, rng: &mut RandomSource) -> Result<f64> {
        let d = self;
        match self {
            Distribution::Uniform => {
                let (min, max) = (params.min(d)?, params.max(d)?);
                uniform(rng, min, max)
            }
            Distribution::LogUniform => {
                let (min, max) = (params.min(d)?, params.max(d)?);
                log_uniform(rng, min, max)
            }
            Distribution::Gaussian | Distribution::Normal => {
                let (avg, stddev) = (params.avg(d)?, params.stddev(d)?);
                normal(rng, avg, stddev)
            }
            Distribution::LogNormal => {
                let (avg, stddev) = (params.avg(d)?, params.stddev(d)?);
                log_normal(rng, avg, stddev)
            }
            Distribution::Rayleigh => rayleigh(rng, params.avg(d)?),
            Distribution::Exponential => exponential(rng, params.avg(d)?),
            Distribution::Gamma => {
                let (avg, stddev) = (params.avg(d)?, params.stddev(d)?);
                gamma_mean_stddev(rng, avg, stddev)
            }
            Distribution::Beta => {
                let (min, max) = (params.min(d)?, params.max(d)?);
                let (avg, stddev) = (params.avg(d)?, params.stddev(d)?);
                beta(rng, min, max, avg, stddev)
            }
            Distribution::Isotropic => Ok(isotropic(rng)),
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Distribution::Uniform => "uniform",
            Distribution::LogUniform => "log-uniform",
            Distribution::Gaussian => "gaussian",
            Distribution::Normal => "normal",
            Distribution::LogNormal => "log-normal",
            Distribution::Rayleigh => "rayleigh",
            Distribution::Exponential => "exponential",
            Distribution::Gamma => "gamma",
            Distribution::Beta => "beta",
            Distribution::Isotropic => "isotropic",
        };
        f.write_str(name)
    }
}

pub fn uniform(rng: &mut RandomSource, min: f64, max: f64) -> Result<f64> {
    if min > max || !min.is_finite() || !max.is_finite() {
        return Err(Error::invalid_parameter(format!(
            "uniform distribution needs finite min <= max, got [{min}, {max}]"
        )));
    }
    Ok(rng.uniform_range(min, max))
}

pub fn log_uniform(rng: &mut RandomSource, min: f64, max: f64) -> Result<f64> {
    if !(min > 0.0 && min <= max && max.is_finite()) {
        return Err(Error::invalid_parameter(format!(
            "log-uniform distribution needs 0 < min <= max, got [{min}, {max}]"
        )));
    }
    if min == max {
        return Ok(min);
    }
    Ok(libm::exp(rng.uniform_range(libm::log(min), libm::log(max))))
}

pub fn normal(rng: &mut RandomSource, avg: f64, stddev: f64) -> Result<f64> {
    if stddev < 0.0 {
        return Err(Error::invalid_parameter(format!(
            "normal distribution needs stddev >= 0, got {stddev}"
        )));
    }
    Ok(avg + stddev * rng.standard_normal())
}

pub fn log_normal(rng: &mut RandomSource, avg: f64, stddev: f64) -> Result<f64> {
    if avg <= 0.0 || stddev <= 0.0 {
        return Err(Error::invalid_parameter(format!(
            "log-normal distribution needs avg > 0 and stddev > 0, got avg = {avg}, stddev = {stddev}"
        )));
    }
    let quad = libm::sqrt(avg * avg + stddev * stddev);
    let mu = libm::log(avg * avg / quad);
    let sigma = libm::sqrt(2.0 * libm::log(quad / avg));
    Ok(libm::exp(normal(rng, mu, sigma)?))
}

/// Rayleigh distribution with the given mean.
pub fn rayleigh(rng: &mut RandomSource, mean: f64) -> Result<f64> {
    if mean <= 0.0 {
        return Err(Error::invalid_parameter(format!(
            "rayleigh distribution needs avg > 0, got {mean}"
        )));
    }
    let sigma2 = mean * mean * 2.0 / consts::PI;
    Ok(libm::sqrt(-2.0 * sigma2 * libm::log(rng.uniform_open0())))
}

/// Exponential distribution with the given mean.
pub fn exponential(rng: &mut RandomSource, mean: f64) -> Result<f64> {
    if mean <= 0.0 {
        return Err(Error::invalid_parameter(format!(
            "exponential distribution needs avg > 0, got {mean}"
        )));
    }
    Ok(-mean * libm::log(rng.uniform_open0()))
}

fn gamma_mean_stddev(rng: &mut RandomSource, avg: f64, stddev: f64) -> Result<f64> {
    if avg <= 0.0 || stddev <= 0.0 {
        return Err(Error::invalid_parameter(format!(
            "gamma distribution needs avg > 0 and stddev > 0, got avg = {avg}, stddev = {stddev}"
        )));
    }
    let shape = (avg / stddev).powi(2);
    let scale = stddev * stddev / avg;
    Ok(gamma(rng, shape) * scale)
}

/// Gamma distribution with unit scale (Marsaglia & Tsang 2000).
fn gamma(rng: &mut RandomSource, shape: f64) -> f64 {
    if shape < 1.0 {
        let boost = libm::pow(rng.uniform_open0(), 1.0 / shape);
        return gamma(rng, shape + 1.0) * boost;
    }

    let d = shape - 1.0 / 3.0;
    let c = 1.0 / libm::sqrt(9.0 * d);
    loop {
        let x = rng.standard_normal();
        let v = (1.0 + c * x).powi(3);
        if v <= 0.0 {
            continue;
        }
        let u = rng.uniform_open0();
        if u < 1.0 - 0.0331 * x.powi(4) {
            return d * v;
        }
        if libm::log(u) < 0.5 * x * x + d * (1.0 - v + libm::log(v)) {
            return d * v;
        }
    }
}

/// Beta distribution rescaled to `[min, max]`, parametrized by its mean
/// and standard deviation.
fn beta(rng: &mut RandomSource, min: f64, max: f64, avg: f64, stddev: f64) -> Result<f64> {
    if !(min < avg && avg < max) || stddev <= 0.0 {
        return Err(Error::invalid_parameter(format!(
            "beta distribution needs min < avg < max and stddev > 0, got min = {min}, max = {max}, avg = {avg}, stddev = {stddev}"
        )));
    }
    let width = max - min;
    let mean = (avg - min) / width;
    let var = (stddev / width).powi(2);
    let common = mean * (1.0 - mean) / var - 1.0;
    if common <= 0.0 {
        return Err(Error::invalid_parameter(format!(
            "beta distribution on [{min}, {max}] with avg = {avg} cannot have stddev = {stddev}"
        )));
    }
    let alpha = mean * common;
    let beta = (1.0 - mean) * common;

    let x = gamma(rng, alpha);
    let y = gamma(rng, beta);
    Ok(min + width * x / (x + y))
}

/// Angle in degrees on `[0, 180]` with density proportional to its sine,
/// i.e. the inclination of a uniformly random direction.
pub fn isotropic(rng: &mut RandomSource) -> f64 {
    libm::acos(1.0 - 2.0 * rng.uniform()).to_degrees()
}
