//! Error kinds shared by the generation engine.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    /// A value expression did not match any known form.
    #[error("could not parse {input:?}: {reason}")]
    Parse { input: String, reason: String },
    /// An unknown body, property, frame or asteroid set was referenced.
    #[error("{0}")]
    Lookup(String),
    /// Distribution parameters are out of domain.
    #[error("invalid distribution parameters: {0}")]
    InvalidParameter(String),
    /// Orbital elements or selection inputs are inconsistent.
    #[error("{0}")]
    InvalidOperation(String),
}

impl Error {
    pub fn parse(input: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            input: input.to_owned(),
            reason: reason.into(),
        }
    }

    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Find the typed cause at the bottom of a wrapped report, if any.
    pub fn root_of(report: &color_eyre::eyre::Report) -> Option<&Error> {
        report.root_cause().downcast_ref::<Error>()
    }
}
