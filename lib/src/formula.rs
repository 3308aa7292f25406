//! Value expressions for orbital parameters.
//!
//! A value is either a plain number or one of three forms that refer to
//! a property of a celestial body:
//!
//! - `Ratio(<body>.<key>, <factor>)`: the property times `factor`
//! - `Offset(<body>.<key>, <delta>)`: the property plus `delta`
//! - `Resonance(<body>, <m>:<n>)`: the semimajor axis with an `m:n`
//!   mean-motion resonance with `body` (only allowed for sizes)
//!
//! Keywords and property keys are case-insensitive.

use std::fmt;

use crate::{
    bodies::{Bodies, Property},
    error::{Error, Result},
};

#[derive(Clone, Debug, PartialEq)]
pub enum Formula {
    Literal(f64),
    Ratio {
        body: String,
        key: Property,
        factor: f64,
    },
    Offset {
        body: String,
        key: Property,
        delta: f64,
    },
    Resonance {
        body: String,
        m: u32,
        n: u32,
    },
}

impl Formula {
    /// Parse a value expression. `allow_resonance` is only set for
    /// fields that describe an orbit's size.
    pub fn parse(input: &str, allow_resonance: bool) -> Result<Formula> {
        let formula = match parse::formula(input) {
            Ok((_, raw)) => raw.into_formula(input)?,
            Err(_) => {
                return Err(Error::parse(
                    input,
                    "expected a number, Ratio(body.key, factor), Offset(body.key, delta) or Resonance(body, m:n)",
                ))
            }
        };
        if !allow_resonance && matches!(formula, Formula::Resonance { .. }) {
            return Err(Error::parse(
                input,
                "Resonance() can only be used for orbit sizes",
            ));
        }
        Ok(formula)
    }

    pub fn eval<B: Bodies + ?Sized>(&self, bodies: &B) -> Result<f64> {
        match self {
            Formula::Literal(x) => Ok(*x),
            Formula::Ratio { body, key, factor } => Ok(bodies.property(body, *key)? * factor),
            Formula::Offset { body, key, delta } => Ok(bodies.property(body, *key)? + delta),
            Formula::Resonance { body, m, n } => {
                let sma = bodies.property(body, Property::SemimajorAxis)?;
                Ok(sma * (f64::from(*n) / f64::from(*m)).powf(2.0 / 3.0))
            }
        }
    }
}

/// Parse and evaluate in one step.
pub fn evaluate<B: Bodies + ?Sized>(input: &str, allow_resonance: bool, bodies: &B) -> Result<f64> {
    Formula::parse(input, allow_resonance)?.eval(bodies)
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::Literal(x) => write!(f, "{x}"),
            Formula::Ratio { body, key, factor } => write!(f, "Ratio({body}.{key}, {factor})"),
            Formula::Offset { body, key, delta } => write!(f, "Offset({body}.{key}, {delta})"),
            Formula::Resonance { body, m, n } => write!(f, "Resonance({body}, {m}:{n})"),
        }
    }
}

mod parse {
    use nom::branch::alt;
    use nom::bytes::complete::{tag_no_case, take_while1};
    use nom::character::complete::{alphanumeric1, char, multispace0, u32};
    use nom::combinator::{all_consuming, map};
    use nom::number::complete::double;
    use nom::sequence::{delimited, preceded, separated_pair, terminated, tuple};
    use nom::IResult;

    use crate::{
        bodies::Property,
        error::{Error, Result},
    };

    use super::Formula;

    /// A parsed expression whose property key is not yet checked.
    pub enum Raw<'a> {
        Literal(f64),
        Ratio(&'a str, &'a str, f64),
        Offset(&'a str, &'a str, f64),
        Resonance(&'a str, u32, u32),
    }

    impl Raw<'_> {
        pub fn into_formula(self, input: &str) -> Result<Formula> {
            let key = |k: &str| k.parse::<Property>();
            Ok(match self {
                Raw::Literal(x) => Formula::Literal(x),
                Raw::Ratio(body, k, factor) => Formula::Ratio {
                    body: body.to_owned(),
                    key: key(k)?,
                    factor,
                },
                Raw::Offset(body, k, delta) => Formula::Offset {
                    body: body.to_owned(),
                    key: key(k)?,
                    delta,
                },
                Raw::Resonance(body, m, n) => {
                    if m == 0 || n == 0 {
                        return Err(Error::parse(input, "resonance terms must be positive"));
                    }
                    Formula::Resonance {
                        body: body.to_owned(),
                        m,
                        n,
                    }
                }
            })
        }
    }

    fn ws<'a, O>(
        inner: impl FnMut(&'a str) -> IResult<&'a str, O>,
    ) -> impl FnMut(&'a str) -> IResult<&'a str, O> {
        delimited(multispace0, inner, multispace0)
    }

    fn body_name(input: &str) -> IResult<&str, &str> {
        map(
            take_while1(|c: char| !matches!(c, '.' | ',' | '(' | ')')),
            str::trim,
        )(input)
    }

    fn body_key(input: &str) -> IResult<&str, (&str, &str)> {
        separated_pair(ws(body_name), char('.'), ws(alphanumeric1))(input)
    }

    fn call<'a, O>(
        name: &'static str,
        args: impl FnMut(&'a str) -> IResult<&'a str, O>,
    ) -> impl FnMut(&'a str) -> IResult<&'a str, O> {
        preceded(
            ws(tag_no_case(name)),
            delimited(char('('), args, char(')')),
        )
    }

    fn ratio(input: &str) -> IResult<&str, Raw<'_>> {
        map(
            call("ratio", separated_pair(body_key, char(','), ws(double))),
            |((body, key), factor)| Raw::Ratio(body, key, factor),
        )(input)
    }

    fn offset(input: &str) -> IResult<&str, Raw<'_>> {
        map(
            call("offset", separated_pair(body_key, char(','), ws(double))),
            |((body, key), delta)| Raw::Offset(body, key, delta),
        )(input)
    }

    fn resonance(input: &str) -> IResult<&str, Raw<'_>> {
        map(
            call(
                "resonance",
                separated_pair(
                    ws(body_name),
                    char(','),
                    tuple((ws(u32), char(':'), ws(u32))),
                ),
            ),
            |(body, (m, _, n))| Raw::Resonance(body, m, n),
        )(input)
    }

    fn literal(input: &str) -> IResult<&str, Raw<'_>> {
        map(ws(double), Raw::Literal)(input)
    }

    pub fn formula(input: &str) -> IResult<&str, Raw<'_>> {
        all_consuming(terminated(
            alt((ratio, offset, resonance, literal)),
            multispace0,
        ))(input)
    }
}
