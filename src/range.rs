//! Threshold ranges as understood by nagios compatible schedulers.
//!
//! A range describes the *safe* zone of a value. By default a value alerts when it
//! falls outside of the range, a leading `@` inverts this so the value alerts when
//! it falls inside of it.
//!
//! | expression | alerts when            |
//! |------------|------------------------|
//! | `10`       | `< 0` or `> 10`        |
//! | `10:`      | `< 10`                 |
//! | `~:10`     | `> 10`                 |
//! | `:10`      | `> 10`                 |
//! | `10:20`    | `< 10` or `> 20`       |
//! | `@10:20`   | `>= 10` and `<= 20`    |

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)$").expect("number pattern is valid")
});

/// Returned when a threshold expression doesn't follow the range grammar.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid range syntax {expression:?}: {kind}")]
pub struct InvalidRangeSyntax {
    expression: String,
    kind: SyntaxErrorKind,
}

impl InvalidRangeSyntax {
    /// The expression as it was handed to the parser.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn kind(&self) -> &SyntaxErrorKind {
        &self.kind
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyntaxErrorKind {
    #[error("expression is empty")]
    Empty,
    #[error("no bound given")]
    MissingBounds,
    #[error("more than one ':'")]
    TooManyColons,
    #[error("{0:?} is neither a number nor '~'")]
    InvalidNumber(String),
    #[error("lower bound {lower} is greater than upper bound {upper}")]
    LowerAboveUpper { lower: f64, upper: f64 },
}

/// A parsed threshold expression.
///
/// ```rust
/// # use checkkit::Range;
/// let range = Range::parse("10:20").unwrap();
/// assert!(!range.matches(10.0));
/// assert!(range.matches(20.001));
///
/// let range: Range = "@10:20".parse().unwrap();
/// assert!(range.matches(15.0));
/// assert_eq!(range.to_string(), "@10:20");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    lower: f64,
    upper: f64,
    inverted: bool,
}

impl Range {
    /// Parses a threshold expression.
    ///
    /// Malformed expressions are rejected as a whole, bounds are never adjusted to
    /// make an expression fit.
    pub fn parse(expression: &str) -> Result<Range, InvalidRangeSyntax> {
        parse_expression(expression).map_err(|kind| InvalidRangeSyntax {
            expression: expression.to_owned(),
            kind,
        })
    }

    /// Returns true if `value` should raise an alert.
    ///
    /// Bounds are inclusive in both modes: a value sitting exactly on a bound is safe
    /// for a normal range and alerting for an inverted one. `NaN` never matches.
    pub fn matches(&self, value: f64) -> bool {
        if self.inverted {
            self.lower <= value && value <= self.upper
        } else {
            value < self.lower || value > self.upper
        }
    }

    /// The lower bound, `f64::NEG_INFINITY` if unbounded.
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// The upper bound, `f64::INFINITY` if unbounded.
    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn lower_inclusive(&self) -> bool {
        self.lower.is_finite()
    }

    pub fn upper_inclusive(&self) -> bool {
        self.upper.is_finite()
    }

    /// True if the range was prefixed with `@`.
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }
}

fn parse_expression(expression: &str) -> Result<Range, SyntaxErrorKind> {
    let (inverted, body) = match expression.strip_prefix('@') {
        Some(rest) => (true, rest),
        None => (false, expression),
    };

    if body.is_empty() {
        return Err(SyntaxErrorKind::Empty);
    }

    let (lower, upper) = match body.split_once(':') {
        None => (0.0, parse_bound(body, f64::INFINITY)?),
        Some((_, end)) if end.contains(':') => return Err(SyntaxErrorKind::TooManyColons),
        Some(("", "")) => return Err(SyntaxErrorKind::MissingBounds),
        Some((start, end)) => {
            let lower = match start {
                "" => f64::NEG_INFINITY,
                start => parse_bound(start, f64::NEG_INFINITY)?,
            };
            let upper = match end {
                "" => f64::INFINITY,
                end => parse_bound(end, f64::INFINITY)?,
            };
            (lower, upper)
        }
    };

    if lower > upper {
        return Err(SyntaxErrorKind::LowerAboveUpper { lower, upper });
    }

    Ok(Range {
        lower,
        upper,
        inverted,
    })
}

/// `~` stands for the infinity of the side it is written on.
fn parse_bound(text: &str, infinity: f64) -> Result<f64, SyntaxErrorKind> {
    if text == "~" {
        return Ok(infinity);
    }

    if !NUMBER.is_match(text) {
        return Err(SyntaxErrorKind::InvalidNumber(text.to_owned()));
    }

    text.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| SyntaxErrorKind::InvalidNumber(text.to_owned()))
}

impl FromStr for Range {
    type Err = InvalidRangeSyntax;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Range::parse(s)
    }
}

/// Writes the canonical form of the range, which parses back into the same range.
impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inverted {
            f.write_str("@")?;
        }

        if self.lower == 0.0 && self.upper.is_finite() {
            return write!(f, "{}", self.upper);
        }

        if self.lower.is_finite() {
            write!(f, "{}:", self.lower)?;
        } else {
            f.write_str("~:")?;
        }

        if self.upper.is_finite() {
            write!(f, "{}", self.upper)?;
        }

        Ok(())
    }
}
