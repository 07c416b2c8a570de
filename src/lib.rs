//! The checkkit crate provides the threshold language, status evaluation and output protocol
//! shared by nagios/icinga compatible check plugins.
//!
//! A check builds a list of [Measurement]s, evaluates them into a [CheckResult] and hands it to
//! a [Reporter], which prints the status line and exits with the matching exit code.
//!
//! ```rust
//! # #[macro_use]
//! # extern crate checkkit;
//! # use checkkit::{Measurement, Range, Reporter, ReporterConfig, ServiceState, Unit};
//! # fn main() {
//! let disk = Measurement::new("used", 85)
//!     .with_unit(Unit::Percentage)
//!     .with_warning(Range::parse("80").unwrap())
//!     .with_critical(Range::parse("90").unwrap());
//!
//! let result = check_result![disk];
//! assert_eq!(result.state(), ServiceState::Warning);
//!
//! let reporter = Reporter::new(ReporterConfig::named("disk"));
//! assert_eq!(
//!     reporter.status_line(&result),
//!     "DISK WARNING - used is 85% | used=85%;80;90"
//! );
//! # }
//! ```

use std::fmt;

#[macro_use]
mod macros;

pub mod error;
mod helper;
pub mod logging;
mod measurement;
pub mod options;
pub mod probe;
mod range;
mod reporter;
mod result;
mod runner;

pub use crate::error::{CheckError, ProbeError};
pub use crate::helper::safe_run;
pub use crate::measurement::Measurement;
pub use crate::range::{InvalidRangeSyntax, Range, SyntaxErrorKind};
pub use crate::reporter::{Reporter, ReporterConfig};
pub use crate::result::{evaluate, CheckResult};
pub use crate::runner::{Runner, RunnerResult};

/// Represents a service state from nagios.
///
/// The ordering is the precedence used when several states compete for the overall result:
/// `Ok < Warning < Critical < Unknown`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceState {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl ServiceState {
    /// Returns the corresponding nagios exit code to signal the service state of self.
    pub fn exit_code(&self) -> i32 {
        match self {
            ServiceState::Ok => 0,
            ServiceState::Warning => 1,
            ServiceState::Critical => 2,
            ServiceState::Unknown => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServiceState::Ok => "OK",
            ServiceState::Warning => "WARNING",
            ServiceState::Critical => "CRITICAL",
            ServiceState::Unknown => "UNKNOWN",
        }
    }

    /// The more severe of both states.
    pub fn worst(self, other: ServiceState) -> ServiceState {
        self.max(other)
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ServiceState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ok" => Ok(ServiceState::Ok),
            "warning" => Ok(ServiceState::Warning),
            "critical" => Ok(ServiceState::Critical),
            "unknown" => Ok(ServiceState::Unknown),
            other => Err(format!("unknown service state {:?}", other)),
        }
    }
}

/// Unit of measurement appended to a value in the performance data.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Unit {
    #[default]
    None,
    Seconds,
    Milliseconds,
    Microseconds,
    Percentage,
    Bytes,
    Kilobytes,
    Megabytes,
    Gigabytes,
    Terabytes,
    Counter,
    Other(UnitString),
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Unit::None => "",
            Unit::Seconds => "s",
            Unit::Milliseconds => "ms",
            Unit::Microseconds => "us",
            Unit::Percentage => "%",
            Unit::Bytes => "B",
            Unit::Kilobytes => "KB",
            Unit::Megabytes => "MB",
            Unit::Gigabytes => "GB",
            Unit::Terabytes => "TB",
            Unit::Counter => "c",
            Unit::Other(s) => s.as_str(),
        };
        f.write_str(s)
    }
}

/// A custom unit which is known not to break the performance data syntax.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitString(String);

#[derive(Debug, thiserror::Error)]
#[error("invalid unit {0:?}: units must not contain digits, whitespace, quotes, '=', ';' or '|'")]
pub struct InvalidUnit(String);

impl UnitString {
    pub fn new(s: impl Into<String>) -> Result<Self, InvalidUnit> {
        let s = s.into();
        let invalid = s
            .chars()
            .any(|c| c.is_ascii_digit() || c.is_whitespace() || "'\"=;|".contains(c));

        if invalid {
            return Err(InvalidUnit(s));
        }

        Ok(UnitString(s))
    }

    /// Skips validation. Only use this for units you know are valid.
    pub fn new_unchecked(s: impl Into<String>) -> Self {
        UnitString(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Numeric types which can be used as the value of a [Measurement].
pub trait IntoValue {
    fn into_value(self) -> f64;
}

impl_into_value!(u8, u16, u32, u64, u128, usize);
impl_into_value!(i8, i16, i32, i64, i128, isize);
impl_into_value!(f32, f64);
