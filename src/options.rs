//! Declarative description of the command line of a plugin.
//!
//! Every plugin lists the options it understands in a [PluginSpec]. The spec builds the
//! `clap::Command`, parses the threshold options into [Range]s and keeps them apart per
//! measurement, so the check itself only asks for [PluginArgs::thresholds].
//!
//! ```rust
//! # use checkkit::options::{OptionSpec, PluginSpec};
//! let spec = PluginSpec::new("check_load", "Checks the system load")
//!     .with_thresholds(&["load1", "load5", "load15"])
//!     .option(OptionSpec::parameter("host", "Host to check").short('H').required());
//!
//! let args = spec
//!     .parse_from(["check_load", "-H", "localhost", "-w", "2,4,6", "-c", "@10:"])
//!     .unwrap();
//!
//! assert_eq!(args.get("host"), Some("localhost"));
//! let load5 = args.thresholds("load5");
//! assert_eq!(load5.warning.unwrap().upper(), 4.0);
//! assert!(load5.critical.unwrap().is_inverted());
//! ```

use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::{CheckError, Range};

/// What a command line option is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionRole {
    /// A warning threshold for the measurements in `applies_to`.
    Warning,
    /// A critical threshold for the measurements in `applies_to`.
    Critical,
    /// Anything the probe needs, e.g. host or port.
    Parameter,
    /// A repeatable `-v` flag.
    Verbosity,
}

#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub flag: &'static str,
    pub short: Option<char>,
    pub description: &'static str,
    pub required: bool,
    /// Measurements a threshold option applies to, in the order of comma-separated values.
    /// Empty means all measurements.
    pub applies_to: &'static [&'static str],
    pub role: OptionRole,
    pub default: Option<&'static str>,
}

impl OptionSpec {
    fn new(flag: &'static str, description: &'static str, role: OptionRole) -> Self {
        OptionSpec {
            flag,
            short: None,
            description,
            required: false,
            applies_to: &[],
            role,
            default: None,
        }
    }

    pub fn parameter(flag: &'static str, description: &'static str) -> Self {
        Self::new(flag, description, OptionRole::Parameter)
    }

    pub fn warning(
        flag: &'static str,
        description: &'static str,
        applies_to: &'static [&'static str],
    ) -> Self {
        Self::new(flag, description, OptionRole::Warning).applies_to(applies_to)
    }

    pub fn critical(
        flag: &'static str,
        description: &'static str,
        applies_to: &'static [&'static str],
    ) -> Self {
        Self::new(flag, description, OptionRole::Critical).applies_to(applies_to)
    }

    pub fn verbosity() -> Self {
        Self::new("verbose", "Increase log output on stderr, repeatable", OptionRole::Verbosity)
            .short('v')
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn applies_to(mut self, measurements: &'static [&'static str]) -> Self {
        self.applies_to = measurements;
        self
    }

    pub fn default_value(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    fn is_threshold(&self) -> bool {
        matches!(self.role, OptionRole::Warning | OptionRole::Critical)
    }

    fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.flag)
            .long(self.flag)
            .help(self.description)
            .required(self.required);

        if let Some(short) = self.short {
            arg = arg.short(short);
        }

        arg = match self.role {
            OptionRole::Verbosity => arg.action(ArgAction::Count),
            OptionRole::Warning | OptionRole::Critical => arg
                .action(ArgAction::Set)
                .value_name("RANGE")
                .allow_hyphen_values(true),
            OptionRole::Parameter => arg.action(ArgAction::Set),
        };

        if let Some(default) = self.default {
            arg = arg.default_value(default);
        }

        arg
    }
}

/// The command line surface of one plugin.
#[derive(Debug, Clone)]
pub struct PluginSpec {
    name: &'static str,
    about: &'static str,
    options: Vec<OptionSpec>,
}

impl PluginSpec {
    pub fn new(name: &'static str, about: &'static str) -> Self {
        PluginSpec {
            name,
            about,
            options: Vec::new(),
        }
    }

    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    /// Adds the usual `-w/--warning` and `-c/--critical` options for the given measurements.
    pub fn with_thresholds(self, measurements: &'static [&'static str]) -> Self {
        self.option(
            OptionSpec::warning("warning", "Range which triggers a WARNING", measurements)
                .short('w'),
        )
        .option(
            OptionSpec::critical("critical", "Range which triggers a CRITICAL", measurements)
                .short('c'),
        )
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    pub fn command(&self) -> Command {
        self.options
            .iter()
            .fold(
                Command::new(self.name)
                    .about(self.about)
                    .version(env!("CARGO_PKG_VERSION")),
                |cmd, option| cmd.arg(option.to_arg()),
            )
    }

    /// Parses the arguments of the current process.
    pub fn parse(&self) -> Result<PluginArgs, CheckError> {
        self.parse_from(std::env::args_os())
    }

    pub fn parse_from<I, T>(&self, args: I) -> Result<PluginArgs, CheckError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.command().try_get_matches_from(args)?;

        let mut warning = HashMap::new();
        let mut critical = HashMap::new();

        for option in self.options.iter().filter(|o| o.is_threshold()) {
            let Some(value) = matches.get_one::<String>(option.flag) else {
                continue;
            };

            let ranges = parse_thresholds(option, value)?;
            let target = match option.role {
                OptionRole::Warning => &mut warning,
                _ => &mut critical,
            };
            target.extend(ranges);
        }

        let verbosity = self
            .options
            .iter()
            .filter(|o| o.role == OptionRole::Verbosity)
            .map(|o| matches.get_count(o.flag))
            .sum();

        tracing::debug!(plugin = self.name, ?warning, ?critical, "parsed thresholds");

        Ok(PluginArgs {
            matches,
            warning,
            critical,
            verbosity,
        })
    }
}

/// Key for thresholds which apply to every measurement.
const ALL: &str = "";

/// One range applies to every measurement in `applies_to`, otherwise ranges map positionally.
fn parse_thresholds(
    option: &OptionSpec,
    value: &str,
) -> Result<Vec<(&'static str, Range)>, CheckError> {
    let ranges = value
        .split(',')
        .map(Range::parse)
        .collect::<Result<Vec<_>, _>>()?;

    match (ranges.as_slice(), option.applies_to) {
        ([range], []) => Ok(vec![(ALL, *range)]),
        ([range], measurements) => Ok(measurements.iter().map(|m| (*m, *range)).collect()),
        (ranges, measurements) if ranges.len() == measurements.len() => {
            Ok(measurements.iter().copied().zip(ranges.iter().copied()).collect())
        }
        (ranges, measurements) => Err(CheckError::ThresholdCount {
            flag: option.flag,
            expected: measurements.len().max(1),
            given: ranges.len(),
        }),
    }
}

/// Warning and critical range of one measurement. `None` never triggers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Thresholds {
    pub warning: Option<Range>,
    pub critical: Option<Range>,
}

/// The parsed command line of a plugin.
#[derive(Debug)]
pub struct PluginArgs {
    matches: ArgMatches,
    warning: HashMap<&'static str, Range>,
    critical: HashMap<&'static str, Range>,
    verbosity: u8,
}

impl PluginArgs {
    pub fn thresholds(&self, measurement: &str) -> Thresholds {
        let lookup = |ranges: &HashMap<&'static str, Range>| {
            ranges.get(measurement).or_else(|| ranges.get(ALL)).copied()
        };

        Thresholds {
            warning: lookup(&self.warning),
            critical: lookup(&self.critical),
        }
    }

    /// Raw value of an option, `None` if it wasn't given and has no default.
    pub fn get(&self, flag: &str) -> Option<&str> {
        self.matches
            .try_get_one::<String>(flag)
            .ok()
            .flatten()
            .map(String::as_str)
    }

    pub fn value<T>(&self, flag: &'static str) -> Result<Option<T>, CheckError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.get(flag)
            .map(|value| {
                value.parse::<T>().map_err(|err| CheckError::InvalidOption {
                    flag,
                    value: value.to_owned(),
                    reason: err.to_string(),
                })
            })
            .transpose()
    }

    /// Like [PluginArgs::value] but fails if the option is missing.
    pub fn required<T>(&self, flag: &'static str) -> Result<T, CheckError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.value(flag)?.ok_or_else(|| CheckError::InvalidOption {
            flag,
            value: String::new(),
            reason: "option is required".to_owned(),
        })
    }

    /// Reads a number of seconds, fractions allowed.
    pub fn duration(&self, flag: &'static str) -> Result<Option<Duration>, CheckError> {
        let Some(secs) = self.value::<f64>(flag)? else {
            return Ok(None);
        };

        if secs <= 0.0 {
            return Err(CheckError::InvalidOption {
                flag,
                value: secs.to_string(),
                reason: "must be greater than zero".to_owned(),
            });
        }

        Duration::try_from_secs_f64(secs)
            .map(Some)
            .map_err(|err| CheckError::InvalidOption {
                flag,
                value: secs.to_string(),
                reason: err.to_string(),
            })
    }

    /// Number of times the verbosity flag was given.
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }
}
