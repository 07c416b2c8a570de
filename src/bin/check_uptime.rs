//! Checks how long the local system has been running.
//!
//! The uptime is compared in the unit chosen with `--unit`. Use a lower bound to alert on a
//! recent reboot, an upper bound to alert on a machine which hasn't been rebooted for too long:
//!
//! ```text
//! check_uptime --unit min -w 30: -c 10:
//! check_uptime --unit day -w 90 -c 180
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use checkkit::options::{OptionSpec, PluginArgs, PluginSpec};
use checkkit::{
    logging, CheckError, CheckResult, Measurement, ProbeError, Reporter, ReporterConfig, Runner,
    ServiceState, Unit, UnitString,
};
use sysinfo::System;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn seconds(&self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3_600.0,
            TimeUnit::Days => 86_400.0,
        }
    }

    fn perf_unit(&self) -> Unit {
        match self {
            TimeUnit::Seconds => Unit::Seconds,
            other => Unit::Other(UnitString::new_unchecked(other.to_string())),
        }
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sec" => Ok(TimeUnit::Seconds),
            "min" => Ok(TimeUnit::Minutes),
            "hr" => Ok(TimeUnit::Hours),
            "day" => Ok(TimeUnit::Days),
            _ => Err("expected one of sec, min, hr, day".to_owned()),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimeUnit::Seconds => "sec",
            TimeUnit::Minutes => "min",
            TimeUnit::Hours => "hr",
            TimeUnit::Days => "day",
        };
        f.write_str(s)
    }
}

fn plugin() -> PluginSpec {
    PluginSpec::new("check_uptime", "Checks how long the system has been running")
        .with_thresholds(&["uptime"])
        .option(
            OptionSpec::parameter("unit", "Unit of the thresholds: sec, min, hr or day")
                .short('u')
                .default_value("sec"),
        )
        .option(
            OptionSpec::parameter("timeout", "Seconds before the check gives up")
                .short('t')
                .default_value("10"),
        )
        .option(OptionSpec::verbosity())
}

fn main() {
    let reporter = Reporter::new(ReporterConfig::named("uptime"));

    let (args, timeout) = match plugin().parse().and_then(|args| {
        let timeout = args.duration("timeout")?.unwrap_or(Duration::from_secs(10));
        Ok((args, timeout))
    }) {
        Ok(parsed) => parsed,
        Err(err) => reporter.print_and_exit(&CheckResult::from(&err)),
    };

    logging::init(args.verbosity());

    Runner::<CheckError>::new()
        .with_timeout(timeout, ServiceState::Unknown)
        .safe_run(move || check(&args, read_uptime()?))
        .print_and_exit(&reporter)
}

fn read_uptime() -> Result<u64, ProbeError> {
    if !sysinfo::IS_SUPPORTED_SYSTEM {
        return Err(ProbeError::Unavailable(
            "uptime is not available on this system".to_owned(),
        ));
    }

    Ok(System::uptime())
}

fn check(args: &PluginArgs, uptime_secs: u64) -> Result<CheckResult, CheckError> {
    let unit: TimeUnit = args.required("unit")?;
    let thresholds = args.thresholds("uptime");

    let value = uptime_secs as f64 / unit.seconds();
    // keep the perfdata readable for the larger units
    let value = (value * 1_000.0).round() / 1_000.0;

    tracing::debug!(uptime_secs, %unit, value, "converted uptime");

    let measurement = Measurement::new("uptime", value)
        .with_unit(unit.perf_unit())
        .with_thresholds(thresholds.warning, thresholds.critical)
        .with_min(0);

    Ok(CheckResult::evaluate(vec![measurement])
        .with_summary(format!("system uptime is {}", pretty(uptime_secs))))
}

/// `3 days, 4:05:06`
fn pretty(secs: u64) -> String {
    let days = secs / 86_400;
    let clock = format!(
        "{}:{:02}:{:02}",
        secs % 86_400 / 3_600,
        secs % 3_600 / 60,
        secs % 60
    );

    match days {
        0 => clock,
        1 => format!("1 day, {}", clock),
        days => format!("{} days, {}", days, clock),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(argv: &[&str], uptime_secs: u64) -> CheckResult {
        let args = plugin().parse_from(argv.iter().copied()).unwrap();
        match check(&args, uptime_secs) {
            Ok(result) => result,
            Err(err) => CheckResult::from(&err),
        }
    }

    #[test]
    fn test_pretty() {
        assert_eq!(pretty(0), "0:00:00");
        assert_eq!(pretty(3_661), "1:01:01");
        assert_eq!(pretty(86_400 + 59), "1 day, 0:00:59");
        assert_eq!(pretty(3 * 86_400 + 4 * 3_600 + 5 * 60 + 6), "3 days, 4:05:06");
    }

    #[test]
    fn test_recent_reboot() {
        let argv = ["check_uptime", "--unit", "min", "-w", "30:", "-c", "10:"];

        assert_eq!(run(&argv, 5 * 60).state(), ServiceState::Critical);
        assert_eq!(run(&argv, 20 * 60).state(), ServiceState::Warning);
        assert_eq!(run(&argv, 30 * 60).state(), ServiceState::Ok);
    }

    #[test]
    fn test_long_running() {
        let argv = ["check_uptime", "-u", "day", "-w", "90", "-c", "180"];

        assert_eq!(run(&argv, 10 * 86_400).state(), ServiceState::Ok);
        assert_eq!(run(&argv, 100 * 86_400).state(), ServiceState::Warning);
        assert_eq!(run(&argv, 200 * 86_400).state(), ServiceState::Critical);
    }

    #[test]
    fn test_output() {
        let result = run(&["check_uptime", "-u", "hr", "-c", "~:48"], 90 * 60);
        let reporter = Reporter::new(ReporterConfig::named("uptime"));

        assert_eq!(
            reporter.render(&result),
            "UPTIME OK - system uptime is 1:30:00 | uptime=1.5hr;;~:48;0"
        );
    }

    #[test]
    fn test_invalid_unit() {
        let result = run(&["check_uptime", "-u", "weeks"], 60);
        assert_eq!(result.state(), ServiceState::Unknown);
        assert_eq!(
            result.summary(),
            "invalid value \"weeks\" for --unit: expected one of sec, min, hr, day"
        );
    }
}
