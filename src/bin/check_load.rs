//! Checks the 1, 5 and 15 minute load averages of the local system.
//!
//! Thresholds are given once for all three averages or as three comma-separated ranges:
//!
//! ```text
//! check_load -w 4,3,2 -c 8,6,4
//! ```

use std::time::Duration;

use checkkit::options::{OptionSpec, PluginArgs, PluginSpec};
use checkkit::{
    logging, CheckError, CheckResult, Measurement, ProbeError, Reporter, ReporterConfig, Runner,
    ServiceState,
};
use sysinfo::System;

const MEASUREMENTS: &[&str] = &["load1", "load5", "load15"];

fn plugin() -> PluginSpec {
    PluginSpec::new("check_load", "Checks the 1, 5 and 15 minute load averages")
        .with_thresholds(MEASUREMENTS)
        .option(
            OptionSpec::parameter("timeout", "Seconds before the check gives up")
                .short('t')
                .default_value("10"),
        )
        .option(OptionSpec::verbosity())
}

fn main() {
    let reporter = Reporter::new(ReporterConfig::named("load"));

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
        .safe_run(move || check(&args, read_load()?))
        .print_and_exit(&reporter)
}

fn read_load() -> Result<[f64; 3], ProbeError> {
    if !sysinfo::IS_SUPPORTED_SYSTEM {
        return Err(ProbeError::Unavailable(
            "load averages are not available on this system".to_owned(),
        ));
    }

    let load = System::load_average();
    tracing::debug!(one = load.one, five = load.five, fifteen = load.fifteen, "read load averages");

    Ok([load.one, load.five, load.fifteen])
}

fn check(args: &PluginArgs, load: [f64; 3]) -> Result<CheckResult, CheckError> {
    if let Some(bad) = load.iter().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(ProbeError::Malformed(format!("load average {}", bad)).into());
    }

    let measurements = MEASUREMENTS
        .iter()
        .zip(load)
        .map(|(label, value)| {
            let thresholds = args.thresholds(label);
            Measurement::new(*label, value)
                .with_thresholds(thresholds.warning, thresholds.critical)
                .with_min(0)
        })
        .collect();

    Ok(CheckResult::evaluate(measurements).with_summary(format!(
        "load average is {:.2}, {:.2}, {:.2}",
        load[0], load[1], load[2]
    )))
}
