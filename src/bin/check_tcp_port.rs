//! Checks that one or more TCP ports of a host accept connections.
//!
//! Every port becomes one measurement holding the connect time in seconds. A port which
//! refuses the connection or doesn't answer in time is CRITICAL, a host name which doesn't
//! resolve is UNKNOWN.
//!
//! ```text
//! check_tcp_port -H 127.0.0.1 -p 22,80,443 -w 0.5 -c 2 -t 5
//! ```

use std::time::Duration;

use checkkit::options::{OptionSpec, PluginArgs, PluginSpec};
use checkkit::probe::{Probe, ProbeExecutor, TcpConnectProbe};
use checkkit::{
    logging, CheckError, CheckResult, ProbeError, Reporter, ReporterConfig, Runner, ServiceState,
    Unit,
};

/// Extra time the runner grants on top of the probe deadline before giving up.
const GRACE: Duration = Duration::from_secs(1);

fn plugin() -> PluginSpec {
    PluginSpec::new("check_tcp_port", "Checks that TCP ports accept connections")
        .option(
            OptionSpec::parameter("host", "Host to check, i.e. 127.0.0.1")
                .short('H')
                .required(),
        )
        .option(
            OptionSpec::parameter("port", "Comma-separated ports to check, i.e. 22,80")
                .short('p')
                .required(),
        )
        .option(
            OptionSpec::parameter("timeout", "Seconds to wait for all connections")
                .short('t')
                .default_value("5"),
        )
        .option(
            OptionSpec::parameter("workers", "Number of ports probed at the same time")
                .short('W')
                .default_value("4"),
        )
        .with_thresholds(&[])
        .option(OptionSpec::verbosity())
}

fn main() {
    let reporter = Reporter::new(ReporterConfig::named("tcp"));

    let (args, timeout) = match plugin().parse().and_then(|args| {
        let timeout = args.duration("timeout")?.unwrap_or(Duration::from_secs(5));
        Ok((args, timeout))
    }) {
        Ok(parsed) => parsed,
        Err(err) => reporter.print_and_exit(&CheckResult::from(&err)),
    };

    logging::init(args.verbosity());

    Runner::<CheckError>::new()
        .with_timeout(timeout + GRACE, ServiceState::Critical)
        .safe_run(move || check(&args, timeout))
        .print_and_exit(&reporter)
}

fn check(args: &PluginArgs, timeout: Duration) -> Result<CheckResult, CheckError> {
    let host: String = args.required("host")?;
    let ports = parse_ports(args.get("port").unwrap_or_default())?;
    let workers: usize = args.required("workers")?;

    tracing::info!(%host, ?ports, workers, ?timeout, "probing ports");

    let probes = ports
        .iter()
        .map(|port| Box::new(TcpConnectProbe::new(host.clone(), *port)) as Box<dyn Probe>)
        .collect();

    let measurements = ProbeExecutor::new(workers, timeout)
        .run(probes)
        .into_iter()
        .map(|outcome| {
            let failure_state = failure_state(&outcome.value);
            let thresholds = args.thresholds(&outcome.label);

            outcome
                .into_measurement()
                .with_unit(Unit::Seconds)
                .with_thresholds(thresholds.warning, thresholds.critical)
                .with_min(0)
                .on_failure(failure_state)
        })
        .collect();

    Ok(CheckResult::evaluate(measurements))
}

/// A closed or silent port is the outcome being checked for, not a broken probe.
fn failure_state(value: &Result<f64, ProbeError>) -> ServiceState {
    match value {
        Err(ProbeError::Connect { .. }) | Err(ProbeError::Timeout { .. }) => {
            ServiceState::Critical
        }
        _ => ServiceState::Unknown,
    }
}

fn parse_ports(value: &str) -> Result<Vec<u16>, CheckError> {
    let invalid = |reason: &str| CheckError::InvalidOption {
        flag: "port",
        value: value.to_owned(),
        reason: reason.to_owned(),
    };

    let mut ports = Vec::new();
    for part in value.split(',') {
        let port: u16 = part
            .trim()
            .parse()
            .map_err(|_| invalid("ports are numbers between 1 and 65535"))?;

        if port == 0 {
            return Err(invalid("port 0 can't be connected to"));
        }

        if !ports.contains(&port) {
            ports.push(port);
        }
    }

    Ok(ports)
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn test_parse_ports() {
        assert_eq!(parse_ports("22").unwrap(), vec![22]);
        assert_eq!(parse_ports("22, 80,443,80").unwrap(), vec![22, 80, 443]);
        assert!(parse_ports("").is_err());
        assert!(parse_ports("0").is_err());
        assert!(parse_ports("70000").is_err());
        assert!(parse_ports("ssh").is_err());
    }

    #[test]
    fn test_failure_state() {
        let refused = Err(ProbeError::Connect {
            target: "localhost:1".to_owned(),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        });
        assert_eq!(failure_state(&refused), ServiceState::Critical);

        let timeout = Err(ProbeError::Timeout {
            after: Duration::from_secs(1),
        });
        assert_eq!(failure_state(&timeout), ServiceState::Critical);

        let unresolved = Err(ProbeError::Resolve {
            target: "nowhere.invalid".to_owned(),
            reason: "not found".to_owned(),
        });
        assert_eq!(failure_state(&unresolved), ServiceState::Unknown);
    }

    #[test]
    fn test_plugin_options() {
        let args = plugin()
            .parse_from(["check_tcp_port", "-H", "localhost", "-p", "22", "-w", "0.5"])
            .unwrap();

        assert_eq!(args.get("workers"), Some("4"));
        assert!(args.thresholds("port_22").warning.is_some());
        assert!(args.thresholds("port_22").critical.is_none());
    }
}
