use std::process;

use crate::CheckResult;

/// Settings of a [Reporter], fixed for the lifetime of the plugin process.
#[derive(Debug, Clone, Default)]
pub struct ReporterConfig {
    /// Printed in upper case in front of the status label, e.g. `TCP OK - ...`.
    pub plugin_name: Option<String>,
}

impl ReporterConfig {
    pub fn named(name: impl Into<String>) -> Self {
        ReporterConfig {
            plugin_name: Some(name.into()),
        }
    }
}

/// Turns a [CheckResult] into the text and exit code nagios understands.
///
/// ```rust
/// # use checkkit::{CheckResult, Reporter, ReporterConfig, ServiceState};
/// let reporter = Reporter::new(ReporterConfig::default());
/// let result = CheckResult::new(ServiceState::Ok, "everything is fine");
/// assert_eq!(reporter.render(&result), "OK - everything is fine");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    config: ReporterConfig,
}

impl Reporter {
    pub fn new(config: ReporterConfig) -> Self {
        Reporter { config }
    }

    pub fn config(&self) -> &ReporterConfig {
        &self.config
    }

    /// The first output line: status label, summary and performance data.
    pub fn status_line(&self, result: &CheckResult) -> String {
        let mut s = String::new();

        if let Some(ref name) = self.config.plugin_name {
            s.push_str(&format!("{} ", name.to_uppercase()));
        }

        s.push_str(result.state().label());
        s.push_str(" - ");
        s.push_str(&sanitize(&result.summary()));

        if !result.measurements().is_empty() {
            s.push_str(" |");

            for measurement in result.measurements() {
                s.push_str(&format!(" {}", measurement.perf_string()));
            }
        }

        s
    }

    /// The complete output, the status line followed by the detail lines of the result.
    pub fn render(&self, result: &CheckResult) -> String {
        let mut out = self.status_line(result);

        for line in result.details() {
            out.push('\n');
            out.push_str(&line.replace('|', "/"));
        }

        out
    }

    /// Prints [Reporter::render] and exits with the exit code of the result.
    pub fn print_and_exit(&self, result: &CheckResult) -> ! {
        tracing::debug!(state = %result.state(), "reporting check result");

        println!("{}", self.render(result));
        process::exit(result.exit_code());
    }
}

/// Keeps the summary on one line and free of the performance data separator.
fn sanitize(summary: &str) -> String {
    summary
        .chars()
        .map(|c| match c {
            '\r' | '\n' => ' ',
            '|' => '/',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{evaluate, Measurement, ProbeError, Range, ServiceState, Unit};

    fn measurement(value: i32) -> Measurement {
        Measurement::new("value", value).with_thresholds(
            Some(Range::parse("80").unwrap()),
            Some(Range::parse("90").unwrap()),
        )
    }

    #[test]
    fn test_status_line() {
        let reporter = Reporter::default();

        let result = evaluate(vec![measurement(50)]);
        assert_eq!(reporter.status_line(&result), "OK - value is 50 | value=50;80;90");

        let result = evaluate(vec![measurement(95), Measurement::new("other", 1)]);
        assert_eq!(
            reporter.status_line(&result),
            "CRITICAL - value is 95 | value=95;80;90 other=1"
        );

        let result = CheckResult::new(ServiceState::Warning, "no metrics here");
        assert_eq!(reporter.status_line(&result), "WARNING - no metrics here");
    }

    #[test]
    fn test_plugin_name() {
        let reporter = Reporter::new(ReporterConfig::named("tcp_port"));
        let result = CheckResult::new(ServiceState::Ok, "port 22 open");
        assert_eq!(reporter.status_line(&result), "TCP_PORT OK - port 22 open");
    }

    #[test]
    fn test_failed_measurement() {
        let reporter = Reporter::default();
        let result = evaluate(vec![
            Measurement::failed("rtt", ProbeError::Unavailable("host unreachable".to_owned()))
                .with_unit(Unit::Milliseconds),
            Measurement::new("loss", 0).with_unit(Unit::Percentage),
        ]);

        assert_eq!(
            reporter.status_line(&result),
            "UNKNOWN - rtt: host unreachable | rtt=U loss=0%"
        );
    }

    #[test]
    fn test_summary_stays_on_one_line() {
        let reporter = Reporter::default();
        let result = CheckResult::new(ServiceState::Unknown, "first\nsecond | third")
            .with_detail("detail | line");

        assert_eq!(
            reporter.render(&result),
            "UNKNOWN - first second / third\ndetail / line"
        );
    }

    #[test]
    fn test_separators_in_labels() {
        let reporter = Reporter::default();
        let result = evaluate(vec![Measurement::new("in|out", 1), Measurement::new("a;b", 2)]);

        let line = reporter.status_line(&result);
        assert_eq!(line, "OK - in/out is 1, a;b is 2 | in_out=1 a_b=2");
        assert_eq!(line.matches('|').count(), 1);
    }

    #[test]
    fn test_render_is_idempotent() {
        let reporter = Reporter::new(ReporterConfig::named("disk"));
        let input = || {
            vec![
                measurement(85),
                Measurement::new("inodes", 12.5).with_unit(Unit::Percentage),
            ]
        };

        let first = evaluate(input());
        let second = evaluate(input());

        assert_eq!(reporter.render(&first), reporter.render(&second));
        assert_eq!(first.exit_code(), second.exit_code());
        assert_eq!(first.exit_code(), 1);
    }
}
