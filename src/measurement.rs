use std::sync::Arc;

use crate::{IntoValue, ProbeError, Range, ServiceState, Unit};

/// A single observed value of a check, together with the thresholds it is judged by.
///
/// A measurement is either a value or the error which prevented the probe from producing one.
/// Failed measurements never look at their thresholds.
///
/// ```rust
/// # use checkkit::{Measurement, Range, ServiceState};
/// let warning = Range::parse("80").unwrap();
/// let critical = Range::parse("90").unwrap();
///
/// let m = Measurement::new("cpu", 95).with_thresholds(Some(warning), Some(critical));
/// assert_eq!(m.state(), ServiceState::Critical);
/// assert_eq!(m.perf_string(), "cpu=95;80;90");
/// ```
#[derive(Debug, Clone)]
pub struct Measurement {
    label: String,
    value: Result<f64, Arc<ProbeError>>,
    unit: Unit,
    warning: Option<Range>,
    critical: Option<Range>,
    min: Option<f64>,
    max: Option<f64>,
    failure_state: ServiceState,
}

impl Measurement {
    pub fn new(label: impl Into<String>, value: impl IntoValue) -> Self {
        Self::with_outcome(label.into(), Ok(value.into_value()))
    }

    /// A measurement whose probe failed. Reported as [ServiceState::Unknown] unless
    /// [Measurement::on_failure] says otherwise.
    pub fn failed(label: impl Into<String>, error: ProbeError) -> Self {
        Self::with_outcome(label.into(), Err(Arc::new(error)))
    }

    /// Creates a measurement straight from a probe outcome.
    pub fn from_probe(label: impl Into<String>, outcome: Result<f64, ProbeError>) -> Self {
        Self::with_outcome(label.into(), outcome.map_err(Arc::new))
    }

    fn with_outcome(label: String, value: Result<f64, Arc<ProbeError>>) -> Self {
        Measurement {
            label,
            value,
            unit: Unit::None,
            warning: None,
            critical: None,
            min: None,
            max: None,
            failure_state: ServiceState::Unknown,
        }
    }

    pub fn with_warning(mut self, range: Range) -> Self {
        self.warning = Some(range);
        self
    }

    pub fn with_critical(mut self, range: Range) -> Self {
        self.critical = Some(range);
        self
    }

    /// Sets both thresholds at once. `None` means the severity never triggers.
    pub fn with_thresholds(mut self, warning: Option<Range>, critical: Option<Range>) -> Self {
        self.warning = warning;
        self.critical = critical;
        self
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    /// Lower bound shown in the performance data. Display only.
    pub fn with_min(mut self, min: impl IntoValue) -> Self {
        self.min = Some(min.into_value());
        self
    }

    /// Upper bound shown in the performance data. Display only.
    pub fn with_max(mut self, max: impl IntoValue) -> Self {
        self.max = Some(max.into_value());
        self
    }

    /// The state to report if the value couldn't be acquired.
    pub fn on_failure(mut self, state: ServiceState) -> Self {
        self.failure_state = state;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The observed value, `None` if the probe failed.
    pub fn value(&self) -> Option<f64> {
        self.value.as_ref().ok().copied()
    }

    pub fn error(&self) -> Option<&ProbeError> {
        self.value.as_ref().err().map(|e| e.as_ref())
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn warning(&self) -> Option<&Range> {
        self.warning.as_ref()
    }

    pub fn critical(&self) -> Option<&Range> {
        self.critical.as_ref()
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// The value if it can be compared against thresholds.
    fn comparable(&self) -> Option<f64> {
        self.value().filter(|v| !v.is_nan())
    }

    /// Critical is checked before warning, a value matching both is critical.
    pub fn state(&self) -> ServiceState {
        let Some(value) = self.comparable() else {
            return self.failure_state;
        };

        if self.critical.map_or(false, |r| r.matches(value)) {
            ServiceState::Critical
        } else if self.warning.map_or(false, |r| r.matches(value)) {
            ServiceState::Warning
        } else {
            ServiceState::Ok
        }
    }

    /// Short human readable text, used for the summary.
    pub fn describe(&self) -> String {
        match (&self.value, self.comparable()) {
            (Err(err), _) => format!("{}: {}", self.label, err),
            (Ok(_), None) => format!("{}: value is not a number", self.label),
            (Ok(_), Some(value)) => format!("{} is {}{}", self.label, value, self.unit),
        }
    }

    /// Renders `label=value[unit];warn;crit;min;max` with empty trailing fields removed.
    ///
    /// A measurement without a finite value is rendered as `U`, meaning undetermined.
    /// Infinite min or max values are left out.
    pub fn perf_string(&self) -> String {
        let value = match self.comparable().filter(|v| v.is_finite()) {
            Some(value) => format!("{}{}", value, self.unit),
            None => "U".to_owned(),
        };
        let bound = |b: Option<f64>| {
            b.filter(|b| b.is_finite())
                .map(|b| b.to_string())
                .unwrap_or_default()
        };

        let fields = [
            value,
            self.warning.map(|r| r.to_string()).unwrap_or_default(),
            self.critical.map(|r| r.to_string()).unwrap_or_default(),
            bound(self.min),
            bound(self.max),
        ];

        let s = format!("{}={}", self.perf_label(), fields.join(";"));
        s.trim_end_matches(';').to_owned()
    }

    fn perf_label(&self) -> String {
        // replace `=` and the perfdata separators
        let label = self.label.replace(['=', '|', ';'], "_");

        // keep it on one line
        let label = label.replace(['\r', '\n'], " ");

        // quote `'`
        let label = label.replace('\'', "''");

        // quote if contains spaces
        if label.contains(' ') {
            format!("'{}'", label)
        } else {
            label
        }
    }
}
