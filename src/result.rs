use crate::{CheckError, Measurement, ServiceState};

/// The outcome of one plugin run: an overall state, a summary and the measurements which
/// led to it.
///
/// Build it with [CheckResult::evaluate] (or the *check_result!* macro) to derive the state from
/// measurements, or with [CheckResult::new] for categorical checks which have no numeric value.
#[derive(Debug, Clone)]
pub struct CheckResult {
    state: ServiceState,
    summary: Option<String>,
    measurements: Vec<Measurement>,
    details: Vec<String>,
}

/// Shorthand for [CheckResult::evaluate].
pub fn evaluate(measurements: Vec<Measurement>) -> CheckResult {
    CheckResult::evaluate(measurements)
}

impl CheckResult {
    /// Determines the overall state as the most severe state of all measurements.
    ///
    /// An empty list of measurements is [ServiceState::Ok].
    pub fn evaluate(measurements: Vec<Measurement>) -> Self {
        let state = measurements
            .iter()
            .map(Measurement::state)
            .max()
            .unwrap_or(ServiceState::Ok);

        CheckResult {
            state,
            summary: None,
            measurements,
            details: Vec::new(),
        }
    }

    /// A result with a fixed state and no measurements.
    pub fn new(state: ServiceState, summary: impl Into<String>) -> Self {
        CheckResult {
            state,
            summary: Some(summary.into()),
            measurements: Vec::new(),
            details: Vec::new(),
        }
    }

    /// Replaces the generated summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Adds a line which is printed below the status line.
    pub fn with_detail(mut self, line: impl Into<String>) -> Self {
        self.details.push(line.into());
        self
    }

    /// Folds an additional verdict into the overall state. The more severe state wins.
    pub fn escalate(mut self, state: ServiceState) -> Self {
        self.state = self.state.worst(state);
        self
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn exit_code(&self) -> i32 {
        self.state.exit_code()
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn details(&self) -> &[String] {
        &self.details
    }

    /// The summary set by the check or, if there is none, a description of the measurements
    /// responsible for the overall state.
    pub fn summary(&self) -> String {
        if let Some(ref summary) = self.summary {
            return summary.clone();
        }

        if self.measurements.is_empty() {
            return "no measurements".to_owned();
        }

        let relevant: Vec<String> = self
            .measurements
            .iter()
            .filter(|m| self.state == ServiceState::Ok || m.state() == self.state)
            .map(Measurement::describe)
            .collect();

        if relevant.is_empty() {
            // state was escalated past every measurement
            return self
                .measurements
                .iter()
                .map(Measurement::describe)
                .collect::<Vec<_>>()
                .join(", ");
        }

        relevant.join(", ")
    }
}

/// Reports a configuration or acquisition error, with usage text as detail lines.
impl From<&CheckError> for CheckResult {
    fn from(err: &CheckError) -> Self {
        err.details()
            .into_iter()
            .fold(CheckResult::new(err.state(), err.to_string()), CheckResult::with_detail)
    }
}
