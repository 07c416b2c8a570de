use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::{CheckResult, Reporter, ServiceState};

/// Runs a check and makes sure that whatever happens inside of it ends up as a valid
/// service state: errors, panics and an exceeded timeout included.
pub struct Runner<E> {
    on_error: Option<Box<dyn FnOnce(&E) -> ServiceState>>,
    timeout: Option<(Duration, ServiceState)>,
}

impl<E> Runner<E> {
    pub fn new() -> Self {
        Self {
            on_error: None,
            timeout: None,
        }
    }

    /// Chooses the state an error is reported with. Without a handler errors are
    /// [ServiceState::Unknown].
    pub fn on_error(mut self, f: impl FnOnce(&E) -> ServiceState + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Gives up on the check after `after` and reports `state` instead.
    pub fn with_timeout(mut self, after: Duration, state: ServiceState) -> Self {
        self.timeout = Some((after, state));
        self
    }

    /// Runs `f`, applying the `on_error` handler and the timeout set on this runner.
    pub fn safe_run<F>(self, f: F) -> RunnerResult<E>
    where
        F: FnOnce() -> Result<CheckResult, E> + Send + 'static,
        E: Send + 'static,
    {
        let outcome = match self.timeout {
            None => catch_fault(f),
            Some((after, state)) => match run_with_deadline(f, after) {
                Some(outcome) => outcome,
                None => {
                    tracing::warn!(?after, "check did not finish in time");
                    return RunnerResult::TimedOut { after, state };
                }
            },
        };

        match outcome {
            Ok(Ok(result)) => RunnerResult::Ok(result),
            Ok(Err(err)) => {
                let state = self
                    .on_error
                    .map(|f| f(&err))
                    .unwrap_or(ServiceState::Unknown);

                RunnerResult::Err(state, err)
            }
            Err(message) => {
                tracing::error!(%message, "check panicked");
                RunnerResult::Fault(message)
            }
        }
    }
}

impl<E> Default for Runner<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// `None` if the deadline passed first. The check thread is left behind, the process is
/// expected to exit right after reporting.
fn run_with_deadline<T, F>(f: F, after: Duration) -> Option<Result<T, String>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("check".to_owned())
        .spawn(move || {
            let _ = tx.send(catch_fault(f));
        });

    if let Err(err) = spawned {
        return Some(Err(format!("could not start check thread: {}", err)));
    }

    match rx.recv_timeout(after) {
        Ok(outcome) => Some(outcome),
        Err(RecvTimeoutError::Timeout) => None,
        Err(RecvTimeoutError::Disconnected) => {
            Some(Err("check thread ended without a result".to_owned()))
        }
    }
}

fn catch_fault<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

pub enum RunnerResult<E> {
    Ok(CheckResult),
    Err(ServiceState, E),
    /// The check panicked.
    Fault(String),
    TimedOut {
        after: Duration,
        state: ServiceState,
    },
}

impl<E: Display> RunnerResult<E> {
    pub fn into_check_result(self) -> CheckResult {
        match self {
            RunnerResult::Ok(result) => result,
            RunnerResult::Err(state, err) => CheckResult::new(state, format!("{:#}", err)),
            RunnerResult::Fault(message) => CheckResult::new(
                ServiceState::Unknown,
                format!("internal fault: {}", message),
            ),
            RunnerResult::TimedOut { after, state } => CheckResult::new(
                state,
                format!("plugin timed out after {} seconds", after.as_secs_f64()),
            ),
        }
    }

    /// This will print the result or the error with the state chosen by the `on_error` handler
    /// and exit with the matching exit code.
    pub fn print_and_exit(self, reporter: &Reporter) -> ! {
        reporter.print_and_exit(&self.into_check_result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Measurement, ReporterConfig};

    #[derive(Debug, thiserror::Error)]
    #[error("woops")]
    struct EmptyError;

    #[test]
    fn test_runner_ok() {
        let result = Runner::<EmptyError>::new()
            .on_error(|_| panic!("handler must not run"))
            .safe_run(|| Ok(CheckResult::evaluate(vec![Measurement::new("test", 1)])));

        assert!(matches!(result, RunnerResult::Ok(_)));
    }

    #[test]
    fn test_runner_error_defaults_to_unknown() {
        let result = Runner::<EmptyError>::new().safe_run(|| Err(EmptyError));

        assert!(matches!(result, RunnerResult::Err(ServiceState::Unknown, _)));

        let result = result.into_check_result();
        assert_eq!(result.exit_code(), 3);
        assert_eq!(result.summary(), "woops");
    }

    #[test]
    fn test_runner_error_handler() {
        let result = Runner::<EmptyError>::new()
            .on_error(|_| ServiceState::Critical)
            .safe_run(|| Err(EmptyError));

        assert!(matches!(result, RunnerResult::Err(ServiceState::Critical, _)));
    }

    #[test]
    fn test_runner_anyhow_context() {
        use anyhow::Context;

        let result = Runner::<anyhow::Error>::new()
            .safe_run(|| {
                Err(anyhow::anyhow!("connection refused")).context("could not query host")
            })
            .into_check_result();

        let reporter = Reporter::new(ReporterConfig::named("foo"));
        assert_eq!(
            reporter.render(&result),
            "FOO UNKNOWN - could not query host: connection refused"
        );
    }

    #[test]
    fn test_runner_panic_is_unknown() {
        let result = Runner::<EmptyError>::new().safe_run(|| panic!("index out of bounds"));
        assert!(matches!(result, RunnerResult::Fault(_)));

        let result = result.into_check_result();
        assert_eq!(result.state(), ServiceState::Unknown);
        assert_eq!(result.summary(), "internal fault: index out of bounds");
    }

    #[test]
    fn test_runner_timeout() {
        let result = Runner::<EmptyError>::new()
            .with_timeout(Duration::from_millis(50), ServiceState::Critical)
            .safe_run(|| {
                thread::sleep(Duration::from_secs(2));
                Ok(CheckResult::new(ServiceState::Ok, "too late"))
            })
            .into_check_result();

        assert_eq!(result.state(), ServiceState::Critical);
        assert_eq!(result.summary(), "plugin timed out after 0.05 seconds");
    }

    #[test]
    fn test_runner_finishes_before_timeout() {
        let result = Runner::<EmptyError>::new()
            .with_timeout(Duration::from_secs(5), ServiceState::Unknown)
            .safe_run(|| panic!("boom"))
            .into_check_result();

        assert_eq!(result.summary(), "internal fault: boom");
    }
}
