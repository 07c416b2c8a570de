use crate::{CheckResult, Runner, RunnerResult, ServiceState};

/// Runs the given closure and reports any error it returns with `error_state`.
///
/// ```rust
/// # use checkkit::{safe_run, CheckResult, ServiceState};
/// let result = safe_run(|| Err::<CheckResult, _>("disk not mounted"), ServiceState::Critical);
/// assert_eq!(result.into_check_result().state(), ServiceState::Critical);
/// ```
pub fn safe_run<E, F>(f: F, error_state: ServiceState) -> RunnerResult<E>
where
    F: FnOnce() -> Result<CheckResult, E> + Send + 'static,
    E: Send + 'static,
{
    Runner::new().on_error(move |_| error_state).safe_run(f)
}
