use std::time::Duration;

use crate::range::InvalidRangeSyntax;
use crate::ServiceState;

/// Raised by a probe which couldn't produce a value.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("could not resolve {target}: {reason}")]
    Resolve { target: String, reason: String },

    #[error("connection to {target} failed: {source}")]
    Connect {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Unavailable(String),

    #[error("unparsable probe output: {0}")]
    Malformed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Everything that can stop a plugin from producing a measurement based result.
///
/// All variants are configuration, acquisition or internal faults and map to
/// [ServiceState::Unknown].
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    InvalidRange(#[from] InvalidRangeSyntax),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error("invalid arguments: {message}")]
    Usage { message: String, usage: String },

    #[error("help requested")]
    HelpRequested(String),

    #[error("version requested")]
    VersionRequested(String),

    #[error("invalid value {value:?} for --{flag}: {reason}")]
    InvalidOption {
        flag: &'static str,
        value: String,
        reason: String,
    },

    #[error("--{flag} takes 1 or {expected} comma-separated ranges, got {given}")]
    ThresholdCount {
        flag: &'static str,
        expected: usize,
        given: usize,
    },

    #[error("internal fault: {0}")]
    Internal(String),
}

impl CheckError {
    pub fn state(&self) -> ServiceState {
        ServiceState::Unknown
    }

    /// Additional lines printed after the status line, e.g. the usage text.
    pub fn details(&self) -> Vec<String> {
        match self {
            CheckError::Usage { usage: text, .. }
            | CheckError::HelpRequested(text)
            | CheckError::VersionRequested(text) => {
                text.lines().map(str::to_owned).collect()
            }
            _ => Vec::new(),
        }
    }
}

impl From<clap::Error> for CheckError {
    fn from(err: clap::Error) -> Self {
        use clap::error::{ContextKind, ContextValue, ErrorKind};

        let text = err.to_string();
        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                CheckError::HelpRequested(text.trim_end().to_owned())
            }
            ErrorKind::DisplayVersion => CheckError::VersionRequested(text.trim_end().to_owned()),
            kind => {
                let first = text.lines().next().unwrap_or_default();
                let message = match (kind, err.get(ContextKind::InvalidArg)) {
                    (ErrorKind::MissingRequiredArgument, Some(ContextValue::Strings(args))) => {
                        format!("missing required arguments: {}", args.join(", "))
                    }
                    (ErrorKind::MissingRequiredArgument, Some(ContextValue::String(arg))) => {
                        format!("missing required arguments: {}", arg)
                    }
                    _ => first.trim_start_matches("error: ").to_owned(),
                };

                CheckError::Usage {
                    message,
                    usage: usage_section(&text).to_owned(),
                }
            }
        }
    }
}

/// Everything from clap's `Usage:` line on, the error header is already in the message.
fn usage_section(text: &str) -> &str {
    match text.find("Usage:") {
        Some(start) => text[start..].trim(),
        None => text.split_once('\n').map_or("", |(_, rest)| rest.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Range;

    #[test]
    fn test_every_error_is_unknown() {
        let errors = [
            CheckError::from(Range::parse("abc").unwrap_err()),
            CheckError::from(ProbeError::Unavailable("gone".to_owned())),
            CheckError::Usage {
                message: "nope".to_owned(),
                usage: String::new(),
            },
            CheckError::Internal("boom".to_owned()),
        ];

        for err in &errors {
            assert_eq!(err.state(), ServiceState::Unknown);
        }
    }

    #[test]
    fn test_messages() {
        let err = CheckError::from(ProbeError::Timeout {
            after: Duration::from_secs(5),
        });
        assert_eq!(err.to_string(), "timed out after 5s");

        let err = CheckError::ThresholdCount {
            flag: "warning",
            expected: 3,
            given: 2,
        };
        assert_eq!(
            err.to_string(),
            "--warning takes 1 or 3 comma-separated ranges, got 2"
        );
    }

    #[test]
    fn test_usage_keeps_status_line_short() {
        let err = CheckError::Usage {
            message: "unexpected argument '--foo' found".to_owned(),
            usage: "Usage: check_foo -w <warning>\n\nFor more information, try '--help'.".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "invalid arguments: unexpected argument '--foo' found"
        );
        assert_eq!(err.details().len(), 3);
        assert_eq!(err.details()[0], "Usage: check_foo -w <warning>");
    }

    fn tcp_command() -> clap::Command {
        clap::Command::new("check_tcp")
            .version("1.2.3")
            .arg(clap::Arg::new("host").long("host").short('H').required(true))
            .arg(clap::Arg::new("port").long("port").short('p').required(true))
    }

    #[test]
    fn test_missing_arguments_are_named() {
        let err = CheckError::from(tcp_command().try_get_matches_from(["check_tcp"]).unwrap_err());

        assert!(matches!(err, CheckError::Usage { .. }));
        assert_eq!(
            err.to_string(),
            "invalid arguments: missing required arguments: --host <host>, --port <port>"
        );
        assert!(err.details()[0].starts_with("Usage: check_tcp"));
    }

    #[test]
    fn test_unknown_argument_keeps_header() {
        let err = CheckError::from(
            tcp_command()
                .try_get_matches_from(["check_tcp", "-H", "a", "-p", "1", "--foo"])
                .unwrap_err(),
        );

        assert!(err.to_string().starts_with("invalid arguments: unexpected argument '--foo'"));
        assert!(err.details()[0].starts_with("Usage: check_tcp"));
    }

    #[test]
    fn test_version_is_not_help() {
        let err = CheckError::from(
            tcp_command()
                .try_get_matches_from(["check_tcp", "--version"])
                .unwrap_err(),
        );

        assert!(matches!(err, CheckError::VersionRequested(_)));
        assert_eq!(err.to_string(), "version requested");
        assert_eq!(err.details(), vec!["check_tcp 1.2.3".to_owned()]);
        assert_eq!(err.state(), ServiceState::Unknown);
    }
}
