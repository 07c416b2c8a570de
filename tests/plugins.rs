use std::net::TcpListener;
use std::process::{Command, Output};

fn run(bin: &str, args: &[&str]) -> (i32, Vec<String>) {
    let Output { status, stdout, .. } = Command::new(bin)
        .args(args)
        .env_remove("CHECKKIT_LOG")
        .output()
        .unwrap();

    let lines = String::from_utf8(stdout)
        .unwrap()
        .lines()
        .map(str::to_owned)
        .collect();

    (status.code().unwrap(), lines)
}

#[test]
fn test_invalid_range_is_unknown() {
    let (code, lines) = run(env!("CARGO_BIN_EXE_check_load"), &["-w", "abc"]);

    assert_eq!(code, 3);
    assert_eq!(lines.len(), 1);
    assert_eq!(
        lines[0],
        "LOAD UNKNOWN - invalid range syntax \"abc\": \"abc\" is neither a number nor '~'"
    );
}

#[test]
fn test_help_is_unknown() {
    let (code, lines) = run(env!("CARGO_BIN_EXE_check_uptime"), &["--help"]);

    assert_eq!(code, 3);
    assert_eq!(lines[0], "UPTIME UNKNOWN - help requested");
    assert!(lines.iter().any(|l| l.contains("--unit")));
}

#[test]
fn test_missing_host_is_unknown() {
    let (code, lines) = run(env!("CARGO_BIN_EXE_check_tcp_port"), &["-p", "22"]);

    assert_eq!(code, 3);
    assert_eq!(
        lines[0],
        "TCP UNKNOWN - invalid arguments: missing required arguments: --host <host>"
    );
    assert!(lines[1].starts_with("Usage:"));
}

#[test]
fn test_version_is_unknown() {
    let (code, lines) = run(env!("CARGO_BIN_EXE_check_load"), &["--version"]);

    assert_eq!(code, 3);
    assert_eq!(lines[0], "LOAD UNKNOWN - version requested");
    assert_eq!(lines[1], format!("check_load {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_open_port_is_ok() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port().to_string();

    let (code, lines) = run(
        env!("CARGO_BIN_EXE_check_tcp_port"),
        &["-H", "127.0.0.1", "-p", &port, "-c", "5"],
    );

    assert_eq!(code, 0);
    assert!(lines[0].starts_with(&format!("TCP OK - port_{} is ", port)));
    assert!(lines[0].contains(&format!("| port_{}=", port)));
}

#[test]
fn test_closed_port_is_critical() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port().to_string()
    };

    let (code, lines) = run(
        env!("CARGO_BIN_EXE_check_tcp_port"),
        &["-H", "127.0.0.1", "-p", &port, "-t", "2"],
    );

    assert_eq!(code, 2);
    assert!(lines[0].starts_with("TCP CRITICAL - "));
    assert!(lines[0].ends_with(&format!("| port_{}=U;;;0", port)));
}
