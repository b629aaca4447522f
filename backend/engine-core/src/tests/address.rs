use crate::address::{PortSpec, is_pipe_path, normalize};
use crate::error::EngineError;
use crate::DEFAULT_FRONTEND_HOST;

use models::ListenTarget;

/// **VALUE**: Verifies a numeric port with no host listens on the default frontend host.
///
/// **WHY THIS MATTERS**: The proxy binds whatever host the payload names. A wrong default
/// makes the public endpoint unreachable from other machines.
///
/// **BUG THIS CATCHES**: Would catch if the default host changes to loopback or to an
/// empty string that the payload builder then rejects.
#[test]
fn given_numeric_port_without_host_when_normalized_then_uses_default_frontend_host() {
    // GIVEN: Port 8080, no host

    // WHEN: Normalizing
    let target = normalize(Some(PortSpec::from(8080)), None, None).unwrap();

    // THEN: TCP target on the default host
    assert_eq!(target, ListenTarget::tcp(DEFAULT_FRONTEND_HOST, 8080));
}

/// **VALUE**: Verifies numeric text is parsed as a port and the caller's host is kept.
///
/// **BUG THIS CATCHES**: Would catch if text ports are treated as pipe paths or if the
/// host argument is dropped for text ports.
#[test]
fn given_numeric_text_and_host_when_normalized_then_tcp_target_with_host() {
    // GIVEN: "4000" with a host
    let port = PortSpec::from("4000");

    // WHEN: Normalizing
    let target = normalize(Some(port), None, Some("localhost".to_string())).unwrap();

    // THEN: TCP target on that host
    assert_eq!(target, ListenTarget::tcp("localhost", 4000));
}

/// **VALUE**: Verifies a named pipe path given as the port selects a pipe frontend.
///
/// **WHY THIS MATTERS**: Hosting platforms pass the pipe through the same argument a
/// TCP port would use. Treating it as an error breaks those deployments.
///
/// **BUG THIS CATCHES**: Would catch if the pipe prefix check is dropped or if the
/// pipe path is altered on the way through.
#[test]
fn given_pipe_path_as_port_when_normalized_then_pipe_target() {
    // GIVEN: A named pipe path in the port slot
    let pipe = r"\\.\pipe\my-app";

    // WHEN: Normalizing, with a host that must be ignored
    let target = normalize(Some(PortSpec::from(pipe)), None, Some("ignored".into())).unwrap();

    // THEN: Pipe target, path verbatim
    assert_eq!(target, ListenTarget::pipe(pipe));
    assert_eq!(target.pipe_path(), Some(pipe));
}

/// **VALUE**: Verifies an explicit pipe path option produces a pipe target.
#[test]
fn given_pipe_path_option_when_normalized_then_pipe_target() {
    // GIVEN / WHEN: Only a pipe path
    let target = normalize(None, Some(r"\\.\pipe\x".to_string()), None).unwrap();

    // THEN: Pipe target
    assert_eq!(target, ListenTarget::pipe(r"\\.\pipe\x"));
}

/// **VALUE**: Verifies text that is neither a port nor a pipe path is a config error.
///
/// **BUG THIS CATCHES**: Would catch if garbage text silently becomes port 0 or a pipe
/// path, which would start a proxy on a random or nonexistent endpoint.
#[test]
fn given_non_numeric_text_when_normalized_then_config_error_names_value() {
    // GIVEN: Text that is neither
    let port = PortSpec::from("not-a-port");

    // WHEN: Normalizing
    let err = normalize(Some(port), None, None).unwrap_err();

    // THEN: Config error quoting the bad value
    assert!(matches!(err, EngineError::Config { .. }));
    assert!(err.to_string().contains("\"not-a-port\""), "got: {err}");
}

/// **VALUE**: Verifies out-of-range numeric text is rejected instead of wrapping.
#[test]
fn given_out_of_range_text_port_when_normalized_then_config_error() {
    // GIVEN / WHEN: 70000 as text
    let result = normalize(Some(PortSpec::from("70000")), None, None);

    // THEN: Config error
    assert!(matches!(result, Err(EngineError::Config { .. })));
}

/// **VALUE**: Verifies both or neither of port and pipe path is rejected.
///
/// **WHY THIS MATTERS**: An ambiguous target must fail before any socket is touched.
#[test]
fn given_both_or_neither_target_when_normalized_then_config_error() {
    // GIVEN / WHEN: Neither
    let neither = normalize(None, None, None);

    // GIVEN / WHEN: Both
    let both = normalize(Some(PortSpec::from(80)), Some(r"\\.\pipe\p".into()), None);

    // THEN: Both are config errors
    assert!(matches!(neither, Err(EngineError::Config { .. })));
    assert!(matches!(both, Err(EngineError::Config { .. })));
}

/// **VALUE**: Verifies an empty pipe path is rejected.
#[test]
fn given_empty_pipe_path_when_normalized_then_config_error() {
    // GIVEN / WHEN: Empty pipe path
    let result = normalize(None, Some(String::new()), None);

    // THEN: Config error
    assert!(matches!(result, Err(EngineError::Config { .. })));
}

/// **VALUE**: Verifies a blank host falls back to the default frontend host.
#[test]
fn given_blank_host_when_normalized_then_default_host() {
    // GIVEN / WHEN: Whitespace host
    let target = normalize(Some(PortSpec::from(81)), None, Some("  ".into())).unwrap();

    // THEN: Default host
    assert_eq!(target, ListenTarget::tcp(DEFAULT_FRONTEND_HOST, 81));
}

/// **VALUE**: Verifies the pipe prefix check is literal and case-sensitive.
#[test]
fn given_various_strings_when_checked_for_pipe_prefix_then_only_literal_prefix_matches() {
    // GIVEN / WHEN / THEN
    assert!(is_pipe_path(r"\\.\pipe\name"));
    assert!(!is_pipe_path(r"\\.\PIPE\name"));
    assert!(!is_pipe_path("/tmp/pipe"));
    assert!(!is_pipe_path("8080"));
}
