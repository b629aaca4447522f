use crate::error::EngineError;
use crate::payload::{build_payload, check_graphql_paths};
use crate::settings::EngineSettings;

use models::handshake_payload::builder::DEFAULT_GRAPHQL_PATH;
use models::{EphemeralBindResult, FrontendEndpoint, ListenTarget};

/// **VALUE**: Verifies the payload mirrors the TCP target and points at the bind origin.
///
/// **WHY THIS MATTERS**: The proxy forwards every request to `origin_url`. A wrong origin
/// sends public traffic to the wrong port.
///
/// **BUG THIS CATCHES**: Would catch if host and port are swapped between frontend and
/// origin, or if the default GraphQL path is not applied.
#[test]
fn given_tcp_target_and_bind_when_payload_built_then_frontend_and_origin_match() {
    // GIVEN: A TCP target and an ephemeral bind
    let target = ListenTarget::tcp("0.0.0.0", 8080);
    let bind = EphemeralBindResult::new("127.0.0.1", 53211);

    // WHEN: Building the payload with default settings
    let payload = build_payload(&target, &bind, &EngineSettings::default()).unwrap();

    // THEN: Frontend is the target, origin is the bind, paths defaulted
    assert_eq!(
        payload.frontend(),
        &FrontendEndpoint::Tcp {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    );
    assert_eq!(payload.origin_url(), "http://127.0.0.1:53211");
    assert_eq!(payload.graphql_paths(), [DEFAULT_GRAPHQL_PATH.to_string()]);
    assert!(payload.use_frontend_path_for_default_origin());
}

/// **VALUE**: Verifies a pipe target yields a pipe frontend and configured GraphQL paths.
#[test]
fn given_pipe_target_and_custom_paths_when_payload_built_then_pipe_frontend() {
    // GIVEN: Pipe target and two configured paths
    let target = ListenTarget::pipe(r"\\.\pipe\app");
    let bind = EphemeralBindResult::new("127.0.0.1", 40000);
    let settings = EngineSettings {
        graphql_paths: Some(vec!["/graphql".into(), "/api/graphql".into()]),
        ..EngineSettings::default()
    };

    // WHEN: Building
    let payload = build_payload(&target, &bind, &settings).unwrap();

    // THEN: Pipe frontend, both paths kept in order
    assert_eq!(
        payload.frontend(),
        &FrontendEndpoint::Pipe {
            pipe_path: r"\\.\pipe\app".to_string(),
        }
    );
    assert_eq!(payload.graphql_paths(), ["/graphql", "/api/graphql"]);
}

/// **VALUE**: Verifies GraphQL path settings are checked before any side effect.
///
/// **BUG THIS CATCHES**: Would catch if a relative path slips through and only fails
/// after the server already bound its port.
#[test]
fn given_invalid_graphql_paths_when_checked_then_config_error() {
    // GIVEN / WHEN / THEN: Unset and valid are fine
    assert!(check_graphql_paths(None).is_ok());
    assert!(check_graphql_paths(Some(&["/graphql".to_string()])).is_ok());

    // Empty list and relative path are rejected
    assert!(matches!(
        check_graphql_paths(Some(&[])),
        Err(EngineError::Config { .. })
    ));
    assert!(matches!(
        check_graphql_paths(Some(&["graphql".to_string()])),
        Err(EngineError::Config { .. })
    ));
}
