use crate::handshake_payload::builder::DEFAULT_GRAPHQL_PATH;
use crate::{
    EphemeralBindResult, FrontendEndpoint, HandshakePayloadBuilder, ListenTarget, ModelError,
};

fn bind() -> EphemeralBindResult {
    EphemeralBindResult::new("127.0.0.1", 40000)
}

/// **VALUE**: Verifies GraphQL paths default to `/graphql` when unset.
///
/// **WHY THIS MATTERS**: Most callers never configure paths. Without the default the proxy
/// would receive an empty list and treat no path as GraphQL.
///
/// **BUG THIS CATCHES**: Would catch removal of the `unwrap_or_else` default in `build()`.
#[test]
fn given_no_graphql_paths_when_building_then_defaults_to_graphql() {
    // GIVEN: Builder without GraphQL paths
    let builder = HandshakePayloadBuilder::default()
        .with_listen_target(&ListenTarget::tcp("0.0.0.0", 3000))
        .with_origin(&bind());

    // WHEN: Building
    let payload = builder.build().expect("payload should build");

    // THEN: Default path is used
    assert_eq!(payload.graphql_paths(), [DEFAULT_GRAPHQL_PATH.to_string()]);
    assert!(payload.use_frontend_path_for_default_origin());
    assert_eq!(payload.origin_url(), "http://127.0.0.1:40000");
}

/// **VALUE**: Verifies that a missing frontend is rejected.
///
/// **WHY THIS MATTERS**: A payload without a frontend leaves the proxy with nowhere to listen.
///
/// **BUG THIS CATCHES**: Would catch the builder silently defaulting the frontend.
#[test]
fn given_missing_frontend_when_building_then_returns_validation_error() {
    let result = HandshakePayloadBuilder::default().with_origin(&bind()).build();

    match result {
        Err(ModelError::Validation { field, .. }) => assert_eq!(field, "frontend"),
        Ok(_) => panic!("Builder must reject a payload without frontend"),
    }
}

/// **VALUE**: Verifies that relative GraphQL paths are rejected.
///
/// **WHY THIS MATTERS**: The proxy matches request paths literally; "graphql" without a
/// leading slash never matches anything.
///
/// **BUG THIS CATCHES**: Would catch removal of the leading slash check.
#[test]
fn given_relative_graphql_path_when_building_then_returns_validation_error() {
    let result = HandshakePayloadBuilder::default()
        .with_listen_target(&ListenTarget::tcp("0.0.0.0", 3000))
        .with_graphql_paths(["/graphql", "api"])
        .with_origin(&bind())
        .build();

    match result {
        Err(ModelError::Validation { field, message, .. }) => {
            assert_eq!(field, "graphqlPaths");
            assert!(message.contains("api"));
        }
        Ok(_) => panic!("Builder must reject relative paths"),
    }
}

/// **VALUE**: Verifies that an explicitly empty path list is rejected.
///
/// **WHY THIS MATTERS**: An empty list is different from "unset" and means the caller made a
/// configuration mistake.
///
/// **BUG THIS CATCHES**: Would catch an empty list being replaced by the default.
#[test]
fn given_empty_graphql_paths_when_building_then_returns_validation_error() {
    let result = HandshakePayloadBuilder::default()
        .with_listen_target(&ListenTarget::tcp("0.0.0.0", 3000))
        .with_graphql_paths(Vec::<String>::new())
        .with_origin(&bind())
        .build();

    assert!(matches!(result, Err(ModelError::Validation { field: "graphqlPaths", .. })));
}

/// **VALUE**: Verifies non-http origin URLs are rejected.
///
/// **WHY THIS MATTERS**: The embedding server only ever speaks plain HTTP on loopback.
///
/// **BUG THIS CATCHES**: Would catch removal of the scheme check.
#[test]
fn given_https_origin_when_building_then_returns_validation_error() {
    let result = HandshakePayloadBuilder::default()
        .with_listen_target(&ListenTarget::tcp("0.0.0.0", 3000))
        .with_origin_url("https://127.0.0.1:40000")
        .build();

    assert!(matches!(result, Err(ModelError::Validation { field: "originUrl", .. })));
}

/// **VALUE**: Verifies a frontend given directly is carried into the payload unchanged.
///
/// **WHY THIS MATTERS**: Callers that already hold a [`FrontendEndpoint`] (for example one
/// read back from a serialized payload) skip the `ListenTarget` conversion.
///
/// **BUG THIS CATCHES**: Would catch `with_frontend` being ignored or rewritten by `build()`.
#[test]
fn given_explicit_pipe_frontend_when_building_then_payload_uses_it() {
    // GIVEN
    let frontend = FrontendEndpoint::Pipe {
        pipe_path: r"\\.\pipe\direct".to_string(),
    };

    // WHEN
    let payload = HandshakePayloadBuilder::default()
        .with_frontend(frontend.clone())
        .with_origin(&bind())
        .build()
        .expect("payload should build");

    // THEN
    assert_eq!(payload.frontend(), &frontend);
    assert_eq!(payload.frontend_pipe_path(), Some(r"\\.\pipe\direct"));
    assert_eq!(payload.frontend_host(), None);
}

/// **VALUE**: Verifies empty frontend fields are rejected even when set directly.
///
/// **WHY THIS MATTERS**: `ListenTarget` never produces an empty host or pipe path, but a
/// directly supplied [`FrontendEndpoint`] bypasses that normalization.
///
/// **BUG THIS CATCHES**: Would catch removal of the empty host or empty pipe path checks.
#[test]
fn given_empty_frontend_fields_when_building_then_returns_validation_error() {
    let cases = [
        (
            FrontendEndpoint::Tcp {
                host: String::new(),
                port: 3000,
            },
            "frontendHost",
        ),
        (
            FrontendEndpoint::Pipe {
                pipe_path: String::new(),
            },
            "frontendPipePath",
        ),
    ];

    for (frontend, expected_field) in cases {
        let result = HandshakePayloadBuilder::default()
            .with_frontend(frontend)
            .with_origin(&bind())
            .build();

        match result {
            Err(ModelError::Validation { field, .. }) => assert_eq!(field, expected_field),
            Ok(_) => panic!("Builder must reject an empty {expected_field}"),
        }
    }
}
