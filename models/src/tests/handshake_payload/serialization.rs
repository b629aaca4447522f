use crate::{EphemeralBindResult, HandshakePayload, HandshakePayloadBuilder, ListenTarget};

use serde_json::{Value, json};

/// **VALUE**: Verifies the exact JSON shape of a TCP payload.
///
/// **WHY THIS MATTERS**: The proxy process parses these keys by name. A renamed key means
/// the proxy starts with its defaults and never points at the embedding server.
///
/// **BUG THIS CATCHES**: Would catch a lost `rename_all = "camelCase"` or a broken flatten.
#[test]
fn given_tcp_payload_when_serialized_then_uses_camel_case_frontend_keys() {
    // GIVEN: A TCP payload
    let payload = HandshakePayloadBuilder::default()
        .with_listen_target(&ListenTarget::tcp("0.0.0.0", 3000))
        .with_origin(&EphemeralBindResult::new("127.0.0.1", 40000))
        .build()
        .expect("payload should build");

    // WHEN: Serializing
    let value = serde_json::to_value(&payload).expect("payload should serialize");

    // THEN: Matches the wire contract
    assert_eq!(
        value,
        json!({
            "frontendHost": "0.0.0.0",
            "frontendPort": 3000,
            "graphqlPaths": ["/graphql"],
            "originUrl": "http://127.0.0.1:40000",
            "useFrontendPathForDefaultOrigin": true
        })
    );
}

/// **VALUE**: Verifies that pipe payloads carry only `frontendPipePath`.
///
/// **WHY THIS MATTERS**: If both port and pipe keys are present the proxy picks one
/// arbitrarily.
///
/// **BUG THIS CATCHES**: Would catch the frontend fields being stored as independent options.
#[test]
fn given_pipe_payload_when_serialized_then_omits_host_and_port() {
    let payload = HandshakePayloadBuilder::default()
        .with_listen_target(&ListenTarget::pipe(r"\\.\pipe\foo"))
        .with_origin(&EphemeralBindResult::new("127.0.0.1", 40000))
        .build()
        .expect("payload should build");

    let value: Value = serde_json::to_value(&payload).expect("payload should serialize");

    assert_eq!(value["frontendPipePath"], json!(r"\\.\pipe\foo"));
    assert!(value.get("frontendPort").is_none());
    assert!(value.get("frontendHost").is_none());
}

/// **VALUE**: Verifies that a payload read back from JSON keeps its frontend variant.
///
/// **WHY THIS MATTERS**: Stub proxies in tests and the host's debug dump read payloads back.
///
/// **BUG THIS CATCHES**: Would catch the untagged frontend enum resolving pipe JSON as TCP.
#[test]
fn given_pipe_json_when_deserialized_then_frontend_is_pipe() {
    let raw = json!({
        "frontendPipePath": r"\\.\pipe\foo",
        "graphqlPaths": ["/graphql"],
        "originUrl": "http://127.0.0.1:40000",
        "useFrontendPathForDefaultOrigin": true
    });

    let payload: HandshakePayload = serde_json::from_value(raw).expect("payload should parse");

    assert_eq!(payload.frontend_pipe_path(), Some(r"\\.\pipe\foo"));
    assert_eq!(payload.frontend_port(), None);
}
