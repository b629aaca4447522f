use engine_host::status::StatusHandler;

use engine_core::EngineSession;
use engine_core::server::{RequestServer, TcpRequestServer};
use engine_core::settings::EngineSettings;

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

// ============================================================================
// Status handler served over a real socket
// ============================================================================

/// **VALUE**: Verifies an HTTP client gets a JSON status back from the served handler.
///
/// **WHY THIS MATTERS**: This is what the proxy sees as the origin. If the handler never
/// answers, every public request through the proxy times out.
///
/// **BUG THIS CATCHES**: Would catch if the handler waits for more request bytes than
/// the client sends, ignores `Connection: close`, or closes the connection before writing.
#[tokio::test]
async fn given_status_handler_when_client_sends_get_then_json_status_returned() {
    // GIVEN: The handler served on an ephemeral port
    let session = EngineSession::with_process_launcher(EngineSettings::default());
    let server = TcpRequestServer::new(Arc::new(StatusHandler::new(session.clone())));
    server.listen("127.0.0.1", 0).await.unwrap();
    let address = server.address().unwrap();

    // WHEN: Sending a GET
    let mut stream = TcpStream::connect(address).await.unwrap();
    stream
        .write_all(b"GET /status HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    // THEN
    assert!(response.starts_with("HTTP/1.1 200 OK"), "got: {response}");
    let (head, body) = response.split_once("\r\n\r\n").unwrap();
    let head = head.to_ascii_lowercase();
    assert!(head.contains("content-type: application/json"), "got: {head}");
    assert!(head.contains(&format!("content-length: {}", body.len())), "got: {head}");
    let json: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(json["sessionId"], session.id().to_string());
    assert_eq!(json["phase"], "idle");
    assert!(json["publicAddress"].is_null());

    server.close().await.unwrap();
}
