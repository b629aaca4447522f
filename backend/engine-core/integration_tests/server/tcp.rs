use crate::helpers::{GREETING, GreetingHandler};

use engine_core::server::{RequestServer, TcpRequestServer};

use std::io::ErrorKind;
use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

// ============================================================================
// TcpRequestServer public API
// ============================================================================

/// **VALUE**: Verifies the server binds an OS-assigned port and dispatches connections.
///
/// **BUG THIS CATCHES**: Would catch if port 0 is reported back instead of the real port,
/// or if accepted connections never reach the handler.
#[tokio::test]
async fn given_ephemeral_port_when_listening_then_address_reported_and_handler_serves() {
    // GIVEN
    let server = TcpRequestServer::new(Arc::new(GreetingHandler));
    assert!(server.address().is_none());

    // WHEN
    server.listen("127.0.0.1", 0).await.unwrap();

    // THEN
    let address = server.address().expect("bound address");
    assert_ne!(address.port(), 0);

    let mut stream = TcpStream::connect(address).await.unwrap();
    let mut received = Vec::new();
    stream.read_to_end(&mut received).await.unwrap();
    assert_eq!(received, GREETING);

    server.close().await.unwrap();
}

/// **VALUE**: Verifies close releases the port.
///
/// **WHY THIS MATTERS**: A session that stops must not keep the origin reachable.
#[tokio::test]
async fn given_listening_server_when_closed_then_connections_refused() {
    // GIVEN
    let server = TcpRequestServer::new(Arc::new(GreetingHandler));
    server.listen("127.0.0.1", 0).await.unwrap();
    let address = server.address().unwrap();

    // WHEN
    server.close().await.unwrap();

    // THEN
    assert!(server.address().is_none());
    let err = TcpStream::connect(address).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectionRefused);
}

/// **VALUE**: Verifies misuse is reported as I/O errors instead of panics.
#[tokio::test]
async fn given_server_when_listen_twice_or_close_unbound_then_io_errors() {
    // GIVEN
    let server = TcpRequestServer::new(Arc::new(GreetingHandler));

    // WHEN / THEN: Close before listen
    let err = server.close().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotConnected);

    // WHEN / THEN: Listen twice
    server.listen("127.0.0.1", 0).await.unwrap();
    let err = server.listen("127.0.0.1", 0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AddrInUse);

    server.close().await.unwrap();
}

/// **VALUE**: Verifies the server can listen again after close.
#[tokio::test]
async fn given_closed_server_when_listen_again_then_bound() {
    // GIVEN
    let server = TcpRequestServer::new(Arc::new(GreetingHandler));
    server.listen("127.0.0.1", 0).await.unwrap();
    server.close().await.unwrap();

    // WHEN
    server.listen("127.0.0.1", 0).await.unwrap();

    // THEN
    assert!(server.address().is_some());
    server.close().await.unwrap();
}
