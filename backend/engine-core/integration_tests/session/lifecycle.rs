use crate::helpers::{
    EVENT_PROXY_STOPPED, EVENT_SERVER_CLOSED, EventLog, FailingServer, FakeLauncher,
    GREETING, GreetingHandler, PROXY_HOST, PROXY_PORT, PanickingServer, ProxyBehavior,
    RecordingServer, events, session_with,
};

use engine_core::error::{EngineError, ProxyError};
use engine_core::server::RequestServer;
use engine_core::settings::EngineSettings;
use engine_core::{ListenOptions, SessionPhase};

use models::{FrontendEndpoint, ListeningAddress};

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::time::{sleep as TokioSleep, timeout};

// ============================================================================
// EngineSession lifecycle from an embedding application's perspective
// ============================================================================

const WAIT: Duration = Duration::from_secs(5);

fn new_log() -> EventLog {
    EventLog::default()
}

// ----------------------------------------------------------------------------
// listen() - successful startup
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies the full TCP startup: ephemeral bind, payload, live phase, ready callback.
///
/// **WHY THIS MATTERS**: This is the path every production start takes. The proxy must be
/// pointed at the port the app actually bound, and the app must learn the public address.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The origin URL names a different port than the server bound
/// - The frontend loses the caller's port or default host
/// - `on_ready` runs before the public address is stored, or runs twice
#[tokio::test]
async fn given_tcp_port_and_server_when_listen_then_live_with_matching_payload() {
    // GIVEN: A session with a succeeding proxy and a real server
    let log = new_log();
    let launcher = FakeLauncher::new(ProxyBehavior::Succeed, log.clone());
    let session = session_with(Arc::clone(&launcher), EngineSettings::default());
    let server = RecordingServer::new(log.clone());

    let (ready_tx, ready_rx) = oneshot::channel();
    let observer = session.clone();

    // WHEN: Listening on port 8080
    let pending = session
        .listen(
            ListenOptions::default()
                .with_port(8080)
                .with_server(server.clone())
                .on_ready(move |address| {
                    let stored = observer.public_address();
                    let _ = ready_tx.send((address, stored));
                }),
        )
        .expect("validation should pass");
    let address = timeout(WAIT, pending.ready()).await.unwrap().unwrap();

    // THEN: Live at the proxy's address
    assert_eq!(address, ListeningAddress::new(PROXY_HOST, PROXY_PORT));
    assert_eq!(session.phase(), SessionPhase::Live);
    assert_eq!(session.public_address(), Some(address.clone()));

    // Payload mirrors the target and points at the bound server
    let bound = server.address().expect("server should be bound");
    let payload = launcher.last_payload();
    assert_eq!(
        payload.frontend(),
        &FrontendEndpoint::Tcp {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    );
    assert_eq!(payload.origin_url(), format!("http://127.0.0.1:{}", bound.port()));
    assert_eq!(payload.graphql_paths(), ["/graphql"]);
    assert!(bound.ip().is_loopback());

    // Ready callback saw the stored address
    let (ready_address, stored) = timeout(WAIT, ready_rx).await.unwrap().unwrap();
    assert_eq!(ready_address, address);
    assert_eq!(stored, Some(address));
    assert_eq!(launcher.start_count(), 1);

    session.stop().await.unwrap();
}

/// **VALUE**: Verifies the app is actually reachable on the origin the proxy is given.
///
/// **BUG THIS CATCHES**: Would catch if the handler wrapper binds but never dispatches
/// connections, so the proxy would forward into a dead socket.
#[tokio::test]
async fn given_handler_app_when_live_then_origin_serves_connections() {
    // GIVEN: A session whose app is a connection handler
    let launcher = FakeLauncher::new(ProxyBehavior::Succeed, new_log());
    let session = session_with(Arc::clone(&launcher), EngineSettings::default());

    // WHEN: Going live
    session
        .listen(
            ListenOptions::default()
                .with_port("3000")
                .with_handler(Arc::new(GreetingHandler)),
        )
        .unwrap()
        .ready()
        .await
        .unwrap();

    // THEN: Connecting to the origin reaches the handler
    let origin = launcher.last_payload().origin_url().trim_start_matches("http://").to_string();
    let mut stream = TcpStream::connect(&origin).await.unwrap();
    let mut received = Vec::new();
    stream.read_to_end(&mut received).await.unwrap();
    assert_eq!(received, GREETING);

    session.stop().await.unwrap();
}

/// **VALUE**: Verifies a pipe path given as the port produces a pipe frontend.
#[tokio::test]
async fn given_pipe_path_as_port_when_listen_then_payload_has_pipe_frontend() {
    // GIVEN
    let launcher = FakeLauncher::new(ProxyBehavior::Succeed, new_log());
    let settings = EngineSettings {
        graphql_paths: Some(vec!["/graphql".into(), "/admin/graphql".into()]),
        ..EngineSettings::default()
    };
    let session = session_with(Arc::clone(&launcher), settings);

    // WHEN
    session
        .listen(
            ListenOptions::default()
                .with_port(r"\\.\pipe\site")
                .with_handler(Arc::new(GreetingHandler)),
        )
        .unwrap()
        .ready()
        .await
        .unwrap();

    // THEN
    let payload = launcher.last_payload();
    assert_eq!(payload.frontend_pipe_path(), Some(r"\\.\pipe\site"));
    assert_eq!(payload.frontend_port(), None);
    assert_eq!(payload.graphql_paths(), ["/graphql", "/admin/graphql"]);

    session.stop().await.unwrap();
}

/// **VALUE**: Verifies an explicit pipe path produces a pipe frontend with no TCP fields.
///
/// **WHY THIS MATTERS**: Callers on Windows pass the pipe through `with_pipe_path` rather
/// than as the port. The proxy must not also be told to listen on a TCP host or port.
///
/// **BUG THIS CATCHES**: Would catch if the explicit pipe path is dropped, or if a default
/// host or port leaks into the frontend alongside the pipe.
#[tokio::test]
async fn given_explicit_pipe_path_when_listen_then_payload_has_only_pipe_frontend() {
    // GIVEN
    let launcher = FakeLauncher::new(ProxyBehavior::Succeed, new_log());
    let session = session_with(Arc::clone(&launcher), EngineSettings::default());
    let server = RecordingServer::new(new_log());

    // WHEN
    session
        .listen(
            ListenOptions::default()
                .with_pipe_path(r"\\.\pipe\explicit")
                .with_server(server.clone()),
        )
        .unwrap()
        .ready()
        .await
        .unwrap();

    // THEN
    let payload = launcher.last_payload();
    assert_eq!(payload.frontend_pipe_path(), Some(r"\\.\pipe\explicit"));
    assert_eq!(payload.frontend_host(), None);
    assert_eq!(payload.frontend_port(), None);
    assert!(server.address().is_some());

    session.stop().await.unwrap();
}

// ----------------------------------------------------------------------------
// listen() - synchronous rejections
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies malformed input fails synchronously with no side effect.
///
/// **WHY THIS MATTERS**: A caller must be able to fix its arguments and retry. A failed
/// validation that still bound a port or spawned a proxy would leak both.
///
/// **BUG THIS CATCHES**: Would catch if validation runs after the bind, if the phase is
/// advanced before validation, or if the launcher is started for invalid input.
#[tokio::test]
async fn given_invalid_listen_input_when_listen_then_config_error_and_no_side_effect() {
    // GIVEN
    let launcher = FakeLauncher::new(ProxyBehavior::Succeed, new_log());
    let session = session_with(Arc::clone(&launcher), EngineSettings::default());
    let server = RecordingServer::new(new_log());

    let cases = vec![
        ("bad port text", ListenOptions::default().with_port("abc").with_server(server.clone())),
        ("no target", ListenOptions::default().with_server(server.clone())),
        ("no app", ListenOptions::default().with_port(80)),
        (
            "port and pipe",
            ListenOptions::default()
                .with_port(80)
                .with_pipe_path(r"\\.\pipe\site")
                .with_server(server.clone()),
        ),
        (
            "two apps",
            ListenOptions::default()
                .with_port(80)
                .with_server(server.clone())
                .with_handler(Arc::new(GreetingHandler)),
        ),
    ];

    // WHEN / THEN
    for (name, options) in cases {
        let err = match session.listen(options) {
            Err(err) => err,
            Ok(_) => panic!("{name}: expected config error"),
        };
        assert!(matches!(err, EngineError::Config { .. }), "{name}: got {err:?}");
        assert!(err.is_synchronous(), "{name}");
        assert_eq!(session.phase(), SessionPhase::Idle, "{name}");
    }

    assert!(server.address().is_none());
    assert_eq!(launcher.start_count(), 0);
}

/// **VALUE**: Verifies invalid GraphQL path settings are rejected before binding.
#[tokio::test]
async fn given_relative_graphql_path_setting_when_listen_then_config_error() {
    // GIVEN
    let launcher = FakeLauncher::new(ProxyBehavior::Succeed, new_log());
    let settings = EngineSettings {
        graphql_paths: Some(vec!["graphql".into()]),
        ..EngineSettings::default()
    };
    let session = session_with(Arc::clone(&launcher), settings);
    let server = RecordingServer::new(new_log());

    // WHEN
    let result = session.listen(ListenOptions::default().with_port(80).with_server(server.clone()));

    // THEN
    assert!(matches!(result, Err(EngineError::Config { .. })));
    assert!(server.address().is_none());
    assert_eq!(session.phase(), SessionPhase::Idle);
}

/// **VALUE**: Verifies a second listen on a busy session is a state error.
///
/// **BUG THIS CATCHES**: Would catch if a second listen starts a second proxy while the
/// first is still starting or live.
#[tokio::test]
async fn given_started_session_when_listen_again_then_state_error() {
    // GIVEN: A live session
    let launcher = FakeLauncher::new(ProxyBehavior::Succeed, new_log());
    let session = session_with(Arc::clone(&launcher), EngineSettings::default());
    let first = session
        .listen(ListenOptions::default().with_port(81).with_handler(Arc::new(GreetingHandler)))
        .unwrap();

    // WHEN: Listening again before and after the first attempt completes
    let while_starting =
        session.listen(ListenOptions::default().with_port(82).with_handler(Arc::new(GreetingHandler)));
    first.ready().await.unwrap();
    let while_live =
        session.listen(ListenOptions::default().with_port(83).with_handler(Arc::new(GreetingHandler)));

    // THEN
    assert!(matches!(while_starting, Err(EngineError::State { .. })));
    assert!(while_starting.as_ref().is_err_and(EngineError::is_synchronous));
    assert!(matches!(while_live, Err(EngineError::State { .. })));
    assert_eq!(launcher.start_count(), 1);

    session.stop().await.unwrap();
}

// ----------------------------------------------------------------------------
// listen() - asynchronous failures
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies a proxy failure is reported once and leaves the server bound.
///
/// **WHY THIS MATTERS**: The caller decides how to tear down after a failed handshake.
/// The ready callback must not fire for a session that never went live.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - `on_ready` runs despite the failure
/// - The error surfaces as something other than `Handshake`
/// - The session stays in a starting phase forever
#[tokio::test]
async fn given_rejecting_proxy_when_listen_then_handshake_error_and_server_left_bound() {
    // GIVEN
    let log = new_log();
    let launcher = FakeLauncher::new(ProxyBehavior::Reject, log.clone());
    let session = session_with(Arc::clone(&launcher), EngineSettings::default());
    let server = RecordingServer::new(log.clone());
    let (ready_tx, mut ready_rx) = oneshot::channel::<ListeningAddress>();

    // WHEN
    let result = session
        .listen(
            ListenOptions::default()
                .with_port(8080)
                .with_server(server.clone())
                .on_ready(move |address| {
                    let _ = ready_tx.send(address);
                }),
        )
        .expect("validation should pass")
        .ready()
        .await;

    // THEN: One handshake error carrying the proxy's reason
    let source = match result {
        Err(EngineError::Handshake { source, .. }) => source,
        other => panic!("expected handshake error, got {other:?}"),
    };
    assert!(matches!(source, ProxyError::Rejected { .. }));
    assert_eq!(session.phase(), SessionPhase::Errored);
    assert!(session.public_address().is_none());
    assert!(server.address().is_some(), "server stays bound after handshake failure");

    TokioSleep(Duration::from_millis(50)).await;
    assert!(ready_rx.try_recv().is_err(), "on_ready must not run");

    // Stop from Errored closes the server and returns to idle
    session.stop().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert!(server.address().is_none());
    assert_eq!(events(&log), [EVENT_SERVER_CLOSED]);
}

/// **VALUE**: Verifies a bind failure arrives through the pending result, not as a panic.
#[tokio::test]
async fn given_unbindable_server_when_listen_then_bind_error_and_proxy_not_started() {
    // GIVEN
    let launcher = FakeLauncher::new(ProxyBehavior::Succeed, new_log());
    let session = session_with(Arc::clone(&launcher), EngineSettings::default());

    // WHEN
    let result = session
        .listen(ListenOptions::default().with_port(80).with_server(Arc::new(FailingServer)))
        .unwrap()
        .ready()
        .await;

    // THEN
    let err = result.expect_err("bind must fail");
    assert!(matches!(err, EngineError::Bind { .. }));
    assert!(!err.is_synchronous(), "bind failures arrive through the pending result");
    assert_eq!(session.phase(), SessionPhase::Errored);
    assert_eq!(launcher.start_count(), 0);

    session.stop().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Idle);
}

/// **VALUE**: Verifies a launcher that panics is reported as a handshake failure.
///
/// **WHY THIS MATTERS**: The startup task runs detached. If a panic in it went unobserved,
/// the caller would wait on `ready()` forever and the session would never leave
/// `AwaitingHandshake`, so neither `stop()` nor a second `listen()` could recover it.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The panic drops the result sender and `ready()` reports a generic failure
/// - The phase is left at `AwaitingHandshake` instead of `Errored`
/// - The server bound before the panic cannot be closed afterwards
#[tokio::test]
async fn given_panicking_launcher_when_listen_then_handshake_error_and_session_recoverable() {
    // GIVEN
    let log = new_log();
    let launcher = FakeLauncher::new(ProxyBehavior::Panic, log.clone());
    let session = session_with(Arc::clone(&launcher), EngineSettings::default());
    let server = RecordingServer::new(log.clone());

    // WHEN
    let result = timeout(
        WAIT,
        session
            .listen(ListenOptions::default().with_port(8080).with_server(server.clone()))
            .expect("validation should pass")
            .ready(),
    )
    .await
    .expect("ready() must resolve after a launcher panic");

    // THEN: A handshake error carrying the panic message
    let source = match result {
        Err(EngineError::Handshake { source, .. }) => source,
        other => panic!("expected handshake error, got {other:?}"),
    };
    match &source {
        ProxyError::Panic { message, .. } => assert!(message.contains("fake launcher crashed")),
        other => panic!("expected panic source, got {other:?}"),
    }
    assert_eq!(session.phase(), SessionPhase::Errored);
    assert!(server.address().is_some());

    // Stop from Errored closes the server, and the session can listen again
    session.stop().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert_eq!(events(&log), [EVENT_SERVER_CLOSED]);

    let retry = session.listen(ListenOptions::default().with_port(8081).with_server(server.clone()));
    assert!(retry.is_ok(), "an errored-then-stopped session accepts a new listen");
}

/// **VALUE**: Verifies a server that panics while binding is reported as a bind failure.
///
/// **BUG THIS CATCHES**: Would catch if a panic during the bind is classified as a proxy
/// failure, leaves the session in `AwaitingBind`, or still starts the proxy.
#[tokio::test]
async fn given_panicking_server_when_listen_then_bind_error_and_proxy_not_started() {
    // GIVEN
    let launcher = FakeLauncher::new(ProxyBehavior::Succeed, new_log());
    let session = session_with(Arc::clone(&launcher), EngineSettings::default());

    // WHEN
    let result = timeout(
        WAIT,
        session
            .listen(ListenOptions::default().with_port(80).with_server(Arc::new(PanickingServer)))
            .unwrap()
            .ready(),
    )
    .await
    .expect("ready() must resolve after a server panic");

    // THEN
    assert!(matches!(result, Err(EngineError::Bind { .. })));
    assert_eq!(session.phase(), SessionPhase::Errored);
    assert_eq!(launcher.start_count(), 0);

    session.stop().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Idle);
}

// ----------------------------------------------------------------------------
// stop()
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies stop tears down proxy first, then server, even when the proxy is slow.
///
/// **WHY THIS MATTERS**: Closing the app while the proxy still forwards traffic turns
/// in-flight public requests into connection errors.
///
/// **BUG THIS CATCHES**: Would catch if the server is closed before the proxy stop
/// completes, or if the public address survives a stop.
#[tokio::test]
async fn given_live_session_with_slow_proxy_when_stop_then_ordered_teardown_to_idle() {
    // GIVEN
    let log = new_log();
    let launcher = FakeLauncher::new(
        ProxyBehavior::SlowStop(Duration::from_millis(100)),
        log.clone(),
    );
    let session = session_with(Arc::clone(&launcher), EngineSettings::default());
    let server = RecordingServer::new(log.clone());
    session
        .listen(ListenOptions::default().with_port(8080).with_server(server.clone()))
        .unwrap()
        .ready()
        .await
        .unwrap();

    // WHEN: Stopping, observing the phase mid-way
    let stopper = session.clone();
    let stop_task = tokio::spawn(async move { stopper.stop().await });
    TokioSleep(Duration::from_millis(20)).await;
    let mid_phase = session.phase();
    stop_task.await.unwrap().unwrap();

    // THEN
    assert_eq!(mid_phase, SessionPhase::Stopping);
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert!(session.public_address().is_none());
    assert!(server.address().is_none());
    assert_eq!(events(&log), [EVENT_PROXY_STOPPED, EVENT_SERVER_CLOSED]);
}

/// **VALUE**: Verifies a failing proxy stop still closes the server and reports afterwards.
#[tokio::test]
async fn given_proxy_stop_failure_when_stop_then_server_closed_and_shutdown_error() {
    // GIVEN
    let log = new_log();
    let launcher = FakeLauncher::new(ProxyBehavior::FailStop, log.clone());
    let session = session_with(Arc::clone(&launcher), EngineSettings::default());
    let server = RecordingServer::new(log.clone());
    session
        .listen(ListenOptions::default().with_port(8080).with_server(server.clone()))
        .unwrap()
        .ready()
        .await
        .unwrap();

    // WHEN
    let result = session.stop().await;

    // THEN
    assert!(matches!(result, Err(EngineError::Shutdown { .. })));
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert!(server.address().is_none());
    assert_eq!(events(&log), [EVENT_PROXY_STOPPED, EVENT_SERVER_CLOSED]);
}

/// **VALUE**: Verifies stop on an idle session is a state error.
#[tokio::test]
async fn given_idle_session_when_stop_then_state_error() {
    // GIVEN
    let session = session_with(
        FakeLauncher::new(ProxyBehavior::Succeed, new_log()),
        EngineSettings::default(),
    );

    // WHEN
    let result = session.stop().await;

    // THEN
    assert!(matches!(result, Err(EngineError::State { .. })));
    assert_eq!(session.phase(), SessionPhase::Idle);
}

/// **VALUE**: Verifies a stopped session can listen again.
///
/// **BUG THIS CATCHES**: Would catch stale server or proxy handles surviving a stop and
/// making the next listen fail or reuse the old origin.
#[tokio::test]
async fn given_stopped_session_when_listen_again_then_live_with_new_origin() {
    // GIVEN: A session that went live and stopped
    let launcher = FakeLauncher::new(ProxyBehavior::Succeed, new_log());
    let session = session_with(Arc::clone(&launcher), EngineSettings::default());
    session
        .listen(ListenOptions::default().with_port(9000).with_handler(Arc::new(GreetingHandler)))
        .unwrap()
        .ready()
        .await
        .unwrap();
    session.stop().await.unwrap();

    // WHEN: Listening again on another port
    let address = session
        .listen(ListenOptions::default().with_port(9001).with_handler(Arc::new(GreetingHandler)))
        .unwrap()
        .ready()
        .await
        .unwrap();

    // THEN
    assert_eq!(address, ListeningAddress::new(PROXY_HOST, PROXY_PORT));
    assert_eq!(session.phase(), SessionPhase::Live);
    assert_eq!(launcher.start_count(), 2);
    assert_eq!(launcher.last_payload().frontend_port(), Some(9001));

    session.stop().await.unwrap();
}
