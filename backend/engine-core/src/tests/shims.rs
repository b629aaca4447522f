use crate::error::EngineError;
use crate::proxy::{LauncherOptions, ProcessLauncher};
use crate::server::{ConnectionHandler, RequestServer, TcpRequestServer};
use crate::session::{EngineSession, SessionPhase};
use crate::settings::EngineSettings;
use crate::shims::{
    ArtificialReadiness, FrameworkListen, FrameworkListenArgs, LISTENING_EVENT, ListenHook,
    ListenOverride, ListeningNotifier, OneShotListen, install_listen_override,
};
use crate::PortSpec;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::sleep as TokioSleep;

struct NullHandler;

#[async_trait]
impl ConnectionHandler for NullHandler {
    async fn handle(&self, _stream: TcpStream, _peer: SocketAddr) {}
}

fn unbound_server() -> Arc<dyn RequestServer> {
    Arc::new(TcpRequestServer::new(Arc::new(NullHandler)))
}

#[derive(Default)]
struct FakeFramework {
    hook: Option<ListenHook>,
}

impl ListenOverride for FakeFramework {
    fn replace_listen(&mut self, hook: ListenHook) {
        self.hook = Some(hook);
    }
}

#[derive(Default)]
struct CountingNotifier {
    count: AtomicUsize,
}

impl ListeningNotifier for CountingNotifier {
    fn notify_listening(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// **VALUE**: Verifies a framework port call becomes listen options with the server as app.
#[test]
fn given_port_call_when_converted_then_options_carry_port_host_and_server() {
    // GIVEN: A framework call with port text and host
    let call = FrameworkListen {
        args: FrameworkListenArgs::Port {
            port: PortSpec::from("8080"),
            host: Some("localhost".into()),
        },
        on_ready: None,
    };
    let server = unbound_server();

    // WHEN
    let options = call.into_listen_options(Arc::clone(&server)).unwrap();

    // THEN
    assert_eq!(options.port, Some(PortSpec::from("8080")));
    assert_eq!(options.host.as_deref(), Some("localhost"));
    assert!(Arc::ptr_eq(options.server.as_ref().unwrap(), &server));
    assert!(options.handler.is_none() && options.service.is_none());
}

/// **VALUE**: Verifies path-based framework listening is refused.
///
/// **WHY THIS MATTERS**: The proxy owns the public side. Binding the framework to a
/// socket file would bypass it entirely.
#[test]
fn given_path_call_when_converted_then_config_error() {
    // GIVEN
    let call = FrameworkListen {
        args: FrameworkListenArgs::Path(PathBuf::from("/tmp/app.sock")),
        on_ready: None,
    };

    // WHEN
    let result = call.into_listen_options(unbound_server());

    // THEN
    assert!(matches!(result, Err(EngineError::Config { .. })));
}

/// **VALUE**: Verifies the installed override routes framework calls to the session and
/// surfaces validation errors synchronously.
///
/// **BUG THIS CATCHES**: Would catch if the hook swallows config errors or leaves the
/// session in a starting phase after rejecting the call.
#[test]
fn given_installed_override_when_framework_listens_with_bad_port_then_config_error_and_idle() {
    // GIVEN: A framework with the override installed
    let session = EngineSession::new(
        EngineSettings::default(),
        Arc::new(ProcessLauncher),
        LauncherOptions::default(),
    );
    let mut framework = FakeFramework::default();
    install_listen_override(&mut framework, &session, unbound_server());

    // WHEN: The framework listens with a bad port and with a path
    let hook = framework.hook.as_mut().unwrap();
    let bad_port = hook(FrameworkListen::port("nope"));
    let path = hook(FrameworkListen {
        args: FrameworkListenArgs::Path(PathBuf::from("/tmp/s")),
        on_ready: None,
    });

    // THEN: Both fail synchronously, session untouched
    assert!(matches!(bad_port, Err(EngineError::Config { .. })));
    assert!(matches!(path, Err(EngineError::Config { .. })));
    assert_eq!(session.phase(), SessionPhase::Idle);
}

/// **VALUE**: Verifies only the first call is intercepted and later calls reach the original.
///
/// **WHY THIS MATTERS**: Frameworks that listen more than once (e.g. a dev reload) must
/// not start a second proxy.
#[test]
fn given_one_shot_when_called_twice_then_first_intercepted_second_original() {
    // GIVEN
    let mut listen = OneShotListen::install(|port: u16| format!("original {port}"), |port: u16| {
        format!("intercepted {port}")
    });
    assert!(listen.is_armed());

    // WHEN
    let first = listen.call(1);
    let second = listen.call(2);

    // THEN
    assert_eq!(first, "intercepted 1");
    assert_eq!(second, "original 2");
    assert!(!listen.is_armed());
}

/// **VALUE**: Verifies restoring before use returns the untouched original.
#[test]
fn given_armed_one_shot_when_restored_then_original_returned() {
    // GIVEN
    let listen = OneShotListen::install(|n: u32| n + 1, |_n: u32| 0);

    // WHEN
    let mut original = listen.restore();

    // THEN
    assert_eq!(original(41), 42);
}

/// **VALUE**: Verifies the synthetic readiness fires once, asynchronously, on the first
/// "listening" subscription only.
///
/// **BUG THIS CATCHES**: Would catch a notification emitted synchronously (before the
/// subscriber is registered), emitted twice, or emitted for other events.
#[tokio::test]
async fn given_readiness_shim_when_subscriptions_observed_then_single_deferred_notification() {
    // GIVEN
    let notifier = Arc::new(CountingNotifier::default());
    let shim = ArtificialReadiness::new(Arc::clone(&notifier));

    // WHEN: An unrelated subscription, then two "listening" subscriptions
    assert!(!shim.observe_subscription("close"));
    assert!(shim.observe_subscription(LISTENING_EVENT));

    // THEN: Not yet delivered synchronously
    assert_eq!(notifier.count.load(Ordering::SeqCst), 0);
    assert!(shim.is_detached());
    assert!(!shim.observe_subscription(LISTENING_EVENT));

    TokioSleep(Duration::from_millis(50)).await;
    assert_eq!(notifier.count.load(Ordering::SeqCst), 1);
}
