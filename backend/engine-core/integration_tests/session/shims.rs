use crate::helpers::{
    FakeLauncher, GreetingHandler, PROXY_HOST, PROXY_PORT, ProxyBehavior, session_with,
};

use engine_core::server::{RequestServer, TcpRequestServer};
use engine_core::settings::EngineSettings;
use engine_core::shims::{
    FrameworkListen, ListenHook, ListenOverride, OneShotListen, install_listen_override,
};
use engine_core::{EngineError, PendingListen, SessionPhase};

use models::ListeningAddress;

use std::sync::Arc;

use tokio::sync::oneshot;

#[derive(Default)]
struct MiniFramework {
    listen: Option<ListenHook>,
}

impl ListenOverride for MiniFramework {
    fn replace_listen(&mut self, hook: ListenHook) {
        self.listen = Some(hook);
    }
}

impl MiniFramework {
    fn start(&mut self, call: FrameworkListen) -> Result<PendingListen, EngineError> {
        let hook = self.listen.as_mut().expect("framework has no listen hook");
        hook(call)
    }
}

/// **VALUE**: Verifies a framework with a replaceable hook goes live through the session.
///
/// **WHY THIS MATTERS**: Framework users never call `listen()` themselves. The override
/// is the only route by which their app reaches the proxy.
///
/// **BUG THIS CATCHES**: Would catch if the hook drops the framework's ready callback or
/// passes a different server than the one installed.
#[tokio::test]
async fn given_override_installed_when_framework_listens_then_session_live_and_callback_runs() {
    // GIVEN
    let launcher = FakeLauncher::new(ProxyBehavior::Succeed, Default::default());
    let session = session_with(Arc::clone(&launcher), EngineSettings::default());
    let server = Arc::new(TcpRequestServer::new(Arc::new(GreetingHandler)));
    let mut framework = MiniFramework::default();
    install_listen_override(&mut framework, &session, server.clone());

    let (ready_tx, ready_rx) = oneshot::channel();
    let mut call = FrameworkListen::port(4000);
    call.on_ready = Some(Box::new(move |address: ListeningAddress| {
        let _ = ready_tx.send(address);
    }));

    // WHEN
    let address = framework.start(call).unwrap().ready().await.unwrap();

    // THEN
    assert_eq!(address, ListeningAddress::new(PROXY_HOST, PROXY_PORT));
    assert_eq!(ready_rx.await.unwrap(), address);
    assert_eq!(session.phase(), SessionPhase::Live);
    assert!(server.address().is_some());
    assert_eq!(launcher.last_payload().frontend_port(), Some(4000));

    session.stop().await.unwrap();
    assert!(server.address().is_none());
}

/// **VALUE**: Verifies the one-shot strategy sends only the first framework listen to the
/// session and hands later calls back to the framework.
#[tokio::test]
async fn given_one_shot_over_session_when_framework_listens_twice_then_one_proxy_started() {
    // GIVEN: The framework's own listen, wrapped
    let launcher = FakeLauncher::new(ProxyBehavior::Succeed, Default::default());
    let session = session_with(Arc::clone(&launcher), EngineSettings::default());
    let server: Arc<dyn RequestServer> = Arc::new(TcpRequestServer::new(Arc::new(GreetingHandler)));
    let mut hook = session.listen_hook(server);

    let mut listen = OneShotListen::install(
        |_call: FrameworkListen| None,
        move |call: FrameworkListen| Some(hook(call)),
    );

    // WHEN
    let first = listen.call(FrameworkListen::port(5000));
    let second = listen.call(FrameworkListen::port(5001));

    // THEN
    let pending = first.expect("first call is intercepted").unwrap();
    pending.ready().await.unwrap();
    assert!(second.is_none(), "second call reaches the original");
    assert_eq!(launcher.start_count(), 1);

    session.stop().await.unwrap();
}
