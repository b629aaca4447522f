//! Test doubles for session integration tests.
//!
//! - [`FakeLauncher`]: records payloads, reports a fixed address or fails
//! - [`RecordingServer`]: real TCP server that logs `close()` into an event log
//! - [`FailingServer`]: refuses to bind
//! - [`PanickingServer`]: panics inside `listen()`
//! - [`EventLog`]: ordered record of proxy stops and server closes

use engine_core::error::ProxyError;
use engine_core::proxy::{LauncherOptions, ProxyHandle, ProxyLauncher};
use engine_core::server::{ConnectionHandler, RequestServer, TcpRequestServer};
use engine_core::settings::EngineSettings;
use engine_core::EngineSession;

use common::ErrorLocation;
use models::{HandshakePayload, ListeningAddress};

use std::io::{Error as IoError, ErrorKind, Result as IoResult};
use std::net::SocketAddr;
use std::panic::Location;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::sleep as TokioSleep;

pub const PROXY_HOST: &str = "127.0.0.1";
pub const PROXY_PORT: u16 = 45_001;

pub const EVENT_PROXY_STOPPED: &str = "proxy stopped";
pub const EVENT_SERVER_CLOSED: &str = "server closed";

pub type EventLog = Arc<Mutex<Vec<&'static str>>>;

pub fn events(log: &EventLog) -> Vec<&'static str> {
    log.lock().unwrap().clone()
}

/// How the fake proxy behaves.
#[derive(Debug, Clone, Default)]
pub enum ProxyBehavior {
    #[default]
    Succeed,
    Reject,
    SlowStop(Duration),
    FailStop,
    Panic,
}

pub struct FakeLauncher {
    behavior: ProxyBehavior,
    pub payloads: Mutex<Vec<HandshakePayload>>,
    pub starts: AtomicUsize,
    pub log: EventLog,
}

impl FakeLauncher {
    pub fn new(behavior: ProxyBehavior, log: EventLog) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            payloads: Mutex::new(Vec::new()),
            starts: AtomicUsize::new(0),
            log,
        })
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn last_payload(&self) -> HandshakePayload {
        self.payloads
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("launcher was never started")
    }
}

#[async_trait]
impl ProxyLauncher for FakeLauncher {
    async fn start(
        &self,
        payload: &HandshakePayload,
        _options: &LauncherOptions,
    ) -> Result<Box<dyn ProxyHandle>, ProxyError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.payloads.lock().unwrap().push(payload.clone());

        if let ProxyBehavior::Panic = self.behavior {
            panic!("fake launcher crashed");
        }

        if let ProxyBehavior::Reject = self.behavior {
            return Err(ProxyError::Rejected {
                message: "fake proxy refused the payload".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(Box::new(FakeProxyHandle {
            address: ListeningAddress::new(PROXY_HOST, PROXY_PORT),
            behavior: self.behavior.clone(),
            log: Arc::clone(&self.log),
        }))
    }
}

struct FakeProxyHandle {
    address: ListeningAddress,
    behavior: ProxyBehavior,
    log: EventLog,
}

#[async_trait]
impl ProxyHandle for FakeProxyHandle {
    fn listening_address(&self) -> &ListeningAddress {
        &self.address
    }

    async fn stop(self: Box<Self>) -> Result<(), ProxyError> {
        if let ProxyBehavior::SlowStop(delay) = self.behavior {
            TokioSleep(delay).await;
        }

        self.log.lock().unwrap().push(EVENT_PROXY_STOPPED);

        match self.behavior {
            ProxyBehavior::FailStop => Err(ProxyError::Stop {
                message: "fake proxy would not stop".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
            _ => Ok(()),
        }
    }
}

/// Writes a fixed greeting and closes the connection.
pub struct GreetingHandler;

pub const GREETING: &[u8] = b"hello from the app";

#[async_trait]
impl ConnectionHandler for GreetingHandler {
    async fn handle(&self, mut stream: TcpStream, _peer: SocketAddr) {
        let _ = stream.write_all(GREETING).await;
        let _ = stream.shutdown().await;
    }
}

pub struct RecordingServer {
    inner: TcpRequestServer,
    log: EventLog,
}

impl RecordingServer {
    pub fn new(log: EventLog) -> Arc<Self> {
        Arc::new(Self {
            inner: TcpRequestServer::new(Arc::new(GreetingHandler)),
            log,
        })
    }
}

#[async_trait]
impl RequestServer for RecordingServer {
    async fn listen(&self, host: &str, port: u16) -> IoResult<()> {
        self.inner.listen(host, port).await
    }

    fn address(&self) -> Option<SocketAddr> {
        self.inner.address()
    }

    async fn close(&self) -> IoResult<()> {
        self.inner.close().await?;
        self.log.lock().unwrap().push(EVENT_SERVER_CLOSED);
        Ok(())
    }
}

pub struct FailingServer;

#[async_trait]
impl RequestServer for FailingServer {
    async fn listen(&self, _host: &str, _port: u16) -> IoResult<()> {
        Err(IoError::new(ErrorKind::AddrInUse, "address already in use"))
    }

    fn address(&self) -> Option<SocketAddr> {
        None
    }

    async fn close(&self) -> IoResult<()> {
        Ok(())
    }
}

pub struct PanickingServer;

#[async_trait]
impl RequestServer for PanickingServer {
    async fn listen(&self, _host: &str, _port: u16) -> IoResult<()> {
        panic!("fake server crashed while binding");
    }

    fn address(&self) -> Option<SocketAddr> {
        None
    }

    async fn close(&self) -> IoResult<()> {
        Ok(())
    }
}

pub fn session_with(launcher: Arc<FakeLauncher>, settings: EngineSettings) -> EngineSession {
    EngineSession::new(settings, launcher, LauncherOptions::default())
}
