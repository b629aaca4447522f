//! Lifecycle controller.
//!
//! An [`EngineSession`] owns one listen lifetime: it validates the caller's
//! input, binds the embedding server to an ephemeral loopback port, starts the
//! proxy with a handshake payload pointing at that port, and records the
//! public address the proxy reports.
//!
//! # Error reporting
//!
//! - Input problems (`Config`) and calls in the wrong phase (`State`) are
//!   returned from [`EngineSession::listen`] before any side effect.
//! - Bind and proxy failures happen later and are delivered exactly once
//!   through the returned [`PendingListen`]. A panic in the server's bind or
//!   in the launcher is reported the same way and leaves the session
//!   `Errored`, so `stop()` can still tear it down.
//!
//! A failed attempt never produces both.
//!
//! # Concurrency
//!
//! `EngineSession` is `Clone`; all clones share one state. The state lock is
//! never held across an `.await`.

mod options;
mod pending;
mod phase;

pub use options::{ListenOptions, ReadyCallback};
pub use pending::PendingListen;
pub use phase::SessionPhase;

use crate::address::normalize;
use crate::bind::bind_ephemeral;
use crate::error::{EngineError, ProxyError};
use crate::payload::{build_payload, check_graphql_paths};
use crate::proxy::{LauncherOptions, ProcessLauncher, ProxyHandle, ProxyLauncher};
use crate::server::{RequestServer, resolve_server};
use crate::settings::EngineSettings;
use crate::shims::{FrameworkListen, ListenHook};

use common::ErrorLocation;
use models::{ListenTarget, ListeningAddress};
use pending::ListenResult;

use std::any::Any;
use std::io::Error as IoError;
use std::panic::{AssertUnwindSafe, Location};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use log::{debug, error, info, warn};
use tokio::spawn as TokioSpawn;
use tokio::sync::oneshot;
use uuid::Uuid;

#[derive(Default)]
struct SessionInner {
    phase: SessionPhase,
    server: Option<Arc<dyn RequestServer>>,
    proxy: Option<Box<dyn ProxyHandle>>,
    public_address: Option<ListeningAddress>,
}

/// One embedding server handed off to one proxy process.
#[derive(Clone)]
pub struct EngineSession {
    id: Uuid,
    settings: Arc<EngineSettings>,
    launcher: Arc<dyn ProxyLauncher>,
    launcher_options: Arc<LauncherOptions>,
    inner: Arc<Mutex<SessionInner>>,
}

impl EngineSession {
    pub fn new(
        settings: EngineSettings,
        launcher: Arc<dyn ProxyLauncher>,
        launcher_options: LauncherOptions,
    ) -> Self {
        let id = Uuid::new_v4();
        debug!("Session {id} created");

        Self {
            id,
            settings: Arc::new(settings),
            launcher,
            launcher_options: Arc::new(launcher_options),
            inner: Arc::new(Mutex::new(SessionInner::default())),
        }
    }

    /// Session running the proxy as a child process configured by `settings.launcher`.
    pub fn with_process_launcher(settings: EngineSettings) -> Self {
        let launcher_options = LauncherOptions::from_settings(&settings.launcher);
        Self::new(settings, Arc::new(ProcessLauncher), launcher_options)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock_inner().phase
    }

    /// Public address most recently reported by the proxy, while live.
    pub fn public_address(&self) -> Option<ListeningAddress> {
        self.lock_inner().public_address.clone()
    }

    fn lock_inner(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a listen attempt.
    ///
    /// Must be called from within a Tokio runtime. Validation runs
    /// synchronously; the bind and the proxy handshake run on a spawned task
    /// whose outcome is delivered through the returned [`PendingListen`]. On
    /// success `options.on_ready` runs on its own task, after the public
    /// address was stored.
    ///
    /// # Errors
    ///
    /// - [`EngineError::State`] when the session is not idle
    /// - [`EngineError::Config`] for a malformed listen target, zero or
    ///   several app sources, or invalid GraphQL path settings
    #[track_caller]
    pub fn listen(&self, options: ListenOptions) -> Result<PendingListen, EngineError> {
        let ListenOptions {
            port,
            pipe_path,
            host,
            server,
            handler,
            service,
            on_ready,
        } = options;

        let (target, server) = {
            let mut inner = self.lock_inner();

            if inner.phase != SessionPhase::Idle {
                return Err(EngineError::State {
                    message: format!(
                        "Session {} is {}; listen requires an idle session",
                        self.id, inner.phase
                    ),
                    location: ErrorLocation::from(Location::caller()),
                });
            }

            let target = normalize(port, pipe_path, host)?;
            let server = resolve_server(server, handler, service)?;
            check_graphql_paths(self.settings.graphql_paths.as_deref())?;

            inner.phase = SessionPhase::AwaitingBind;
            inner.server = Some(Arc::clone(&server));
            (target, server)
        };

        info!("Session {}: listen requested on {target}", self.id);

        let (result_tx, result_rx) = oneshot::channel();
        let session = self.clone();
        TokioSpawn(async move {
            session
                .run_startup(target, server, on_ready, result_tx)
                .await;
        });

        Ok(PendingListen::new(result_rx))
    }

    async fn run_startup(
        self,
        target: ListenTarget,
        server: Arc<dyn RequestServer>,
        on_ready: Option<ReadyCallback>,
        result_tx: oneshot::Sender<ListenResult>,
    ) {
        let outcome = AssertUnwindSafe(self.startup(&target, server))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(self.startup_panicked(panic_message(panic.as_ref()))));

        match outcome {
            Ok(address) => {
                info!("Session {}: live at {address} (frontend {target})", self.id);

                if let Some(on_ready) = on_ready {
                    let ready_address = address.clone();
                    TokioSpawn(async move { on_ready(ready_address) });
                }

                if result_tx.send(Ok(address)).is_err() {
                    debug!("Session {}: nobody awaited the listen result", self.id);
                }
            }
            Err(err) => {
                self.lock_inner().phase = SessionPhase::Errored;
                error!("Session {}: listen on {target} failed: {err}", self.id);

                if let Err(Err(err)) = result_tx.send(Err(err)) {
                    warn!(
                        "Session {}: listen failure was not observed by the caller: {err}",
                        self.id
                    );
                }
            }
        }
    }

    /// Convert a panic in the bind or the proxy start into that stage's error.
    fn startup_panicked(&self, reason: String) -> EngineError {
        let phase = self.lock_inner().phase;
        warn!("Session {}: startup panicked while {phase}: {reason}", self.id);

        if phase == SessionPhase::AwaitingBind {
            EngineError::Bind {
                message: format!("Embedding server panicked during bind: {reason}"),
                location: ErrorLocation::from(Location::caller()),
                source: IoError::other(reason),
            }
        } else {
            EngineError::Handshake {
                message: format!("Proxy launcher panicked: {reason}"),
                location: ErrorLocation::from(Location::caller()),
                source: ProxyError::Panic {
                    message: reason,
                    location: ErrorLocation::from(Location::caller()),
                },
            }
        }
    }

    async fn startup(
        &self,
        target: &ListenTarget,
        server: Arc<dyn RequestServer>,
    ) -> Result<ListeningAddress, EngineError> {
        let bind = bind_ephemeral(server.as_ref(), &self.settings.internal_host).await?;

        self.lock_inner().phase = SessionPhase::AwaitingHandshake;
        debug!(
            "Session {}: embedding server at {}, starting proxy",
            self.id,
            bind.origin_url()
        );

        let payload = build_payload(target, &bind, &self.settings)?;

        let proxy = self
            .launcher
            .start(&payload, &self.launcher_options)
            .await
            .map_err(|source| EngineError::Handshake {
                message: format!("Proxy failed to start for origin {}", bind.origin_url()),
                location: ErrorLocation::from(Location::caller()),
                source,
            })?;

        let address = proxy.listening_address().clone();

        let mut inner = self.lock_inner();
        inner.public_address = Some(address.clone());
        inner.proxy = Some(proxy);
        inner.phase = SessionPhase::Live;

        Ok(address)
    }

    /// Stop the proxy, then close the embedding server, then return to idle.
    ///
    /// From `Live` this always ends `Idle` with the public address cleared and
    /// the server closed, even when the proxy stop fails; such failures are
    /// reported afterwards as [`EngineError::Shutdown`]. From `Errored` it
    /// closes the server left bound by the failed attempt.
    ///
    /// # Errors
    ///
    /// [`EngineError::State`] in any other phase.
    pub async fn stop(&self) -> Result<(), EngineError> {
        let (proxy, server) = {
            let mut inner = self.lock_inner();

            if !matches!(inner.phase, SessionPhase::Live | SessionPhase::Errored) {
                return Err(EngineError::State {
                    message: format!(
                        "Session {} is {}; only a live or errored session can be stopped",
                        self.id, inner.phase
                    ),
                    location: ErrorLocation::from(Location::caller()),
                });
            }

            inner.phase = SessionPhase::Stopping;
            (inner.proxy.take(), inner.server.clone())
        };

        info!("Session {}: stopping", self.id);
        let mut failures = Vec::new();

        if let Some(proxy) = proxy
            && let Err(e) = proxy.stop().await
        {
            warn!("Session {}: proxy stop failed: {e}", self.id);
            failures.push(format!("proxy stop failed: {e}"));
        }

        if let Some(server) = server
            && server.address().is_some()
            && let Err(e) = server.close().await
        {
            warn!("Session {}: closing embedding server failed: {e}", self.id);
            failures.push(format!("server close failed: {e}"));
        }

        {
            let mut inner = self.lock_inner();
            inner.public_address = None;
            inner.proxy = None;
            inner.server = None;
            inner.phase = SessionPhase::Idle;
        }

        info!("Session {}: stopped", self.id);

        if failures.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Shutdown {
                message: failures.join("; "),
                location: ErrorLocation::from(Location::caller()),
            })
        }
    }

    /// Listen hook for framework shims: forwards a framework's own listen
    /// call, with `server` as the app source.
    pub fn listen_hook(&self, server: Arc<dyn RequestServer>) -> ListenHook {
        let session = self.clone();
        Box::new(move |call: FrameworkListen| {
            let options = call.into_listen_options(Arc::clone(&server))?;
            session.listen(options)
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("unknown panic payload")
    }
}
