//! Adapters that turn a framework's own "listen" call into an
//! [`EngineSession::listen`](crate::EngineSession::listen).
//!
//! - [`override_hook`]: frameworks exposing a replaceable listen hook
//! - [`one_shot`]: frameworks without one; intercept only the first call
//! - [`readiness`]: frameworks that wait for a "listening" notification on a
//!   server object that never bound a socket itself

pub mod one_shot;
pub mod override_hook;
pub mod readiness;

pub use one_shot::OneShotListen;
pub use override_hook::{ListenOverride, install_listen_override};
pub use readiness::{ArtificialReadiness, LISTENING_EVENT, ListeningNotifier};

use crate::address::PortSpec;
use crate::error::EngineError;
use crate::server::RequestServer;
use crate::session::{ListenOptions, PendingListen, ReadyCallback};

use common::ErrorLocation;

use std::panic::Location;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments a framework passes to its own listen call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameworkListenArgs {
    /// Numeric port, numeric text, or a named pipe path given as the port.
    Port {
        port: PortSpec,
        host: Option<String>,
    },
    /// Filesystem socket path. Not supported: the proxy owns the public side.
    Path(PathBuf),
}

/// One framework listen invocation.
pub struct FrameworkListen {
    pub args: FrameworkListenArgs,
    pub on_ready: Option<ReadyCallback>,
}

impl FrameworkListen {
    pub fn port(port: impl Into<PortSpec>) -> Self {
        Self {
            args: FrameworkListenArgs::Port {
                port: port.into(),
                host: None,
            },
            on_ready: None,
        }
    }

    /// Convert into session listen options with `server` as the app source.
    ///
    /// # Errors
    ///
    /// [`EngineError::Config`] for path-based listening.
    #[track_caller]
    pub fn into_listen_options(
        self,
        server: Arc<dyn RequestServer>,
    ) -> Result<ListenOptions, EngineError> {
        let (port, host) = match self.args {
            FrameworkListenArgs::Port { port, host } => (port, host),
            FrameworkListenArgs::Path(path) => {
                return Err(EngineError::Config {
                    message: format!(
                        "Path-based listening is not supported: {}",
                        path.display()
                    ),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        Ok(ListenOptions {
            port: Some(port),
            host,
            server: Some(server),
            on_ready: self.on_ready,
            ..ListenOptions::default()
        })
    }
}

/// Replacement for a framework's listen entry point.
pub type ListenHook =
    Box<dyn FnMut(FrameworkListen) -> Result<PendingListen, EngineError> + Send + 'static>;
