//! Canonical request-handling server and the resolver that produces one.
//!
//! Callers supply exactly one "app" source in [`ListenOptions`](crate::ListenOptions):
//!
//! - a ready-made [`RequestServer`]
//! - a [`ConnectionHandler`] implementation
//! - a [`ServiceFn`] closure
//!
//! Handler and closure sources are wrapped into a [`TcpRequestServer`].

mod tcp;

pub use tcp::TcpRequestServer;

use crate::error::EngineError;

use common::ErrorLocation;

use std::io::Result as IoResult;
use std::net::SocketAddr;
use std::panic::Location;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use log::debug;
use tokio::net::TcpStream;

/// The server an engine session binds, hands to the proxy, and closes.
#[async_trait]
pub trait RequestServer: Send + Sync {
    /// Start listening on `host:port`. Resolves once the OS confirmed the bind.
    async fn listen(&self, host: &str, port: u16) -> IoResult<()>;

    /// Bound address, available after `listen` resolved.
    fn address(&self) -> Option<SocketAddr>;

    /// Stop accepting connections.
    async fn close(&self) -> IoResult<()>;
}

/// Per-connection application logic.
#[async_trait]
pub trait ConnectionHandler: Send + Sync + 'static {
    async fn handle(&self, stream: TcpStream, peer: SocketAddr);
}

/// Closure form of [`ConnectionHandler`].
pub type ServiceFn = Arc<dyn Fn(TcpStream, SocketAddr) -> BoxFuture<'static, ()> + Send + Sync>;

struct ServiceHandler(ServiceFn);

#[async_trait]
impl ConnectionHandler for ServiceHandler {
    async fn handle(&self, stream: TcpStream, peer: SocketAddr) {
        (self.0)(stream, peer).await
    }
}

/// Select exactly one canonical server from the mutually exclusive sources.
///
/// Wrapping a handler or closure allocates a new [`TcpRequestServer`] but
/// performs no network operation.
///
/// # Errors
///
/// [`EngineError::Config`] when no source or more than one source is given.
#[track_caller]
pub fn resolve_server(
    server: Option<Arc<dyn RequestServer>>,
    handler: Option<Arc<dyn ConnectionHandler>>,
    service: Option<ServiceFn>,
) -> Result<Arc<dyn RequestServer>, EngineError> {
    let provided = [server.is_some(), handler.is_some(), service.is_some()]
        .into_iter()
        .filter(|present| *present)
        .count();

    match (server, handler, service) {
        (Some(server), None, None) => {
            debug!("Using caller-supplied request server");
            Ok(server)
        }
        (None, Some(handler), None) => Ok(wrap_handler(handler)),
        (None, None, Some(service)) => Ok(wrap_handler(Arc::new(ServiceHandler(service)))),
        (None, None, None) => Err(EngineError::Config {
            message: String::from(
                "No app provided: supply a server, a connection handler or a service function",
            ),
            location: ErrorLocation::from(Location::caller()),
        }),
        _ => Err(EngineError::Config {
            message: format!("Ambiguous app provided: {provided} app sources given, expected one"),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}

fn wrap_handler(handler: Arc<dyn ConnectionHandler>) -> Arc<dyn RequestServer> {
    debug!("Wrapping connection handler in a TCP request server");
    Arc::new(TcpRequestServer::new(handler))
}
