use crate::address::PortSpec;
use crate::server::{ConnectionHandler, RequestServer, ServiceFn};

use models::ListeningAddress;

use std::fmt::{Debug, Formatter, Result as FormatResult};
use std::sync::Arc;

/// Invoked once, on its own task, after the session went live.
pub type ReadyCallback = Box<dyn FnOnce(ListeningAddress) + Send + 'static>;

/// Arguments of one `listen()` call.
///
/// Exactly one of `port` / `pipe_path` and exactly one of `server` /
/// `handler` / `service` must be set.
#[derive(Default)]
pub struct ListenOptions {
    pub port: Option<PortSpec>,
    pub pipe_path: Option<String>,
    pub host: Option<String>,
    pub server: Option<Arc<dyn RequestServer>>,
    pub handler: Option<Arc<dyn ConnectionHandler>>,
    pub service: Option<ServiceFn>,
    pub on_ready: Option<ReadyCallback>,
}

impl ListenOptions {
    pub fn with_port(mut self, port: impl Into<PortSpec>) -> Self {
        self.port = Some(port.into());
        self
    }

    pub fn with_pipe_path(mut self, pipe_path: impl Into<String>) -> Self {
        self.pipe_path = Some(pipe_path.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_server(mut self, server: Arc<dyn RequestServer>) -> Self {
        self.server = Some(server);
        self
    }

    pub fn with_handler(mut self, handler: Arc<dyn ConnectionHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn with_service(mut self, service: ServiceFn) -> Self {
        self.service = Some(service);
        self
    }

    pub fn on_ready<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(ListeningAddress) + Send + 'static,
    {
        self.on_ready = Some(Box::new(callback));
        self
    }
}

impl Debug for ListenOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.debug_struct("ListenOptions")
            .field("port", &self.port)
            .field("pipe_path", &self.pipe_path)
            .field("host", &self.host)
            .field("server", &self.server.is_some())
            .field("handler", &self.handler.is_some())
            .field("service", &self.service.is_some())
            .field("on_ready", &self.on_ready.is_some())
            .finish()
    }
}
