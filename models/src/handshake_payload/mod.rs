//! Startup payload handed to the proxy process.
//!
//! Serialized as a single JSON object with camelCase keys:
//!
//! ```json
//! {
//!   "frontendHost": "0.0.0.0",
//!   "frontendPort": 3000,
//!   "graphqlPaths": ["/graphql"],
//!   "originUrl": "http://127.0.0.1:53122",
//!   "useFrontendPathForDefaultOrigin": true
//! }
//! ```
//!
//! Pipe frontends replace the host/port pair with `frontendPipePath`.

pub mod builder;

use crate::ListenTarget;

use serde::{Deserialize, Serialize};

/// Where the proxy accepts public traffic. Mirrors [`ListenTarget`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrontendEndpoint {
    Tcp {
        #[serde(rename = "frontendHost")]
        host: String,
        #[serde(rename = "frontendPort")]
        port: u16,
    },
    Pipe {
        #[serde(rename = "frontendPipePath")]
        pipe_path: String,
    },
}

impl From<&ListenTarget> for FrontendEndpoint {
    fn from(target: &ListenTarget) -> Self {
        match target {
            ListenTarget::Tcp { host, port } => Self::Tcp {
                host: host.clone(),
                port: *port,
            },
            ListenTarget::Pipe { pipe_path } => Self::Pipe {
                pipe_path: pipe_path.clone(),
            },
        }
    }
}

/// Immutable handshake payload. Construct through [`builder::HandshakePayloadBuilder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakePayload {
    #[serde(flatten)]
    frontend: FrontendEndpoint,
    graphql_paths: Vec<String>,
    origin_url: String,
    use_frontend_path_for_default_origin: bool,
}

impl HandshakePayload {
    pub fn frontend(&self) -> &FrontendEndpoint {
        &self.frontend
    }

    pub fn frontend_host(&self) -> Option<&str> {
        match &self.frontend {
            FrontendEndpoint::Tcp { host, .. } => Some(host),
            FrontendEndpoint::Pipe { .. } => None,
        }
    }

    pub fn frontend_port(&self) -> Option<u16> {
        match &self.frontend {
            FrontendEndpoint::Tcp { port, .. } => Some(*port),
            FrontendEndpoint::Pipe { .. } => None,
        }
    }

    pub fn frontend_pipe_path(&self) -> Option<&str> {
        match &self.frontend {
            FrontendEndpoint::Tcp { .. } => None,
            FrontendEndpoint::Pipe { pipe_path } => Some(pipe_path),
        }
    }

    pub fn graphql_paths(&self) -> &[String] {
        &self.graphql_paths
    }

    pub fn origin_url(&self) -> &str {
        &self.origin_url
    }

    pub fn use_frontend_path_for_default_origin(&self) -> bool {
        self.use_frontend_path_for_default_origin
    }
}
