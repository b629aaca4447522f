use std::fmt::{Display, Formatter, Result as FormatResult};

use serde::{Deserialize, Serialize};

/// Canonical "where should the public proxy listen".
///
/// Exactly one shape per listen attempt; the enum rules out the
/// both-set and neither-set cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListenTarget {
    Tcp { host: String, port: u16 },
    Pipe { pipe_path: String },
}

impl ListenTarget {
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    pub fn pipe(pipe_path: impl Into<String>) -> Self {
        Self::Pipe {
            pipe_path: pipe_path.into(),
        }
    }

    pub fn port(&self) -> Option<u16> {
        match self {
            Self::Tcp { port, .. } => Some(*port),
            Self::Pipe { .. } => None,
        }
    }

    pub fn pipe_path(&self) -> Option<&str> {
        match self {
            Self::Tcp { .. } => None,
            Self::Pipe { pipe_path } => Some(pipe_path),
        }
    }
}

impl Display for ListenTarget {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        match self {
            Self::Tcp { host, port } => write!(formatter, "tcp {host}:{port}"),
            Self::Pipe { pipe_path } => write!(formatter, "pipe {pipe_path}"),
        }
    }
}
