use crate::error::proxy::ProxyError;

use common::ErrorLocation;

use std::io::Error as IoError;

use thiserror::Error as ThisError;

/// Every failure a session can report.
///
/// `Config` and `State` are returned synchronously from `listen()` before any
/// side effect. `Bind` and `Handshake` arrive once, asynchronously, through
/// the attempt's [`PendingListen`](crate::session::PendingListen).
#[derive(Debug, ThisError)]
pub enum EngineError {
    /// Malformed or ambiguous caller input.
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },

    /// The embedding server could not bind its ephemeral port.
    #[error("Bind Error: {message} {location}")]
    Bind {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    /// The proxy process failed to start or never reported an address.
    #[error("Handshake Error: {message} {location}")]
    Handshake {
        message: String,
        location: ErrorLocation,
        #[source]
        source: ProxyError,
    },

    /// Operation not valid in the session's current phase.
    #[error("State Error: {message} {location}")]
    State {
        message: String,
        location: ErrorLocation,
    },

    /// Teardown finished but the proxy stop or server close reported a failure.
    #[error("Shutdown Error: {message} {location}")]
    Shutdown {
        message: String,
        location: ErrorLocation,
    },
}

impl EngineError {
    /// True for failures raised before any socket or process was touched.
    pub fn is_synchronous(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::State { .. })
    }
}
