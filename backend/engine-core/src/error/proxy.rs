use common::ErrorLocation;

use std::error::Error as StdError;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ProxyError {
    #[error("Proxy Spawn Error: {message} {location}")]
    Spawn {
        message: String,
        location: ErrorLocation,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Proxy Handshake Write Error: {message} {location}")]
    Write {
        message: String,
        location: ErrorLocation,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Proxy Parse Error: {message} {location}")]
    Parse {
        message: String,
        location: ErrorLocation,
    },

    /// The proxy ran but refused the payload or exited with an error.
    #[error("Proxy Rejected Error: {message} {location}")]
    Rejected {
        message: String,
        location: ErrorLocation,
    },

    /// The launcher panicked instead of returning an error.
    #[error("Proxy Launcher Panic: {message} {location}")]
    Panic {
        message: String,
        location: ErrorLocation,
    },

    #[error("Proxy Stop Error: {message} {location}")]
    Stop {
        message: String,
        location: ErrorLocation,
    },
}
