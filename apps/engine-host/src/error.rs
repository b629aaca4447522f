use common::ErrorLocation;

use thiserror::Error;

/// Errors that stop the host before or while it serves.
#[derive(Debug, Error)]
pub enum HostError {
    /// Error from this app
    #[error("Host Error: {message} {location}")]
    Host {
        message: String,
        location: ErrorLocation,
    },

    #[error("Logger Error: {message} {location}")]
    Logger {
        message: String,
        location: ErrorLocation,
    },

    /// Settings file could not be located, read or validated
    #[error("Settings Error: {message} {location}")]
    Settings {
        message: String,
        location: ErrorLocation,
    },

    /// Listen or stop failed in the engine session
    #[error("Session Error: {message} {location}")]
    Session {
        message: String,
        location: ErrorLocation,
    },
}
