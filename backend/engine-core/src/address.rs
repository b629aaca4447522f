//! Listen target normalization.
//!
//! Turns the loosely typed `(port, pipe_path, host)` triple a caller hands to
//! `listen()` into exactly one [`ListenTarget`].

use crate::error::EngineError;
use crate::{DEFAULT_FRONTEND_HOST, PIPE_PREFIX};

use common::ErrorLocation;
use models::ListenTarget;

use std::panic::Location;

use log::debug;

/// A port as a caller may supply it: a number, or text that is either a
/// number or a named pipe path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSpec {
    Number(u16),
    Text(String),
}

impl From<u16> for PortSpec {
    fn from(port: u16) -> Self {
        Self::Number(port)
    }
}

impl From<&str> for PortSpec {
    fn from(port: &str) -> Self {
        Self::Text(port.to_string())
    }
}

impl From<String> for PortSpec {
    fn from(port: String) -> Self {
        Self::Text(port)
    }
}

/// True when `value` starts with the literal `\\.\pipe\` prefix.
pub fn is_pipe_path(value: &str) -> bool {
    value.starts_with(PIPE_PREFIX)
}

/// Normalize a requested listen target.
///
/// # Errors
///
/// Returns [`EngineError::Config`] when both or neither of `port` and
/// `pipe_path` are given, when a supplied pipe path is empty, or when a text
/// port is neither numeric nor a named pipe path.
#[track_caller]
pub fn normalize(
    port: Option<PortSpec>,
    pipe_path: Option<String>,
    host: Option<String>,
) -> Result<ListenTarget, EngineError> {
    match (port, pipe_path) {
        (None, None) => Err(EngineError::Config {
            message: String::from("Either a port or a pipe path must be provided"),
            location: ErrorLocation::from(Location::caller()),
        }),
        (Some(_), Some(_)) => Err(EngineError::Config {
            message: String::from("Only one of port and pipe path may be provided"),
            location: ErrorLocation::from(Location::caller()),
        }),
        (None, Some(pipe_path)) => pipe_target(pipe_path, host),
        (Some(PortSpec::Number(port)), None) => Ok(ListenTarget::tcp(frontend_host(host), port)),
        (Some(PortSpec::Text(text)), None) => {
            if let Ok(port) = text.parse::<u16>() {
                return Ok(ListenTarget::tcp(frontend_host(host), port));
            }

            if is_pipe_path(&text) {
                return pipe_target(text, host);
            }

            Err(EngineError::Config {
                message: format!("Invalid port or named pipe path: {text:?}"),
                location: ErrorLocation::from(Location::caller()),
            })
        }
    }
}

#[track_caller]
fn pipe_target(pipe_path: String, host: Option<String>) -> Result<ListenTarget, EngineError> {
    if pipe_path.is_empty() {
        return Err(EngineError::Config {
            message: String::from("Pipe path cannot be empty"),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    if let Some(host) = host {
        debug!("Ignoring host {host} for pipe target {pipe_path}");
    }

    Ok(ListenTarget::pipe(pipe_path))
}

fn frontend_host(host: Option<String>) -> String {
    host.filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FRONTEND_HOST.to_string())
}
