//! Handshake payload assembly.

use crate::error::EngineError;
use crate::settings::EngineSettings;

use common::ErrorLocation;
use models::{EphemeralBindResult, HandshakePayload, HandshakePayloadBuilder, ListenTarget};

use std::panic::Location;

/// Build the proxy startup payload.
///
/// Pure: the frontend mirrors `target`, the origin is derived from `bind`, and
/// GraphQL paths come from `settings` (defaulting to `/graphql`). With a target
/// from [`normalize`](crate::address::normalize), a bind result from
/// [`bind_ephemeral`](crate::bind::bind_ephemeral) and paths that passed
/// [`check_graphql_paths`] this cannot fail.
#[track_caller]
pub fn build_payload(
    target: &ListenTarget,
    bind: &EphemeralBindResult,
    settings: &EngineSettings,
) -> Result<HandshakePayload, EngineError> {
    let mut builder = HandshakePayloadBuilder::default()
        .with_listen_target(target)
        .with_origin(bind);

    if let Some(paths) = &settings.graphql_paths {
        builder = builder.with_graphql_paths(paths.iter().cloned());
    }

    builder.build().map_err(|e| EngineError::Config {
        message: format!("Invalid handshake payload: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })
}

/// Reject GraphQL path settings the payload builder would refuse.
///
/// Run before any side effect so a bad path is a synchronous `listen()` error.
#[track_caller]
pub fn check_graphql_paths(paths: Option<&[String]>) -> Result<(), EngineError> {
    let Some(paths) = paths else {
        return Ok(());
    };

    if paths.is_empty() {
        return Err(EngineError::Config {
            message: String::from("GraphQL paths cannot be an empty list"),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    match paths.iter().find(|p| !p.starts_with('/')) {
        Some(bad) => Err(EngineError::Config {
            message: format!("GraphQL path must start with '/': {bad}"),
            location: ErrorLocation::from(Location::caller()),
        }),
        None => Ok(()),
    }
}
