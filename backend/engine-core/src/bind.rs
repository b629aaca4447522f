//! Ephemeral loopback bind of the embedding server.

use crate::error::EngineError;
use crate::server::RequestServer;

use common::ErrorLocation;
use models::EphemeralBindResult;

use std::io::{Error as IoError, ErrorKind};
use std::panic::Location;

use log::debug;

/// Port 0: let the OS pick.
const EPHEMERAL_PORT: u16 = 0;

/// Bind `server` to an OS-assigned port on `internal_host`.
///
/// Resolves once the OS confirmed the bind. The concrete address is read back
/// from [`RequestServer::address`].
///
/// # Errors
///
/// [`EngineError::Bind`] carrying the OS error when the bind fails, or when
/// the server reports no address after a successful `listen`.
pub async fn bind_ephemeral(
    server: &dyn RequestServer,
    internal_host: &str,
) -> Result<EphemeralBindResult, EngineError> {
    debug!("Binding embedding server to {internal_host}:{EPHEMERAL_PORT}");

    server
        .listen(internal_host, EPHEMERAL_PORT)
        .await
        .map_err(|e| EngineError::Bind {
            message: format!("Failed to bind embedding server on {internal_host}: {e}"),
            location: ErrorLocation::from(Location::caller()),
            source: e,
        })?;

    let bound = server.address().ok_or_else(|| EngineError::Bind {
        message: format!("Embedding server on {internal_host} reported no bound address"),
        location: ErrorLocation::from(Location::caller()),
        source: IoError::new(ErrorKind::AddrNotAvailable, "no bound address after listen"),
    })?;

    debug!("Embedding server bound to {bound}");
    Ok(EphemeralBindResult::new(bound.ip().to_string(), bound.port()))
}
