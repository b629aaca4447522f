use crate::error::EngineError;

use common::ErrorLocation;
use models::ListeningAddress;

use std::panic::Location;

use tokio::sync::oneshot;

pub(crate) type ListenResult = Result<ListeningAddress, EngineError>;

/// Outcome of one listen attempt that passed synchronous validation.
///
/// Resolves exactly once: with the public address when the session went
/// live, or with the single `Bind` / `Handshake` error of the attempt.
#[derive(Debug)]
#[must_use = "a listen attempt reports asynchronous failures only through PendingListen"]
pub struct PendingListen {
    result_rx: oneshot::Receiver<ListenResult>,
}

impl PendingListen {
    pub(crate) fn new(result_rx: oneshot::Receiver<ListenResult>) -> Self {
        Self { result_rx }
    }

    /// Wait until the session is live or the attempt failed.
    pub async fn ready(self) -> Result<ListeningAddress, EngineError> {
        match self.result_rx.await {
            Ok(result) => result,
            Err(_) => Err(EngineError::State {
                message: String::from("Startup task ended without reporting a result"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}
