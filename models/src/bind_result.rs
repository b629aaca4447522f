use serde::{Deserialize, Serialize};

/// Loopback address/port the embedding server ended up bound to.
///
/// Created once per listen attempt, after the OS confirmed the bind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EphemeralBindResult {
    pub address: String,
    pub port: u16,
}

impl EphemeralBindResult {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// URL the proxy forwards traffic to.
    pub fn origin_url(&self) -> String {
        format!("http://{}:{}", self.address, self.port)
    }
}
