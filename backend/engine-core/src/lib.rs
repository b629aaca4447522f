//! Lifecycle orchestration for handing an application server's public
//! identity to an external reverse-proxy process.
//!
//! The embedding server binds an ephemeral loopback port, the proxy is
//! started with a [`models::HandshakePayload`] pointing at it, and once the
//! proxy reports its own address the session is live. See
//! [`session::EngineSession`] for the state machine.

pub mod address;
pub mod bind;
pub mod error;
pub mod payload;
pub mod proxy;
pub mod server;
pub mod session;
pub mod settings;
pub mod shims;

#[cfg(test)]
mod tests;

pub use address::PortSpec;
pub use error::EngineError;
pub use session::{EngineSession, ListenOptions, PendingListen, SessionPhase};

/// Host the embedding server binds its ephemeral port on.
pub const DEFAULT_INTERNAL_HOST: &str = "127.0.0.1";

/// Host the proxy listens on when the caller names a port but no host.
pub const DEFAULT_FRONTEND_HOST: &str = "0.0.0.0";

/// Literal prefix of a Windows named pipe path.
pub const PIPE_PREFIX: &str = r"\\.\pipe\";

pub const PROXY_BINARY: &str = "engine-proxy";

const ENV_PREFIX: &str = "ENGINE_";

/// Environment variable the proxy reads its API key from.
pub const PROXY_API_KEY_ENV: &str = const_format::concatcp!(ENV_PREFIX, "API_KEY");

/// Environment variable forwarded to the proxy to set its log level.
pub const PROXY_LOG_LEVEL_ENV: &str = const_format::concatcp!(ENV_PREFIX, "LOG_LEVEL");
