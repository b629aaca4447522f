//! Domain models for the edge engine.
//!
//! Pure data exchanged between the lifecycle controller and the proxy
//! process. Nothing in here performs I/O.
//!
//! - [`ListenTarget`]: where the public proxy should listen (TCP or named pipe)
//! - [`EphemeralBindResult`]: where the embedding server actually bound
//! - [`HandshakePayload`]: startup configuration sent to the proxy
//! - [`ListeningAddress`]: the public address the proxy reports back

pub mod bind_result;
pub mod error;
pub mod handshake_payload;
pub mod listen_target;
pub mod listening_address;

pub use bind_result::EphemeralBindResult;
pub use common::ErrorLocation;
pub use error::model_error::ModelError;
pub use handshake_payload::builder::HandshakePayloadBuilder;
pub use handshake_payload::{FrontendEndpoint, HandshakePayload};
pub use listen_target::ListenTarget;
pub use listening_address::ListeningAddress;

#[cfg(test)]
mod tests;
