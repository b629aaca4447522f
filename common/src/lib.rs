//! Shared primitives for the edge engine workspace.
//!
//! Everything here is dependency-light and used by every other crate:
//!
//! - **ErrorLocation**: file/line/column captured with `#[track_caller]`
//! - **RedactedApiKey**: proxy API key that never leaks into logs
//!
//! ## Architecture
//!
//! - **common** (this crate): cross-cutting primitives
//! - **models**: pure data handed between the engine and the proxy
//! - **engine-core**: lifecycle orchestration operating on models
//! - **engine-host**: binary wiring everything together

pub mod error;
pub mod redacted_key;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use redacted_key::RedactedApiKey;

#[cfg(test)]
mod tests;
