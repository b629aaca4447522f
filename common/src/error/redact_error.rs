use crate::ErrorLocation;

use thiserror::Error as ThisError;

/// Raised when a secret-bearing type is asked to leave the process in clear text.
#[derive(Debug, ThisError)]
pub enum RedactError {
    #[error("Refused To Serialize {type_name}: {message} {location}")]
    Serialization {
        type_name: &'static str,
        message: String,
        location: ErrorLocation,
    },
}
