//! Proxy API key wrapper with redacted Debug/Display output.

use crate::{ErrorLocation, RedactError};

use std::fmt;
use std::panic::Location;

use serde::ser::Error;
use zeroize::Zeroize;

/// Number of trailing characters [`RedactedApiKey::hint`] reveals.
const HINT_SUFFIX_LEN: usize = 4;

/// API key handed to the proxy process through its environment.
///
/// The value is zeroized on drop and refuses serde serialization, so it can
/// never end up inside a handshake payload or a settings file by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct RedactedApiKey {
    inner: String,
}

impl RedactedApiKey {
    /// Wrap a raw key. Surrounding whitespace (a common `.env` artefact) is dropped.
    pub fn new(key: impl Into<String>) -> Self {
        let mut raw: String = key.into();
        let trimmed = raw.trim().to_string();
        raw.zeroize();
        Self { inner: trimmed }
    }

    /// The actual key, for handing to the child process environment only.
    #[inline]
    pub fn expose(&self) -> &str {
        &self.inner
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Loggable hint: `…` followed by the last few characters, or `…` alone
    /// when the key is too short to reveal anything safely.
    pub fn hint(&self) -> String {
        let count = self.inner.chars().count();
        if count <= HINT_SUFFIX_LEN * 2 {
            return String::from("…");
        }

        let suffix: String = self.inner.chars().skip(count - HINT_SUFFIX_LEN).collect();
        format!("…{suffix}")
    }
}

impl fmt::Debug for RedactedApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RedactedApiKey({})", self.hint())
    }
}

impl fmt::Display for RedactedApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED API KEY {}]", self.hint())
    }
}

impl Drop for RedactedApiKey {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

impl serde::Serialize for RedactedApiKey {
    #[track_caller]
    fn serialize<S>(&self, _serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Err(S::Error::custom(RedactError::Serialization {
            type_name: "RedactedApiKey",
            message: String::from("RedactedApiKey cannot be serialized - pass it via expose()"),
            location: ErrorLocation::from(Location::caller()),
        }))
    }
}
