//! Sensitive-value wrapper.
//!
//! [`Secret`] marks a value as sensitive at the type level: display, debug,
//! and serialization paths all emit a redaction placeholder, and the wrapped
//! memory is zeroized on drop. The value stays deliverable to its intended
//! consumer through the single explicit unwrap, [`Secret::expose_secret`].

use serde::{Serialize, Serializer};
use zeroize::Zeroize;

use crate::core::constants;

/// A value redacted from logs, debug output, and state serialization.
///
/// The public key travels through this wrapper too, even though its content
/// is not confidential: every value a component publishes crosses the same
/// redacting channel, so serialization code paths cannot leak by omission.
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    /// Wrap a sensitive value.
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Access the wrapped value.
    ///
    /// This is the only unwrap path. Call sites are expected to hand the
    /// value directly to its consumer, never to a formatting or logging
    /// macro.
    pub fn expose_secret(&self) -> &T {
        &self.0
    }
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Zeroize + PartialEq> PartialEq for Secret<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: Zeroize + Eq> Eq for Secret<T> {}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<T: Zeroize> std::fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(constants::REDACTED)
    }
}

impl<T: Zeroize> std::fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(constants::REDACTED)
    }
}

impl<T: Zeroize> Serialize for Secret<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(constants::REDACTED)
    }
}

impl From<&str> for Secret<String> {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl From<String> for Secret<String> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
