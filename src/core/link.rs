//! Cross-component link contract.
//!
//! A link is a published, read-only projection of a component's state,
//! consumed by other components in the same provisioning graph. The Auth
//! component's link carries exactly one property: the public key. The
//! payload type has no field capable of holding the private key, so the
//! security invariant holds by construction on every code path.

use serde::Serialize;

use crate::core::secret::Secret;

/// The data a linked component may read from an Auth instance.
#[derive(Debug, Clone, Serialize)]
pub struct LinkPayload {
    /// Public key PEM, sensitive-wrapped for defense in depth.
    #[serde(rename = "publicKey")]
    public_key: Secret<String>,
}

impl LinkPayload {
    pub(crate) fn new(public_key: Secret<String>) -> Self {
        Self { public_key }
    }

    /// The published public key.
    pub fn public_key(&self) -> &Secret<String> {
        &self.public_key
    }
}

/// Implemented by every component that participates in cross-component
/// linking.
pub trait Linkable {
    /// Produce the published projection. Pure and side-effect free.
    fn to_link_payload(&self) -> LinkPayload;
}
