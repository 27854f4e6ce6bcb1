//! Keypair generation.
//!
//! Provides the keypair-provider abstraction and implementations.
//!
//! ## Backends
//!
//! - **ed25519**: Default, always available. Generates Ed25519 signing keys
//!   encoded as PKCS8/SPKI PEM.
//!
//! ## Adding a New Backend
//!
//! 1. Implement the `KeypairProvider` trait
//! 2. Add the implementation in a new file (e.g., `rsa.rs`)
//! 3. Re-export from this module

use sha2::{Digest, Sha256};

use crate::core::secret::Secret;
use crate::core::types::ResourceId;
use crate::error::Result;

mod ed25519;

pub use ed25519::Ed25519Provider;

/// Asymmetric signing algorithm requested from a provider.
///
/// A provider may support a subset; requesting an unsupported algorithm is
/// a generation failure, not a silent fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Algorithm {
    /// Ed25519, the default for edge token signing.
    #[default]
    Ed25519,
    /// RSA with a 2048-bit modulus.
    Rsa2048,
    /// RSA with a 4096-bit modulus.
    Rsa4096,
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Algorithm::Ed25519 => "ed25519",
            Algorithm::Rsa2048 => "rsa-2048",
            Algorithm::Rsa4096 => "rsa-4096",
        };
        f.write_str(name)
    }
}

/// Freshly generated key material, both halves sensitive-wrapped.
#[derive(Debug)]
pub struct GeneratedKeypair {
    /// PKCS8-encoded private key PEM.
    pub private_key_pem: Secret<String>,
    /// SPKI-encoded public key PEM.
    pub public_key_pem: Secret<String>,
}

/// Keypair generation backend.
///
/// Generation is deterministic-or-fail: providers never retry and never
/// substitute a different algorithm for the one requested.
pub trait KeypairProvider: Send + Sync {
    /// Generate a fresh keypair for the given algorithm.
    ///
    /// # Errors
    ///
    /// Returns `KeypairError::UnsupportedAlgorithm` if the provider cannot
    /// produce the requested algorithm, or `KeypairError::Generation` /
    /// `KeypairError::Encode` on backend failure.
    fn generate(&self, algorithm: Algorithm) -> Result<GeneratedKeypair>;

    /// Backend name for display/config.
    fn name(&self) -> &'static str;
}

/// A provisioned keypair resource, owned by exactly one component.
///
/// Created once at construction time and never regenerated implicitly;
/// replacement only happens through an explicit component operation.
#[derive(Debug, Clone)]
pub struct KeyPair {
    id: ResourceId,
    algorithm: Algorithm,
    private_key_pem: Secret<String>,
    public_key_pem: Secret<String>,
    fingerprint: String,
}

impl KeyPair {
    /// Bind generated key material to a resource identity.
    pub(crate) fn new(id: ResourceId, algorithm: Algorithm, material: GeneratedKeypair) -> Self {
        let fingerprint = fingerprint(material.public_key_pem.expose_secret());
        Self {
            id,
            algorithm,
            private_key_pem: material.private_key_pem,
            public_key_pem: material.public_key_pem,
            fingerprint,
        }
    }

    /// Resource identifier in the provisioning graph.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Algorithm the keypair was generated with.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// PKCS8-encoded private key PEM. Sensitive.
    pub fn private_key_pem(&self) -> &Secret<String> {
        &self.private_key_pem
    }

    /// Public key PEM.
    ///
    /// Not confidential content, but delivered through the sensitive
    /// channel like everything else the component publishes.
    pub fn public_key_pem(&self) -> &Secret<String> {
        &self.public_key_pem
    }

    /// SHA-256 hex digest of the public key PEM.
    ///
    /// Safe to log and to store in the graph; changes exactly when the
    /// keypair is replaced.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// SHA-256 hex digest of public key material.
pub(crate) fn fingerprint(public_key_pem: &str) -> String {
    format!("{:x}", Sha256::digest(public_key_pem.as_bytes()))
}
