//! Worker deployment.
//!
//! Defines the worker specification consumed from callers, the provisioned
//! worker record produced by deployment backends, and the `Deployer` trait
//! that abstracts the underlying deployment mechanism (build, upload,
//! routing, URL assignment all live behind it).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::core::secret::Secret;
use crate::core::types::{EnvKey, WorkerUrl};
use crate::error::{Result, ValueError};

mod local;

pub use local::LocalDeployer;

/// An environment value: a plain string or a sensitive wrapper.
///
/// Both variants are delivered to the deployed artifact; only the plain
/// variant is visible in debug output and serialized state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EnvValue {
    Plain(String),
    Sensitive(Secret<String>),
}

impl EnvValue {
    /// The delivered value, regardless of sensitivity.
    ///
    /// Deployment backends call this at the injection boundary; nothing
    /// else should.
    pub fn delivered(&self) -> &str {
        match self {
            EnvValue::Plain(value) => value,
            EnvValue::Sensitive(secret) => secret.expose_secret(),
        }
    }

    /// Whether the value is redacted from logs and state output.
    pub fn is_sensitive(&self) -> bool {
        matches!(self, EnvValue::Sensitive(_))
    }
}

impl From<&str> for EnvValue {
    fn from(value: &str) -> Self {
        EnvValue::Plain(value.to_string())
    }
}

impl From<String> for EnvValue {
    fn from(value: String) -> Self {
        EnvValue::Plain(value)
    }
}

impl From<Secret<String>> for EnvValue {
    fn from(secret: Secret<String>) -> Self {
        EnvValue::Sensitive(secret)
    }
}

/// Caller-supplied worker configuration.
///
/// Immutable input: the Auth component never mutates a caller's spec, it
/// derives an augmented copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerSpec {
    /// Reference to the worker's code bundle.
    pub code_ref: String,
    /// Environment variable mapping. Keys are unique by construction.
    pub environment: BTreeMap<EnvKey, EnvValue>,
    /// Whether the worker is exposed on the network with an invocation URL.
    pub url: bool,
}

impl WorkerSpec {
    /// Create a spec with an empty environment and no network exposure.
    pub fn new(code_ref: &str) -> Self {
        Self {
            code_ref: code_ref.to_string(),
            environment: BTreeMap::new(),
            url: false,
        }
    }

    /// Add an environment entry.
    pub fn with_env(mut self, key: &str, value: impl Into<EnvValue>) -> Self {
        self.environment.insert(key.to_string(), value.into());
        self
    }

    /// Set the network-exposure flag.
    pub fn with_url(mut self, url: bool) -> Self {
        self.url = url;
        self
    }

    /// SHA-256 hex digest of the canonical spec, sensitive values included.
    ///
    /// Update-path diffing compares fingerprints so plaintext secrets are
    /// never compared or printed. The digest changes exactly when the
    /// deployed configuration would change.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.code_ref.as_bytes());
        hasher.update([0u8]);
        hasher.update([u8::from(self.url)]);
        for (key, value) in &self.environment {
            hasher.update([0u8]);
            hasher.update(key.as_bytes());
            hasher.update([b'=']);
            hasher.update(value.delivered().as_bytes());
            hasher.update([u8::from(value.is_sensitive())]);
        }
        format!("{:x}", hasher.finalize())
    }
}

/// A deployed, addressable compute unit.
#[derive(Debug, Clone)]
pub struct ProvisionedWorker {
    id: String,
    name: String,
    url: Option<WorkerUrl>,
    environment: BTreeMap<EnvKey, EnvValue>,
    exposed: bool,
    deployed_at: DateTime<Utc>,
}

impl ProvisionedWorker {
    /// Build a record for a completed deployment. Called by backends.
    pub fn new(
        id: String,
        name: String,
        url: Option<WorkerUrl>,
        environment: BTreeMap<EnvKey, EnvValue>,
        exposed: bool,
    ) -> Self {
        Self {
            id,
            name,
            url,
            environment,
            exposed,
            deployed_at: Utc::now(),
        }
    }

    /// Opaque handle used for dependency tracking.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Worker name as deployed.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invocation URL.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::MissingUrl` if the worker was not configured
    /// for network exposure.
    pub fn url(&self) -> Result<&WorkerUrl> {
        self.url
            .as_ref()
            .ok_or_else(|| ValueError::MissingUrl(self.name.clone()).into())
    }

    /// Resolved environment, sensitive values still wrapped.
    pub fn environment(&self) -> &BTreeMap<EnvKey, EnvValue> {
        &self.environment
    }

    /// One environment entry.
    pub fn env(&self, key: &str) -> Option<&EnvValue> {
        self.environment.get(key)
    }

    /// Whether the worker is exposed on the network.
    pub fn exposed(&self) -> bool {
        self.exposed
    }

    /// When the deployment completed.
    pub fn deployed_at(&self) -> DateTime<Utc> {
        self.deployed_at
    }
}

/// Worker deployment backend.
///
/// Given a named specification, provisions a running compute unit and
/// returns its record. Failures are surfaced unchanged; the engine attaches
/// the owning component's name.
pub trait Deployer: Send + Sync {
    /// Provision a worker from a spec.
    ///
    /// # Errors
    ///
    /// Returns `DeployError` on invalid input or backend failure.
    fn deploy(&self, name: &str, spec: &WorkerSpec) -> Result<ProvisionedWorker>;

    /// Backend name for display/config.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_changes_with_env() {
        let base = WorkerSpec::new("auth-handler").with_env("ISSUER", "example.org");
        let changed = WorkerSpec::new("auth-handler").with_env("ISSUER", "example.com");

        assert_ne!(base.fingerprint(), changed.fingerprint());
        assert_eq!(base.fingerprint(), base.clone().fingerprint());
    }

    #[test]
    fn test_fingerprint_sees_sensitive_values() {
        let a = WorkerSpec::new("auth-handler").with_env("KEY", Secret::from("pem-a"));
        let b = WorkerSpec::new("auth-handler").with_env("KEY", Secret::from("pem-b"));

        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_distinguishes_sensitivity() {
        let plain = WorkerSpec::new("auth-handler").with_env("KEY", "value");
        let sensitive = WorkerSpec::new("auth-handler").with_env("KEY", Secret::from("value"));

        assert_ne!(plain.fingerprint(), sensitive.fingerprint());
    }

    #[test]
    fn test_spec_serializes_redacted() {
        let spec = WorkerSpec::new("auth-handler")
            .with_env("ISSUER", "example.org")
            .with_env("AUTH_PRIVATE_KEY", Secret::from("PRIVATE-PEM"));

        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("example.org"));
        assert!(!json.contains("PRIVATE-PEM"));
    }

    #[test]
    fn test_missing_url_error() {
        let worker = ProvisionedWorker::new(
            "wrk-000001".to_string(),
            "internal".to_string(),
            None,
            BTreeMap::new(),
            false,
        );

        let err = worker.url().unwrap_err();
        assert!(err.to_string().contains("internal"));
    }
}
