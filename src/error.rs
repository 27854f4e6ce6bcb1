//! Error types for gatepost operations.
//!
//! Errors are grouped by the collaborator they originate from and wrapped
//! transparently by the top-level [`Error`]. No local recovery happens
//! anywhere in the crate: a collaborator failure is surfaced unchanged to
//! the caller, with the owning component's name attached to deployment
//! failures so operators can locate the failing instance.
//!
//! Every error type is `Clone`: a deployment failure is stored in a shared
//! deferred node and handed out to every consumer that waits on it.

use thiserror::Error;

/// Configuration errors raised synchronously at construction time.
///
/// All of these fire before any cloud resource is created.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("component name cannot be empty")]
    EmptyName,

    #[error("invalid component name `{name}`: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("component name already in use: {0}")]
    DuplicateName(String),

    #[error("environment key `{0}` is reserved")]
    ReservedKey(String),

    #[error("invalid environment key `{key}`: {reason}")]
    InvalidEnvKey { key: String, reason: String },

    #[error("component type not registered: {0}")]
    UnknownType(String),

    #[error("no such component: {0}")]
    UnknownComponent(String),
}

/// Keypair provider failures.
///
/// Generation is assumed deterministic-or-fail, not transient; there is no
/// retry path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeypairError {
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("keypair generation failed: {0}")]
    Generation(String),

    #[error("key encoding failed: {0}")]
    Encode(String),
}

/// Worker deployment failures surfaced from the deployment backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    #[error("invalid code reference: {0}")]
    InvalidCodeRef(String),

    #[error("worker quota exceeded (limit {0})")]
    QuotaExceeded(usize),

    #[error("deployment backend error: {0}")]
    Backend(String),

    #[error("deployment abandoned before completion")]
    Cancelled,

    #[error("worker deployment failed for component `{name}`: {source}")]
    Component {
        name: String,
        #[source]
        source: Box<DeployError>,
    },
}

impl DeployError {
    /// Attach the owning component's name to a backend failure.
    pub fn for_component(self, name: &str) -> Self {
        DeployError::Component {
            name: name.to_string(),
            source: Box::new(self),
        }
    }
}

/// Errors reading values off provisioned resources.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("worker `{0}` has no invocation URL: not configured for network exposure")]
    MissingUrl(String),

    #[error("value is not resolved yet")]
    Unresolved,
}

/// Top-level error wrapping all failure domains.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Keypair(#[from] KeypairError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Value(#[from] ValueError),
}

pub type Result<T> = std::result::Result<T, Error>;
