//! Gatepost - composable provisioning for edge authentication workers.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── error             # Error taxonomy (config / keypair / deploy / value)
//! └── core/             # Core library components
//!     ├── secret        # Sensitive-value wrapper, redacted everywhere
//!     ├── output        # Deferred dependency nodes (resolved/failed/pending)
//!     ├── registry      # Component-type registry
//!     ├── graph         # Provisioning graph and child-resource records
//!     ├── engine        # Orchestration engine and deploy executor
//!     ├── keypair/      # Keypair providers
//!     │   ├── mod       # KeypairProvider trait
//!     │   └── ed25519   # Ed25519 implementation
//!     ├── worker/       # Worker deployment
//!     │   ├── mod       # WorkerSpec, Deployer trait
//!     │   └── local     # In-process deployment backend
//!     ├── link          # Cross-component link contract
//!     ├── permission    # Cloud-permission declarations
//!     └── auth          # The Auth component
//! ```
//!
//! # Features
//!
//! - One keypair per component, generated once and injected into the worker
//!   as sensitive environment values
//! - Deferred worker handles and URLs, resolved when deployment completes
//! - Link payloads that expose the public key and nothing else
//! - Pluggable keypair and deployment backends

pub mod core;
pub mod error;

pub use crate::core::auth::{Auth, AuthArgs, ComponentState, Transform};
pub use crate::core::engine::Engine;
pub use crate::core::keypair::{
    Algorithm, Ed25519Provider, GeneratedKeypair, KeyPair, KeypairProvider,
};
pub use crate::core::link::{LinkPayload, Linkable};
pub use crate::core::output::Output;
pub use crate::core::permission::{Component, Permission, PermissionSet};
pub use crate::core::secret::Secret;
pub use crate::core::worker::{
    Deployer, EnvValue, LocalDeployer, ProvisionedWorker, WorkerSpec,
};
pub use crate::error::{Error, Result};
