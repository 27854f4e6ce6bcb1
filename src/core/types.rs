//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// A component instance name (e.g., api-auth).
///
/// Must be non-empty and unique within the provisioning graph.
pub type ComponentName = String;

/// An environment variable key (e.g., ISSUER, AUTH_PUBLIC_KEY).
///
/// Must be a valid environment variable name.
pub type EnvKey = String;

/// A worker invocation URL (e.g., https://api-auth-authenticator.workers.internal).
pub type WorkerUrl = String;

/// Identifier of a provisioned resource record in the graph.
pub type ResourceId = String;
