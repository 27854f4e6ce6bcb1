//! Constants used throughout gatepost.
//!
//! Centralizes magic strings and configuration values.

/// Reserved environment key carrying the PKCS8-encoded private key PEM.
pub const AUTH_PRIVATE_KEY: &str = "AUTH_PRIVATE_KEY";

/// Reserved environment key carrying the public key PEM.
pub const AUTH_PUBLIC_KEY: &str = "AUTH_PUBLIC_KEY";

/// Environment keys the Auth component injects into every worker.
///
/// A caller-supplied environment declaring one of these is a
/// construction-time error, never a silent overwrite.
pub const RESERVED_ENV_KEYS: &[&str] = &[AUTH_PRIVATE_KEY, AUTH_PUBLIC_KEY];

/// Type token for the Auth component.
pub const AUTH_TYPE: &str = "gatepost:edge:Auth";

/// Placeholder emitted wherever a sensitive value would otherwise appear.
pub const REDACTED: &str = "[redacted]";

/// Domain suffix for invocation URLs assigned by the local backend.
pub const LOCAL_EDGE_DOMAIN: &str = "workers.internal";
