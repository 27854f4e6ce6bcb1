//! Component-type registry.
//!
//! Every provisioning component type is registered here when the engine is
//! created. Constructing a component whose type token was never registered
//! is a configuration error. The registry replaces the global static type
//! tag pattern: registration is explicit and owned by the engine, not a
//! mutated static on the component type.

use std::collections::BTreeSet;

use crate::error::{ConfigError, Result};

/// Registered component type tokens (e.g., `gatepost:edge:Auth`).
#[derive(Debug, Default, Clone)]
pub struct Registry {
    types: BTreeSet<String>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component type token. Idempotent.
    pub fn register(&mut self, type_token: &str) {
        self.types.insert(type_token.to_string());
    }

    /// Check that a type token is registered.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownType` if it is not.
    pub fn ensure_registered(&self, type_token: &str) -> Result<()> {
        if self.types.contains(type_token) {
            Ok(())
        } else {
            Err(ConfigError::UnknownType(type_token.to_string()).into())
        }
    }

    /// Whether a type token is registered.
    pub fn contains(&self, type_token: &str) -> bool {
        self.types.contains(type_token)
    }
}
