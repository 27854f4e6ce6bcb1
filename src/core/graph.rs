//! Provisioning graph.
//!
//! Tracks live component instances and the cloud resources they own, so
//! that destroy operations cascade from a component to its children. The
//! graph stores no secret material: resource records carry only identifiers
//! and fingerprints, which makes the whole structure safe to serialize into
//! a state snapshot.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::types::{ComponentName, ResourceId};
use crate::error::{ConfigError, Result};

/// Kind of a child resource owned by a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Keypair,
    Worker,
}

/// A cloud resource record, child of exactly one component.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceRecord {
    /// Resource identifier (e.g., `api-auth-keypair`).
    pub id: ResourceId,
    /// What the resource is.
    pub kind: ResourceKind,
    /// Non-sensitive content fingerprint, used for update-path diffing.
    pub fingerprint: String,
}

/// A live component instance and its children.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentRecord {
    /// Registered type token of the component.
    #[serde(rename = "type")]
    pub type_token: String,
    /// Child resources, in provisioning order.
    pub resources: Vec<ResourceRecord>,
}

/// The provisioning graph: component name -> component record.
#[derive(Debug, Default, Serialize)]
pub struct Graph {
    components: BTreeMap<ComponentName, ComponentRecord>,
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component instance.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::DuplicateName` if a live component already
    /// holds the name.
    pub fn register_component(&mut self, type_token: &str, name: &str) -> Result<()> {
        if self.components.contains_key(name) {
            return Err(ConfigError::DuplicateName(name.to_string()).into());
        }
        self.components.insert(
            name.to_string(),
            ComponentRecord {
                type_token: type_token.to_string(),
                resources: Vec::new(),
            },
        );
        Ok(())
    }

    /// Remove a component and all of its child resources.
    ///
    /// Returns the removed record so the caller can release any durable
    /// state tied to the children.
    pub fn remove_component(&mut self, name: &str) -> Option<ComponentRecord> {
        self.components.remove(name)
    }

    /// Attach a resource record to a live component. No-op if the component
    /// is not registered.
    pub fn record_resource(&mut self, component: &str, record: ResourceRecord) {
        if let Some(entry) = self.components.get_mut(component) {
            entry.resources.push(record);
        }
    }

    /// Replace the fingerprint of a resource after an update.
    pub fn update_fingerprint(&mut self, component: &str, id: &str, fingerprint: String) {
        if let Some(entry) = self.components.get_mut(component) {
            if let Some(resource) = entry.resources.iter_mut().find(|r| r.id == id) {
                resource.fingerprint = fingerprint;
            }
        }
    }

    /// Whether a live component holds the name.
    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Child resources of a component.
    pub fn resources(&self, name: &str) -> Option<&[ResourceRecord]> {
        self.components.get(name).map(|c| c.resources.as_slice())
    }

    /// Names of all live components.
    pub fn component_names(&self) -> Vec<ComponentName> {
        self.components.keys().cloned().collect()
    }

    /// Number of live components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the graph holds no components.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keypair_record(id: &str) -> ResourceRecord {
        ResourceRecord {
            id: id.to_string(),
            kind: ResourceKind::Keypair,
            fingerprint: "abc123".to_string(),
        }
    }

    #[test]
    fn test_register_and_record() {
        let mut graph = Graph::new();
        graph.register_component("gatepost:edge:Auth", "api-auth").unwrap();
        graph.record_resource("api-auth", keypair_record("api-auth-keypair"));

        let resources = graph.resources("api-auth").unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].kind, ResourceKind::Keypair);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut graph = Graph::new();
        graph.register_component("gatepost:edge:Auth", "api-auth").unwrap();

        let err = graph
            .register_component("gatepost:edge:Auth", "api-auth")
            .unwrap_err();
        assert!(err.to_string().contains("api-auth"));
    }

    #[test]
    fn test_remove_cascades_resources() {
        let mut graph = Graph::new();
        graph.register_component("gatepost:edge:Auth", "api-auth").unwrap();
        graph.record_resource("api-auth", keypair_record("api-auth-keypair"));

        let removed = graph.remove_component("api-auth").unwrap();
        assert_eq!(removed.resources.len(), 1);
        assert!(graph.is_empty());
        assert!(graph.resources("api-auth").is_none());
    }

    #[test]
    fn test_update_fingerprint() {
        let mut graph = Graph::new();
        graph.register_component("gatepost:edge:Auth", "api-auth").unwrap();
        graph.record_resource("api-auth", keypair_record("api-auth-keypair"));

        graph.update_fingerprint("api-auth", "api-auth-keypair", "def456".to_string());
        assert_eq!(graph.resources("api-auth").unwrap()[0].fingerprint, "def456");
    }

    #[test]
    fn test_serializes_without_secrets() {
        let mut graph = Graph::new();
        graph.register_component("gatepost:edge:Auth", "api-auth").unwrap();
        graph.record_resource("api-auth", keypair_record("api-auth-keypair"));

        let json = serde_json::to_string(&graph).unwrap();
        assert!(json.contains("api-auth-keypair"));
        assert!(json.contains("keypair"));
    }
}
