//! Cloud-permission declarations.
//!
//! Every provisioning component declares the cloud-permission grants it
//! requires of its execution environment; an aggregation pass computes the
//! union across a graph. The Auth component performs no privileged cloud
//! operations itself, so its declaration is always empty.

use serde::Serialize;

/// A single cloud-permission grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Permission {
    /// Action identifier (e.g., `kv:read`).
    pub action: String,
    /// Resource the action applies to.
    pub resource: String,
}

/// Declared set of permission grants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PermissionSet(Vec<Permission>);

impl PermissionSet {
    /// The empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set from explicit grants.
    pub fn from_grants(grants: Vec<Permission>) -> Self {
        Self(grants)
    }

    /// Whether the set declares no grants.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of declared grants.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the declared grants.
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }

    /// Add every grant from `other` that is not already declared.
    pub fn merge(&mut self, other: &PermissionSet) {
        for grant in &other.0 {
            if !self.0.contains(grant) {
                self.0.push(grant.clone());
            }
        }
    }
}

/// Uniform contract implemented by every provisioning component.
pub trait Component {
    /// Instance name, unique within the provisioning graph.
    fn name(&self) -> &str;

    /// Registered type token.
    fn type_token(&self) -> &str;

    /// Cloud permissions the component requires. Empty when the component
    /// performs no privileged operations itself.
    fn required_permissions(&self) -> PermissionSet;
}

/// Union of the permission needs of a set of components.
///
/// This is the aggregation pass consumed by the host environment to compute
/// what the whole graph requires.
pub fn aggregate<'a>(components: impl IntoIterator<Item = &'a dyn Component>) -> PermissionSet {
    let mut union = PermissionSet::empty();
    for component in components {
        union.merge(&component.required_permissions());
    }
    union
}
