//! Orchestration engine.
//!
//! The engine owns the component graph, the collaborator backends, and a
//! single background executor that performs worker deployments off the
//! construction path. Components register themselves and their child
//! resources here; deferred values hand in-flight deployments back to
//! consumers.
//!
//! Ordering is enforced by data dependency, not synchronization: a worker
//! spec cannot be finalized before the keypair exists because its secret
//! environment entries are built from the keypair's PEM values, and keypair
//! provisioning is synchronous.
//!
//! Durable keypair state lives in memory, keyed by resource id, so an
//! update re-uses the existing keypair instead of regenerating it. The
//! state never touches disk; exported snapshots carry identifiers and
//! fingerprints only.

use std::collections::HashMap;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use crate::core::constants;
use crate::core::graph::{Graph, ResourceKind, ResourceRecord};
use crate::core::keypair::{Algorithm, Ed25519Provider, KeyPair, KeypairProvider};
use crate::core::output::{Output, Resolver};
use crate::core::registry::Registry;
use crate::core::types::{ComponentName, ResourceId};
use crate::core::worker::{Deployer, LocalDeployer, ProvisionedWorker, WorkerSpec};
use crate::error::{ConfigError, Error, Result};

/// Unit of work for the deploy executor.
struct DeployJob {
    component: ComponentName,
    worker_name: String,
    spec: WorkerSpec,
    resolver: Resolver<ProvisionedWorker>,
}

/// The provisioning engine.
///
/// Owns the graph, the registry, the keypair and deployment backends, and
/// the executor thread. Dropping the engine drains queued deployments and
/// joins the executor.
pub struct Engine {
    registry: Mutex<Registry>,
    graph: Mutex<Graph>,
    keypairs: Mutex<HashMap<ResourceId, KeyPair>>,
    provider: Arc<dyn KeypairProvider>,
    deployer: Arc<dyn Deployer>,
    jobs: Mutex<Option<Sender<DeployJob>>>,
    executor: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    /// Create an engine with explicit backends.
    ///
    /// Registers the built-in component types.
    pub fn new(provider: Arc<dyn KeypairProvider>, deployer: Arc<dyn Deployer>) -> Self {
        let mut registry = Registry::new();
        registry.register(constants::AUTH_TYPE);

        let (tx, rx) = mpsc::channel::<DeployJob>();
        let executor_deployer = Arc::clone(&deployer);
        let executor = std::thread::spawn(move || {
            while let Ok(job) = rx.recv() {
                debug!(
                    component = %job.component,
                    worker = %job.worker_name,
                    "deployment started"
                );
                match executor_deployer.deploy(&job.worker_name, &job.spec) {
                    Ok(worker) => job.resolver.resolve(worker),
                    Err(err) => {
                        let err = attach_component(err, &job.component);
                        warn!(component = %job.component, error = %err, "deployment failed");
                        job.resolver.fail(err);
                    }
                }
            }
        });

        info!(
            keypair_provider = provider.name(),
            deployer = deployer.name(),
            "engine started"
        );

        Self {
            registry: Mutex::new(registry),
            graph: Mutex::new(Graph::new()),
            keypairs: Mutex::new(HashMap::new()),
            provider,
            deployer,
            jobs: Mutex::new(Some(tx)),
            executor: Mutex::new(Some(executor)),
        }
    }

    /// Create an engine with the default backends (Ed25519 keys, local
    /// deployment).
    pub fn local() -> Self {
        Self::new(Arc::new(Ed25519Provider), Arc::new(LocalDeployer::new()))
    }

    /// Register an additional component type.
    pub fn register_type(&self, type_token: &str) {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .register(type_token);
    }

    /// Names of all live components.
    pub fn component_names(&self) -> Vec<ComponentName> {
        self.graph
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .component_names()
    }

    /// Whether a live component holds the name.
    pub fn has_component(&self, name: &str) -> bool {
        self.graph
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(name)
    }

    /// Child resource records of a component.
    pub fn resources(&self, name: &str) -> Option<Vec<ResourceRecord>> {
        self.graph
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .resources(name)
            .map(<[ResourceRecord]>::to_vec)
    }

    /// Destroy a component, cascading to its child resources.
    ///
    /// Removes the component's graph entry and releases the durable state
    /// of every child keypair. In-flight deployments of the component are
    /// not interrupted; their results are simply no longer tracked.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownComponent` if no live component holds
    /// the name.
    pub fn destroy(&self, name: &str) -> Result<()> {
        let record = self
            .graph
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove_component(name)
            .ok_or_else(|| ConfigError::UnknownComponent(name.to_string()))?;

        let mut keypairs = self.keypairs.lock().unwrap_or_else(PoisonError::into_inner);
        for resource in &record.resources {
            if resource.kind == ResourceKind::Keypair {
                keypairs.remove(&resource.id);
            }
        }

        info!(
            component = name,
            resources = record.resources.len(),
            "component destroyed"
        );
        Ok(())
    }

    /// Export a redacted snapshot of the engine state.
    ///
    /// The snapshot carries component and resource identifiers and content
    /// fingerprints; secret material cannot appear because none is stored
    /// in the graph and every sensitive type serializes redacted.
    pub fn export_state(&self) -> serde_json::Value {
        let graph = self.graph.lock().unwrap_or_else(PoisonError::into_inner);
        serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "keypair_provider": self.provider.name(),
            "deployer": self.deployer.name(),
            "graph": &*graph,
        })
    }

    /// Drain queued deployments and stop the executor.
    ///
    /// Deployments submitted after shutdown fail with
    /// `DeployError::Cancelled`. Idempotent.
    pub fn shutdown(&self) {
        let sender = self
            .jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(sender);

        let handle = self
            .executor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
            debug!("engine executor stopped");
        }
    }

    /// Check that a component type token is registered.
    pub(crate) fn ensure_type(&self, type_token: &str) -> Result<()> {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .ensure_registered(type_token)
    }

    /// Register a component instance in the graph.
    pub(crate) fn register_component(&self, type_token: &str, name: &str) -> Result<()> {
        self.graph
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .register_component(type_token, name)
    }

    /// Roll back a component registration after a failed construction, so
    /// the failure leaves no graph entry and no durable state behind.
    pub(crate) fn abandon_component(&self, name: &str) {
        let removed = self
            .graph
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove_component(name);
        if let Some(record) = removed {
            let mut keypairs = self.keypairs.lock().unwrap_or_else(PoisonError::into_inner);
            for resource in &record.resources {
                if resource.kind == ResourceKind::Keypair {
                    keypairs.remove(&resource.id);
                }
            }
            debug!(component = name, "construction rolled back");
        }
    }

    /// Provision a keypair resource for a component.
    ///
    /// Returns the stored keypair when one exists under the resource id,
    /// unless `replace` forces fresh generation. Stable identity across
    /// re-provisioning is exactly this reuse path.
    pub(crate) fn provision_keypair(
        &self,
        component: &str,
        resource_id: &str,
        algorithm: Algorithm,
        replace: bool,
    ) -> Result<KeyPair> {
        if !replace {
            let keypairs = self.keypairs.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(existing) = keypairs.get(resource_id) {
                debug!(
                    component,
                    keypair = resource_id,
                    fingerprint = existing.fingerprint(),
                    "reusing existing keypair"
                );
                return Ok(existing.clone());
            }
        }

        let material = self.provider.generate(algorithm)?;
        let keypair = KeyPair::new(resource_id.to_string(), algorithm, material);

        self.keypairs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(resource_id.to_string(), keypair.clone());

        let mut graph = self.graph.lock().unwrap_or_else(PoisonError::into_inner);
        let already_recorded = graph
            .resources(component)
            .is_some_and(|resources| resources.iter().any(|r| r.id == resource_id));
        if already_recorded {
            graph.update_fingerprint(component, resource_id, keypair.fingerprint().to_string());
        } else {
            graph.record_resource(
                component,
                ResourceRecord {
                    id: resource_id.to_string(),
                    kind: ResourceKind::Keypair,
                    fingerprint: keypair.fingerprint().to_string(),
                },
            );
        }

        info!(
            component,
            keypair = resource_id,
            algorithm = %keypair.algorithm(),
            fingerprint = keypair.fingerprint(),
            "keypair provisioned"
        );
        Ok(keypair)
    }

    /// Submit a worker deployment to the executor.
    ///
    /// Returns immediately with a deferred handle that settles when the
    /// deployment completes or fails.
    pub(crate) fn submit_deploy(
        &self,
        component: &str,
        worker_name: &str,
        spec: WorkerSpec,
    ) -> Output<ProvisionedWorker> {
        let (output, resolver) = Output::pending();

        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        match jobs.as_ref() {
            Some(sender) => {
                let job = DeployJob {
                    component: component.to_string(),
                    worker_name: worker_name.to_string(),
                    spec,
                    resolver,
                };
                // A send failure drops the job, and the dropped resolver
                // marks the output cancelled.
                let _ = sender.send(job);
            }
            None => {
                warn!(component, worker = worker_name, "engine already shut down");
                drop(resolver);
            }
        }

        output
    }

    /// Record a worker resource under a component.
    pub(crate) fn record_worker(&self, component: &str, resource_id: &str, fingerprint: String) {
        let mut graph = self.graph.lock().unwrap_or_else(PoisonError::into_inner);
        let already_recorded = graph
            .resources(component)
            .is_some_and(|resources| resources.iter().any(|r| r.id == resource_id));
        if already_recorded {
            graph.update_fingerprint(component, resource_id, fingerprint);
        } else {
            graph.record_resource(
                component,
                ResourceRecord {
                    id: resource_id.to_string(),
                    kind: ResourceKind::Worker,
                    fingerprint,
                },
            );
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Wrap a deployment failure with the owning component's name.
fn attach_component(err: Error, component: &str) -> Error {
    match err {
        Error::Deploy(deploy) => Error::Deploy(deploy.for_component(component)),
        other => other,
    }
}
