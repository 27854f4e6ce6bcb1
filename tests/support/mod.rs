//! Test support utilities for gatepost integration tests.
//!
//! Provides a reusable engine harness and instrumented collaborator
//! backends for exercising deferred resolution and failure paths.

#![allow(dead_code)]

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};

use gatepost::error::{KeypairError, Result};
use gatepost::{
    Algorithm, Auth, AuthArgs, Deployer, Ed25519Provider, Engine, GeneratedKeypair,
    KeypairProvider, LocalDeployer, ProvisionedWorker, WorkerSpec,
};

/// Issuer value used by the standard handler spec.
pub const ISSUER: &str = "example.org";

/// Code reference used by the standard handler spec.
pub const CODE_REF: &str = "auth-handler";

/// Test environment: an engine over a shared local deployer.
///
/// Holding the deployer directly lets tests observe deployment counts
/// alongside the engine-facing behavior.
pub struct Test {
    pub deployer: Arc<LocalDeployer>,
    pub engine: Engine,
}

impl Test {
    /// Engine with default backends.
    pub fn new() -> Self {
        let deployer = Arc::new(LocalDeployer::new());
        let engine = Engine::new(
            Arc::new(Ed25519Provider),
            Arc::clone(&deployer) as Arc<dyn Deployer>,
        );
        Self { deployer, engine }
    }

    /// Engine whose deployer accepts a bounded number of deployments.
    pub fn with_quota(quota: usize) -> Self {
        let deployer = Arc::new(LocalDeployer::new().with_quota(quota));
        let engine = Engine::new(
            Arc::new(Ed25519Provider),
            Arc::clone(&deployer) as Arc<dyn Deployer>,
        );
        Self { deployer, engine }
    }

    /// Construct an Auth component with the standard handler spec.
    pub fn auth(&self, name: &str) -> Auth {
        Auth::new(&self.engine, name, AuthArgs::new(handler_spec()))
            .expect("auth construction failed")
    }
}

/// The standard authenticator spec used across tests.
pub fn handler_spec() -> WorkerSpec {
    WorkerSpec::new(CODE_REF).with_env("ISSUER", ISSUER)
}

/// Releases deployments held by a [`GatedDeployer`].
pub struct Gate(Sender<()>);

impl Gate {
    /// Allow one held deployment to proceed.
    pub fn release(&self) {
        let _ = self.0.send(());
    }
}

/// Deployer that holds every deployment until the gate releases it.
///
/// Dropping the gate releases everything, so a failed test never wedges
/// the engine executor on shutdown.
pub struct GatedDeployer {
    inner: LocalDeployer,
    gate: Mutex<Receiver<()>>,
}

impl GatedDeployer {
    pub fn new() -> (Arc<Self>, Gate) {
        let (tx, rx) = mpsc::channel();
        let deployer = Arc::new(Self {
            inner: LocalDeployer::new(),
            gate: Mutex::new(rx),
        });
        (deployer, Gate(tx))
    }
}

impl Deployer for GatedDeployer {
    fn deploy(&self, name: &str, spec: &WorkerSpec) -> Result<ProvisionedWorker> {
        // Blocks until released; a dropped gate unblocks with an error,
        // which is deliberate.
        let _ = self
            .gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv();
        self.inner.deploy(name, spec)
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

/// Keypair provider that always fails generation.
pub struct FailingProvider;

impl KeypairProvider for FailingProvider {
    fn generate(&self, _algorithm: Algorithm) -> Result<GeneratedKeypair> {
        Err(KeypairError::Generation("entropy source unavailable".to_string()).into())
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}
