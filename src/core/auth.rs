//! The Auth component.
//!
//! Binds a keypair's lifecycle to a worker's lifecycle: generates the
//! keypair, injects both PEM halves into the worker's environment as
//! sensitive values, provisions the worker with network exposure forced
//! on, and republishes the public half through the link contract.
//!
//! The private key never leaves the provisioning boundary: it travels from
//! the keypair provider into the worker's secret environment, and nothing
//! the component exposes (link payload, state snapshot, logs) has a field
//! capable of carrying it.

use tracing::{debug, info};

use crate::core::constants;
use crate::core::engine::Engine;
use crate::core::keypair::{Algorithm, KeyPair};
use crate::core::link::{LinkPayload, Linkable};
use crate::core::output::Output;
use crate::core::permission::{Component, PermissionSet};
use crate::core::types::{ComponentName, WorkerUrl};
use crate::core::worker::{EnvValue, ProvisionedWorker, WorkerSpec};
use crate::error::{ConfigError, Result};

/// Structural customization hooks for generated sub-resources.
#[derive(Default)]
pub struct Transform {
    /// Override applied to the authenticator worker spec before the
    /// component's own augmentation. Augmentation runs last, so an
    /// override can never strip the forced exposure or the reserved
    /// environment entries.
    pub worker: Option<Box<dyn Fn(WorkerSpec) -> WorkerSpec + Send + Sync>>,
}

/// Arguments for constructing an [`Auth`] component.
pub struct AuthArgs {
    /// Specification of the authenticator worker.
    pub authenticator: WorkerSpec,
    /// Optional structural customizations.
    pub transform: Option<Transform>,
    /// Signing algorithm for the keypair. Ed25519 when unset.
    pub algorithm: Option<Algorithm>,
}

impl AuthArgs {
    /// Arguments with no customizations and the default algorithm.
    pub fn new(authenticator: WorkerSpec) -> Self {
        Self {
            authenticator,
            transform: None,
            algorithm: None,
        }
    }
}

/// Observable lifecycle state of a constructed component.
///
/// The synchronous assembly window (keypair generation, spec augmentation)
/// ends before the constructor returns, so a caller only ever observes the
/// deployment being in flight or finished. There is no failed resting
/// state: a failed deployment surfaces through the deferred handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentState {
    /// Worker provisioning in flight; deferred values unresolved.
    Deploying,
    /// All deferred values resolved.
    Ready,
}

/// An edge authentication capability: one keypair, one worker wired to it.
pub struct Auth {
    name: ComponentName,
    key: KeyPair,
    base_spec: WorkerSpec,
    authenticator: Output<ProvisionedWorker>,
    url: Output<WorkerUrl>,
    spec_fingerprint: String,
}

impl Auth {
    /// Construct a component: generate the keypair, augment the worker
    /// spec, and start the deployment.
    ///
    /// Returns while deployment is in flight; the deferred accessors
    /// resolve once it completes.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` before any resource is created if the name or
    /// environment is invalid, `KeypairError` if generation fails, and
    /// rolls the graph registration back on any failure so nothing is left
    /// behind.
    pub fn new(engine: &Engine, name: &str, args: AuthArgs) -> Result<Self> {
        validate_name(name)?;
        validate_environment(&args.authenticator)?;
        engine.ensure_type(constants::AUTH_TYPE)?;
        engine.register_component(constants::AUTH_TYPE, name)?;

        match Self::provision(engine, name, args) {
            Ok(auth) => Ok(auth),
            Err(err) => {
                engine.abandon_component(name);
                Err(err)
            }
        }
    }

    fn provision(engine: &Engine, name: &str, args: AuthArgs) -> Result<Self> {
        let algorithm = args.algorithm.unwrap_or_default();
        let key =
            engine.provision_keypair(name, &format!("{name}-keypair"), algorithm, false)?;

        let base_spec = apply_transform(args.authenticator, args.transform.as_ref());
        // A transform may have rewritten the environment entirely.
        validate_environment(&base_spec)?;

        let augmented = augment(&base_spec, &key);
        let spec_fingerprint = augmented.fingerprint();
        let worker_name = format!("{name}-authenticator");

        debug!(
            component = name,
            worker = %worker_name,
            fingerprint = %spec_fingerprint,
            "worker spec finalized"
        );

        let authenticator = engine.submit_deploy(name, &worker_name, augmented);
        engine.record_worker(name, &worker_name, spec_fingerprint.clone());
        let url = derive_url(&authenticator);

        info!(component = name, "auth component constructed");

        Ok(Self {
            name: name.to_string(),
            key,
            base_spec,
            authenticator,
            url,
            spec_fingerprint,
        })
    }

    /// The owned keypair handle.
    pub fn key(&self) -> &KeyPair {
        &self.key
    }

    /// Deferred handle to the provisioned worker.
    ///
    /// Consumers reading fields of the worker are themselves deferred
    /// until deployment completes.
    pub fn authenticator(&self) -> Output<ProvisionedWorker> {
        self.authenticator.clone()
    }

    /// Deferred invocation URL of the authenticator worker.
    ///
    /// Fails with `ValueError::MissingUrl` if the deployed worker carries
    /// no URL. Unreachable while augmentation forces exposure on; kept as
    /// an invariant should the augmentation logic change.
    pub fn url(&self) -> Output<WorkerUrl> {
        self.url.clone()
    }

    /// Observable lifecycle state.
    pub fn state(&self) -> ComponentState {
        if self.authenticator.is_resolved() {
            ComponentState::Ready
        } else {
            ComponentState::Deploying
        }
    }

    /// Re-apply arguments to an already-provisioned instance.
    ///
    /// The keypair is reused, never regenerated here. The worker is
    /// redeployed only when the augmented spec's fingerprint changed;
    /// identical arguments are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` on invalid environment input.
    pub fn update(&mut self, engine: &Engine, args: AuthArgs) -> Result<()> {
        validate_environment(&args.authenticator)?;
        let base_spec = apply_transform(args.authenticator, args.transform.as_ref());
        validate_environment(&base_spec)?;

        let augmented = augment(&base_spec, &self.key);
        let fingerprint = augmented.fingerprint();
        if fingerprint == self.spec_fingerprint {
            debug!(component = %self.name, "no spec changes, deployment skipped");
            self.base_spec = base_spec;
            return Ok(());
        }

        self.base_spec = base_spec;
        self.redeploy(engine, augmented, fingerprint);
        Ok(())
    }

    /// Force replacement of the keypair and redeploy the worker with the
    /// new secrets.
    ///
    /// The secret environment is part of the worker spec, so a replaced
    /// keypair always changes the fingerprint and always redeploys: the
    /// worker can never keep running on stale key material.
    ///
    /// # Errors
    ///
    /// Returns `KeypairError` if generation fails; the previous keypair
    /// and worker stay in place in that case.
    pub fn replace_key(&mut self, engine: &Engine) -> Result<()> {
        let key = engine.provision_keypair(
            &self.name,
            &format!("{}-keypair", self.name),
            self.key.algorithm(),
            true,
        )?;

        info!(
            component = %self.name,
            fingerprint = key.fingerprint(),
            "keypair replaced"
        );
        self.key = key;

        let augmented = augment(&self.base_spec, &self.key);
        let fingerprint = augmented.fingerprint();
        self.redeploy(engine, augmented, fingerprint);
        Ok(())
    }

    fn redeploy(&mut self, engine: &Engine, augmented: WorkerSpec, fingerprint: String) {
        let worker_name = format!("{}-authenticator", self.name);
        let authenticator = engine.submit_deploy(&self.name, &worker_name, augmented);
        engine.record_worker(&self.name, &worker_name, fingerprint.clone());

        self.url = derive_url(&authenticator);
        self.authenticator = authenticator;
        self.spec_fingerprint = fingerprint;

        info!(component = %self.name, fingerprint = %self.spec_fingerprint, "worker redeployed");
    }
}

impl Linkable for Auth {
    /// Publish the public key and nothing else.
    fn to_link_payload(&self) -> LinkPayload {
        LinkPayload::new(self.key.public_key_pem().clone())
    }
}

impl Component for Auth {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_token(&self) -> &str {
        constants::AUTH_TYPE
    }

    /// Always empty: the component performs no privileged cloud operations
    /// itself.
    fn required_permissions(&self) -> PermissionSet {
        PermissionSet::empty()
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("state", &self.state())
            .finish()
    }
}

/// Derive the URL node from the worker node.
fn derive_url(authenticator: &Output<ProvisionedWorker>) -> Output<WorkerUrl> {
    authenticator.apply(|worker| worker.url().map(Clone::clone))
}

/// Apply the caller's structural override, if any.
fn apply_transform(spec: WorkerSpec, transform: Option<&Transform>) -> WorkerSpec {
    match transform.and_then(|t| t.worker.as_ref()) {
        Some(rewrite) => rewrite(spec),
        None => spec,
    }
}

/// Build the augmented spec: exposure forced on, reserved entries injected.
fn augment(spec: &WorkerSpec, key: &KeyPair) -> WorkerSpec {
    let mut augmented = spec.clone();
    augmented.url = true;
    augmented.environment.insert(
        constants::AUTH_PRIVATE_KEY.to_string(),
        EnvValue::Sensitive(key.private_key_pem().clone()),
    );
    augmented.environment.insert(
        constants::AUTH_PUBLIC_KEY.to_string(),
        EnvValue::Sensitive(key.public_key_pem().clone()),
    );
    augmented
}

/// Validate a component instance name.
///
/// Names must be non-empty, lowercase, and limited to letters, digits, and
/// dashes, starting with a letter or digit.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ConfigError::EmptyName.into());
    }

    if let Some(first) = name.chars().next() {
        if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
            return Err(ConfigError::InvalidName {
                name: name.to_string(),
                reason: "must start with a lowercase letter or digit".to_string(),
            }
            .into());
        }
    }

    for (i, ch) in name.chars().enumerate() {
        if !ch.is_ascii_lowercase() && !ch.is_ascii_digit() && ch != '-' {
            return Err(ConfigError::InvalidName {
                name: name.to_string(),
                reason: format!(
                    "invalid character '{}' at position {}. Only lowercase letters, digits, and dashes are allowed",
                    ch,
                    i + 1
                ),
            }
            .into());
        }
    }

    Ok(())
}

/// Validate a caller-supplied worker environment.
///
/// Keys must be valid environment variable names and must not collide with
/// the reserved entries the component injects.
fn validate_environment(spec: &WorkerSpec) -> Result<()> {
    for key in spec.environment.keys() {
        if constants::RESERVED_ENV_KEYS.contains(&key.as_str()) {
            return Err(ConfigError::ReservedKey(key.clone()).into());
        }

        if key.is_empty() {
            return Err(ConfigError::InvalidEnvKey {
                key: key.clone(),
                reason: "cannot be empty".to_string(),
            }
            .into());
        }

        if let Some(first) = key.chars().next() {
            if first.is_ascii_digit() {
                return Err(ConfigError::InvalidEnvKey {
                    key: key.clone(),
                    reason: "cannot start with a digit".to_string(),
                }
                .into());
            }
        }

        for (i, ch) in key.chars().enumerate() {
            if !ch.is_ascii_alphanumeric() && ch != '_' {
                return Err(ConfigError::InvalidEnvKey {
                    key: key.clone(),
                    reason: format!(
                        "invalid character '{}' at position {}. Only A-Z, 0-9, and underscore are allowed",
                        ch,
                        i + 1
                    ),
                }
                .into());
            }
        }
    }

    Ok(())
}
