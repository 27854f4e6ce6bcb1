//! In-process deployment backend.
//!
//! Provisions workers as records instead of real compute units: validates
//! the code reference, enforces an optional quota, and assigns invocation
//! URLs under a configurable domain. The default backend for development
//! and tests, the way a filesystem store backs a keychain-less setup.

use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

use super::{Deployer, ProvisionedWorker, WorkerSpec};
use crate::core::constants;
use crate::error::{DeployError, Result};

/// In-process worker deployment backend.
pub struct LocalDeployer {
    domain: String,
    quota: Option<usize>,
    deployed: Mutex<usize>,
}

impl LocalDeployer {
    /// Create a backend with the default domain and no quota.
    pub fn new() -> Self {
        Self {
            domain: constants::LOCAL_EDGE_DOMAIN.to_string(),
            quota: None,
            deployed: Mutex::new(0),
        }
    }

    /// Override the domain suffix used for invocation URLs.
    pub fn with_domain(mut self, domain: &str) -> Self {
        self.domain = domain.to_string();
        self
    }

    /// Cap the number of deployments this backend will accept.
    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Number of deployments performed so far.
    pub fn deploy_count(&self) -> usize {
        *self
            .deployed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn validate_code_ref(code_ref: &str) -> Result<()> {
        if code_ref.is_empty() {
            return Err(DeployError::InvalidCodeRef("code reference cannot be empty".to_string()).into());
        }
        if let Some(bad) = code_ref
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '-' | '_' | '.' | '/'))
        {
            return Err(DeployError::InvalidCodeRef(format!(
                "invalid character '{}' in code reference `{}`",
                bad, code_ref
            ))
            .into());
        }
        Ok(())
    }
}

impl Default for LocalDeployer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deployer for LocalDeployer {
    fn deploy(&self, name: &str, spec: &WorkerSpec) -> Result<ProvisionedWorker> {
        Self::validate_code_ref(&spec.code_ref)?;

        let id = {
            let mut deployed = self
                .deployed
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(quota) = self.quota {
                if *deployed >= quota {
                    return Err(DeployError::QuotaExceeded(quota).into());
                }
            }
            *deployed += 1;
            format!("wrk-{:06}", *deployed)
        };

        let url = spec
            .url
            .then(|| format!("https://{}.{}", name, self.domain));

        debug!(
            worker = name,
            code_ref = %spec.code_ref,
            env_keys = spec.environment.len(),
            exposed = spec.url,
            "deploying worker"
        );

        let worker = ProvisionedWorker::new(
            id,
            name.to_string(),
            url,
            spec.environment.clone(),
            spec.url,
        );

        info!(worker = name, id = worker.id(), "worker deployed");

        Ok(worker)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
