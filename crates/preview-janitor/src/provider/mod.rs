//! Deployment provider clients.
//!
//! This module defines the narrow interface through which the reconcilers
//! observe and destroy preview deployments. The primary implementation talks
//! to the Heroku Platform API; a mock is provided for testing. Clients are
//! injected explicitly; there is no process-wide provider singleton.

mod heroku;

pub use heroku::HerokuProvider;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::config::{ProviderConfig, ProviderType};
use crate::error::{JanitorError, JanitorResult};
use crate::types::{DeploymentName, DeploymentRecord, ProtectionFlag};

/// Outcome of a delete call.
///
/// Both variants are success: `NotFound` means the desired end state
/// (deployment absent) already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The deployment existed and was destroyed.
    Deleted,
    /// No deployment with this name exists.
    NotFound,
}

/// Trait for deployment provider implementations.
///
/// Implementations must make `delete` safe to invoke twice in quick
/// succession for the same name: the second call observes `NotFound`.
#[async_trait]
pub trait DeploymentProvider: Send + Sync {
    /// List provisioned deployments whose name carries the given prefix,
    /// including each deployment's stored protection flag.
    async fn list_deployments(&self, prefix: &str) -> JanitorResult<Vec<DeploymentRecord>>;

    /// Read the protection flag of a single deployment.
    ///
    /// Returns `None` if no deployment with this name is provisioned.
    async fn get_protection(&self, name: &DeploymentName)
        -> JanitorResult<Option<ProtectionFlag>>;

    /// Destroy a deployment.
    async fn delete(&self, name: &DeploymentName) -> JanitorResult<DeleteOutcome>;
}

/// Create a provider client from configuration.
pub fn create_provider(config: &ProviderConfig) -> JanitorResult<Arc<dyn DeploymentProvider>> {
    match config.provider_type {
        ProviderType::Heroku => {
            let provider = HerokuProvider::new(config)?;
            Ok(Arc::new(provider))
        }
        ProviderType::Mock => Ok(Arc::new(MockProvider::default())),
    }
}

/// Mock provider for testing.
#[derive(Debug, Default)]
pub struct MockProvider {
    deployments: RwLock<HashMap<String, ProtectionFlag>>,
    fail_deletes: RwLock<HashSet<String>>,
    fail_listing: AtomicBool,
    destructive_calls: AtomicUsize,
}

impl MockProvider {
    /// Create an empty mock provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision a deployment with the given protection flag.
    pub fn insert(&self, name: impl Into<String>, protection: ProtectionFlag) {
        if let Ok(mut deployments) = self.deployments.write() {
            deployments.insert(name.into(), protection);
        }
    }

    /// Make deletes of the given name fail with a provider error.
    pub fn fail_delete(&self, name: impl Into<String>) {
        if let Ok(mut fail) = self.fail_deletes.write() {
            fail.insert(name.into());
        }
    }

    /// Make the next listing calls fail.
    pub fn fail_listing(&self) {
        self.fail_listing.store(true, Ordering::SeqCst);
    }

    /// Whether a deployment with this name is still provisioned.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.deployments
            .read()
            .map(|d| d.contains_key(name))
            .unwrap_or(false)
    }

    /// Number of destructive provider calls that observed an existing
    /// deployment.
    #[must_use]
    pub fn destructive_calls(&self) -> usize {
        self.destructive_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeploymentProvider for MockProvider {
    async fn list_deployments(&self, prefix: &str) -> JanitorResult<Vec<DeploymentRecord>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(JanitorError::internal("listing unavailable"));
        }

        let deployments = self
            .deployments
            .read()
            .map_err(|_| JanitorError::internal("lock poisoned"))?;

        Ok(deployments
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, protection)| DeploymentRecord {
                name: DeploymentName::new(name.clone()),
                protection: *protection,
            })
            .collect())
    }

    async fn get_protection(
        &self,
        name: &DeploymentName,
    ) -> JanitorResult<Option<ProtectionFlag>> {
        let deployments = self
            .deployments
            .read()
            .map_err(|_| JanitorError::internal("lock poisoned"))?;

        Ok(deployments.get(name.as_str()).copied())
    }

    async fn delete(&self, name: &DeploymentName) -> JanitorResult<DeleteOutcome> {
        {
            let fail = self
                .fail_deletes
                .read()
                .map_err(|_| JanitorError::internal("lock poisoned"))?;
            if fail.contains(name.as_str()) {
                return Err(JanitorError::provider(name.as_str(), "delete refused"));
            }
        }

        let mut deployments = self
            .deployments
            .write()
            .map_err(|_| JanitorError::internal("lock poisoned"))?;

        if deployments.remove(name.as_str()).is_some() {
            self.destructive_calls.fetch_add(1, Ordering::SeqCst);
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NotFound)
        }
    }
}
