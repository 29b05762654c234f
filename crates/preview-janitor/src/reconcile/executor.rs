//! Deletion executor.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{JanitorError, JanitorResult};
use crate::provider::{DeleteOutcome, DeploymentProvider};
use crate::types::DeploymentName;

/// Performs the destructive provider call, idempotently.
///
/// "Already gone" is translated into [`DeleteOutcome::NotFound`] and treated
/// as success by every caller: the desired end state (deployment absent)
/// already holds. Two concurrent calls for the same name both terminate
/// successfully, with exactly one observing `Deleted`. Provider errors are
/// surfaced with the deployment name attached; no retries happen here.
#[derive(Clone)]
pub struct DeletionExecutor {
    provider: Arc<dyn DeploymentProvider>,
}

impl DeletionExecutor {
    /// Create a new executor over the given provider.
    pub fn new(provider: Arc<dyn DeploymentProvider>) -> Self {
        Self { provider }
    }

    /// Delete a deployment if it still exists.
    pub async fn delete(&self, name: &DeploymentName) -> JanitorResult<DeleteOutcome> {
        match self.provider.delete(name).await {
            Ok(DeleteOutcome::Deleted) => {
                info!(name = %name, "deployment deleted");
                Ok(DeleteOutcome::Deleted)
            }
            Ok(DeleteOutcome::NotFound) => {
                debug!(name = %name, "deployment already absent");
                Ok(DeleteOutcome::NotFound)
            }
            Err(err @ JanitorError::Provider { .. }) => Err(err),
            Err(err) => Err(JanitorError::provider(name.as_str(), err.to_string())),
        }
    }
}

impl std::fmt::Debug for DeletionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeletionExecutor").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;
    use crate::types::ProtectionFlag;

    fn executor_with(provider: Arc<MockProvider>) -> DeletionExecutor {
        DeletionExecutor::new(provider)
    }

    #[tokio::test]
    async fn deleting_absent_deployment_succeeds() {
        let provider = Arc::new(MockProvider::new());
        let executor = executor_with(Arc::clone(&provider));

        let outcome = executor
            .delete(&DeploymentName::new("preview-pr-ghost"))
            .await
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::NotFound);
    }

    #[tokio::test]
    async fn concurrent_deletes_observe_one_destruction() {
        let provider = Arc::new(MockProvider::new());
        provider.insert("preview-pr-abc", ProtectionFlag::Unset);

        let a = executor_with(Arc::clone(&provider));
        let b = executor_with(Arc::clone(&provider));
        let name = DeploymentName::new("preview-pr-abc");

        let (ra, rb) = tokio::join!(a.delete(&name), b.delete(&name));
        let (ra, rb) = (ra.unwrap(), rb.unwrap());

        // Both succeed; exactly one destructive call reached the provider.
        assert_eq!(provider.destructive_calls(), 1);
        assert!(
            (ra == DeleteOutcome::Deleted) != (rb == DeleteOutcome::Deleted),
            "expected exactly one Deleted outcome, got {ra:?} and {rb:?}"
        );
    }

    #[tokio::test]
    async fn provider_failure_carries_name() {
        let provider = Arc::new(MockProvider::new());
        provider.insert("preview-pr-abc", ProtectionFlag::Unset);
        provider.fail_delete("preview-pr-abc");

        let executor = executor_with(provider);
        let err = executor
            .delete(&DeploymentName::new("preview-pr-abc"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("preview-pr-abc"));
    }
}
