//! Reconciliation core.
//!
//! Two paths funnel into the same protection policy and deletion executor:
//!
//! - the event-triggered path reacts to a single pull-request-closed
//!   notification ([`event`]);
//! - the sweep path periodically diffs all prefixed deployments against all
//!   open pull requests and removes every unprotected orphan ([`sweep`]).
//!
//! Neither path locks around a deployment name; safety under concurrent
//! invocation relies on the deletion executor's idempotence.

mod event;
mod executor;
mod sweep;

pub use event::EventDecision;
pub use executor::DeletionExecutor;
pub use sweep::{SweepFailure, SweepReport};

use std::sync::Arc;

use crate::config::SweepConfig;
use crate::naming::Namer;
use crate::policy::ProtectionPolicy;
use crate::provider::DeploymentProvider;
use crate::vcs::PullRequestSource;

/// Shared reconciliation logic for both the event and the sweep path.
///
/// Holds no mutable state of its own; each invocation re-fetches current
/// truth from the provider and the VCS host.
pub struct Reconciler {
    provider: Arc<dyn DeploymentProvider>,
    pull_requests: Arc<dyn PullRequestSource>,
    namer: Namer,
    policy: ProtectionPolicy,
    executor: DeletionExecutor,
    sweep_config: SweepConfig,
}

impl Reconciler {
    /// Create a new reconciler.
    pub fn new(
        provider: Arc<dyn DeploymentProvider>,
        pull_requests: Arc<dyn PullRequestSource>,
        namer: Namer,
        policy: ProtectionPolicy,
        sweep_config: SweepConfig,
    ) -> Self {
        let executor = DeletionExecutor::new(Arc::clone(&provider));
        Self {
            provider,
            pull_requests,
            namer,
            policy,
            executor,
            sweep_config,
        }
    }

    pub(crate) fn provider(&self) -> &Arc<dyn DeploymentProvider> {
        &self.provider
    }

    pub(crate) fn pull_requests(&self) -> &Arc<dyn PullRequestSource> {
        &self.pull_requests
    }

    pub(crate) fn namer(&self) -> &Namer {
        &self.namer
    }

    pub(crate) fn policy(&self) -> &ProtectionPolicy {
        &self.policy
    }

    pub(crate) fn executor(&self) -> &DeletionExecutor {
        &self.executor
    }

    pub(crate) fn sweep_config(&self) -> &SweepConfig {
        &self.sweep_config
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler").finish_non_exhaustive()
    }
}
