//! Event-triggered reconciliation.

use tracing::{debug, info};

use crate::error::{JanitorError, JanitorResult};
use crate::provider::DeleteOutcome;
use crate::types::{DeploymentName, PullRequestAction, PullRequestEvent};

use super::Reconciler;

/// Outcome of handling one pull-request lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDecision {
    /// The corresponding deployment was deleted.
    Deleted(DeploymentName),
    /// The deployment was already gone; nothing to do.
    AlreadyAbsent(DeploymentName),
    /// The action does not denote closure; nothing to do.
    SkippedAction(PullRequestAction),
    /// The head branch is a canonical long-lived branch; closing a pull
    /// request against it must never delete the long-lived environment.
    SkippedLongLivedBranch(String),
    /// The deployment's protection flag is explicitly enabled.
    SkippedProtected(DeploymentName),
    /// No deployment has been provisioned for this branch (yet).
    NotProvisioned(DeploymentName),
}

impl Reconciler {
    /// Handle one pull-request lifecycle notification.
    ///
    /// Proceeds to deletion only when the action denotes closure and the head
    /// branch is not a long-lived branch. The decision, and the reason for a
    /// skip, is logged either way. Failures propagate to the caller; the
    /// webhook sender's own retry contract covers redelivery, which is safe
    /// because deletion is idempotent.
    pub async fn handle_pull_request(
        &self,
        event: &PullRequestEvent,
    ) -> JanitorResult<EventDecision> {
        if event.head_branch.is_empty() {
            return Err(JanitorError::validation("empty head branch"));
        }

        let delivery = event.delivery_id.as_deref().unwrap_or("-");

        if !event.action.is_closure() {
            debug!(
                branch = %event.head_branch,
                action = ?event.action,
                delivery = %delivery,
                "ignoring non-closure action"
            );
            return Ok(EventDecision::SkippedAction(event.action));
        }

        // Unconditional exclusion, checked before any policy or flag lookup.
        if self.policy().is_protected_name(&event.head_branch) {
            info!(
                branch = %event.head_branch,
                delivery = %delivery,
                "skipping long-lived branch"
            );
            return Ok(EventDecision::SkippedLongLivedBranch(
                event.head_branch.clone(),
            ));
        }

        let name = self.namer().deployment_name(&event.head_branch);

        let Some(protection) = self.provider().get_protection(&name).await? else {
            info!(name = %name, branch = %event.head_branch, "deployment not provisioned, nothing to clean up");
            return Ok(EventDecision::NotProvisioned(name));
        };

        if self.policy().is_protected(&event.head_branch, protection) {
            info!(
                name = %name,
                branch = %event.head_branch,
                protection = %protection,
                "deletion protection enabled, skipping clean-up"
            );
            return Ok(EventDecision::SkippedProtected(name));
        }

        info!(name = %name, branch = %event.head_branch, delivery = %delivery, "cleaning up deployment");
        match self.executor().delete(&name).await? {
            DeleteOutcome::Deleted => Ok(EventDecision::Deleted(name)),
            DeleteOutcome::NotFound => Ok(EventDecision::AlreadyAbsent(name)),
        }
    }
}
