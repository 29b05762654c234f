//! Scheduled sweep reconciliation.
//!
//! The sweep is the backstop for lost or early-arriving webhook
//! notifications: it compares the full set of prefixed deployments against
//! the full set of open pull requests and removes every orphan that is not
//! protected.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};

use crate::error::{JanitorError, JanitorResult};
use crate::provider::DeleteOutcome;
use crate::types::DeploymentName;

use super::Reconciler;

/// A per-orphan deletion failure, isolated from the rest of the sweep.
#[derive(Debug, Clone)]
pub struct SweepFailure {
    /// Deployment the deletion targeted.
    pub name: DeploymentName,
    /// Why it failed.
    pub message: String,
}

/// Aggregate result of one sweep pass.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// Prefixed deployments observed at the start of the pass.
    pub deployments: usize,
    /// Open pull requests observed at the start of the pass.
    pub open_pull_requests: usize,
    /// Orphans that were deleted.
    pub deleted: Vec<DeploymentName>,
    /// Orphans that were already gone when the delete was attempted.
    pub already_absent: Vec<DeploymentName>,
    /// Orphans left alone because they are protected.
    pub protected: Vec<DeploymentName>,
    /// Orphans whose deletion failed.
    pub failures: Vec<SweepFailure>,
    /// Orphans not evaluated because the wall-clock budget ran out.
    pub unevaluated: Vec<DeploymentName>,
}

impl SweepReport {
    /// Whether the pass completed but one or more deletions failed.
    #[must_use]
    pub fn completed_with_errors(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Total orphans the pass identified.
    #[must_use]
    pub fn orphans(&self) -> usize {
        self.deleted.len()
            + self.already_absent.len()
            + self.protected.len()
            + self.failures.len()
            + self.unevaluated.len()
    }
}

impl Reconciler {
    /// Run one full sweep pass.
    ///
    /// A failure fetching either source of truth aborts the pass before any
    /// deletion; orphanhood cannot be judged from an incomplete picture. A
    /// failure deleting one orphan does not stop the others; all failures are
    /// collected into the report. The `sweep.budget_secs` wall-clock budget
    /// covers the whole pass, fetches included; per-orphan deletions run
    /// concurrently, bounded by `sweep.max_concurrent_deletes`.
    pub async fn sweep(&self) -> JanitorResult<SweepReport> {
        let prefix = self.namer().prefix().to_owned();
        let deadline =
            Instant::now() + Duration::from_secs(self.sweep_config().budget_secs);

        let deployments = timeout_at(deadline, self.provider().list_deployments(&prefix))
            .await
            .map_err(|_| {
                JanitorError::internal("sweep budget exhausted while listing deployments")
            })??;
        let open = timeout_at(deadline, self.pull_requests().list_open_pull_requests())
            .await
            .map_err(|_| {
                JanitorError::internal("sweep budget exhausted while listing pull requests")
            })??;

        let expected: HashSet<DeploymentName> = open
            .iter()
            .map(|pr| self.namer().deployment_name(&pr.head_branch))
            .collect();

        let mut report = SweepReport {
            deployments: deployments.len(),
            open_pull_requests: open.len(),
            ..SweepReport::default()
        };

        let mut candidates = Vec::new();
        for record in deployments {
            if expected.contains(&record.name) {
                continue;
            }
            // The protection flag stored on the deployment itself decides;
            // the identifier is also checked against the protected name set.
            if self
                .policy()
                .is_protected(record.name.as_str(), record.protection)
            {
                report.protected.push(record.name);
                continue;
            }
            candidates.push(record.name);
        }

        info!(
            deployments = report.deployments,
            open_pull_requests = report.open_pull_requests,
            orphans = candidates.len() + report.protected.len(),
            protected = report.protected.len(),
            "sweep pass starting deletions"
        );

        self.delete_candidates(candidates, deadline, &mut report).await;

        if report.completed_with_errors() {
            warn!(
                deleted = report.deleted.len(),
                failed = report.failures.len(),
                "sweep completed with errors"
            );
        } else {
            info!(
                deleted = report.deleted.len(),
                already_absent = report.already_absent.len(),
                "sweep completed"
            );
        }

        Ok(report)
    }

    /// Delete the given orphans with bounded concurrency under what is left
    /// of the sweep budget. Results are recorded in the report; orphans still
    /// pending when the budget expires end up in `unevaluated`.
    async fn delete_candidates(
        &self,
        candidates: Vec<DeploymentName>,
        deadline: Instant,
        report: &mut SweepReport,
    ) {
        if candidates.is_empty() {
            return;
        }

        let config = self.sweep_config();
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_deletes.max(1)));
        let mut tasks: JoinSet<(DeploymentName, JanitorResult<DeleteOutcome>)> = JoinSet::new();

        for name in &candidates {
            let name = name.clone();
            let executor = self.executor().clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            name.clone(),
                            Err(JanitorError::internal("sweep semaphore closed")),
                        )
                    }
                };
                let outcome = executor.delete(&name).await;
                drop(permit);
                (name, outcome)
            });
        }

        let deadline = tokio::time::sleep_until(deadline);
        tokio::pin!(deadline);

        let mut evaluated: HashSet<DeploymentName> = HashSet::new();
        loop {
            tokio::select! {
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok((name, Ok(DeleteOutcome::Deleted)))) => {
                        evaluated.insert(name.clone());
                        report.deleted.push(name);
                    }
                    Some(Ok((name, Ok(DeleteOutcome::NotFound)))) => {
                        evaluated.insert(name.clone());
                        report.already_absent.push(name);
                    }
                    Some(Ok((name, Err(err)))) => {
                        warn!(name = %name, error = %err, "orphan deletion failed");
                        evaluated.insert(name.clone());
                        report.failures.push(SweepFailure {
                            name,
                            message: err.to_string(),
                        });
                    }
                    // A panicked or cancelled deletion task counts as failed,
                    // but its name is only known from the candidate diff below.
                    Some(Err(join_err)) => {
                        warn!(error = %join_err, "orphan deletion task aborted");
                    }
                },
                () = &mut deadline => {
                    tasks.abort_all();
                    break;
                }
            }
        }

        for name in candidates {
            if !evaluated.contains(&name) {
                warn!(name = %name, "sweep budget exhausted before evaluation");
                report.unevaluated.push(name);
            }
        }
    }
}
