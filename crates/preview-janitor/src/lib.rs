//! Preview Deployment Janitor
//!
//! This crate reconciles ephemeral preview deployments against the set of
//! currently-open pull requests and tears down every deployment that no
//! longer has one, while protecting deployments explicitly marked durable.
//!
//! # Architecture
//!
//! Two independent triggers funnel into one reconciliation core:
//!
//! - **Webhook path**: a pull-request-closed notification arrives on the
//!   HTTP API, is signature-verified and validated, and immediately removes
//!   the corresponding deployment if eligible.
//! - **Sweep path**: a scheduled pass lists all prefixed deployments and all
//!   open pull requests, diffs them by derived name, and removes every
//!   unprotected orphan. This is the backstop for lost or early-arriving
//!   notifications.
//!
//! Both paths share the [`policy::ProtectionPolicy`] and the idempotent
//! [`reconcile::DeletionExecutor`]; concurrent deletion attempts for the same
//! name are safe because "already absent" is a success outcome. External
//! collaborators (the deployment provider and the VCS host) are reached only
//! through injected trait objects, never through a process-wide client.

#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod error;
pub mod naming;
pub mod policy;
pub mod provider;
pub mod reconcile;
pub mod service;
pub mod types;
pub mod vcs;

// Re-export commonly used types at the crate root
pub use config::JanitorConfig;
pub use error::{JanitorError, JanitorResult};
pub use naming::Namer;
pub use policy::ProtectionPolicy;
pub use provider::{DeleteOutcome, DeploymentProvider, MockProvider};
pub use reconcile::{EventDecision, Reconciler, SweepReport};
pub use service::JanitorService;
pub use types::{
    DeploymentName, DeploymentRecord, ProtectionFlag, PullRequest, PullRequestAction,
    PullRequestEvent,
};
pub use vcs::{MockPullRequests, PullRequestSource};
