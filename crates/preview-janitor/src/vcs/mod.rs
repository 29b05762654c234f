//! Pull request sources.
//!
//! The sweep reconciler needs one thing from the VCS host: the set of
//! currently-open pull requests for the configured repository. The trait here
//! keeps that read-only and substitutable in tests.

mod github;

pub use github::GithubPullRequests;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::config::GithubConfig;
use crate::error::{JanitorError, JanitorResult};
use crate::types::PullRequest;

/// Read-only view of a repository's open pull requests.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// List every currently-open pull request.
    async fn list_open_pull_requests(&self) -> JanitorResult<Vec<PullRequest>>;
}

/// Create a pull request source from configuration.
pub fn create_pull_request_source(
    config: &GithubConfig,
) -> JanitorResult<Arc<dyn PullRequestSource>> {
    Ok(Arc::new(GithubPullRequests::new(config)?))
}

/// Mock pull request source for testing.
#[derive(Debug, Default)]
pub struct MockPullRequests {
    open: RwLock<Vec<PullRequest>>,
    fail_listing: AtomicBool,
}

impl MockPullRequests {
    /// Create a source with no open pull requests.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a pull request as open for the given head branch.
    pub fn open(&self, head_branch: impl Into<String>) {
        if let Ok(mut open) = self.open.write() {
            open.push(PullRequest {
                head_branch: head_branch.into(),
            });
        }
    }

    /// Make listing calls fail.
    pub fn fail_listing(&self) {
        self.fail_listing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PullRequestSource for MockPullRequests {
    async fn list_open_pull_requests(&self) -> JanitorResult<Vec<PullRequest>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(JanitorError::PullRequestSource(
                "listing unavailable".to_owned(),
            ));
        }

        self.open
            .read()
            .map(|open| open.clone())
            .map_err(|_| JanitorError::internal("lock poisoned"))
    }
}
