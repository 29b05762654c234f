//! Common test utilities for janitor integration tests.

use std::sync::Arc;

use axum::Router;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use preview_janitor::{
    api::{self, AppState},
    config::SweepConfig,
    DeploymentProvider, MockProvider, MockPullRequests, Namer, ProtectionPolicy,
    PullRequestSource, Reconciler,
};

pub const TEST_SECRET: &str = "test-webhook-secret";

/// Complete test janitor setup with all components wired together.
pub struct TestJanitor {
    pub provider: Arc<MockProvider>,
    pub pull_requests: Arc<MockPullRequests>,
    pub reconciler: Arc<Reconciler>,
}

impl TestJanitor {
    /// Creates a new test janitor with the default `preview-pr-` prefix.
    pub fn new() -> Self {
        Self::with_prefix("preview-pr-")
    }

    /// Creates a new test janitor with a custom namespace prefix.
    pub fn with_prefix(prefix: &str) -> Self {
        let provider = Arc::new(MockProvider::new());
        let pull_requests = Arc::new(MockPullRequests::new());

        let reconciler = Arc::new(Reconciler::new(
            Arc::clone(&provider) as Arc<dyn DeploymentProvider>,
            Arc::clone(&pull_requests) as Arc<dyn PullRequestSource>,
            Namer::new(prefix),
            ProtectionPolicy::default(),
            SweepConfig::default(),
        ));

        Self {
            provider,
            pull_requests,
            reconciler,
        }
    }

    /// Builds the HTTP router backed by this janitor's mocks.
    pub fn app(&self) -> Router {
        api::router(AppState {
            reconciler: Arc::clone(&self.reconciler),
            webhook_secret: Arc::from(TEST_SECRET),
        })
    }
}

impl Default for TestJanitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes the `X-Hub-Signature-256` header value for a body.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}
