//! GitHub REST client for listing open pull requests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use tracing::debug;

use crate::config::GithubConfig;
use crate::error::{JanitorError, JanitorResult};
use crate::types::PullRequest;

use super::PullRequestSource;

const PAGE_SIZE: usize = 100;

/// Pull request payload subset from the REST API.
#[derive(serde::Deserialize)]
struct RawPullRequest {
    head: RawHead,
}

#[derive(serde::Deserialize)]
struct RawHead {
    #[serde(rename = "ref")]
    branch: String,
}

/// Pull request source backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GithubPullRequests {
    client: Client,
    base_url: String,
    repository: String,
}

impl GithubPullRequests {
    /// Create a new client from configuration.
    pub fn new(config: &GithubConfig) -> JanitorResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("preview-janitor"));
        if let Some(token) = &config.token {
            let auth = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| JanitorError::Config(format!("invalid github token: {e}")))?;
            headers.insert(AUTHORIZATION, auth);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(JanitorError::Http)?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_owned(),
            repository: config.repository.clone(),
        })
    }
}

#[async_trait]
impl PullRequestSource for GithubPullRequests {
    async fn list_open_pull_requests(&self) -> JanitorResult<Vec<PullRequest>> {
        let mut open = Vec::new();

        for page in 1.. {
            let url = format!(
                "{}/repos/{}/pulls?state=open&per_page={PAGE_SIZE}&page={page}",
                self.base_url, self.repository
            );
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(JanitorError::Http)?;

            if !response.status().is_success() {
                return Err(JanitorError::PullRequestSource(format!(
                    "listing {} failed: {}",
                    self.repository,
                    response.status()
                )));
            }

            let batch: Vec<RawPullRequest> =
                response.json().await.map_err(JanitorError::Http)?;
            let batch_len = batch.len();

            open.extend(batch.into_iter().map(|pr| PullRequest {
                head_branch: pr.head.branch,
            }));

            if batch_len < PAGE_SIZE {
                break;
            }
        }

        debug!(
            repository = %self.repository,
            count = open.len(),
            "listed open pull requests"
        );

        Ok(open)
    }
}
