//! Configuration for preview-janitor.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

use crate::error::{JanitorError, JanitorResult};

/// Top-level configuration for the janitor service.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct JanitorConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Webhook receiver configuration.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// VCS host (pull request source) configuration.
    #[serde(default)]
    pub github: GithubConfig,

    /// Deployment provider configuration.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Sweep reconciler configuration.
    #[serde(default)]
    pub sweep: SweepConfig,

    /// Protection policy configuration.
    #[serde(default)]
    pub protection: ProtectionConfig,
}

impl JanitorConfig {
    /// Load configuration from the default sources.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. `janitor.toml` in the current directory (if present)
    /// 3. Environment variables with `JANITOR_` prefix
    pub fn load() -> JanitorResult<Self> {
        Figment::new()
            .merge(Toml::file("janitor.toml"))
            .merge(Env::prefixed("JANITOR_").split("__"))
            .extract()
            .map_err(|e| JanitorError::Config(e.to_string()))
    }

    /// Load configuration from a specific TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> JanitorResult<Self> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("JANITOR_").split("__"))
            .extract()
            .map_err(|e| JanitorError::Config(e.to_string()))
    }

    /// Validate settings the service cannot run without.
    pub fn validate(&self) -> JanitorResult<()> {
        if self.webhook.secret.is_empty() {
            return Err(JanitorError::Config(
                "webhook.secret must be set (JANITOR_WEBHOOK__SECRET)".to_owned(),
            ));
        }
        if self.github.repository.is_empty() {
            return Err(JanitorError::Config(
                "github.repository must be set (owner/name)".to_owned(),
            ));
        }
        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

/// Webhook receiver configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WebhookConfig {
    /// Shared secret for HMAC signature verification of inbound deliveries.
    #[serde(default)]
    pub secret: String,
}

/// VCS host configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubConfig {
    /// Base URL of the REST API.
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Source repository in `owner/name` form.
    #[serde(default)]
    pub repository: String,

    /// API token. Optional for public repositories.
    #[serde(default)]
    pub token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_github_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_owned()
}

const fn default_github_timeout_secs() -> u64 {
    10
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            repository: String::new(),
            token: None,
            timeout_secs: default_github_timeout_secs(),
        }
    }
}

/// Deployment provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use.
    #[serde(default)]
    pub provider_type: ProviderType,

    /// Base URL of the provider API.
    #[serde(default = "default_provider_api_url")]
    pub api_url: String,

    /// Provider API token.
    #[serde(default)]
    pub token: String,

    /// Namespace prefix for preview deployment names.
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,

    /// Config key holding the deployment's protection flag.
    #[serde(default = "default_protection_key")]
    pub protection_key: String,

    /// Request timeout in seconds.
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider_api_url() -> String {
    "https://api.heroku.com".to_owned()
}

fn default_name_prefix() -> String {
    "preview-pr-".to_owned()
}

fn default_protection_key() -> String {
    "DELETION_PROTECTION".to_owned()
}

const fn default_provider_timeout_secs() -> u64 {
    15
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::default(),
            api_url: default_provider_api_url(),
            token: String::new(),
            name_prefix: default_name_prefix(),
            protection_key: default_protection_key(),
            timeout_secs: default_provider_timeout_secs(),
        }
    }
}

/// Type of deployment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    /// Heroku Platform API provider.
    #[default]
    Heroku,

    /// Mock provider for testing.
    Mock,
}

/// Sweep reconciler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    /// Whether the scheduled sweep runs at all.
    #[serde(default = "default_sweep_enabled")]
    pub enabled: bool,

    /// Interval between sweeps in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub interval_secs: u64,

    /// Wall-clock budget for a single sweep pass in seconds.
    #[serde(default = "default_sweep_budget_secs")]
    pub budget_secs: u64,

    /// Maximum concurrent deletions within one sweep.
    #[serde(default = "default_max_concurrent_deletes")]
    pub max_concurrent_deletes: usize,
}

const fn default_sweep_enabled() -> bool {
    true
}

const fn default_sweep_interval_secs() -> u64 {
    3600
}

const fn default_sweep_budget_secs() -> u64 {
    300
}

const fn default_max_concurrent_deletes() -> usize {
    4
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: default_sweep_enabled(),
            interval_secs: default_sweep_interval_secs(),
            budget_secs: default_sweep_budget_secs(),
            max_concurrent_deletes: default_max_concurrent_deletes(),
        }
    }
}

/// Protection policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProtectionConfig {
    /// Long-lived branch names that are never eligible for deletion.
    ///
    /// Additive: `master` and `production` are always protected, whether or
    /// not they appear here.
    #[serde(default = "default_protected_branches")]
    pub protected_branches: Vec<String>,
}

fn default_protected_branches() -> Vec<String> {
    vec!["master".to_owned(), "production".to_owned()]
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            protected_branches: default_protected_branches(),
        }
    }
}
