//! Heroku Platform API provider client.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{JanitorError, JanitorResult};
use crate::types::{DeploymentName, DeploymentRecord, ProtectionFlag};

use super::{DeleteOutcome, DeploymentProvider};

const HEROKU_ACCEPT: &str = "application/vnd.heroku+json; version=3";

/// App summary from the Platform API.
#[derive(serde::Deserialize)]
struct RawApp {
    name: String,
}

/// Deployment provider backed by the Heroku Platform API.
///
/// Preview apps carry the namespace prefix in their app name; the protection
/// flag lives in a config var on the app.
#[derive(Debug, Clone)]
pub struct HerokuProvider {
    client: Client,
    base_url: String,
    protection_key: String,
}

impl HerokuProvider {
    /// Create a new provider client from configuration.
    pub fn new(config: &ProviderConfig) -> JanitorResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(HEROKU_ACCEPT));
        let auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|e| JanitorError::Config(format!("invalid provider token: {e}")))?;
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(JanitorError::Http)?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_owned(),
            protection_key: config.protection_key.clone(),
        })
    }

    async fn list_apps(&self, prefix: &str) -> JanitorResult<Vec<String>> {
        let url = format!("{}/apps", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(JanitorError::Http)?;

        if !response.status().is_success() {
            return Err(JanitorError::provider(
                prefix,
                format!("failed to list apps: {}", response.status()),
            ));
        }

        let apps: Vec<RawApp> = response.json().await.map_err(JanitorError::Http)?;
        Ok(apps
            .into_iter()
            .map(|a| a.name)
            .filter(|name| name.starts_with(prefix))
            .collect())
    }

    async fn config_vars(
        &self,
        name: &DeploymentName,
    ) -> JanitorResult<Option<HashMap<String, String>>> {
        let url = format!("{}/apps/{}/config-vars", self.base_url, name);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(JanitorError::Http)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json().await.map(Some).map_err(JanitorError::Http)
            }
            status => Err(JanitorError::provider(
                name.as_str(),
                format!("failed to read config vars: {status}"),
            )),
        }
    }

    fn decode_protection(&self, vars: &HashMap<String, String>) -> ProtectionFlag {
        ProtectionFlag::from_config_value(vars.get(&self.protection_key).map(String::as_str))
    }
}

#[async_trait]
impl DeploymentProvider for HerokuProvider {
    async fn list_deployments(&self, prefix: &str) -> JanitorResult<Vec<DeploymentRecord>> {
        let names = self.list_apps(prefix).await?;
        debug!(prefix = %prefix, count = names.len(), "listed prefixed apps");

        let mut records = Vec::with_capacity(names.len());
        for name in names {
            let name = DeploymentName::new(name);
            // An app can disappear between the listing and this read; treat
            // that as already gone rather than failing the whole listing.
            let protection = match self.config_vars(&name).await? {
                Some(vars) => self.decode_protection(&vars),
                None => continue,
            };
            records.push(DeploymentRecord { name, protection });
        }

        Ok(records)
    }

    async fn get_protection(
        &self,
        name: &DeploymentName,
    ) -> JanitorResult<Option<ProtectionFlag>> {
        Ok(self
            .config_vars(name)
            .await?
            .map(|vars| self.decode_protection(&vars)))
    }

    async fn delete(&self, name: &DeploymentName) -> JanitorResult<DeleteOutcome> {
        let url = format!("{}/apps/{}", self.base_url, name);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(JanitorError::Http)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(DeleteOutcome::NotFound),
            status if status.is_success() => Ok(DeleteOutcome::Deleted),
            status => Err(JanitorError::provider(
                name.as_str(),
                format!("delete failed: {status}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;

    fn provider() -> HerokuProvider {
        HerokuProvider::new(&ProviderConfig::default()).unwrap()
    }

    #[test]
    fn protection_decoded_from_config_vars() {
        let provider = provider();

        let mut vars = HashMap::new();
        vars.insert("DELETION_PROTECTION".to_owned(), "true".to_owned());
        assert_eq!(provider.decode_protection(&vars), ProtectionFlag::Enabled);

        vars.insert("DELETION_PROTECTION".to_owned(), String::new());
        assert_eq!(provider.decode_protection(&vars), ProtectionFlag::Disabled);

        vars.remove("DELETION_PROTECTION");
        assert_eq!(provider.decode_protection(&vars), ProtectionFlag::Unset);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = ProviderConfig {
            api_url: "https://api.heroku.com/".to_owned(),
            ..ProviderConfig::default()
        };
        let provider = HerokuProvider::new(&config).unwrap();
        assert_eq!(provider.base_url, "https://api.heroku.com");
    }
}
