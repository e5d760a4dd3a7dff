use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::TemplateSource;
use crate::config::PromptServiceConfig;

/// Body returned by `GET /private/prompt/name/{name}`
#[derive(Debug, Deserialize)]
struct PromptRecord {
    #[serde(default)]
    content: Option<String>,
}

/// Template source backed by the remote prompt-content service.
///
/// Lookup failures of any kind are logged and answered with the default.
pub struct RemoteTemplateSource {
    client: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl RemoteTemplateSource {
    /// Build a source for an explicit base URL, e.g. `http://localhost:8000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: None,
            password: None,
        }
    }

    /// Build a source from configuration; `None` when no host is configured.
    pub fn from_config(config: &PromptServiceConfig) -> Option<Self> {
        let base_url = config.base_url()?;
        let mut source = Self::new(base_url);
        source.username = config.username.clone();
        source.password = config.password.clone();
        Some(source)
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    fn url_for(&self, name: &str) -> String {
        format!("{}/private/prompt/name/{}", self.base_url, name)
    }

    async fn lookup(&self, name: &str) -> Result<Option<String>> {
        let mut request = self.client.get(self.url_for(name));
        if let Some(ref username) = self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("failed to reach prompt service for '{}'", name))?
            .error_for_status()
            .with_context(|| format!("prompt service rejected '{}'", name))?;

        let record: PromptRecord = response
            .json()
            .await
            .with_context(|| format!("failed to parse prompt '{}'", name))?;

        Ok(record.content)
    }
}

#[async_trait]
impl TemplateSource for RemoteTemplateSource {
    async fn fetch(&self, name: &str, default: &str) -> String {
        match self.lookup(name).await {
            Ok(Some(content)) => {
                debug!(template = name, "using remote prompt");
                content
            }
            Ok(None) => {
                debug!(template = name, "remote prompt has no content, using default");
                default.to_string()
            }
            Err(e) => {
                warn!(template = name, error = %e, "prompt lookup failed, using default");
                default.to_string()
            }
        }
    }
}
