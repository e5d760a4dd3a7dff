use serde::{Deserialize, Serialize};

/// Connection settings for the remote prompt-content service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptServiceConfig {
    /// Host name of the service
    #[serde(default)]
    pub hostname: Option<String>,

    /// Port of the service
    #[serde(default)]
    pub port: Option<u16>,

    /// Basic auth user
    #[serde(default)]
    pub username: Option<String>,

    /// Basic auth password
    #[serde(default)]
    pub password: Option<String>,
}

impl PromptServiceConfig {
    /// The service is only contacted when a host is set.
    pub fn is_configured(&self) -> bool {
        self.hostname.as_deref().is_some_and(|h| !h.is_empty())
    }

    /// Base URL of the service, e.g. `http://localhost:8000`
    pub fn base_url(&self) -> Option<String> {
        let hostname = self.hostname.as_deref().filter(|h| !h.is_empty())?;
        Some(match self.port {
            Some(port) => format!("http://{}:{}", hostname, port),
            None => format!("http://{}", hostname),
        })
    }
}
