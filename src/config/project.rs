use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::PromptServiceConfig;

/// Project config file, looked up in the current directory
pub const PROJECT_CONFIG_FILE: &str = ".ducky.toml";

/// Directory where generated code lands when nothing else is configured
pub const DEFAULT_WORK_DIR: &str = "coding";

/// Ducky configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuckyConfig {
    /// LLM provider to use (e.g., "anthropic", "openai")
    #[serde(default)]
    pub provider: Option<String>,

    /// Model to use
    #[serde(default)]
    pub model: Option<String>,

    /// Working directory for generated code
    #[serde(default)]
    pub work_dir: Option<PathBuf>,

    /// Remote prompt-content service
    #[serde(default)]
    pub prompt_service: PromptServiceConfig,
}

impl DuckyConfig {
    /// Load configuration with precedence: env > project file > global file > defaults.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(global) = global_config_path() {
            if global.exists() {
                config = config.merge(Self::from_file(&global)?);
            }
        }

        let project = Path::new(PROJECT_CONFIG_FILE);
        if project.exists() {
            config = config.merge(Self::from_file(project)?);
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a single TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: Self) -> Self {
        let service = other.prompt_service;
        Self {
            provider: other.provider.or(self.provider),
            model: other.model.or(self.model),
            work_dir: other.work_dir.or(self.work_dir),
            prompt_service: PromptServiceConfig {
                hostname: service.hostname.or(self.prompt_service.hostname),
                port: service.port.or(self.prompt_service.port),
                username: service.username.or(self.prompt_service.username),
                password: service.password.or(self.prompt_service.password),
            },
        }
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// An unparseable `CODEPROMPTU_PORT` is skipped with a warning; the other
    /// overrides still apply.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(hostname) = lookup("CODEPROMPTU_HOSTNAME") {
            self.prompt_service.hostname = Some(hostname);
        }
        if let Some(port) = lookup("CODEPROMPTU_PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => self.prompt_service.port = Some(port),
                Err(e) => warn!(value = %port, error = %e, "ignoring invalid CODEPROMPTU_PORT"),
            }
        }
        if let Some(username) = lookup("CODEPROMPTU_USERNAME") {
            self.prompt_service.username = Some(username);
        }
        if let Some(password) = lookup("CODEPROMPTU_PASSWORD") {
            self.prompt_service.password = Some(password);
        }
        if let Some(work_dir) = lookup("DUCKY_WORK_DIR") {
            self.work_dir = Some(PathBuf::from(work_dir));
        }
    }

    /// Working directory, falling back to [`DEFAULT_WORK_DIR`].
    pub fn work_dir_or_default(&self) -> PathBuf {
        self.work_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORK_DIR))
    }
}

fn global_config_path() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    Some(Path::new(&home).join(".ducky").join("config.toml"))
}
