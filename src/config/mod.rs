mod project;
mod prompt_service;

pub use project::{DEFAULT_WORK_DIR, DuckyConfig, PROJECT_CONFIG_FILE};
pub use prompt_service::PromptServiceConfig;
