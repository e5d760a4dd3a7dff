use std::collections::HashMap;

use async_trait::async_trait;

/// Where named prompt templates come from.
///
/// Implementations never fail: when a template cannot be found they hand back
/// `default` unchanged.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    async fn fetch(&self, name: &str, default: &str) -> String;
}

/// Always answers with the built-in default.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTemplates;

#[async_trait]
impl TemplateSource for DefaultTemplates {
    async fn fetch(&self, _name: &str, default: &str) -> String {
        default.to_string()
    }
}

/// Fixed set of named templates held in memory, falling back to the default for
/// anything not present.
#[derive(Debug, Clone, Default)]
pub struct StaticTemplates {
    templates: HashMap<String, String>,
}

impl StaticTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.templates.insert(name.into(), content.into());
        self
    }
}

#[async_trait]
impl TemplateSource for StaticTemplates {
    async fn fetch(&self, name: &str, default: &str) -> String {
        self.templates
            .get(name)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }
}
