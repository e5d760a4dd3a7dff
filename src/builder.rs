use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::agents::{HttpPageSource, PageSource};
use crate::config::{DuckyConfig, PromptServiceConfig};
use crate::ducky::Ducky;
use crate::error::DuckyError;
use crate::llm::{AnthropicProvider, LlmProvider, OpenAIProvider};
use crate::pipeline::ScrapePipeline;
use crate::prompts::{DefaultTemplates, PromptBuilder, RemoteTemplateSource, TemplateSource};

/// Builder for constructing a [`Ducky`] instance.
///
/// # Example
///
/// ```no_run
/// # use ducky::{Ducky, DuckyConfig};
/// # fn example() -> Result<(), ducky::DuckyError> {
/// let config = DuckyConfig::default();
/// let ducky = Ducky::builder()
///     .config(&config)
///     .openai(Some("gpt-4o-mini"))?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct DuckyBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    templates: Option<Arc<dyn TemplateSource>>,
    prompt_service: PromptServiceConfig,
    pages: Option<Arc<dyn PageSource>>,
    pipeline: Option<ScrapePipeline>,
    work_dir: Option<PathBuf>,
}

impl DuckyBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            templates: None,
            prompt_service: PromptServiceConfig::default(),
            pages: None,
            pipeline: None,
            work_dir: None,
        }
    }

    /// Set a custom LLM provider.
    pub fn provider(mut self, provider: impl LlmProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Configure the Anthropic provider.
    ///
    /// If `model` is `None`, defaults to Claude Sonnet.
    pub fn anthropic(mut self, model: Option<&str>) -> Result<Self, DuckyError> {
        let p = match model {
            Some(m) => AnthropicProvider::new(m),
            None => AnthropicProvider::sonnet(),
        }
        .map_err(|e| DuckyError::Provider(format!("{:#}", e)))?;
        self.provider = Some(Arc::new(p));
        Ok(self)
    }

    /// Configure the OpenAI provider.
    ///
    /// If `model` is `None`, defaults to GPT-4o.
    pub fn openai(mut self, model: Option<&str>) -> Result<Self, DuckyError> {
        let p = match model {
            Some(m) => OpenAIProvider::new(m),
            None => OpenAIProvider::gpt4o(),
        }
        .map_err(|e| DuckyError::Provider(format!("{:#}", e)))?;
        self.provider = Some(Arc::new(p));
        Ok(self)
    }

    /// Configure a provider by name ("anthropic" or "openai").
    pub fn provider_by_name(self, name: &str, model: Option<&str>) -> Result<Self, DuckyError> {
        match name {
            "anthropic" => self.anthropic(model),
            "openai" => self.openai(model),
            _ => Err(DuckyError::Provider(format!("unknown provider: {}", name))),
        }
    }

    /// Use a fixed template source instead of the prompt service.
    pub fn templates(mut self, templates: impl TemplateSource + 'static) -> Self {
        self.templates = Some(Arc::new(templates));
        self
    }

    /// Fetch templates from the prompt service described by `config`.
    ///
    /// Ignored when [`templates`](Self::templates) is also set.
    pub fn prompt_service(mut self, config: PromptServiceConfig) -> Self {
        self.prompt_service = config;
        self
    }

    /// Set where the page scraper reads pages from.
    pub fn page_source(mut self, pages: impl PageSource + 'static) -> Self {
        self.pages = Some(Arc::new(pages));
        self
    }

    /// Set a custom agent line-up for the scrape pipeline.
    pub fn pipeline(mut self, pipeline: ScrapePipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Set the directory scrape runs write into.
    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Apply settings from a loaded configuration.
    ///
    /// The provider named in the config is not created here so the caller can
    /// still override it; see [`provider_by_name`](Self::provider_by_name).
    /// Settings applied here can be overridden by later builder calls.
    pub fn config(mut self, config: &DuckyConfig) -> Self {
        debug!("applying configuration");
        self.prompt_service = config.prompt_service.clone();
        self.work_dir = Some(config.work_dir_or_default());
        self
    }

    /// Build the [`Ducky`] instance.
    ///
    /// Fails if no provider has been configured or the pipeline is invalid.
    pub fn build(self) -> Result<Ducky, DuckyError> {
        let provider = self
            .provider
            .ok_or_else(|| DuckyError::Config("no LLM provider configured".to_string()))?;

        let templates: Arc<dyn TemplateSource> = match self.templates {
            Some(templates) => templates,
            None => match RemoteTemplateSource::from_config(&self.prompt_service) {
                Some(remote) => {
                    debug!("using remote prompt templates");
                    Arc::new(remote)
                }
                None => Arc::new(DefaultTemplates),
            },
        };

        let pipeline = self.pipeline.unwrap_or_default();
        pipeline.validate()?;

        let pages = self
            .pages
            .unwrap_or_else(|| Arc::new(HttpPageSource::new()));
        let work_dir = self
            .work_dir
            .unwrap_or_else(|| DuckyConfig::default().work_dir_or_default());

        Ok(Ducky::from_parts(
            provider,
            PromptBuilder::new(templates),
            pages,
            pipeline,
            work_dir,
        ))
    }
}

impl Default for DuckyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
