use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::agents::{ModelResponder, PageScraperResponder, PageSource};
use crate::builder::DuckyBuilder;
use crate::error::DuckyError;
use crate::llm::{LlmProvider, Message};
use crate::pipeline::{ScrapePipeline, ScrapeRun, StageResponders, WorkResult};
use crate::prompts::{CodeRevision, PromptBuilder};

struct Inner {
    provider: Arc<dyn LlmProvider>,
    prompts: PromptBuilder,
    pages: Arc<dyn PageSource>,
    pipeline: ScrapePipeline,
    work_dir: PathBuf,
}

/// The coding assistant: single-shot code help plus the scrape pipeline.
///
/// Use [`Ducky::builder()`] to construct an instance. Cloning is cheap and
/// clones share the same provider and template source.
///
/// # Example
///
/// ```no_run
/// # use ducky::Ducky;
/// # async fn example() -> Result<(), ducky::DuckyError> {
/// let ducky = Ducky::builder().anthropic(None)?.build()?;
///
/// let review = ducky.review("def add(a, b): return a - b").await?;
/// println!("{}", review);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Ducky {
    inner: Arc<Inner>,
}

impl Ducky {
    pub(crate) fn from_parts(
        provider: Arc<dyn LlmProvider>,
        prompts: PromptBuilder,
        pages: Arc<dyn PageSource>,
        pipeline: ScrapePipeline,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                prompts,
                pages,
                pipeline,
                work_dir,
            }),
        }
    }

    /// Create a new builder for configuring a `Ducky` instance.
    pub fn builder() -> DuckyBuilder {
        DuckyBuilder::new()
    }

    /// Directory that [`scrape`](Self::scrape) writes into.
    pub fn work_dir(&self) -> &Path {
        &self.inner.work_dir
    }

    /// Review a snippet; the answer is markdown.
    pub async fn review(&self, code: &str) -> Result<String, DuckyError> {
        require("code snippet", code)?;
        let system = self.inner.prompts.code_starter_system().await;
        let prompt = self.inner.prompts.review(code).await;
        self.chat("review", &system, &prompt).await
    }

    /// Ask for a modified version of a snippet.
    pub async fn modify(&self, code: &str, instruction: &str) -> Result<CodeRevision, DuckyError> {
        require("code snippet", code)?;
        require("instruction", instruction)?;
        let system = self.inner.prompts.code_starter_system().await;
        let prompt = self.inner.prompts.modify(code, instruction).await;
        let answer = self.chat("modify", &system, &prompt).await?;
        Ok(CodeRevision::parse(&answer))
    }

    /// Ask for a fixed version of a snippet with an explanation of the bugs.
    pub async fn debug(&self, code: &str) -> Result<CodeRevision, DuckyError> {
        require("code snippet", code)?;
        let system = self.inner.prompts.code_starter_system().await;
        let prompt = self.inner.prompts.debug(code).await;
        let answer = self.chat("debug", &system, &prompt).await?;
        Ok(CodeRevision::parse(&answer))
    }

    /// Explain `topic` for a learner at `level`, answering in the requested style.
    pub async fn learn(
        &self,
        level: &str,
        answer_type: &str,
        topic: &str,
    ) -> Result<String, DuckyError> {
        require("topic", topic)?;
        let system = self.inner.prompts.learning_system().await;
        let prompt = self.inner.prompts.learning(level, answer_type, topic).await;
        self.chat("learn", &system, &prompt).await
    }

    /// Free-form coding question.
    pub async fn ask(&self, question: &str) -> Result<String, DuckyError> {
        require("question", question)?;
        let system = self.inner.prompts.quick_chat_system().await;
        self.chat("ask", &system, question).await
    }

    /// Run the scrape pipeline in the configured working directory.
    pub async fn scrape(&self, message: &str) -> Result<WorkResult, DuckyError> {
        let mut run = ScrapeRun::new(&self.inner.work_dir);
        self.scrape_run(&mut run, message).await?;
        Ok(run.result)
    }

    /// Run the scrape pipeline, recording progress in `run`.
    ///
    /// On failure `run` is left in the FAILED phase with the error recorded.
    pub async fn scrape_run(&self, run: &mut ScrapeRun, message: &str) -> Result<(), DuckyError> {
        require("message", message)?;

        let model = ModelResponder::new(Arc::clone(&self.inner.provider));
        let page_scraper = PageScraperResponder::new(Arc::clone(&self.inner.pages));
        let responders = StageResponders {
            model: &model,
            page_scraper: &page_scraper,
        };

        self.inner.pipeline.execute(run, message, responders).await
    }

    async fn chat(&self, action: &str, system: &str, prompt: &str) -> Result<String, DuckyError> {
        info!(action, provider = self.inner.provider.name(), "sending request");
        debug!(action, prompt_len = prompt.len(), "prompt built");

        let response = self
            .inner
            .provider
            .chat(system, &[Message::user(prompt)])
            .await
            .map_err(|e| DuckyError::Chat(format!("{} request failed: {:#}", action, e)))?;

        let answer = response.message.content;
        if answer.trim().is_empty() {
            return Err(DuckyError::Chat(format!(
                "{} request returned an empty answer",
                action
            )));
        }
        Ok(answer)
    }
}

fn require(what: &str, value: &str) -> Result<(), DuckyError> {
    if value.trim().is_empty() {
        return Err(DuckyError::Input(format!("{} must not be empty", what)));
    }
    Ok(())
}
