use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::agents::{AgentSpec, Participant, Responder, initiate_chat};
use crate::error::DuckyError;
use crate::persist::{WrittenFile, clear_working_dir, lock_work_dir, save_code_files, summarize_files};

/// The three fixed hand-offs of a scrape run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Turns a URL or description into a page structure
    PageScraper,
    /// Turns the page structure into a scraping specification
    Summarizer,
    /// Turns the specification into named source files
    ScriptGenerator,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::PageScraper, Stage::Summarizer, Stage::ScriptGenerator];

    /// 1-based position in the pipeline
    pub fn number(self) -> usize {
        match self {
            Self::PageScraper => 1,
            Self::Summarizer => 2,
            Self::ScriptGenerator => 3,
        }
    }

    /// The run phase while this stage is executing
    pub fn running_phase(self) -> RunPhase {
        match self {
            Self::PageScraper => RunPhase::Stage1Running,
            Self::Summarizer => RunPhase::Stage2Running,
            Self::ScriptGenerator => RunPhase::Stage3Running,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PageScraper => write!(f, "page_scraper"),
            Self::Summarizer => write!(f, "summarizer"),
            Self::ScriptGenerator => write!(f, "script_generator"),
        }
    }
}

/// Where a scrape run is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Created, working directory not yet touched
    #[default]
    Init,
    Stage1Running,
    Stage2Running,
    Stage3Running,
    /// Writing generated files
    Persisting,
    /// Finished with a summary
    Done,
    /// Stopped by an error; no recovery
    Failed,
}

impl RunPhase {
    /// The only phase that may follow this one on success.
    pub fn next(self) -> Option<RunPhase> {
        match self {
            Self::Init => Some(Self::Stage1Running),
            Self::Stage1Running => Some(Self::Stage2Running),
            Self::Stage2Running => Some(Self::Stage3Running),
            Self::Stage3Running => Some(Self::Persisting),
            Self::Persisting => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Stage1Running => write!(f, "stage1_running"),
            Self::Stage2Running => write!(f, "stage2_running"),
            Self::Stage3Running => write!(f, "stage3_running"),
            Self::Persisting => write!(f, "persisting"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for RunPhase {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init" => Ok(Self::Init),
            "stage1_running" => Ok(Self::Stage1Running),
            "stage2_running" => Ok(Self::Stage2Running),
            "stage3_running" => Ok(Self::Stage3Running),
            "persisting" => Ok(Self::Persisting),
            "done" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            _ => anyhow::bail!("unknown run phase: {}", s),
        }
    }
}

/// What a scrape run leaves behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkResult {
    pub working_directory: PathBuf,
    /// Set once the generated files are written
    pub summary: Option<String>,
    pub files: Vec<WrittenFile>,
}

/// State of one scrape run. Owned by a single caller, never shared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeRun {
    pub id: String,
    pub phase: RunPhase,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub result: WorkResult,
    pub error: Option<String>,
}

impl ScrapeRun {
    pub fn new(working_directory: impl Into<PathBuf>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            phase: RunPhase::Init,
            started_at: now,
            updated_at: now,
            result: WorkResult {
                working_directory: working_directory.into(),
                summary: None,
                files: Vec::new(),
            },
            error: None,
        }
    }

    /// Move to `phase`, which must be the successor of the current phase.
    pub fn advance(&mut self, phase: RunPhase) -> Result<(), DuckyError> {
        if self.phase.next() != Some(phase) {
            return Err(DuckyError::Internal(anyhow::anyhow!(
                "illegal run transition: {} -> {}",
                self.phase,
                phase
            )));
        }
        self.phase = phase;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Record an error and mark the run as failed
    pub fn fail(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.phase = RunPhase::Failed;
        self.updated_at = Utc::now();
    }
}

/// Who answers for each kind of agent during a run.
#[derive(Clone, Copy)]
pub struct StageResponders<'a> {
    /// Answers for model-backed agents
    pub model: &'a dyn Responder,
    /// Answers for the page scraper
    pub page_scraper: &'a dyn Responder,
}

/// The fixed scrape pipeline: a silent coordinator talks to three agents in turn.
#[derive(Debug, Clone)]
pub struct ScrapePipeline {
    pub coordinator: AgentSpec,
    pub page_scraper: AgentSpec,
    pub summarizer: AgentSpec,
    pub script_generator: AgentSpec,
}

impl Default for ScrapePipeline {
    fn default() -> Self {
        Self {
            coordinator: AgentSpec::coordinator("a0"),
            page_scraper: AgentSpec::tool("page_scraper", 1),
            summarizer: AgentSpec::assistant("summary_agent", 6, default_summarizer_prompt()),
            script_generator: AgentSpec::assistant(
                "script_client_agent",
                6,
                default_script_generator_prompt(),
            ),
        }
    }
}

impl ScrapePipeline {
    /// The agent that handles `stage`.
    pub fn agent(&self, stage: Stage) -> &AgentSpec {
        match stage {
            Stage::PageScraper => &self.page_scraper,
            Stage::Summarizer => &self.summarizer,
            Stage::ScriptGenerator => &self.script_generator,
        }
    }

    /// Replace the system instruction of the agent handling `stage`.
    pub fn with_instructions(mut self, stage: Stage, instructions: impl Into<String>) -> Self {
        let agent = match stage {
            Stage::PageScraper => &mut self.page_scraper,
            Stage::Summarizer => &mut self.summarizer,
            Stage::ScriptGenerator => &mut self.script_generator,
        };
        agent.instructions = Some(instructions.into());
        self
    }

    /// Agent names must be unique within a run.
    pub fn validate(&self) -> Result<(), DuckyError> {
        let mut seen = HashSet::new();
        for agent in [
            &self.coordinator,
            &self.page_scraper,
            &self.summarizer,
            &self.script_generator,
        ] {
            if !seen.insert(agent.name.as_str()) {
                return Err(DuckyError::Config(format!(
                    "duplicate agent name in pipeline: {}",
                    agent.name
                )));
            }
        }
        Ok(())
    }

    /// Drive `run` from INIT to DONE, or to FAILED on the first error.
    ///
    /// A run that is not in INIT is rejected and left as it is.
    ///
    /// The working directory is cleared first, then each stage's final reply
    /// becomes the next stage's message, and the last reply is written out as
    /// files.
    pub async fn execute(
        &self,
        run: &mut ScrapeRun,
        message: &str,
        responders: StageResponders<'_>,
    ) -> Result<(), DuckyError> {
        // A run that already started keeps its state untouched.
        if run.phase != RunPhase::Init {
            return Err(DuckyError::Internal(anyhow::anyhow!(
                "run {} already started (phase: {})",
                run.id,
                run.phase
            )));
        }
        info!(run_id = %run.id, input = message, "scrape run starting");

        match self.drive(run, message, responders).await {
            Ok(()) => {
                info!(run_id = %run.id, files = run.result.files.len(), "scrape run completed");
                Ok(())
            }
            Err(e) => {
                error!(run_id = %run.id, phase = %run.phase, error = %e, "scrape run failed");
                run.fail(e.to_string());
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        run: &mut ScrapeRun,
        message: &str,
        responders: StageResponders<'_>,
    ) -> Result<(), DuckyError> {
        self.validate()?;

        let work_dir = run.result.working_directory.clone();
        let _guard = lock_work_dir(&work_dir).await;

        clear_working_dir(&work_dir)
            .await
            .map_err(|e| DuckyError::Persistence(format!("{:#}", e)))?;

        let mut current = message.to_string();
        for stage in Stage::ALL {
            run.advance(stage.running_phase())?;
            current = self.execute_stage(stage, &current, responders).await?;
        }

        run.advance(RunPhase::Persisting)?;
        let (files, summary) = persist(&current, &work_dir).await?;
        run.result.files = files;
        run.result.summary = Some(summary);
        run.advance(RunPhase::Done)
    }

    async fn execute_stage(
        &self,
        stage: Stage,
        message: &str,
        responders: StageResponders<'_>,
    ) -> Result<String, DuckyError> {
        let agent = self.agent(stage);
        info!(stage = %stage, agent = %agent.name, "=== STAGE {}: {} ===", stage.number(), stage.to_string().to_uppercase());

        let responder = match stage {
            Stage::PageScraper => responders.page_scraper,
            Stage::Summarizer | Stage::ScriptGenerator => responders.model,
        };

        let chat = initiate_chat(
            Participant::silent(&self.coordinator),
            Participant::new(agent, responder),
            message,
        )
        .await
        .map_err(|e| DuckyError::stage(stage, format!("{:#}", e)))?;

        let output = chat
            .last_message_from(&agent.name)
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| DuckyError::stage(stage, format!("{} produced no reply", agent.name)))?;

        if stage == Stage::Summarizer && is_null_signal(output) {
            warn!(stage = %stage, "summarizer found nothing actionable");
            return Err(DuckyError::stage(stage, "input is not actionable"));
        }

        info!(stage = %stage, output_len = output.len(), preview = %truncate(output, 200), "stage completed");
        Ok(output.to_string())
    }
}

async fn persist(text: &str, work_dir: &Path) -> Result<(Vec<WrittenFile>, String), DuckyError> {
    let files = save_code_files(text, work_dir)
        .await
        .map_err(|e| DuckyError::Persistence(format!("{:#}", e)))?;

    if files.is_empty() {
        return Err(DuckyError::Persistence(
            "generated output contained no files with a filename marker".to_string(),
        ));
    }

    let summary =
        summarize_files(work_dir).map_err(|e| DuckyError::Persistence(format!("{:#}", e)))?;
    Ok((files, summary))
}

/// Whether a reply is the "nothing to do" answer the summarizer is told to give.
pub fn is_null_signal(reply: &str) -> bool {
    let normalized = reply
        .trim()
        .trim_matches('`')
        .trim()
        .trim_end_matches('.')
        .to_lowercase();
    normalized == "none" || normalized == "null"
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

// --- Default system prompts ---

fn default_summarizer_prompt() -> &'static str {
    r#"You are a helpful AI assistant.
Your task is to analyze web pages and describe how to scrape data from them.
You will receive a description of a web page's structure: its URL, title, headings, paragraphs and links.

Write a self-contained specification of the scraping logic that a developer could implement without seeing the page:
- Which libraries to initialize and how to set up the scraping session.
- Which elements to extract: the page title, headers (h1, h2) and all paragraphs, plus anything else the structure shows is important.
- How the extracted data should be formatted and stored or displayed.
- How to handle errors when the page is not accessible or elements are missing.

If the URL is not valid or the content cannot be scraped effectively, reply with exactly `None` and nothing else.
"#
}

fn default_script_generator_prompt() -> &'static str {
    r#"You are a software developer specializing in Python, focusing on data collection for web-based projects.
Your task is to write Python scripts that scrape web content effectively using the BeautifulSoup and requests libraries.

You will receive a specification of the scraping task for a web page.

Generate Python scripts that:
- **fetch_content.py**: Initializes a scraping session using requests to fetch the page content. Handles network exceptions and returns the HTML content.
- **parse_content.py**: Parses the fetched content using BeautifulSoup. Extracts the page title, headers (h1, h2, etc.) and paragraphs and returns a structured dictionary of these elements.
- **display_results.py**: Takes the parsed data and prints it in a readable format.
- **main.py**: Coordinates the other modules, asks the user for the URL, and manages the flow from fetching to displaying the data.

Organize your code into functions or classes in each module:
- Use proper exception handling in each module to deal with network issues or HTML parsing errors.
- Each script must run as a standalone module for testing but also work when imported into `main.py`.
- Include clear comments explaining each part of the code.

Always put `# filename: /<filename>` as the first line of each code block.

The generated scripts must not require any additional configuration or modification by the end user.
Do not suggest incomplete code which requires users to modify it.

Generate all of the script files in one response.
"#
}
