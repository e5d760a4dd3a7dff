use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use ducky::{CodeRevision, Ducky, DuckyConfig, ScrapeRun};

#[derive(Parser)]
#[command(name = "ducky", version)]
#[command(about = "Ducky, a personal coding assistant", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// LLM provider to use (anthropic, openai)
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Model to use (provider-specific)
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Review a code snippet
    Review {
        /// File containing the snippet (reads stdin when omitted)
        file: Option<PathBuf>,
    },

    /// Modify a code snippet following an instruction
    Modify {
        /// File containing the snippet (reads stdin when omitted)
        file: Option<PathBuf>,

        /// What to change
        #[arg(short, long)]
        instruction: String,
    },

    /// Find and fix bugs in a code snippet
    Debug {
        /// File containing the snippet (reads stdin when omitted)
        file: Option<PathBuf>,
    },

    /// Learn about a topic
    Learn {
        /// The topic to explain
        topic: String,

        /// Learner level, e.g. beginner, intermediate, advanced
        #[arg(long, default_value = "beginner")]
        level: String,

        /// Kind of answer, e.g. "concise", "detailed", "with examples"
        #[arg(long, default_value = "concise")]
        answer_type: String,
    },

    /// Ask a coding question
    Ask {
        /// The question
        question: String,
    },

    /// Generate a scraper for a web page with the multi-agent pipeline
    Scrape {
        /// A URL or a description of the page
        message: String,

        /// Directory to write the generated files to (cleared first)
        #[arg(long)]
        work_dir: Option<PathBuf>,

        /// Print the full run record as JSON instead of the summary
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive("info".parse().expect("valid log directive"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// CLI argument takes highest precedence, then config file, then default.
fn resolve_provider<'a>(
    cli_provider: Option<&'a str>,
    config_provider: Option<&'a str>,
) -> &'a str {
    cli_provider.or(config_provider).unwrap_or("anthropic")
}

/// Read a snippet from `file`, or from stdin when no file is given.
fn read_snippet(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read snippet from stdin")?;
            Ok(buf)
        }
    }
}

fn print_revision(revision: &CodeRevision) {
    match (&revision.modified_code, &revision.explanation) {
        (Some(code), Some(explanation)) => {
            println!("```\n{}\n```\n\n{}", code, explanation);
        }
        _ => {
            warn!("answer did not follow the requested format, printing it as is");
            println!("{}", revision.raw);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Precedence: CLI > env > project > global > defaults
    let config = DuckyConfig::load().context("failed to load configuration")?;

    // Read input before touching the provider so bad paths fail fast.
    let snippet = match &cli.command {
        Commands::Review { file } | Commands::Modify { file, .. } | Commands::Debug { file } => {
            Some(read_snippet(file.as_deref())?)
        }
        _ => None,
    };

    let provider_name = resolve_provider(cli.provider.as_deref(), config.provider.as_deref());
    let model_name = cli.model.as_deref().or(config.model.as_deref());
    debug!(provider = %provider_name, model = ?model_name, "resolved provider");

    let mut builder = Ducky::builder()
        .config(&config)
        .provider_by_name(provider_name, model_name)
        .context("failed to create LLM provider")?;
    if let Commands::Scrape {
        work_dir: Some(dir),
        ..
    } = &cli.command
    {
        builder = builder.work_dir(dir);
    }
    let ducky = builder.build().context("failed to initialize ducky")?;

    let snippet = snippet.unwrap_or_default();
    match cli.command {
        Commands::Review { .. } => {
            let review = ducky.review(&snippet).await?;
            println!("{}", review);
        }
        Commands::Modify { instruction, .. } => {
            let revision = ducky.modify(&snippet, &instruction).await?;
            print_revision(&revision);
        }
        Commands::Debug { .. } => {
            let revision = ducky.debug(&snippet).await?;
            print_revision(&revision);
        }
        Commands::Learn {
            topic,
            level,
            answer_type,
        } => {
            let answer = ducky.learn(&level, &answer_type, &topic).await?;
            println!("{}", answer);
        }
        Commands::Ask { question } => {
            let answer = ducky.ask(&question).await?;
            println!("{}", answer);
        }
        Commands::Scrape { message, json, .. } => {
            info!(provider = %provider_name, work_dir = %ducky.work_dir().display(), "starting scrape");

            let mut run = ScrapeRun::new(ducky.work_dir());
            let result = ducky.scrape_run(&mut run, &message).await;

            if json {
                let record =
                    serde_json::to_string_pretty(&run).context("failed to serialize run")?;
                println!("{}", record);
            }

            match result {
                Ok(()) => {
                    if !json {
                        println!("\n{}", run.result.summary.unwrap_or_default());
                    }
                }
                Err(e) => {
                    match e.failed_stage() {
                        Some(stage) => error!(stage = %stage, error = %e, "scrape failed"),
                        None => error!(error = %e, "scrape failed"),
                    }
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_provider_cli_wins() {
        assert_eq!(resolve_provider(Some("openai"), Some("anthropic")), "openai");
    }

    #[test]
    fn test_resolve_provider_config_fallback() {
        assert_eq!(resolve_provider(None, Some("openai")), "openai");
        assert_eq!(resolve_provider(None, None), "anthropic");
    }

    #[test]
    fn test_read_snippet_from_file() {
        let tmp = tempfile::NamedTempFile::new().expect("temp file");
        std::fs::write(tmp.path(), "print('hi')\n").expect("write");
        assert_eq!(read_snippet(Some(tmp.path())).expect("read"), "print('hi')\n");
    }

    #[test]
    fn test_read_snippet_missing_file() {
        let err = read_snippet(Some(Path::new("/definitely/not/here.py"))).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
