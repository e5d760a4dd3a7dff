mod common;

use std::path::Path;

use ducky::{DuckyError, RunPhase, ScrapeRun, Stage};
use tempfile::TempDir;

use common::{
    EXAMPLE_PAGE, MockLlmProvider, SCRIPTS_REPLY, SPEC_REPLY, StaticPageSource, test_ducky,
};

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read work dir")
        .map(|e| e.expect("dir entry").file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_scrape_writes_generated_files() {
    let tmp = TempDir::new().expect("create temp dir");
    let work_dir = tmp.path().join("coding");
    let provider = MockLlmProvider::with_responses(&[SPEC_REPLY, SCRIPTS_REPLY]);
    let pages = StaticPageSource::new(EXAMPLE_PAGE);
    let ducky = test_ducky(provider.clone(), pages.clone(), &work_dir);

    let mut run = ScrapeRun::new(&work_dir);
    ducky
        .scrape_run(&mut run, "https://example.com/")
        .await
        .expect("scrape should succeed");

    assert_eq!(run.phase, RunPhase::Done);
    assert!(run.error.is_none());
    assert_eq!(file_names(&work_dir), vec!["fetch_content.py", "main.py"]);
    assert_eq!(run.result.files.len(), 2);

    let summary = run.result.summary.expect("summary");
    assert!(summary.contains("`main.py`"));
    assert!(summary.contains("`fetch_content.py`"));

    let main = std::fs::read_to_string(work_dir.join("main.py")).expect("read main.py");
    assert!(main.contains("from fetch_content import fetch"));
    assert!(!main.contains("filename:"));

    assert_eq!(pages.requested(), vec!["https://example.com/"]);
}

#[tokio::test]
async fn test_each_stage_receives_previous_output() {
    let tmp = TempDir::new().expect("create temp dir");
    let provider = MockLlmProvider::with_responses(&[SPEC_REPLY, SCRIPTS_REPLY]);
    let ducky = test_ducky(
        provider.clone(),
        StaticPageSource::new(EXAMPLE_PAGE),
        tmp.path(),
    );

    ducky
        .scrape("Please scrape https://example.com/")
        .await
        .expect("scrape should succeed");

    let calls = provider.calls();
    assert_eq!(calls.len(), 2, "one model call per model-backed stage");

    let outline = calls[0].last_message();
    assert!(outline.starts_with("# Page structure: https://example.com/"));
    assert!(outline.contains("Title: Example Domain"));
    assert!(outline.contains("- h1: Example Domain"));
    assert!(calls[0].system.contains("analyze web pages"));

    assert_eq!(calls[1].last_message(), SPEC_REPLY);
    assert!(calls[1].system.contains("# filename: /<filename>"));
}

#[tokio::test]
async fn test_description_without_url_is_passed_on() {
    let tmp = TempDir::new().expect("create temp dir");
    let provider = MockLlmProvider::with_responses(&[SPEC_REPLY, SCRIPTS_REPLY]);
    let pages = StaticPageSource::new(EXAMPLE_PAGE);
    let ducky = test_ducky(provider.clone(), pages.clone(), tmp.path());

    ducky
        .scrape("a page listing books with their titles and prices")
        .await
        .expect("scrape should succeed");

    assert!(pages.requested().is_empty());
    let calls = provider.calls();
    assert!(calls[0].last_message().starts_with("Page description:"));
    assert!(calls[0].last_message().contains("titles and prices"));
}

#[tokio::test]
async fn test_second_run_replaces_first_runs_files() {
    let tmp = TempDir::new().expect("create temp dir");
    let work_dir = tmp.path().join("coding");

    let first = test_ducky(
        MockLlmProvider::with_responses(&[SPEC_REPLY, SCRIPTS_REPLY]),
        StaticPageSource::new(EXAMPLE_PAGE),
        &work_dir,
    );
    first.scrape("https://example.com/").await.expect("first run");
    assert_eq!(file_names(&work_dir), vec!["fetch_content.py", "main.py"]);

    let second_output = "```python\n# filename: /scraper.py\nprint('second')\n```\n";
    let second = test_ducky(
        MockLlmProvider::with_responses(&[SPEC_REPLY, second_output]),
        StaticPageSource::new(EXAMPLE_PAGE),
        &work_dir,
    );
    let result = second.scrape("https://example.com/").await.expect("second run");

    assert_eq!(file_names(&work_dir), vec!["scraper.py"]);
    let summary = result.summary.expect("summary");
    assert!(summary.contains("`scraper.py`"));
    assert!(!summary.contains("main.py"));
}

#[tokio::test]
async fn test_summarizer_null_signal_fails_at_stage_two() {
    let tmp = TempDir::new().expect("create temp dir");
    let provider = MockLlmProvider::with_responses(&["None", SCRIPTS_REPLY]);
    let ducky = test_ducky(
        provider.clone(),
        StaticPageSource::new(EXAMPLE_PAGE),
        tmp.path(),
    );

    let mut run = ScrapeRun::new(tmp.path());
    let err = ducky
        .scrape_run(&mut run, "https://example.com/")
        .await
        .expect_err("null signal should fail the run");

    assert_eq!(err.failed_stage(), Some(Stage::Summarizer));
    assert_eq!(run.phase, RunPhase::Failed);
    assert!(run.error.as_deref().is_some_and(|e| e.contains("summarizer")));
    assert!(run.result.summary.is_none());
    assert_eq!(provider.calls().len(), 1, "generator must not run");
    assert!(file_names(tmp.path()).is_empty());
}

#[tokio::test]
async fn test_output_without_markers_is_persistence_error() {
    let tmp = TempDir::new().expect("create temp dir");
    let provider = MockLlmProvider::with_responses(&[
        SPEC_REPLY,
        "I would use requests and BeautifulSoup for this.",
    ]);
    let ducky = test_ducky(provider, StaticPageSource::new(EXAMPLE_PAGE), tmp.path());

    let mut run = ScrapeRun::new(tmp.path());
    let err = ducky
        .scrape_run(&mut run, "https://example.com/")
        .await
        .expect_err("unparseable output should fail");

    assert!(matches!(err, DuckyError::Persistence(_)));
    assert_eq!(run.phase, RunPhase::Failed);
    assert!(run.result.summary.is_none());
}

#[tokio::test]
async fn test_model_failure_is_attributed_to_its_stage() {
    let tmp = TempDir::new().expect("create temp dir");
    let provider = MockLlmProvider::with_responses(&[SPEC_REPLY]).then_error("invalid api key");
    let ducky = test_ducky(provider, StaticPageSource::new(EXAMPLE_PAGE), tmp.path());

    let err = ducky
        .scrape("https://example.com/")
        .await
        .expect_err("generator failure should fail the run");

    assert_eq!(err.failed_stage(), Some(Stage::ScriptGenerator));
    assert!(err.to_string().contains("invalid api key"));
}

#[tokio::test]
async fn test_empty_message_is_rejected() {
    let tmp = TempDir::new().expect("create temp dir");
    let provider = MockLlmProvider::default();
    let ducky = test_ducky(
        provider.clone(),
        StaticPageSource::new(EXAMPLE_PAGE),
        tmp.path(),
    );

    let err = ducky.scrape("   ").await.expect_err("empty message");
    assert!(matches!(err, DuckyError::Input(_)));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_concurrent_runs_on_one_directory_do_not_mix() {
    let tmp = TempDir::new().expect("create temp dir");
    let work_dir = tmp.path().join("shared");

    let a = test_ducky(
        MockLlmProvider::with_responses(&[SPEC_REPLY, "```\n# filename: a.py\nprint('a')\n```\n"]),
        StaticPageSource::new(EXAMPLE_PAGE),
        &work_dir,
    );
    let b = test_ducky(
        MockLlmProvider::with_responses(&[SPEC_REPLY, "```\n# filename: b.py\nprint('b')\n```\n"]),
        StaticPageSource::new(EXAMPLE_PAGE),
        &work_dir,
    );

    let (ra, rb) = tokio::join!(a.scrape("https://example.com/"), b.scrape("https://example.com/"));
    ra.expect("run a");
    rb.expect("run b");

    let names = file_names(&work_dir);
    assert_eq!(names.len(), 1, "later run must reset the directory: {:?}", names);
}

#[tokio::test]
async fn test_finished_run_cannot_be_restarted() {
    let tmp = TempDir::new().expect("create temp dir");
    let provider = MockLlmProvider::with_responses(&[SPEC_REPLY, SCRIPTS_REPLY]);
    let ducky = test_ducky(
        provider.clone(),
        StaticPageSource::new(EXAMPLE_PAGE),
        tmp.path(),
    );

    let mut run = ScrapeRun::new(tmp.path());
    ducky
        .scrape_run(&mut run, "https://example.com/")
        .await
        .expect("first run");

    let err = ducky
        .scrape_run(&mut run, "https://example.com/")
        .await
        .expect_err("restart must be rejected");

    assert!(err.to_string().contains("already started"));
    assert_eq!(run.phase, RunPhase::Done);
    assert!(run.error.is_none());
    assert!(run.result.summary.is_some());
    assert_eq!(file_names(tmp.path()), vec!["fetch_content.py", "main.py"]);
    assert_eq!(provider.calls().len(), 2);
}

#[tokio::test]
async fn test_url_followed_by_punctuation_is_fetched_cleanly() {
    let tmp = TempDir::new().expect("create temp dir");
    let pages = StaticPageSource::new(EXAMPLE_PAGE);
    let ducky = test_ducky(
        MockLlmProvider::with_responses(&[SPEC_REPLY, SCRIPTS_REPLY]),
        pages.clone(),
        tmp.path(),
    );

    ducky
        .scrape("Scrape https://example.com/, please")
        .await
        .expect("scrape should succeed");

    assert_eq!(pages.requested(), vec!["https://example.com/"]);
}
