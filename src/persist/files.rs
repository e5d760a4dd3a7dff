use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^[ \t]*```[^\n]*\n(.*?)^[ \t]*```").expect("valid fence regex")
});
static FILENAME_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:#|//|--|;)\s*filename:\s*(\S+)\s*$").expect("valid marker regex")
});

/// A file recovered from generated text, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFile {
    /// Path relative to the working directory
    pub path: PathBuf,
    pub content: String,
}

/// A file that was written to the working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenFile {
    /// Path relative to the working directory
    pub path: PathBuf,
    pub bytes: u64,
    pub lines: usize,
}

/// Normalize a filename marker into a safe relative path.
///
/// Leading `/` and `./` are dropped, since generators routinely write
/// `# filename: /main.py` meaning "at the root of the project". Anything
/// that would still escape the working directory is rejected.
fn validate_relative(name: &str) -> Result<PathBuf> {
    let trimmed = name
        .trim_matches(|c| c == '`' || c == '"' || c == '\'')
        .trim_start_matches('/')
        .trim_start_matches("./");

    if trimmed.is_empty() {
        anyhow::bail!("empty filename in marker: {:?}", name);
    }
    if trimmed.contains("..") {
        anyhow::bail!("path traversal detected: '..' is not allowed in paths");
    }

    let path = PathBuf::from(trimmed);
    if !path.components().all(|c| matches!(c, Component::Normal(_))) {
        anyhow::bail!("filename must be relative: {}", name);
    }
    Ok(path)
}

/// Split one section into (marker, body) if its first non-blank line is a marker.
fn split_marker(section: &str) -> Option<(&str, String)> {
    let mut lines = section.lines().skip_while(|l| l.trim().is_empty());
    let first = lines.next()?;
    let name = FILENAME_MARKER.captures(first)?.get(1)?.as_str();
    let mut body = lines.collect::<Vec<_>>().join("\n");
    body.push('\n');
    Some((name, body))
}

/// Sections in unfenced text: each starts at a marker line.
fn unfenced_sections(text: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for line in text.lines() {
        if FILENAME_MARKER.is_match(line) {
            if let Some(lines) = current.take() {
                sections.push(lines.join("\n"));
            }
            current = Some(vec![line]);
        } else if let Some(ref mut lines) = current {
            lines.push(line);
        }
    }
    if let Some(lines) = current {
        sections.push(lines.join("\n"));
    }
    sections
}

/// Parse generated text into named files.
///
/// A file is a fenced code block whose first line is a filename marker such
/// as `# filename: /main.py`. When the text has no fenced blocks at all,
/// each marker line starts a file that runs to the next marker. Blocks
/// without a marker and markers with unsafe names are skipped; a name seen
/// twice keeps the later content.
pub fn parse_code_files(text: &str) -> Vec<CodeFile> {
    let blocks: Vec<String> = FENCED_BLOCK
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect();

    let sections = if blocks.is_empty() {
        unfenced_sections(text)
    } else {
        blocks
    };

    let mut files: Vec<CodeFile> = Vec::new();
    for section in &sections {
        let Some((name, content)) = split_marker(section) else {
            debug!("skipping block without filename marker");
            continue;
        };
        let path = match validate_relative(name) {
            Ok(path) => path,
            Err(e) => {
                warn!(name, error = %e, "skipping file with unsafe name");
                continue;
            }
        };

        if let Some(existing) = files.iter_mut().find(|f| f.path == path) {
            debug!(path = %path.display(), "duplicate filename, keeping later block");
            existing.content = content;
        } else {
            files.push(CodeFile { path, content });
        }
    }
    files
}

/// Write parsed files under `dir`, creating parent directories as needed.
pub async fn write_code_files(files: &[CodeFile], dir: &Path) -> Result<Vec<WrittenFile>> {
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let target = dir.join(&file.path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }
        tokio::fs::write(&target, &file.content)
            .await
            .with_context(|| format!("failed to write file: {}", target.display()))?;

        debug!(path = %target.display(), bytes = file.content.len(), "wrote file");
        written.push(WrittenFile {
            path: file.path.clone(),
            bytes: file.content.len() as u64,
            lines: file.content.lines().count(),
        });
    }
    Ok(written)
}

/// Parse `text` and write every file it contains under `dir`.
pub async fn save_code_files(text: &str, dir: &Path) -> Result<Vec<WrittenFile>> {
    let files = parse_code_files(text);
    info!(count = files.len(), dir = %dir.display(), "saving generated files");
    write_code_files(&files, dir).await
}

/// Remove everything under `dir` and leave it existing and empty.
pub async fn clear_working_dir(dir: &Path) -> Result<()> {
    if !dir.components().any(|c| matches!(c, Component::Normal(_)))
        || dir.components().any(|c| c == Component::ParentDir)
    {
        anyhow::bail!("refusing to clear working directory: {}", dir.display());
    }

    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => debug!(dir = %dir.display(), "removed previous working directory"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| format!("failed to clear {}", dir.display()));
        }
    }

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create {}", dir.display()))
}

/// Every file under `dir`, relative to it, sorted.
pub fn list_files(dir: &Path) -> Result<Vec<WrittenFile>> {
    let pattern = format!(
        "{}/**/*",
        glob::Pattern::escape(&dir.to_string_lossy())
    );

    let mut files = Vec::new();
    for entry in glob::glob(&pattern).context("invalid working directory pattern")? {
        let path = entry.context("failed to read working directory entry")?;
        if !path.is_file() {
            continue;
        }
        let content = std::fs::read(&path)
            .with_context(|| format!("failed to read file: {}", path.display()))?;
        let relative = path.strip_prefix(dir).unwrap_or(&path).to_path_buf();
        files.push(WrittenFile {
            path: relative,
            bytes: content.len() as u64,
            lines: String::from_utf8_lossy(&content).lines().count(),
        });
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Markdown summary of the files under `dir`.
pub fn summarize_files(dir: &Path) -> Result<String> {
    let files = list_files(dir)?;
    if files.is_empty() {
        return Ok(format!("No files were generated in `{}`.", dir.display()));
    }

    let mut summary = format!(
        "Generated {} file(s) in `{}`:\n",
        files.len(),
        dir.display()
    );
    for file in &files {
        summary.push_str(&format!(
            "- `{}` ({} bytes, {} lines)\n",
            file.path.display(),
            file.bytes,
            file.lines
        ));
    }
    Ok(summary)
}
