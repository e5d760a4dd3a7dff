use std::sync::{Arc, LazyLock};

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info};

use super::{AgentSpec, Responder};
use crate::llm::{Message, MessageRole};

const MAX_PARAGRAPHS: usize = 8;
const MAX_PARAGRAPH_CHARS: usize = 240;
const URL_TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}'];

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"'`]+"#).expect("valid url regex"));
static NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?</script>|<style\b.*?</style>|<!--.*?-->")
        .expect("valid noise regex")
});
static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").expect("valid title regex"));
static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h([1-6])\b[^>]*>(.*?)</h[1-6]>").expect("valid heading regex")
});
static PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p(?:\s[^>]*)?>(.*?)</p>").expect("valid paragraph regex"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\s[^>]*href\s*=").expect("valid link regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid space regex"));

/// Fetches raw HTML for a URL.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Page source backed by plain HTTP GET requests.
pub struct HttpPageSource {
    client: reqwest::Client,
}

impl HttpPageSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpPageSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to fetch {}", url))?
            .error_for_status()
            .with_context(|| format!("page request failed: {}", url))?;

        response
            .text()
            .await
            .with_context(|| format!("failed to read page body: {}", url))
    }
}

/// The structural skeleton of an HTML page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageOutline {
    pub url: String,
    pub title: Option<String>,
    /// `(level, text)` pairs in document order
    pub headings: Vec<(u8, String)>,
    pub paragraphs: Vec<String>,
    pub paragraph_count: usize,
    pub link_count: usize,
}

impl PageOutline {
    pub fn from_html(url: &str, html: &str) -> Self {
        let html = NOISE.replace_all(html, "");

        let title = TITLE
            .captures(&html)
            .map(|caps| clean_text(&caps[1]))
            .filter(|t| !t.is_empty());

        let headings = HEADING
            .captures_iter(&html)
            .filter_map(|caps| {
                let level = caps[1].parse::<u8>().ok()?;
                let text = clean_text(&caps[2]);
                (!text.is_empty()).then_some((level, text))
            })
            .collect();

        let all_paragraphs: Vec<String> = PARAGRAPH
            .captures_iter(&html)
            .map(|caps| clean_text(&caps[1]))
            .filter(|p| !p.is_empty())
            .collect();

        Self {
            url: url.to_string(),
            title,
            headings,
            paragraph_count: all_paragraphs.len(),
            paragraphs: all_paragraphs
                .into_iter()
                .take(MAX_PARAGRAPHS)
                .map(|p| truncate(&p, MAX_PARAGRAPH_CHARS))
                .collect(),
            link_count: LINK.find_iter(&html).count(),
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut out = format!("# Page structure: {}\n\n", self.url);
        out.push_str(&format!(
            "Title: {}\n\n",
            self.title.as_deref().unwrap_or("(none)")
        ));

        out.push_str("## Headings\n");
        if self.headings.is_empty() {
            out.push_str("(none)\n");
        }
        for (level, text) in &self.headings {
            out.push_str(&format!("- h{}: {}\n", level, text));
        }

        out.push_str(&format!("\n## Paragraphs ({} total)\n", self.paragraph_count));
        for paragraph in &self.paragraphs {
            out.push_str(&format!("- {}\n", paragraph));
        }

        out.push_str(&format!("\nLinks: {}\n", self.link_count));
        out
    }
}

/// Replies with the outline of the page named in the last message it received.
///
/// Without a URL in the message the description itself is passed on.
pub struct PageScraperResponder {
    source: Arc<dyn PageSource>,
}

impl PageScraperResponder {
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Responder for PageScraperResponder {
    async fn reply(&self, agent: &AgentSpec, history: &[Message]) -> Result<String> {
        let request = history
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let Some(url) = find_url(request) else {
            debug!(agent = %agent.name, "no URL in request, passing description on");
            return Ok(format!("Page description:\n{}", request.trim()));
        };

        info!(agent = %agent.name, url, "fetching page");
        let html = self.source.fetch(url).await?;
        Ok(PageOutline::from_html(url, &html).to_markdown())
    }
}

/// First URL in `text`, without sentence punctuation glued to its end.
fn find_url(text: &str) -> Option<&str> {
    URL.find(text)
        .map(|m| m.as_str().trim_end_matches(URL_TRAILING))
        .filter(|url| url.contains("://") && !url.ends_with("://"))
}

fn clean_text(fragment: &str) -> String {
    let text = TAG.replace_all(fragment, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    SPACE.replace_all(text.trim(), " ").into_owned()
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>Example &amp; Co</title>
<style>h1 { color: red; }</style></head>
<body>
<h1>Welcome</h1>
<p>First <b>paragraph</b>.</p>
<h2 class="sub">Details</h2>
<p class="x">Second paragraph with a <a href="/more">link</a>.</p>
<pre>not a paragraph</pre>
<script>document.write("<p>hidden</p>")</script>
</body></html>"#;

    struct FixedPage;

    #[async_trait]
    impl PageSource for FixedPage {
        async fn fetch(&self, _url: &str) -> Result<String> {
            Ok(PAGE.to_string())
        }
    }

    #[test]
    fn outline_extracts_structure() {
        let outline = PageOutline::from_html("https://example.com/", PAGE);

        assert_eq!(outline.title.as_deref(), Some("Example & Co"));
        assert_eq!(
            outline.headings,
            vec![(1, "Welcome".to_string()), (2, "Details".to_string())]
        );
        assert_eq!(outline.paragraph_count, 2);
        assert_eq!(outline.paragraphs[0], "First paragraph .");
        assert_eq!(outline.link_count, 1);
    }

    #[test]
    fn markdown_lists_headings() {
        let md = PageOutline::from_html("https://example.com/", PAGE).to_markdown();
        assert!(md.contains("# Page structure: https://example.com/"));
        assert!(md.contains("- h1: Welcome"));
        assert!(md.contains("Paragraphs (2 total)"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé...");
        assert_eq!(truncate("hi", 5), "hi");
    }

    #[tokio::test]
    async fn scraper_fetches_url_from_request() {
        let responder = PageScraperResponder::new(Arc::new(FixedPage));
        let agent = AgentSpec::tool("page_scraper", 1);
        let reply = responder
            .reply(&agent, &[Message::user("please look at https://example.com/")])
            .await
            .expect("reply");
        assert!(reply.contains("https://example.com/"));
        assert!(reply.contains("Welcome"));
    }

    #[test]
    fn url_drops_trailing_punctuation() {
        assert_eq!(
            find_url("Scrape https://example.com/, please"),
            Some("https://example.com/")
        );
        assert_eq!(
            find_url("(see https://example.com/books?page=2)."),
            Some("https://example.com/books?page=2")
        );
        assert_eq!(
            find_url("is it https://example.com/a.html?"),
            Some("https://example.com/a.html")
        );
        assert_eq!(find_url("nothing here"), None);
    }

    #[tokio::test]
    async fn scraper_ignores_punctuation_after_url() {
        let responder = PageScraperResponder::new(Arc::new(FixedPage));
        let agent = AgentSpec::tool("page_scraper", 1);
        let reply = responder
            .reply(&agent, &[Message::user("Scrape https://example.com/, please")])
            .await
            .expect("reply");
        assert!(reply.starts_with("# Page structure: https://example.com/\n"));
    }

    #[tokio::test]
    async fn scraper_passes_description_through() {
        let responder = PageScraperResponder::new(Arc::new(FixedPage));
        let agent = AgentSpec::tool("page_scraper", 1);
        let reply = responder
            .reply(&agent, &[Message::user("a blog with posts and tags")])
            .await
            .expect("reply");
        assert_eq!(reply, "Page description:\na blog with posts and tags");
    }
}
