#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use ducky::{Ducky, LlmProvider, LlmResponse, Message, PageSource, StaticTemplates};

/// One call the mock received.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub messages: Vec<Message>,
}

impl RecordedCall {
    /// Content of the last message in the call.
    pub fn last_message(&self) -> &str {
        self.messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

#[derive(Default)]
struct MockState {
    responses: VecDeque<Result<String, String>>,
    calls: Vec<RecordedCall>,
}

/// A mock LLM provider that replays scripted responses in order and records
/// every call. Clones share the same script and call log.
#[derive(Clone, Default)]
pub struct MockLlmProvider {
    state: Arc<Mutex<MockState>>,
}

impl MockLlmProvider {
    /// Create a mock that returns a single text response.
    pub fn single_response(text: &str) -> Self {
        Self::with_responses(&[text])
    }

    /// Create a mock from a sequence of responses (popped in order).
    pub fn with_responses(responses: &[&str]) -> Self {
        let mock = Self::default();
        mock.state.lock().unwrap().responses =
            responses.iter().map(|r| Ok(r.to_string())).collect();
        mock
    }

    /// Queue an API failure after the responses already scripted.
    pub fn then_error(self, message: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .push_back(Err(message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn chat(&self, system: &str, messages: &[Message]) -> Result<LlmResponse> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RecordedCall {
            system: system.to_string(),
            messages: messages.to_vec(),
        });
        match state.responses.pop_front() {
            Some(Ok(text)) => Ok(LlmResponse::text(text)),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Err(anyhow::anyhow!("MockLlmProvider: no more responses in queue")),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Serves the same HTML for every URL and records what was requested.
#[derive(Clone)]
pub struct StaticPageSource {
    html: String,
    requested: Arc<Mutex<Vec<String>>>,
}

impl StaticPageSource {
    pub fn new(html: &str) -> Self {
        Self {
            html: html.to_string(),
            requested: Arc::default(),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for StaticPageSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.requested.lock().unwrap().push(url.to_string());
        Ok(self.html.clone())
    }
}

pub const EXAMPLE_PAGE: &str = r#"<!doctype html>
<html>
<head><title>Example Domain</title></head>
<body>
<div>
    <h1>Example Domain</h1>
    <p>This domain is for use in illustrative examples in documents.</p>
    <p><a href="https://www.iana.org/domains/example">More information...</a></p>
</div>
</body>
</html>"#;

pub const SPEC_REPLY: &str = "Fetch the page with requests, parse it with BeautifulSoup, \
extract the title, the h1 heading and both paragraphs, then print them.";

pub const SCRIPTS_REPLY: &str = r#"Here are the modules.

```python
# filename: /fetch_content.py
import requests

def fetch(url):
    return requests.get(url, timeout=10).text
```

```python
# filename: /main.py
from fetch_content import fetch

if __name__ == "__main__":
    print(fetch(input("URL: ")))
```
"#;

/// A Ducky wired to `provider` and the example page, writing into `work_dir`.
pub fn test_ducky(provider: MockLlmProvider, pages: StaticPageSource, work_dir: &Path) -> Ducky {
    Ducky::builder()
        .provider(provider)
        .templates(StaticTemplates::new())
        .page_source(pages)
        .work_dir(work_dir)
        .build()
        .expect("build test ducky")
}
