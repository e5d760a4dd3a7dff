use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};

use super::TemplateSource;
use super::templates::*;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{|\}\}|\{([a-z_]+)\}").expect("valid placeholder regex")
});

/// Substitute `{name}` placeholders in `template`.
///
/// Works in a single pass over the template, so substituted values are never
/// scanned again. `{{` and `}}` become literal `{` and `}` in the same pass.
/// Unknown placeholders are left untouched.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let Some(key) = caps.get(1) else {
                return caps[0][..1].to_string();
            };
            values
                .iter()
                .find(|(name, _)| *name == key.as_str())
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Builds the instruction text sent to the chat model for each action.
#[derive(Clone)]
pub struct PromptBuilder {
    templates: Arc<dyn TemplateSource>,
}

impl PromptBuilder {
    pub fn new(templates: Arc<dyn TemplateSource>) -> Self {
        Self { templates }
    }

    async fn build(&self, name: &str, default: &str, values: &[(&str, &str)]) -> String {
        let template = self.templates.fetch(name, default).await;
        let prompt = render(&template, values);
        if prompt.trim().is_empty() {
            // A blank remote template would send the model nothing to work with.
            return render(default, values);
        }
        prompt
    }

    /// System prompt for free-form coding questions.
    pub async fn quick_chat_system(&self) -> String {
        self.build(QUICK_CHAT_SYSTEM, QUICK_CHAT_SYSTEM_DEFAULT, &[])
            .await
    }

    /// System prompt for review, modify and debug requests.
    pub async fn code_starter_system(&self) -> String {
        self.build(CODE_STARTER, CODE_STARTER_DEFAULT, &[]).await
    }

    /// System prompt for learning requests.
    pub async fn learning_system(&self) -> String {
        self.build(SYSTEM_LEARNING, SYSTEM_LEARNING_DEFAULT, &[])
            .await
    }

    pub async fn review(&self, code_snippet: &str) -> String {
        self.build(
            REVIEW_CODE,
            REVIEW_CODE_DEFAULT,
            &[("code_snippet", code_snippet)],
        )
        .await
    }

    /// Prompt asking for a modified version of `code_snippet`.
    ///
    /// Known defect: `modified_code` is the snippet with the literal text
    /// `old_value` replaced by `new_value`, whatever the instruction says. Kept
    /// as-is until the intended behaviour is settled.
    pub async fn modify(&self, code_snippet: &str, modify_instruction: &str) -> String {
        let modified_code = code_snippet.replace("old_value", "new_value");
        self.build(
            MODIFY_CODE,
            MODIFY_CODE_DEFAULT,
            &[
                ("modify_instruction", modify_instruction),
                ("code_snippet", code_snippet),
                ("modified_code", &modified_code),
            ],
        )
        .await
    }

    pub async fn debug(&self, user_code: &str) -> String {
        self.build(DEBUG_CODE, DEBUG_CODE_DEFAULT, &[("user_code", user_code)])
            .await
    }

    pub async fn learning(&self, learner_level: &str, answer_type: &str, topic: &str) -> String {
        self.build(
            LEARNING,
            LEARNING_DEFAULT,
            &[
                ("learner_level", learner_level),
                ("answer_type", answer_type),
                ("topic", topic),
            ],
        )
        .await
    }
}
