use serde::{Deserialize, Serialize};

const CODE_FENCE: &str = "```modified_code";
const EXPLANATION_OPEN: &str = "!!!explanation";
const EXPLANATION_CLOSE: &str = "!!!";

/// A model answer to a modify or debug prompt.
///
/// Either section may be missing when the model ignores the requested format;
/// `raw` always holds the full answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRevision {
    pub modified_code: Option<String>,
    pub explanation: Option<String>,
    pub raw: String,
}

impl CodeRevision {
    pub fn parse(raw: &str) -> Self {
        Self {
            modified_code: extract_modified_code(raw),
            explanation: extract_explanation(raw),
            raw: raw.to_string(),
        }
    }

    /// True when both sections were found.
    pub fn is_well_formed(&self) -> bool {
        self.modified_code.is_some() && self.explanation.is_some()
    }
}

fn extract_modified_code(raw: &str) -> Option<String> {
    let start = raw.find(CODE_FENCE)? + CODE_FENCE.len();
    let rest = &raw[start..];
    // Skip the remainder of the opening fence line.
    let body_start = rest.find('\n').map(|i| i + 1).unwrap_or(rest.len());
    let body = &rest[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim_end_matches(['\n', '\r']).to_string())
}

fn extract_explanation(raw: &str) -> Option<String> {
    let start = raw.find(EXPLANATION_OPEN)? + EXPLANATION_OPEN.len();
    let rest = &raw[start..];
    let body = match rest.find(EXPLANATION_CLOSE) {
        Some(end) => &rest[..end],
        // Models regularly drop the closing delimiter; keep what we have.
        None => rest,
    };
    let body = body.trim();
    (!body.is_empty()).then(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_sections() {
        let raw = "Here you go.\n\
                   ```modified_code\n\
                   total = 1\n\
                   print(total)\n\
                   ```\n\
                   !!!explanation\n\
                   Renamed `x` to `total`.\n\
                   !!!\n";

        let revision = CodeRevision::parse(raw);
        assert_eq!(
            revision.modified_code.as_deref(),
            Some("total = 1\nprint(total)")
        );
        assert_eq!(
            revision.explanation.as_deref(),
            Some("Renamed `x` to `total`.")
        );
        assert!(revision.is_well_formed());
    }

    #[test]
    fn missing_closing_delimiter_keeps_explanation() {
        let revision = CodeRevision::parse("!!!explanation\nFixed the off-by-one.");
        assert_eq!(
            revision.explanation.as_deref(),
            Some("Fixed the off-by-one.")
        );
        assert!(revision.modified_code.is_none());
        assert!(!revision.is_well_formed());
    }

    #[test]
    fn free_text_answer_has_no_sections() {
        let revision = CodeRevision::parse("I could not find a bug.");
        assert!(revision.modified_code.is_none());
        assert!(revision.explanation.is_none());
        assert_eq!(revision.raw, "I could not find a bug.");
    }
}
