//! Extraction of a JSON payload from free-text model output
//!
//! Models wrap JSON in code fences, prepend chatter, or append explanations.
//! [`extract_json`] peels those wrappers off and returns the slice most likely
//! to parse. It never fails: when no wrapper is found it returns its input.
//!
//! # Design Philosophy
//!
//! - Cheap and pattern-based, no JSON parsing happens here
//! - Every result is a sub-slice of the input
//! - Extraction is idempotent: `extract_json(extract_json(x)) == extract_json(x)`

use once_cell::sync::Lazy;
use regex::Regex;

/// A fenced block: three backticks, an optional language tag on the opening
/// line, then the body up to the next three backticks.
static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:[A-Za-z0-9_+-]*[ \t]*\r?\n)?(.*?)```").expect("valid fence regex")
});

/// Return the body of the first fenced block that has non-blank content.
///
/// The body is trimmed. Returns `None` when the text holds no such block.
///
/// # Examples
///
/// ```
/// use statesmith_extraction::extract_json_from_backticks;
///
/// let text = "Here you go:\n```json\n[1, 2]\n```";
/// assert_eq!(extract_json_from_backticks(text), Some("[1, 2]"));
/// assert_eq!(extract_json_from_backticks("[1, 2]"), None);
/// ```
#[must_use]
pub fn extract_json_from_backticks(text: &str) -> Option<&str> {
    FENCED_BLOCK
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|body| body.as_str().trim())
        .find(|body| !body.is_empty())
}

/// Return the span from the first `[` or `{` to the last matching closer.
///
/// Returns `None` when there is no opener, no closer after it, or when the
/// span is already the whole text.
fn outermost_brackets(text: &str) -> Option<&str> {
    let start = text.find(['[', '{'])?;
    let closer = if text[start..].starts_with('[') {
        ']'
    } else {
        '}'
    };
    let end = text.rfind(closer)?;
    if end <= start {
        return None;
    }
    let span = &text[start..=end];
    (span.len() < text.len()).then_some(span)
}

/// One peeling step. Returns a strictly shorter slice, or `None` if nothing
/// could be peeled.
fn peel(text: &str) -> Option<&str> {
    extract_json_from_backticks(text).or_else(|| outermost_brackets(text))
}

/// Extract the candidate JSON payload from a model response.
///
/// Fenced blocks are unwrapped first; otherwise surrounding prose is cut back to
/// the outermost JSON brackets. Peeling repeats until nothing changes, which
/// makes the function idempotent. Text with no recognizable wrapper is
/// returned verbatim.
///
/// # Examples
///
/// ```
/// use statesmith_extraction::extract_json;
///
/// assert_eq!(extract_json("```json\n[{\"id\":\"a\"}]\n```"), "[{\"id\":\"a\"}]");
/// assert_eq!(extract_json("Sure! {\"a\": 1} Hope this helps."), "{\"a\": 1}");
/// assert_eq!(extract_json("no payload here"), "no payload here");
/// ```
#[must_use]
pub fn extract_json(text: &str) -> &str {
    let mut current = text;
    // Each peel is strictly shorter, so this terminates.
    while let Some(next) = peel(current) {
        if next.len() >= current.len() {
            break;
        }
        current = next;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plain_json_is_unchanged() {
        let json = r#"[{"id":"fetchData","type":"normal","transitions":["success"]}]"#;
        assert_eq!(extract_json(json), json);
    }

    #[test]
    fn test_fenced_json_with_language_tag() {
        let text = "```json\n[{\"id\":\"a\"}]\n```";
        assert_eq!(extract_json(text), "[{\"id\":\"a\"}]");
    }

    #[test]
    fn test_fenced_json_without_language_tag() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json(text), "{\"a\": 1}");
    }

    #[test]
    fn test_fence_with_surrounding_prose() {
        let text = "Here is the machine:\n```json\n[1]\n```\nLet me know if you need changes.";
        assert_eq!(extract_json(text), "[1]");
    }

    #[test]
    fn test_first_non_empty_fence_wins() {
        let text = "```\n```\nthen\n```json\n{\"b\": 2}\n```";
        assert_eq!(extract_json(text), "{\"b\": 2}");
    }

    #[test]
    fn test_unterminated_fence_falls_back_to_brackets() {
        let text = "```json\n[{\"id\":\"a\"}]";
        assert_eq!(extract_json(text), "[{\"id\":\"a\"}]");
    }

    #[test]
    fn test_prose_around_object() {
        let text = "Sure! {\"a\": {\"b\": 1}} Hope this helps.";
        assert_eq!(extract_json(text), "{\"a\": {\"b\": 1}}");
    }

    #[test]
    fn test_invalid_json_is_still_returned() {
        // Trailing comma: extraction does not validate.
        let text = "{id: fetchData,}";
        assert_eq!(extract_json(text), text);
    }

    #[test]
    fn test_no_wrapper_returns_input() {
        assert_eq!(extract_json("t2"), "t2");
        assert_eq!(extract_json(""), "");
        assert_eq!(extract_json("] backwards ["), "] backwards [");
    }

    #[test]
    fn test_backticks_helper_ignores_blank_fences() {
        assert_eq!(extract_json_from_backticks("```\n   \n```"), None);
    }

    proptest! {
        #[test]
        fn prop_extraction_is_idempotent(text in "[a-z`\\[\\]{}\n :\"]{0,60}") {
            let once = extract_json(&text);
            prop_assert_eq!(extract_json(once), once);
        }

        #[test]
        fn prop_result_is_a_substring(text in "[a-z`\\[\\]{}\n ]{0,60}") {
            prop_assert!(text.contains(extract_json(&text)));
        }

        #[test]
        fn prop_fenced_payload_is_recovered(body in "[a-z0-9:,\" ]{1,30}") {
            let body = format!("{{{body}}}");
            let text = format!("prefix\n```json\n{body}\n```\nsuffix");
            prop_assert_eq!(extract_json(&text), body.as_str());
        }
    }
}
