//! Candidate extraction from free-form model output.
//!
//! Models wrap JSON in prose and markdown fences often enough that the raw
//! text is only the first of several places a suggestion might live.

use regex::Regex;
use std::sync::OnceLock;

static FENCE_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn fence_re() -> Option<&'static Regex> {
    FENCE_RE
        .get_or_init(|| Regex::new(r"(?s)```([^\n`]*)\n(.*?)```").ok())
        .as_ref()
}

fn push_unique_candidate(candidates: &mut Vec<String>, candidate: &str) {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return;
    }
    if !candidates.iter().any(|existing| existing == trimmed) {
        candidates.push(trimmed.to_string());
    }
}

/// Ordered, de-duplicated places a JSON suggestion might be found:
/// the whole input, then every json (or untagged) fenced block, then the
/// first balanced object in the text.
pub fn extract_candidates(text: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    push_unique_candidate(&mut candidates, text);

    if let Some(re) = fence_re() {
        for caps in re.captures_iter(text) {
            let language = caps.get(1).map_or("", |m| m.as_str()).trim().to_lowercase();
            if language.is_empty() || language.contains("json") {
                if let Some(body) = caps.get(2) {
                    push_unique_candidate(&mut candidates, body.as_str());
                }
            }
        }
    }

    if let Some(object) = first_balanced_object(text) {
        push_unique_candidate(&mut candidates, object);
    }

    tracing::debug!(candidates = candidates.len(), "extracted response candidates");
    candidates
}

/// First `{...}` whose braces balance, ignoring braces inside string literals.
fn first_balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;
    let mut start_idx = None;

    for (i, c) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        if c == '\\' && in_string {
            escape_next = true;
            continue;
        }

        if c == '"' {
            in_string = !in_string;
            continue;
        }

        if in_string {
            continue;
        }

        if c == '{' {
            if depth == 0 {
                start_idx = Some(i);
            }
            depth += 1;
        } else if c == '}' && depth > 0 {
            depth -= 1;
            if depth == 0 {
                if let Some(start) = start_idx {
                    return Some(&text[start..=i]);
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_object_is_the_only_candidate() {
        assert_eq!(extract_candidates(r#"{"a":1}"#), vec![r#"{"a":1}"#]);
    }

    #[test]
    fn test_blank_input_has_no_candidates() {
        assert!(extract_candidates("   \n\t").is_empty());
    }

    #[test]
    fn test_fenced_block_ranks_before_brace_scan() {
        let text = "Here you go:\n```json\n{\"a\":1}\n```\nEnjoy!";
        let candidates = extract_candidates(text);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0], text.trim());
        assert_eq!(candidates[1], r#"{"a":1}"#);
    }

    #[test]
    fn test_fence_languages() {
        let text = "```\n{\"a\":1}\n```\n```JSON5\n{\"b\":2}\n```\n```python\nprint({})\n```";
        let candidates = extract_candidates(text);
        assert!(candidates.contains(&r#"{"a":1}"#.to_string()));
        assert!(candidates.contains(&r#"{"b":2}"#.to_string()));
        assert!(!candidates.iter().any(|c| c.starts_with("print")));
    }

    #[test]
    fn test_fences_keep_source_order() {
        let text = "```json\n{\"first\":1}\n```\ntext\n```json\n{\"second\":2}\n```";
        let candidates = extract_candidates(text);
        assert_eq!(candidates[1], r#"{"first":1}"#);
        assert_eq!(candidates[2], r#"{"second":2}"#);
    }

    #[test]
    fn test_brace_scan_handles_escaped_quotes() {
        let text = r#"Sure! Here is the patch: {"a": "}\"", "b": 2} Thanks."#;
        let candidates = extract_candidates(text);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1], r#"{"a": "}\"", "b": 2}"#);
        let parsed: serde_json::Value = serde_json::from_str(&candidates[1]).unwrap();
        assert_eq!(parsed["b"], 2);
    }

    #[test]
    fn test_brace_scan_tracks_nesting() {
        let text = r#"prefix {"outer": {"inner": [1, {"x": "{"}]}} suffix {"later": true}"#;
        assert_eq!(
            first_balanced_object(text),
            Some(r#"{"outer": {"inner": [1, {"x": "{"}]}}"#)
        );
    }

    #[test]
    fn test_unbalanced_object_is_not_a_candidate() {
        assert_eq!(first_balanced_object(r#"text {"a": 1"#), None);
        assert_eq!(first_balanced_object("stray } then {\"a\":1}"), Some("{\"a\":1}"));
    }
}
