//! Two-pass deserialization of response candidates into a suggestion draft.
//!
//! Pass one matches field names exactly. Pass two folds key casing onto the
//! known field names first, which recovers models that answer with
//! `Summary` or `VALUETYPE`.

use crate::error::ReconcileError;
use patchwright_core::util::eq_ignore_case;
use patchwright_core::PatchValue;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Wire shape of a suggestion. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionDraft {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub controls: Option<Vec<ControlDraft>>,
    #[serde(default)]
    pub reasoning: Option<ReasoningDraft>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub client_request_id: Option<String>,
    #[serde(default)]
    pub generated_at_utc: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl SuggestionDraft {
    fn has_content(&self) -> bool {
        self.prompt.is_some()
            || self.summary.is_some()
            || self.controls.is_some()
            || self.reasoning.is_some()
            || self.request_id.is_some()
            || self.client_request_id.is_some()
            || self.generated_at_utc.is_some()
            || self.model.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlDraft {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub value: Option<PatchValue>,
    #[serde(default)]
    pub value_type: Option<String>,
    #[serde(default)]
    pub range: Option<RangeDraft>,
    #[serde(default)]
    pub allowed_values: Option<Vec<String>>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub confidence: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RangeDraft {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningDraft {
    #[serde(default)]
    pub intent_summary: Option<String>,
    #[serde(default)]
    pub sound_design_notes: Option<Vec<String>>,
    #[serde(default)]
    pub assumptions: Option<Vec<String>>,
}

/// Field names of every draft struct, as they appear on the wire.
const KNOWN_FIELDS: &[&str] = &[
    "prompt",
    "summary",
    "controls",
    "reasoning",
    "requestId",
    "clientRequestId",
    "generatedAtUtc",
    "model",
    "id",
    "label",
    "group",
    "value",
    "valueType",
    "range",
    "allowedValues",
    "explanation",
    "confidence",
    "min",
    "max",
    "unit",
    "intentSummary",
    "soundDesignNotes",
    "assumptions",
];

/// First candidate that parses as a draft, strict pass before lenient pass.
///
/// A candidate that is well-formed JSON but carries none of the suggestion
/// fields (`{"a": 1}`) does not count as parsed; the search moves on to the
/// next candidate, and it fails like any other candidate if nothing else
/// matches.
pub fn deserialize_draft(candidates: &[String], raw: &str) -> Result<SuggestionDraft, ReconcileError> {
    let mut last_error: Option<String> = None;

    for candidate in candidates {
        match parse_strict(candidate) {
            Ok(draft) => return Ok(draft),
            Err(err) => last_error = Some(err),
        }
    }

    for candidate in candidates {
        match parse_lenient(candidate) {
            Ok(draft) => {
                tracing::debug!("suggestion recovered with case-insensitive field matching");
                return Ok(draft);
            }
            Err(err) => last_error = Some(err),
        }
    }

    let last_error = last_error.unwrap_or_else(|| "no candidates to parse".to_string());
    tracing::warn!(error = %last_error, "no candidate parsed as a suggestion");
    Err(ReconcileError::Deserialization {
        last_error,
        raw: raw.to_string(),
    })
}

fn parse_strict(candidate: &str) -> Result<SuggestionDraft, String> {
    let value: Value = serde_json::from_str(candidate).map_err(|e| e.to_string())?;
    if let Some(key) = case_variant_key(&value) {
        return Err(format!("field '{}' does not match the expected casing", key));
    }
    let draft: SuggestionDraft = serde_json::from_value(value).map_err(|e| e.to_string())?;
    require_content(draft)
}

fn parse_lenient(candidate: &str) -> Result<SuggestionDraft, String> {
    let value: Value = serde_json::from_str(candidate).map_err(|e| e.to_string())?;
    let draft: SuggestionDraft =
        serde_json::from_value(canonicalize_keys(value)).map_err(|e| e.to_string())?;
    require_content(draft)
}

fn require_content(draft: SuggestionDraft) -> Result<SuggestionDraft, String> {
    if draft.has_content() {
        Ok(draft)
    } else {
        Err("candidate has no recognised suggestion fields".to_string())
    }
}

fn canonical_name(key: &str) -> Option<&'static str> {
    KNOWN_FIELDS
        .iter()
        .copied()
        .find(|known| eq_ignore_case(known, key))
}

/// First key anywhere in the value that names a known field with different
/// casing. Strict matching would silently drop such a field.
fn case_variant_key(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) => map.iter().find_map(|(key, inner)| {
            match canonical_name(key) {
                Some(canonical) if canonical != key.as_str() => Some(key.as_str()),
                _ => case_variant_key(inner),
            }
        }),
        Value::Array(items) => items.iter().find_map(case_variant_key),
        _ => None,
    }
}

/// Rename object keys onto their known spelling, recursively. An exact
/// spelling wins over a case variant of the same field.
fn canonicalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, inner) in map {
                let inner = canonicalize_keys(inner);
                match canonical_name(&key) {
                    Some(canonical) if canonical == key => {
                        out.insert(key, inner);
                    }
                    Some(canonical) => {
                        if !out.contains_key(canonical) {
                            out.insert(canonical.to_string(), inner);
                        }
                    }
                    None => {
                        out.insert(key, inner);
                    }
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize_keys).collect()),
        other => other,
    }
}
