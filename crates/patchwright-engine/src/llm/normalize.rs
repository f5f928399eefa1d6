//! Turns a structurally-parsed draft into a complete `Suggestion`.
//!
//! Normalization never fails. Gaps are filled from the catalog or from fixed
//! fallbacks; whatever is still wrong is left for the validator to report.

use super::parse::{ControlDraft, RangeDraft, ReasoningDraft, SuggestionDraft};
use chrono::{DateTime, Utc};
use patchwright_core::util::non_blank;
use patchwright_core::{
    Confidence, ControlCatalog, ControlRange, Reasoning, Suggestion, SuggestionControl,
};

pub const FALLBACK_SUMMARY: &str = "Model did not provide a summary.";
pub const FALLBACK_INTENT: &str = "Model did not provide an intent summary.";
pub const FALLBACK_NOTE: &str = "Model did not provide detailed sound design notes.";

pub struct SuggestionNormalizer<'a> {
    controls: &'a ControlCatalog,
}

impl<'a> SuggestionNormalizer<'a> {
    pub fn new(controls: &'a ControlCatalog) -> Self {
        Self { controls }
    }

    /// `fallback_prompt` is the original request text.
    ///
    /// Request metadata is carried over from the draft as-is (empty when
    /// missing); the reconciler stamps the final values.
    pub fn normalize(&self, draft: SuggestionDraft, fallback_prompt: &str) -> Suggestion {
        let controls = draft
            .controls
            .unwrap_or_default()
            .into_iter()
            .filter_map(|control| self.normalize_control(control))
            .collect();

        let generated_at_utc = draft
            .generated_at_utc
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        Suggestion {
            prompt: text_or(draft.prompt.as_deref(), fallback_prompt),
            summary: text_or(draft.summary.as_deref(), FALLBACK_SUMMARY),
            controls,
            reasoning: normalize_reasoning(draft.reasoning.unwrap_or_default()),
            request_id: text_or(draft.request_id.as_deref(), ""),
            client_request_id: text_or(draft.client_request_id.as_deref(), ""),
            generated_at_utc,
            model: text_or(draft.model.as_deref(), ""),
        }
    }

    fn normalize_control(&self, draft: ControlDraft) -> Option<SuggestionControl> {
        let Some(id) = non_blank(draft.id.as_deref()) else {
            tracing::debug!("dropping suggested control without an id");
            return None;
        };
        let id = id.to_string();
        let entry = self.controls.get(&id);

        let label = non_blank(draft.label.as_deref())
            .map(str::to_string)
            .or_else(|| entry.map(|e| e.label.clone()))
            .unwrap_or_else(|| id.clone());
        let group = non_blank(draft.group.as_deref())
            .map(str::to_string)
            .or_else(|| entry.map(|e| e.group_label.clone()))
            .unwrap_or_default();
        let value_type = non_blank(draft.value_type.as_deref())
            .map(str::to_string)
            .or_else(|| entry.map(|e| e.value_type.as_str().to_string()))
            .unwrap_or_default();

        let range = match draft.range {
            Some(RangeDraft {
                min: Some(min),
                max: Some(max),
                unit,
            }) => Some(ControlRange {
                min,
                max,
                unit: non_blank(unit.as_deref()).map(str::to_string),
            }),
            _ => entry.and_then(|e| e.range.as_ref()).map(|r| ControlRange {
                min: r.min,
                max: r.max,
                unit: r.unit.clone(),
            }),
        };

        let allowed_values = match draft.allowed_values {
            Some(values) if !values.is_empty() => Some(values),
            provided => entry
                .filter(|e| !e.allowed_values.is_empty())
                .map(|e| e.allowed_values.clone())
                .or(provided),
        };

        let confidence = non_blank(draft.confidence.as_deref())
            .map(str::to_lowercase)
            .unwrap_or_else(|| Confidence::default().as_str().to_string());

        Some(SuggestionControl {
            id,
            label,
            group,
            value: draft.value.unwrap_or_default(),
            value_type,
            range,
            allowed_values,
            explanation: text_or(draft.explanation.as_deref(), ""),
            confidence,
        })
    }
}

fn text_or(value: Option<&str>, fallback: &str) -> String {
    non_blank(value).unwrap_or(fallback).to_string()
}

fn clean_lines(lines: Option<Vec<String>>) -> Vec<String> {
    lines
        .unwrap_or_default()
        .iter()
        .filter_map(|line| non_blank(Some(line.as_str())))
        .map(str::to_string)
        .collect()
}

fn normalize_reasoning(draft: ReasoningDraft) -> Reasoning {
    let mut sound_design_notes = clean_lines(draft.sound_design_notes);
    if sound_design_notes.is_empty() {
        sound_design_notes.push(FALLBACK_NOTE.to_string());
    }
    Reasoning {
        intent_summary: text_or(draft.intent_summary.as_deref(), FALLBACK_INTENT),
        sound_design_notes,
        assumptions: clean_lines(draft.assumptions),
    }
}
