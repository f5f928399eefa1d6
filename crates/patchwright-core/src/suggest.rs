//! Suggestion model
//!
//! A partial, model-proposed patch: 5-10 catalog controls, each with an
//! explanation and a confidence tag. Created fresh per request and never
//! persisted here.

use crate::value::PatchValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inclusive bounds on the number of controls in an accepted suggestion.
pub const MIN_CONTROLS: usize = 5;
pub const MAX_CONTROLS: usize = 10;

/// Self-reported certainty attached to each suggested value
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    #[default]
    Medium,
    High,
}

impl Confidence {
    /// Case-insensitive parse of `low`/`medium`/`high`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "low" => Some(Confidence::Low),
            "medium" => Some(Confidence::Medium),
            "high" => Some(Confidence::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlRange {
    pub min: f64,
    pub max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionControl {
    pub id: String,
    pub label: String,
    pub group: String,
    /// Numeric or textual; which one is meaningful depends on `value_type`.
    pub value: PatchValue,
    /// Kept as text so a model's unexpected type names reach the validator.
    pub value_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<ControlRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
    pub explanation: String,
    /// Kept as text for the same reason as `value_type`.
    pub confidence: String,
}

impl SuggestionControl {
    pub fn confidence_level(&self) -> Option<Confidence> {
        Confidence::parse(&self.confidence)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reasoning {
    pub intent_summary: String,
    pub sound_design_notes: Vec<String>,
    #[serde(default)]
    pub assumptions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub prompt: String,
    pub summary: String,
    pub controls: Vec<SuggestionControl>,
    pub reasoning: Reasoning,
    pub request_id: String,
    pub client_request_id: String,
    pub generated_at_utc: DateTime<Utc>,
    pub model: String,
}
