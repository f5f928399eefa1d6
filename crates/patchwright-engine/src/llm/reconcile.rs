//! Raw model text in, accepted suggestion out.
//!
//! extract -> deserialize -> normalize -> stamp request metadata -> validate.

use super::extract::extract_candidates;
use super::models::UNKNOWN_MODEL;
use super::normalize::SuggestionNormalizer;
use super::parse::deserialize_draft;
use crate::error::ReconcileError;
use patchwright_core::util::non_blank;
use patchwright_core::{Catalog, Suggestion, ValidationOutcome};
use uuid::Uuid;

/// Request-side facts the model output is reconciled against.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileRequest<'a> {
    /// Original user prompt. Fallback for a missing `prompt` field.
    pub prompt: &'a str,
    pub client_request_id: Option<&'a str>,
    /// Model name reported by the provider for this reply.
    pub reply_model: Option<&'a str>,
}

impl<'a> ReconcileRequest<'a> {
    pub fn new(prompt: &'a str) -> Self {
        Self {
            prompt,
            ..Self::default()
        }
    }
}

pub struct Reconciler<'a> {
    catalog: &'a Catalog,
}

impl<'a> Reconciler<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn reconcile(
        &self,
        raw: &str,
        request: ReconcileRequest<'_>,
    ) -> Result<Suggestion, ReconcileError> {
        let candidates = extract_candidates(raw);
        if candidates.is_empty() {
            tracing::warn!("model response contained no JSON candidates");
            return Err(ReconcileError::Extraction {
                raw: raw.to_string(),
            });
        }

        let draft = deserialize_draft(&candidates, raw)?;
        let mut suggestion =
            SuggestionNormalizer::new(self.catalog.controls()).normalize(draft, request.prompt);
        stamp_metadata(&mut suggestion, request);

        match self.catalog.validate_suggestion(&suggestion) {
            ValidationOutcome::Success => {
                tracing::info!(
                    request_id = %suggestion.request_id,
                    controls = suggestion.controls.len(),
                    model = %suggestion.model,
                    "accepted patch suggestion"
                );
                Ok(suggestion)
            }
            ValidationOutcome::Failure(errors) => {
                tracing::warn!(
                    request_id = %suggestion.request_id,
                    errors = errors.len(),
                    "rejected patch suggestion"
                );
                Err(ReconcileError::Validation {
                    errors,
                    raw: raw.to_string(),
                })
            }
        }
    }
}

/// Fresh request id, the caller's client id (or a fresh one), and the model
/// name resolved reply -> suggestion -> "unknown".
fn stamp_metadata(suggestion: &mut Suggestion, request: ReconcileRequest<'_>) {
    suggestion.request_id = Uuid::new_v4().to_string();
    suggestion.client_request_id = non_blank(request.client_request_id)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    suggestion.model = non_blank(request.reply_model)
        .or_else(|| non_blank(Some(suggestion.model.as_str())))
        .unwrap_or(UNKNOWN_MODEL)
        .to_string();
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchwright_core::ValidationErrorKind;

    const BUNDLED: &str = include_str!("../../../../schemas/minilogue-xd/voice-parameters.json");

    fn catalog() -> Catalog {
        Catalog::from_json_str(BUNDLED).unwrap()
    }

    fn control_json(id: &str, value: &str, value_type: &str) -> String {
        format!(
            r#"{{"id": "{id}", "value": {value}, "valueType": "{value_type}", "explanation": "because", "confidence": "high"}}"#
        )
    }

    fn response(control_count: usize) -> String {
        let controls = [
            control_json("filter.cutoff", "300", "continuous"),
            control_json("filter.resonance", "200", "continuous"),
            control_json("amp_eg.attack", "650", "continuous"),
            control_json("amp_eg.release", "700", "continuous"),
            control_json("vco1.wave", "\"saw\"", "enumeration"),
            control_json("vco2.sync", "false", "boolean"),
        ];
        format!(
            r#"{{"summary": "Slow warm pad", "controls": [{}], "reasoning": {{"intentSummary": "A soft pad", "soundDesignNotes": ["Darken the filter"], "assumptions": []}}, "model": "declared-model"}}"#,
            controls[..control_count].join(", ")
        )
    }

    #[test]
    fn test_accepts_fenced_response_in_prose() {
        let catalog = catalog();
        let raw = format!("Here is your patch!\n```json\n{}\n```\nHave fun.", response(6));
        let suggestion = Reconciler::new(&catalog)
            .reconcile(&raw, ReconcileRequest::new("warm pad"))
            .unwrap();
        assert_eq!(suggestion.prompt, "warm pad");
        assert_eq!(suggestion.summary, "Slow warm pad");
        assert_eq!(suggestion.controls.len(), 6);
        assert_eq!(suggestion.controls[4].allowed_values.as_ref().unwrap().len(), 3);
        assert_eq!(suggestion.model, "declared-model");
        assert!(Uuid::parse_str(&suggestion.request_id).is_ok());
        assert!(Uuid::parse_str(&suggestion.client_request_id).is_ok());
    }

    #[test]
    fn test_metadata_prefers_request_values() {
        let catalog = catalog();
        let request = ReconcileRequest {
            prompt: "warm pad",
            client_request_id: Some("client-42"),
            reply_model: Some("served-model"),
        };
        let suggestion = Reconciler::new(&catalog).reconcile(&response(5), request).unwrap();
        assert_eq!(suggestion.client_request_id, "client-42");
        assert_eq!(suggestion.model, "served-model");
    }

    #[test]
    fn test_model_defaults_to_unknown() {
        let catalog = catalog();
        let raw = response(5).replace(r#", "model": "declared-model""#, "");
        let suggestion = Reconciler::new(&catalog)
            .reconcile(&raw, ReconcileRequest::new("warm pad"))
            .unwrap();
        assert_eq!(suggestion.model, UNKNOWN_MODEL);
    }

    #[test]
    fn test_blank_response_is_an_extraction_failure() {
        let catalog = catalog();
        let err = Reconciler::new(&catalog)
            .reconcile("   ", ReconcileRequest::new("warm pad"))
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Extraction { .. }));
    }

    #[test]
    fn test_prose_only_response_is_a_deserialization_failure() {
        let catalog = catalog();
        let err = Reconciler::new(&catalog)
            .reconcile("Sorry, I can't design that sound.", ReconcileRequest::new("warm pad"))
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Deserialization { .. }));
        assert_eq!(err.raw(), Some("Sorry, I can't design that sound."));
    }

    #[test]
    fn test_too_few_controls_is_a_validation_failure() {
        let catalog = catalog();
        let raw = response(4);
        let err = Reconciler::new(&catalog)
            .reconcile(&raw, ReconcileRequest::new("warm pad"))
            .unwrap_err();
        match err {
            ReconcileError::Validation { errors, raw: kept } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].kind, ValidationErrorKind::ControlCount);
                assert_eq!(kept, raw);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_case_variant_fields_are_recovered() {
        let catalog = catalog();
        let raw = response(5)
            .replace("\"summary\"", "\"Summary\"")
            .replace("\"controls\"", "\"Controls\"")
            .replace("\"valueType\"", "\"ValueType\"");
        let suggestion = Reconciler::new(&catalog)
            .reconcile(&raw, ReconcileRequest::new("warm pad"))
            .unwrap();
        assert_eq!(suggestion.summary, "Slow warm pad");
        assert_eq!(suggestion.controls[0].value_type, "continuous");
    }
}
