//! Prompt in, accepted suggestion out, over an abstract model.
//!
//! Transport lives behind `PatchModel`; this layer owns the prompt guard, the
//! system prompt, structured-output negotiation and reconciliation.

use super::client::{ChatRequest, StructuredOutput};
use super::models::ModelReply;
use super::prompts::patch_suggestion_system;
use super::reconcile::{ReconcileRequest, Reconciler};
use crate::error::{ModelError, PromptError, SuggestError};
use patchwright_core::{Catalog, Suggestion};
use std::sync::Arc;

/// Default model requested when nothing is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Controls per group embedded in the system prompt.
pub const DEFAULT_PROMPT_SUBSET_LIMIT: usize = 8;
/// Longest accepted user prompt, in characters, after trimming.
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 500;

/// A chat completion endpoint.
pub trait PatchModel {
    fn complete(&self, request: &ChatRequest) -> Result<ModelReply, ModelError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestSettings {
    pub model: String,
    pub prompt_subset_limit: usize,
    pub max_prompt_chars: usize,
}

impl Default for SuggestSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            prompt_subset_limit: DEFAULT_PROMPT_SUBSET_LIMIT,
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
        }
    }
}

/// Trimmed prompt, or why it cannot be sent.
pub fn check_prompt(prompt: &str, max_chars: usize) -> Result<&str, PromptError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(PromptError::Blank);
    }
    let length = trimmed.chars().count();
    if length > max_chars {
        return Err(PromptError::TooLong {
            length,
            limit: max_chars,
        });
    }
    Ok(trimmed)
}

pub struct SuggestionService<M> {
    catalog: Arc<Catalog>,
    model: M,
    settings: SuggestSettings,
}

impl<M: PatchModel> SuggestionService<M> {
    pub fn new(catalog: Arc<Catalog>, model: M, settings: SuggestSettings) -> Self {
        Self {
            catalog,
            model,
            settings,
        }
    }

    pub fn settings(&self) -> &SuggestSettings {
        &self.settings
    }

    /// The first request sent for `prompt`: strict schema mode.
    pub fn build_request(&self, prompt: &str) -> ChatRequest {
        let system = patch_suggestion_system(
            self.catalog.controls(),
            self.settings.prompt_subset_limit,
        );
        ChatRequest::new(
            &self.settings.model,
            &system,
            prompt,
            StructuredOutput::preferred().response_format(),
        )
    }

    pub fn suggest(
        &self,
        prompt: &str,
        client_request_id: Option<&str>,
    ) -> Result<Suggestion, SuggestError> {
        let prompt = check_prompt(prompt, self.settings.max_prompt_chars)?;
        let request = self.build_request(prompt);

        let reply = match self.model.complete(&request) {
            Ok(reply) => reply,
            Err(err) => match StructuredOutput::downgrade(&err) {
                Some(fallback) => {
                    tracing::warn!(
                        model = %self.settings.model,
                        error = %err,
                        "structured output rejected; retrying in JSON mode"
                    );
                    self.model
                        .complete(&request.with_response_format(fallback.response_format()))?
                }
                None => return Err(err.into()),
            },
        };

        if reply.content.trim().is_empty() {
            return Err(ModelError::EmptyResponse.into());
        }
        if let Some(usage) = &reply.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "model usage"
            );
        }

        let suggestion = Reconciler::new(&self.catalog).reconcile(
            &reply.content,
            ReconcileRequest {
                prompt,
                client_request_id,
                reply_model: reply.model.as_deref(),
            },
        )?;
        Ok(suggestion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconcileError;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    const BUNDLED: &str = include_str!("../../../../schemas/minilogue-xd/voice-parameters.json");

    const GOOD_REPLY: &str = r#"{
        "summary": "Plucky bass",
        "controls": [
            {"id": "filter.cutoff", "value": 200, "valueType": "continuous", "explanation": "dark", "confidence": "high"},
            {"id": "filter.resonance", "value": 400, "valueType": "continuous", "explanation": "bite", "confidence": "medium"},
            {"id": "amp_eg.attack", "value": 0, "valueType": "continuous", "explanation": "snappy", "confidence": "high"},
            {"id": "amp_eg.decay", "value": 300, "valueType": "continuous", "explanation": "short", "confidence": "medium"},
            {"id": "vco1.wave", "value": "square", "valueType": "enumeration", "explanation": "hollow", "confidence": "low"}
        ],
        "reasoning": {"intentSummary": "A short pluck", "soundDesignNotes": ["Fast decay"], "assumptions": []}
    }"#;

    /// Replays scripted replies and records every request it receives.
    struct ScriptedModel {
        replies: RefCell<VecDeque<Result<ModelReply, ModelError>>>,
        requests: RefCell<Vec<ChatRequest>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<ModelReply, ModelError>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl PatchModel for &ScriptedModel {
        fn complete(&self, request: &ChatRequest) -> Result<ModelReply, ModelError> {
            self.requests.borrow_mut().push(request.clone());
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(ModelError::Transport("no scripted reply".to_string())))
        }
    }

    fn service(model: &ScriptedModel) -> SuggestionService<&ScriptedModel> {
        let catalog = Arc::new(Catalog::from_json_str(BUNDLED).unwrap());
        SuggestionService::new(catalog, model, SuggestSettings::default())
    }

    #[test]
    fn test_check_prompt_guard() {
        assert_eq!(check_prompt("  bright lead  ", 500), Ok("bright lead"));
        assert_eq!(check_prompt(" \n ", 500), Err(PromptError::Blank));
        let long = "a".repeat(501);
        assert_eq!(
            check_prompt(&long, 500),
            Err(PromptError::TooLong {
                length: 501,
                limit: 500
            })
        );
        assert!(check_prompt(&"a".repeat(500), 500).is_ok());
    }

    #[test]
    fn test_suggest_happy_path() {
        let model = ScriptedModel::new(vec![Ok(ModelReply {
            content: GOOD_REPLY.to_string(),
            model: Some("served".to_string()),
            usage: None,
        })]);
        let suggestion = service(&model).suggest("  plucky bass ", Some("client-1")).unwrap();
        assert_eq!(suggestion.prompt, "plucky bass");
        assert_eq!(suggestion.model, "served");
        assert_eq!(suggestion.client_request_id, "client-1");

        let requests = model.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].response_format.is_structured());
        assert_eq!(requests[0].messages[1].content, "plucky bass");
        assert!(requests[0].messages[0].content.contains("- id: filter.cutoff"));
    }

    #[test]
    fn test_blank_prompt_never_reaches_model() {
        let model = ScriptedModel::new(vec![]);
        let err = service(&model).suggest("   ", None).unwrap_err();
        assert!(matches!(err, SuggestError::Prompt(PromptError::Blank)));
        assert!(model.requests.borrow().is_empty());
    }

    #[test]
    fn test_unsupported_structured_output_retries_in_json_mode() {
        let model = ScriptedModel::new(vec![
            Err(ModelError::Rejected {
                status: 400,
                body: "response_format json_schema is not supported by this model".to_string(),
            }),
            Ok(ModelReply::text(GOOD_REPLY)),
        ]);
        let suggestion = service(&model).suggest("plucky bass", None).unwrap();
        assert_eq!(suggestion.summary, "Plucky bass");

        let requests = model.requests.borrow();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].response_format.is_structured());
        assert_eq!(requests[1].response_format.format_type, "json_object");
    }

    #[test]
    fn test_other_rejections_are_not_retried() {
        let model = ScriptedModel::new(vec![Err(ModelError::Rejected {
            status: 401,
            body: "bad key".to_string(),
        })]);
        let err = service(&model).suggest("plucky bass", None).unwrap_err();
        assert!(matches!(err, SuggestError::Model(ModelError::Rejected { status: 401, .. })));
        assert_eq!(model.requests.borrow().len(), 1);
    }

    #[test]
    fn test_empty_reply_is_a_model_error() {
        let model = ScriptedModel::new(vec![Ok(ModelReply::text("  "))]);
        let err = service(&model).suggest("plucky bass", None).unwrap_err();
        assert!(matches!(err, SuggestError::Model(ModelError::EmptyResponse)));
    }

    #[test]
    fn test_invalid_suggestion_surfaces_validation_errors() {
        let reply = GOOD_REPLY.replace("\"confidence\": \"low\"", "\"confidence\": \"certain\"");
        let model = ScriptedModel::new(vec![Ok(ModelReply::text(reply))]);
        let err = service(&model).suggest("plucky bass", None).unwrap_err();
        match err {
            SuggestError::Reconcile(ReconcileError::Validation { errors, .. }) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "controls[4].confidence");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
