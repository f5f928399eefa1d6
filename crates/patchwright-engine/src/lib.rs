//! Model-output reconciliation and suggestion orchestration for Patchwright.
//!
//! Takes the free-form text a language model returns and turns it into an
//! accepted `Suggestion`, or a typed failure that keeps the raw text.

pub mod error;
pub mod llm;

pub use error::{ModelError, PromptError, ReconcileError, SuggestError};
pub use llm::{
    extract_candidates, ChatRequest, ModelReply, PatchModel, ReconcileRequest, Reconciler,
    ResponseFormat, StructuredOutput, SuggestSettings, SuggestionService,
};
