pub mod client;
pub mod extract;
pub mod models;
pub mod normalize;
pub mod parse;
pub mod prompts;
pub mod reconcile;
pub mod service;

pub use client::{ChatRequest, ResponseFormat, StructuredOutput};
pub use extract::extract_candidates;
pub use models::{ModelReply, Usage};
pub use normalize::SuggestionNormalizer;
pub use parse::{deserialize_draft, SuggestionDraft};
pub use reconcile::{ReconcileRequest, Reconciler};
pub use service::{check_prompt, PatchModel, SuggestSettings, SuggestionService};
