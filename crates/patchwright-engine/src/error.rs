use patchwright_core::{CatalogError, ValidationError};
use thiserror::Error;

/// Why a raw model response could not become an accepted suggestion.
///
/// Every variant that came from model output keeps the raw text so callers can
/// log it.
#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    #[error("could not interpret response: no JSON candidate found")]
    Extraction { raw: String },

    #[error("could not parse suggestion from any candidate: {last_error}")]
    Deserialization { last_error: String, raw: String },

    #[error("suggestion failed validation with {} error(s)", errors.len())]
    Validation {
        errors: Vec<ValidationError>,
        raw: String,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl ReconcileError {
    /// The model output this failure came from, if any.
    pub fn raw(&self) -> Option<&str> {
        match self {
            ReconcileError::Extraction { raw }
            | ReconcileError::Deserialization { raw, .. }
            | ReconcileError::Validation { raw, .. } => Some(raw),
            ReconcileError::Catalog(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("prompt must not be empty")]
    Blank,

    #[error("prompt is {length} characters; the limit is {limit}")]
    TooLong { length: usize, limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("model rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("model transport failed: {0}")]
    Transport(String),

    #[error("model response was empty")]
    EmptyResponse,
}

#[derive(Debug, Clone, Error)]
pub enum SuggestError {
    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}
