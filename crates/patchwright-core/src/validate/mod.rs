//! Patch validation
//!
//! Two modes share one result type: suggestion mode checks a model-proposed
//! partial patch against the control view, document mode checks a complete
//! patch document against the schema. Both collect every violation instead of
//! stopping at the first one.

mod document;
mod suggestion;

pub use document::DocumentValidator;
pub use suggestion::SuggestionValidator;

use serde::Serialize;

/// Machine-readable category of a validation error. Not part of the wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    InvalidPayload,
    UnknownSection,
    SectionType,
    MissingRequiredSection,
    UnknownParameter,
    TypeMismatch,
    RangeViolation,
    EnumViolation,
    ConfidenceError,
    MissingReasoning,
    ControlCount,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    #[serde(skip)]
    pub kind: ValidationErrorKind,
    pub field: String,
    /// Observed value, stringified. Absent when there was nothing to observe.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub message: String,
}

impl ValidationError {
    pub fn new(
        kind: ValidationErrorKind,
        field: impl Into<String>,
        value: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            field: field.into(),
            value,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Success,
    Failure(Vec<ValidationError>),
}

impl ValidationOutcome {
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        if errors.is_empty() {
            ValidationOutcome::Success
        } else {
            ValidationOutcome::Failure(errors)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Success)
    }

    pub fn errors(&self) -> &[ValidationError] {
        match self {
            ValidationOutcome::Success => &[],
            ValidationOutcome::Failure(errors) => errors,
        }
    }

    /// The `{ valid, errors? }` shape handed to callers verbatim.
    pub fn into_report(self) -> ValidationReport {
        match self {
            ValidationOutcome::Success => ValidationReport {
                valid: true,
                errors: None,
            },
            ValidationOutcome::Failure(errors) => ValidationReport {
                valid: false,
                errors: Some(errors),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationError>>,
}
