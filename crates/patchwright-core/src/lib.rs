//! Core domain model and contracts for Patchwright.
//!
//! Holds the parameter catalog, the suggestion model and both patch validators.
//! Everything here is a pure function of its inputs plus an immutable catalog.

pub mod catalog;
pub mod error;
pub mod suggest;
pub mod util;
pub mod validate;
pub mod value;

pub use catalog::{
    CatalogControl, ControlCatalog, ParameterDataType, ParameterDefinition, ParameterGroup,
    ParameterRange, SchemaSnapshot, ValueType,
};
pub use catalog::Catalog;
pub use error::CatalogError;
pub use suggest::{Confidence, ControlRange, Reasoning, Suggestion, SuggestionControl};
pub use validate::{
    DocumentValidator, SuggestionValidator, ValidationError, ValidationErrorKind,
    ValidationOutcome, ValidationReport,
};
pub use value::PatchValue;
