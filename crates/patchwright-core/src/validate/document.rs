//! Document mode: a complete patch keyed by section, then parameter id.

use super::{ValidationError, ValidationErrorKind, ValidationOutcome};
use crate::catalog::{ParameterDataType, ParameterDefinition, ParameterGroup, SchemaSnapshot};
use crate::error::CatalogError;
use crate::util::{eq_ignore_case, fold_key, format_number};
use crate::value::PatchValue;
use std::collections::HashSet;

/// Validates full patch documents against one schema snapshot.
///
/// Catalog errors (a corrupt alias graph) abort validation; everything else is
/// collected into the outcome.
#[derive(Debug, Clone, Copy)]
pub struct DocumentValidator<'a> {
    schema: &'a SchemaSnapshot,
}

impl<'a> DocumentValidator<'a> {
    pub fn new(schema: &'a SchemaSnapshot) -> Self {
        Self { schema }
    }

    pub fn validate(&self, document: &PatchValue) -> Result<ValidationOutcome, CatalogError> {
        let Some(sections) = document.as_object() else {
            return Ok(ValidationOutcome::Failure(vec![ValidationError::new(
                ValidationErrorKind::InvalidPayload,
                "patch",
                Some(document.render()),
                "Patch payload must be a JSON object.",
            )]));
        };

        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for (name, value) in sections {
            if self.schema.group(name).is_none() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownSection,
                    name.as_str(),
                    Some(value.render()),
                    format!("Unknown section '{}'.", name),
                ));
            } else if !seen.insert(fold_key(name)) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::SectionType,
                    name.as_str(),
                    Some(value.render()),
                    format!("Section '{}' appears more than once.", name),
                ));
            }
        }

        for group in self.schema.groups() {
            let mut matching = sections
                .iter()
                .filter(|(name, _)| eq_ignore_case(name, &group.id))
                .map(|(_, value)| value)
                .peekable();

            if matching.peek().is_none() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::MissingRequiredSection,
                    group.id.as_str(),
                    None,
                    format!("Required section '{}' is missing.", group.id),
                ));
                continue;
            }

            // Case-variant duplicates are already reported; their contents
            // are still checked.
            for section in matching {
                self.check_section(group, section, &mut errors)?;
            }
        }

        if !errors.is_empty() {
            tracing::debug!(errors = errors.len(), "patch document failed validation");
        }
        Ok(ValidationOutcome::from_errors(errors))
    }

    fn check_section(
        &self,
        group: &ParameterGroup,
        section: &PatchValue,
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), CatalogError> {
        let Some(parameters) = section.as_object() else {
            errors.push(ValidationError::new(
                ValidationErrorKind::SectionType,
                group.id.as_str(),
                Some(section.render()),
                format!("Section '{}' must be a JSON object of parameters.", group.id),
            ));
            return Ok(());
        };

        for (parameter_id, value) in parameters {
            let Some(definition) = self.schema.parameter(parameter_id) else {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownParameter,
                    parameter_id.as_str(),
                    Some(value.render()),
                    format!(
                        "Unknown parameter '{}' in section '{}'.",
                        parameter_id, group.id
                    ),
                ));
                continue;
            };

            let resolved = self.schema.resolve(definition)?;
            check_value(parameter_id, value, resolved, errors);
        }
        Ok(())
    }
}

fn check_value(
    parameter_id: &str,
    value: &PatchValue,
    definition: &ParameterDefinition,
    errors: &mut Vec<ValidationError>,
) {
    match definition.data_type {
        ParameterDataType::Float => check_numeric(parameter_id, value, definition, false, errors),
        ParameterDataType::Integer => check_numeric(parameter_id, value, definition, true, errors),
        ParameterDataType::Boolean => {
            if value.as_bool().is_none() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::TypeMismatch,
                    parameter_id,
                    Some(value.render()),
                    format!("Parameter '{}' must be a boolean.", parameter_id),
                ));
            }
        }
        ParameterDataType::Enum => check_enum(parameter_id, value, definition, errors),
        ParameterDataType::List => check_list(parameter_id, value, definition, errors),
        // resolve() never hands back an alias
        ParameterDataType::Alias => errors.push(ValidationError::new(
            ValidationErrorKind::TypeMismatch,
            parameter_id,
            Some(value.render()),
            format!(
                "Parameter '{}' has an unsupported schema type '{}'.",
                parameter_id,
                definition.data_type.as_str()
            ),
        )),
    }
}

fn check_numeric(
    parameter_id: &str,
    value: &PatchValue,
    definition: &ParameterDefinition,
    require_integer: bool,
    errors: &mut Vec<ValidationError>,
) {
    let Some(number) = value.as_f64() else {
        let expected = if require_integer { "integer" } else { "number" };
        errors.push(ValidationError::new(
            ValidationErrorKind::TypeMismatch,
            parameter_id,
            Some(value.render()),
            format!("Parameter '{}' must be a {}.", parameter_id, expected),
        ));
        return;
    };

    if require_integer && (number - number.round()).abs() > f64::EPSILON {
        errors.push(ValidationError::new(
            ValidationErrorKind::TypeMismatch,
            parameter_id,
            Some(format_number(number)),
            format!("Parameter '{}' must be an integer value.", parameter_id),
        ));
        return;
    }

    if let Some(range) = &definition.range {
        if !range.contains(number) {
            errors.push(ValidationError::new(
                ValidationErrorKind::RangeViolation,
                parameter_id,
                Some(format_number(number)),
                format!(
                    "Value for '{}' must be between {} and {}.",
                    parameter_id,
                    format_number(range.min),
                    format_number(range.max)
                ),
            ));
        }
    }
}

fn check_enum(
    parameter_id: &str,
    value: &PatchValue,
    definition: &ParameterDefinition,
    errors: &mut Vec<ValidationError>,
) {
    let Some(actual) = value.as_str() else {
        errors.push(ValidationError::new(
            ValidationErrorKind::TypeMismatch,
            parameter_id,
            Some(value.render()),
            format!(
                "Parameter '{}' must be a string matching one of the allowed values.",
                parameter_id
            ),
        ));
        return;
    };

    if actual.trim().is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EnumViolation,
            parameter_id,
            Some(actual.to_string()),
            format!("Parameter '{}' must specify one of the allowed values.", parameter_id),
        ));
        return;
    }

    if !definition.allowed_values.is_empty() && !definition.allows(actual) {
        errors.push(ValidationError::new(
            ValidationErrorKind::EnumViolation,
            parameter_id,
            Some(actual.to_string()),
            format!(
                "Parameter '{}' must be one of: {}.",
                parameter_id,
                definition.allowed_values.join(", ")
            ),
        ));
    }
}

fn check_list(
    parameter_id: &str,
    value: &PatchValue,
    definition: &ParameterDefinition,
    errors: &mut Vec<ValidationError>,
) {
    let Some(entries) = value.as_array() else {
        errors.push(ValidationError::new(
            ValidationErrorKind::TypeMismatch,
            parameter_id,
            Some(value.render()),
            format!("Parameter '{}' must be an array of allowed values.", parameter_id),
        ));
        return;
    };

    for entry in entries {
        let Some(actual) = entry.as_str() else {
            errors.push(ValidationError::new(
                ValidationErrorKind::TypeMismatch,
                parameter_id,
                Some(entry.render()),
                format!("Each entry in '{}' must be a string value.", parameter_id),
            ));
            continue;
        };

        if !definition.allowed_values.is_empty() && !definition.allows(actual) {
            errors.push(ValidationError::new(
                ValidationErrorKind::EnumViolation,
                parameter_id,
                Some(actual.to_string()),
                format!(
                    "Value '{}' in '{}' must be one of: {}.",
                    actual,
                    parameter_id,
                    definition.allowed_values.join(", ")
                ),
            ));
        }
    }
}
