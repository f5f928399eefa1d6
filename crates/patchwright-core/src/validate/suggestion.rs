//! Suggestion mode: a model-proposed partial patch checked against the
//! control view of the catalog.

use super::{ValidationError, ValidationErrorKind, ValidationOutcome};
use crate::catalog::{CatalogControl, ControlCatalog, ValueType};
use crate::suggest::{Suggestion, SuggestionControl, MAX_CONTROLS, MIN_CONTROLS};
use crate::util::format_number;

#[derive(Debug, Clone, Copy)]
pub struct SuggestionValidator<'a> {
    controls: &'a ControlCatalog,
}

impl<'a> SuggestionValidator<'a> {
    pub fn new(controls: &'a ControlCatalog) -> Self {
        Self { controls }
    }

    pub fn validate(&self, suggestion: &Suggestion) -> ValidationOutcome {
        let mut errors = Vec::new();

        let count = suggestion.controls.len();
        if !(MIN_CONTROLS..=MAX_CONTROLS).contains(&count) {
            errors.push(ValidationError::new(
                ValidationErrorKind::ControlCount,
                "controls",
                Some(count.to_string()),
                format!(
                    "Suggestion must contain between {} and {} controls; got {}.",
                    MIN_CONTROLS, MAX_CONTROLS, count
                ),
            ));
        }

        for (index, control) in suggestion.controls.iter().enumerate() {
            self.check_control(index, control, &mut errors);
        }

        let reasoning = &suggestion.reasoning;
        if reasoning.sound_design_notes.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingReasoning,
                "reasoning.soundDesignNotes",
                None,
                "Reasoning must include sound design notes.",
            ));
        }
        if reasoning.intent_summary.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingReasoning,
                "reasoning.intentSummary",
                None,
                "Reasoning must include an intent summary.",
            ));
        }

        if !errors.is_empty() {
            tracing::debug!(errors = errors.len(), "suggestion failed validation");
        }
        ValidationOutcome::from_errors(errors)
    }

    fn check_control(
        &self,
        index: usize,
        control: &SuggestionControl,
        errors: &mut Vec<ValidationError>,
    ) {
        let field = |name: &str| format!("controls[{}].{}", index, name);

        let Some(entry) = self.controls.get(&control.id) else {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownParameter,
                field("id"),
                Some(control.id.clone()),
                format!("Control '{}' is not recognised in the catalog.", control.id),
            ));
            return;
        };

        if !entry.value_type.matches(&control.value_type) {
            errors.push(ValidationError::new(
                ValidationErrorKind::TypeMismatch,
                field("valueType"),
                Some(control.value_type.clone()),
                format!(
                    "Control '{}' has mismatched value type. Expected {}.",
                    control.id,
                    entry.value_type.as_str()
                ),
            ));
        }

        if entry.value_type == ValueType::Enumeration {
            check_enumeration(entry, control, &field, errors);
        }

        if control.confidence_level().is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::ConfidenceError,
                field("confidence"),
                Some(control.confidence.clone()),
                format!(
                    "Control '{}' has invalid confidence '{}'.",
                    control.id, control.confidence
                ),
            ));
        }

        // Values that are not numeric are simply outside the range check.
        if let (Some(range), Some(value)) = (&entry.range, control.value.numeric()) {
            if !range.contains(value) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::RangeViolation,
                    field("value"),
                    Some(format_number(value)),
                    format!(
                        "Control '{}' value {} must be between {} and {}.",
                        control.id,
                        format_number(value),
                        format_number(range.min),
                        format_number(range.max)
                    ),
                ));
            }
        }
    }
}

fn check_enumeration(
    entry: &CatalogControl,
    control: &SuggestionControl,
    field: &dyn Fn(&str) -> String,
    errors: &mut Vec<ValidationError>,
) {
    if entry.allowed_values.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EnumViolation,
            field("id"),
            Some(control.id.clone()),
            format!("Catalog entry for '{}' is missing allowed values.", entry.id),
        ));
        return;
    }

    let provided = control
        .allowed_values
        .as_ref()
        .is_some_and(|values| !values.is_empty());
    if !provided {
        errors.push(ValidationError::new(
            ValidationErrorKind::EnumViolation,
            field("allowedValues"),
            None,
            format!("Control '{}' must include allowedValues list.", control.id),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::suggest::{ControlRange, Reasoning};
    use crate::value::PatchValue;
    use chrono::Utc;

    const BUNDLED: &str = include_str!("../../../../schemas/minilogue-xd/voice-parameters.json");

    fn catalog() -> Catalog {
        Catalog::from_json_str(BUNDLED).unwrap()
    }

    fn control(catalog: &Catalog, id: &str, value: PatchValue) -> SuggestionControl {
        let entry = catalog.controls().get(id).unwrap();
        SuggestionControl {
            id: entry.id.clone(),
            label: entry.label.clone(),
            group: entry.group_label.clone(),
            value,
            value_type: entry.value_type.as_str().to_string(),
            range: entry.range.as_ref().map(|r| ControlRange {
                min: r.min,
                max: r.max,
                unit: r.unit.clone(),
            }),
            allowed_values: if entry.allowed_values.is_empty() {
                None
            } else {
                Some(entry.allowed_values.clone())
            },
            explanation: "shapes the tone".to_string(),
            confidence: "medium".to_string(),
        }
    }

    fn suggestion(controls: Vec<SuggestionControl>) -> Suggestion {
        Suggestion {
            prompt: "warm evolving pad".to_string(),
            summary: "A slow pad".to_string(),
            controls,
            reasoning: Reasoning {
                intent_summary: "Soft attack with a dark filter".to_string(),
                sound_design_notes: vec!["Lower the cutoff".to_string()],
                assumptions: vec![],
            },
            request_id: "req".to_string(),
            client_request_id: "client".to_string(),
            generated_at_utc: Utc::now(),
            model: "test-model".to_string(),
        }
    }

    fn pad_controls(catalog: &Catalog) -> Vec<SuggestionControl> {
        vec![
            control(catalog, "filter.cutoff", PatchValue::Number(320.0)),
            control(catalog, "filter.resonance", PatchValue::Number(180.0)),
            control(catalog, "amp_eg.attack", PatchValue::Number(700.0)),
            control(catalog, "amp_eg.release", PatchValue::Number(800.0)),
            control(catalog, "vco1.wave", PatchValue::from("saw")),
            control(catalog, "vco2.sync", PatchValue::Bool(false)),
        ]
    }

    fn kinds(outcome: &ValidationOutcome) -> Vec<ValidationErrorKind> {
        outcome.errors().iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_well_formed_suggestion_passes() {
        let catalog = catalog();
        let outcome = SuggestionValidator::new(catalog.controls()).validate(&suggestion(pad_controls(&catalog)));
        assert_eq!(outcome, ValidationOutcome::Success);
    }

    #[test]
    fn test_four_controls_rejected_even_when_each_is_valid() {
        let catalog = catalog();
        let mut controls = pad_controls(&catalog);
        controls.truncate(4);
        let outcome = SuggestionValidator::new(catalog.controls()).validate(&suggestion(controls));
        assert_eq!(kinds(&outcome), vec![ValidationErrorKind::ControlCount]);
        assert_eq!(outcome.errors()[0].field, "controls");
    }

    #[test]
    fn test_twelve_controls_rejected() {
        let catalog = catalog();
        let mut controls = pad_controls(&catalog);
        controls.extend(pad_controls(&catalog));
        assert_eq!(controls.len(), 12);
        let outcome = SuggestionValidator::new(catalog.controls()).validate(&suggestion(controls));
        assert_eq!(kinds(&outcome), vec![ValidationErrorKind::ControlCount]);
    }

    #[test]
    fn test_count_violation_does_not_suppress_control_checks() {
        let catalog = catalog();
        let mut controls = pad_controls(&catalog);
        controls.truncate(3);
        controls[0].confidence = "certain".to_string();
        let outcome = SuggestionValidator::new(catalog.controls()).validate(&suggestion(controls));
        assert_eq!(
            kinds(&outcome),
            vec![ValidationErrorKind::ControlCount, ValidationErrorKind::ConfidenceError]
        );
    }

    #[test]
    fn test_ten_controls_with_one_unknown_id() {
        let catalog = catalog();
        let mut controls = pad_controls(&catalog);
        controls.push(control(&catalog, "lfo.rate", PatchValue::Number(100.0)));
        controls.push(control(&catalog, "lfo.intensity", PatchValue::Number(-20.0)));
        controls.push(control(&catalog, "master.tempo", PatchValue::Number(90.0)));
        let mut ghost = control(&catalog, "eg.decay", PatchValue::Number(10.0));
        ghost.id = "filter.wobble".to_string();
        controls.push(ghost);
        assert_eq!(controls.len(), 10);

        let outcome = SuggestionValidator::new(catalog.controls()).validate(&suggestion(controls));
        assert_eq!(kinds(&outcome), vec![ValidationErrorKind::UnknownParameter]);
        let error = &outcome.errors()[0];
        assert_eq!(error.field, "controls[9].id");
        assert_eq!(error.value.as_deref(), Some("filter.wobble"));
        assert!(error.message.contains("filter.wobble"));
    }

    #[test]
    fn test_value_type_mismatch_names_expected_type() {
        let catalog = catalog();
        let mut controls = pad_controls(&catalog);
        controls[4].value_type = "continuous".to_string();
        let outcome = SuggestionValidator::new(catalog.controls()).validate(&suggestion(controls));
        assert_eq!(kinds(&outcome), vec![ValidationErrorKind::TypeMismatch]);
        assert!(outcome.errors()[0].message.contains("Expected enumeration"));
    }

    #[test]
    fn test_value_type_matches_case_insensitively() {
        let catalog = catalog();
        let mut controls = pad_controls(&catalog);
        controls[5].value_type = "Boolean".to_string();
        controls[0].confidence = "HIGH".to_string();
        let outcome = SuggestionValidator::new(catalog.controls()).validate(&suggestion(controls));
        assert!(outcome.is_valid());
    }

    #[test]
    fn test_enumeration_requires_allowed_values_list() {
        let catalog = catalog();
        let mut controls = pad_controls(&catalog);
        controls[4].allowed_values = Some(vec![]);
        let outcome = SuggestionValidator::new(catalog.controls()).validate(&suggestion(controls));
        assert_eq!(kinds(&outcome), vec![ValidationErrorKind::EnumViolation]);
        assert_eq!(outcome.errors()[0].field, "controls[4].allowedValues");
    }

    #[test]
    fn test_catalog_enumeration_without_values_is_flagged() {
        let catalog = Catalog::from_json_str(
            r#"{"parameter_groups": [{"id": "g", "parameters": [
                {"id": "mode", "type": "enum"},
                {"id": "a", "type": "integer"},
                {"id": "b", "type": "integer"},
                {"id": "c", "type": "integer"},
                {"id": "d", "type": "integer"}
            ]}]}"#,
        )
        .unwrap();
        let mut controls: Vec<SuggestionControl> = ["a", "b", "c", "d"]
            .iter()
            .map(|id| control(&catalog, id, PatchValue::Number(1.0)))
            .collect();
        let mut mode = control(&catalog, "mode", PatchValue::from("x"));
        mode.allowed_values = Some(vec!["x".to_string()]);
        controls.push(mode);

        let outcome = SuggestionValidator::new(catalog.controls()).validate(&suggestion(controls));
        assert_eq!(kinds(&outcome), vec![ValidationErrorKind::EnumViolation]);
        assert!(outcome.errors()[0].message.contains("missing allowed values"));
    }

    #[test]
    fn test_range_violation_reports_both_bounds() {
        let catalog = catalog();
        let mut controls = pad_controls(&catalog);
        controls[0].value = PatchValue::Number(2000.0);
        let outcome = SuggestionValidator::new(catalog.controls()).validate(&suggestion(controls));
        assert_eq!(kinds(&outcome), vec![ValidationErrorKind::RangeViolation]);
        let message = &outcome.errors()[0].message;
        assert!(message.contains("between 0 and 1023"));
    }

    #[test]
    fn test_numeric_strings_are_range_checked() {
        let catalog = catalog();
        let mut controls = pad_controls(&catalog);
        controls[1].value = PatchValue::from("-5");
        let outcome = SuggestionValidator::new(catalog.controls()).validate(&suggestion(controls));
        assert_eq!(kinds(&outcome), vec![ValidationErrorKind::RangeViolation]);
    }

    #[test]
    fn test_non_numeric_values_skip_range_check() {
        let catalog = catalog();
        let mut controls = pad_controls(&catalog);
        controls[0].value = PatchValue::from("fully open");
        let outcome = SuggestionValidator::new(catalog.controls()).validate(&suggestion(controls));
        assert!(outcome.is_valid());
    }

    #[test]
    fn test_reasoning_requires_notes_and_intent() {
        let catalog = catalog();
        let mut suggestion = suggestion(pad_controls(&catalog));
        suggestion.reasoning.sound_design_notes.clear();
        suggestion.reasoning.intent_summary = "   ".to_string();
        let outcome = SuggestionValidator::new(catalog.controls()).validate(&suggestion);
        assert_eq!(
            kinds(&outcome),
            vec![ValidationErrorKind::MissingReasoning, ValidationErrorKind::MissingReasoning]
        );
        assert_eq!(outcome.errors()[0].field, "reasoning.soundDesignNotes");
        assert_eq!(outcome.errors()[1].field, "reasoning.intentSummary");
    }
}
