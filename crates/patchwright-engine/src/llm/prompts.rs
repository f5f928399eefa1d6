// ═══════════════════════════════════════════════════════════════════════════════
// PATCH SUGGESTION PROMPT
// ═══════════════════════════════════════════════════════════════════════════════

use patchwright_core::suggest::{MAX_CONTROLS, MIN_CONTROLS};
use patchwright_core::ControlCatalog;

pub const CATALOG_PLACEHOLDER: &str = "{{CONTROL_CATALOG}}";
pub const COUNT_PLACEHOLDER_MIN: &str = "{{MIN_CONTROLS}}";
pub const COUNT_PLACEHOLDER_MAX: &str = "{{MAX_CONTROLS}}";

/// Shared output contract for both structured and plain JSON modes.
const OUTPUT_RULES: &str = r#"OUTPUT (JSON object only, no prose, no markdown fences):
{
  "prompt": "the user's request, verbatim",
  "summary": "one sentence describing the resulting sound",
  "controls": [
    {
      "id": "catalog id, copied exactly",
      "label": "catalog label",
      "group": "catalog group label",
      "value": 512,
      "valueType": "continuous | enumeration | boolean",
      "range": { "min": 0, "max": 1023, "unit": null },
      "allowedValues": ["only for enumeration controls"],
      "explanation": "why this value serves the request",
      "confidence": "low | medium | high"
    }
  ],
  "reasoning": {
    "intentSummary": "what the user is after, in your words",
    "soundDesignNotes": ["at least one concrete note"],
    "assumptions": ["anything you had to guess"]
  }
}"#;

pub const PATCH_SUGGESTION_SYSTEM: &str = r#"You are a sound designer programming a Korg minilogue xd.

Turn the user's description into a focused patch suggestion: between {{MIN_CONTROLS}} and {{MAX_CONTROLS}} controls that matter most for the requested sound. Leave every other control at its current value.

Rules:
- Use only controls from the CONTROL CATALOG below. Copy ids exactly.
- Respect each control's valueType.
- Continuous values must lie inside the listed range.
- Enumeration values must be one of the allowed values, and the control must repeat its allowedValues list.
- Boolean values are true or false.
- Give each control a short explanation and an honest confidence.

CONTROL CATALOG:
{{CONTROL_CATALOG}}

"#;

/// The system prompt with the rendered catalog embedded.
pub fn patch_suggestion_system(controls: &ControlCatalog, limit_per_group: usize) -> String {
    let mut prompt = PATCH_SUGGESTION_SYSTEM
        .replace(COUNT_PLACEHOLDER_MIN, &MIN_CONTROLS.to_string())
        .replace(COUNT_PLACEHOLDER_MAX, &MAX_CONTROLS.to_string())
        .replace(
            CATALOG_PLACEHOLDER,
            &controls.build_prompt_catalog(limit_per_group),
        );
    prompt.push_str(OUTPUT_RULES);
    prompt
}
