use crate::error::ModelError;
use patchwright_core::suggest::{MAX_CONTROLS, MIN_CONTROLS};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Name the strict response schema is registered under.
pub const PATCH_SUGGESTION_SCHEMA_NAME: &str = "patch_suggestion";

/// Sampling temperature for suggestion requests.
const SUGGESTION_TEMPERATURE: f32 = 0.4;

/// Response format configuration.
/// Supports both plain JSON mode and structured output with a schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<JsonSchemaWrapper>,
}

/// Wrapper for JSON Schema in structured output mode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonSchemaWrapper {
    pub name: String,
    /// Whether to strictly enforce the schema
    pub strict: bool,
    pub schema: serde_json::Value,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            format_type: "json_object".to_string(),
            json_schema: None,
        }
    }

    pub fn patch_suggestion_schema() -> Self {
        Self {
            format_type: "json_schema".to_string(),
            json_schema: Some(JsonSchemaWrapper {
                name: PATCH_SUGGESTION_SCHEMA_NAME.to_string(),
                strict: true,
                schema: patch_suggestion_schema(),
            }),
        }
    }

    pub fn is_structured(&self) -> bool {
        self.json_schema.is_some()
    }
}

/// Outcome of negotiating structured output with a model.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredOutput {
    Supported(ResponseFormat),
    Unsupported { reason: String },
}

impl StructuredOutput {
    /// What every request starts with: the strict suggestion schema.
    pub fn preferred() -> Self {
        StructuredOutput::Supported(ResponseFormat::patch_suggestion_schema())
    }

    /// The format to send. Unsupported falls back to plain JSON mode.
    pub fn response_format(&self) -> ResponseFormat {
        match self {
            StructuredOutput::Supported(format) => format.clone(),
            StructuredOutput::Unsupported { .. } => ResponseFormat::json_object(),
        }
    }

    /// Downgrade after a model rejected the structured format.
    pub fn downgrade(error: &ModelError) -> Option<Self> {
        unsupported_format_reason(error).map(|reason| StructuredOutput::Unsupported { reason })
    }
}

/// Recognise a rejection caused by the model not accepting the requested
/// `response_format`. Anything else is a real failure and is not retried.
pub fn unsupported_format_reason(error: &ModelError) -> Option<String> {
    let ModelError::Rejected { status, body } = error else {
        return None;
    };
    if !matches!(status, 400 | 422) {
        return None;
    }
    let lower = body.to_ascii_lowercase();
    let mentions_format = lower.contains("response_format")
        || lower.contains("json_schema")
        || lower.contains("structured output");
    let unsupported = lower.contains("not supported")
        || lower.contains("unsupported")
        || lower.contains("does not support");
    if mentions_format && unsupported {
        Some(body.trim().to_string())
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// Chat completion request for one suggestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

impl ChatRequest {
    pub fn new(model: &str, system: &str, user: &str, response_format: ResponseFormat) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: SUGGESTION_TEMPERATURE,
            response_format,
        }
    }

    /// Same request with a different response format.
    pub fn with_response_format(mut self, response_format: ResponseFormat) -> Self {
        self.response_format = response_format;
        self
    }
}

fn patch_suggestion_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": [
            "prompt",
            "summary",
            "controls",
            "reasoning",
            "requestId",
            "clientRequestId",
            "generatedAtUtc",
            "model"
        ],
        "properties": {
            "prompt": { "type": "string" },
            "summary": { "type": "string" },
            "requestId": { "type": "string" },
            "clientRequestId": { "type": "string" },
            "generatedAtUtc": { "type": "string", "format": "date-time" },
            "model": { "type": "string" },
            "controls": {
                "type": "array",
                "minItems": MIN_CONTROLS,
                "maxItems": MAX_CONTROLS,
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["id", "label", "group", "value", "valueType", "explanation", "confidence"],
                    "properties": {
                        "id": { "type": "string" },
                        "label": { "type": "string" },
                        "group": { "type": "string" },
                        "valueType": { "type": "string", "enum": ["continuous", "enumeration", "boolean"] },
                        "value": { "anyOf": [{ "type": "number" }, { "type": "string" }, { "type": "boolean" }] },
                        "explanation": { "type": "string" },
                        "confidence": { "type": "string", "enum": ["low", "medium", "high"] },
                        "allowedValues": { "type": "array", "items": { "type": "string" } },
                        "range": {
                            "type": ["object", "null"],
                            "required": ["min", "max"],
                            "properties": {
                                "min": { "type": "number" },
                                "max": { "type": "number" },
                                "unit": { "type": ["string", "null"] }
                            }
                        }
                    }
                }
            },
            "reasoning": {
                "type": "object",
                "additionalProperties": false,
                "required": ["intentSummary", "soundDesignNotes", "assumptions"],
                "properties": {
                    "intentSummary": { "type": "string" },
                    "soundDesignNotes": { "type": "array", "items": { "type": "string" }, "minItems": 1 },
                    "assumptions": { "type": "array", "items": { "type": "string" } }
                }
            }
        }
    })
}
