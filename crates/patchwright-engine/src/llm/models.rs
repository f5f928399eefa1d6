use serde::Deserialize;

/// Model name used when neither the reply nor the suggestion names one.
pub const UNKNOWN_MODEL: &str = "unknown";

/// Text and bookkeeping returned by one chat completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub content: String,
    /// Model that actually served the request, when the provider reports it.
    pub model: Option<String>,
    pub usage: Option<Usage>,
}

impl ModelReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }
}

/// API usage information from the model provider.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_tolerates_missing_fields() {
        let usage: Usage = serde_json::from_str(r#"{"total_tokens": 42}"#).unwrap();
        assert_eq!(usage.total_tokens, 42);
        assert_eq!(usage.prompt_tokens, 0);
    }
}
