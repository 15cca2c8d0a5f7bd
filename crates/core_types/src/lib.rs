use std::fmt;
use std::str::FromStr;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

mod error;
mod message;
mod part;

pub use error::{LlmError, Result};
pub use message::{MessageContent, ModelMessage, Role};
pub use part::{
    ContentPart, FilePart, ImagePart, PART_TAGS, ProviderOptions, ReasoningPart, TextPart,
    ToolCallPart, ToolResultPart,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    Fireworks,
}

impl ProviderId {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Anthropic => "anthropic",
            ProviderId::Fireworks => "fireworks",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderId::OpenAi),
            "anthropic" => Ok(ProviderId::Anthropic),
            "fireworks" => Ok(ProviderId::Fireworks),
            _ => Err(LlmError::UnrecognizedProvider {
                provider: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: ProviderId,
    pub base_url: String,
    /// Environment variable consulted when `api_key` is not set inline.
    pub api_key_env: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub extra_headers: Vec<(String, String)>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

impl ProviderConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

/// Outcome of one generation call. `text` is a lossy flattening of `parts`
/// kept for plain-text consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateTextResult {
    pub text: String,
    pub parts: Vec<ContentPart>,
}

impl GenerateTextResult {
    pub fn from_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            text: flatten_parts(&parts),
            parts,
        }
    }
}

pub fn flatten_parts(parts: &[ContentPart]) -> String {
    parts
        .iter()
        .map(|part| match part {
            ContentPart::Text(part) => part.text.clone(),
            ContentPart::Reasoning(part) => format!("[Reasoning: {}]", part.text),
            ContentPart::ToolCall(part) => format!("[Tool Call: {}]", part.tool_name),
            ContentPart::ToolResult(part) => {
                format!("[Tool Result: {}]", display_value(&part.output))
            }
            ContentPart::Image(_) => "[Image]".to_string(),
            ContentPart::File(part) => {
                format!("[File: {}]", part.filename.as_deref().unwrap_or("unnamed"))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Strings render bare, everything else as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// One provider family bound to its transport. Implementations encode the
/// messages, perform exactly one transport call and decode the reply.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    async fn generate_parts(
        &self,
        model: &str,
        messages: &[ModelMessage],
    ) -> AnyResult<Vec<ContentPart>>;
}
