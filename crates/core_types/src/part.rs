use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LlmError, Result};

/// Opaque per-part extension bag. Codecs only read keys they know about
/// (for example `detail` on images) and never interpret the rest.
pub type ProviderOptions = Map<String, Value>;

pub const PART_TAGS: [&str; 6] = [
    "text",
    "image",
    "file",
    "reasoning",
    "tool-call",
    "tool-result",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "text")]
    Text(TextPart),
    #[serde(rename = "image")]
    Image(ImagePart),
    #[serde(rename = "file")]
    File(FilePart),
    #[serde(rename = "reasoning")]
    Reasoning(ReasoningPart),
    #[serde(rename = "tool-call")]
    ToolCall(ToolCallPart),
    #[serde(rename = "tool-result")]
    ToolResult(ToolResultPart),
}

impl ContentPart {
    /// Parses a part from loosely typed JSON, rejecting tags outside the closed set
    /// before attempting to match the variant's field set.
    pub fn from_value(value: Value) -> Result<Self> {
        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if !PART_TAGS.contains(&tag) {
            return Err(LlmError::UnrecognizedPartType {
                tag: tag.to_string(),
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ContentPart::Text(_) => "text",
            ContentPart::Image(_) => "image",
            ContentPart::File(_) => "file",
            ContentPart::Reasoning(_) => "reasoning",
            ContentPart::ToolCall(_) => "tool-call",
            ContentPart::ToolResult(_) => "tool-result",
        }
    }

    pub fn provider_options(&self) -> &ProviderOptions {
        match self {
            ContentPart::Text(part) => &part.provider_options,
            ContentPart::Image(part) => &part.provider_options,
            ContentPart::File(part) => &part.provider_options,
            ContentPart::Reasoning(part) => &part.provider_options,
            ContentPart::ToolCall(part) => &part.provider_options,
            ContentPart::ToolResult(part) => &part.provider_options,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text(TextPart::new(text))
    }

    pub fn empty_text() -> Self {
        Self::text(String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPart {
    pub text: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub provider_options: ProviderOptions,
}

impl TextPart {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            provider_options: ProviderOptions::new(),
        }
    }
}

/// `image` holds either a URL or base64 data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePart {
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub provider_options: ProviderOptions,
}

impl ImagePart {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            media_type: None,
            provider_options: ProviderOptions::new(),
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.provider_options
            .insert("detail".to_string(), Value::String(detail.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePart {
    /// Base64 payload.
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub provider_options: ProviderOptions,
}

impl FilePart {
    pub fn new(data: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            filename: None,
            media_type: media_type.into(),
            provider_options: ProviderOptions::new(),
        }
    }

    pub fn from_bytes(bytes: &[u8], media_type: impl Into<String>) -> Self {
        Self::new(BASE64.encode(bytes), media_type)
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningPart {
    pub text: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub provider_options: ProviderOptions,
}

impl ReasoningPart {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            provider_options: ProviderOptions::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallPart {
    pub tool_call_id: String,
    pub tool_name: String,
    pub input: Value,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub provider_options: ProviderOptions,
    #[serde(default)]
    pub provider_executed: Option<bool>,
}

impl ToolCallPart {
    pub fn new(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        input: impl Into<Value>,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            input: input.into(),
            provider_options: ProviderOptions::new(),
            provider_executed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultPart {
    pub tool_call_id: String,
    pub tool_name: String,
    pub output: Value,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub provider_options: ProviderOptions,
    #[serde(default)]
    pub provider_executed: Option<bool>,
}

impl ToolResultPart {
    pub fn new(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        output: impl Into<Value>,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            output: output.into(),
            provider_options: ProviderOptions::new(),
            provider_executed: None,
        }
    }
}
