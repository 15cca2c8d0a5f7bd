use core_types::{ContentPart, MessageContent, ModelMessage, Role, ToolCallPart, flatten_parts};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{Codec, ensure_non_empty};

/// The messages API rejects requests without a token ceiling.
pub const ANTHROPIC_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Option<Vec<ContentBlock>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text {
        #[serde(default)]
        text: Option<String>,
    },
    #[serde(rename = "tool_use")]
    ToolUse {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicCodec;

impl Codec for AnthropicCodec {
    type Fragment = Value;
    type Response = MessagesResponse;

    fn encode(&self, message: &ModelMessage) -> Value {
        encode_message(message)
    }

    fn decode(&self, response: &MessagesResponse) -> Vec<ContentPart> {
        decode_response(response)
    }
}

impl AnthropicCodec {
    /// System instructions live outside the turn list: the first system message
    /// becomes the top-level `system` field and every other message is a turn.
    pub fn build_request(&self, model: &str, messages: &[ModelMessage]) -> MessagesRequest {
        let system = messages
            .iter()
            .find(|message| message.role == Role::System)
            .map(|message| match &message.content {
                MessageContent::Text(text) => text.clone(),
                MessageContent::Parts(parts) => flatten_parts(parts),
            });

        MessagesRequest {
            model: model.to_string(),
            max_tokens: ANTHROPIC_MAX_TOKENS,
            messages: messages
                .iter()
                .filter(|message| message.role != Role::System)
                .map(|message| self.encode(message))
                .collect(),
            system,
        }
    }
}

pub fn encode_message(message: &ModelMessage) -> Value {
    let content = match &message.content {
        MessageContent::Text(text) => Value::String(text.clone()),
        MessageContent::Parts(parts) => parts.iter().map(content_item).collect(),
    };
    json!({"role": message.role.as_str(), "content": content})
}

fn content_item(part: &ContentPart) -> Value {
    match part {
        ContentPart::Text(part) => json!({"type": "text", "text": part.text}),
        ContentPart::Image(part) => {
            if part.image.starts_with("http://") || part.image.starts_with("https://") {
                json!({"type": "image", "source": {"type": "url", "url": part.image}})
            } else {
                json!({
                    "type": "image",
                    "source": {
                        "type": "base64",
                        "media_type": part.media_type.as_deref().unwrap_or("image/jpeg"),
                        "data": part.image,
                    }
                })
            }
        }
        ContentPart::File(part) => json!({
            "type": "document",
            "source": {
                "type": "base64",
                "media_type": part.media_type,
                "data": part.data,
            }
        }),
        ContentPart::ToolCall(part) => json!({
            "type": "tool_use",
            "id": part.tool_call_id,
            "name": part.tool_name,
            "input": part.input,
        }),
        ContentPart::ToolResult(part) => json!({
            "type": "tool_result",
            "tool_use_id": part.tool_call_id,
            "content": part.output,
        }),
        // no reasoning block on this API
        ContentPart::Reasoning(part) => json!({"type": "text", "text": part.text}),
    }
}

pub fn decode_response(response: &MessagesResponse) -> Vec<ContentPart> {
    let parts = response
        .content
        .iter()
        .flatten()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => {
                Some(ContentPart::text(text.clone().unwrap_or_default()))
            }
            ContentBlock::ToolUse { id, name, input } => {
                Some(ContentPart::ToolCall(ToolCallPart::new(
                    id.clone().unwrap_or_default(),
                    name.clone().unwrap_or_default(),
                    input.clone(),
                )))
            }
            ContentBlock::Unsupported => None,
        })
        .collect();
    ensure_non_empty(parts)
}
