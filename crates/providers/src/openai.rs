use core_types::{
    ContentPart, FilePart, ImagePart, MessageContent, ModelMessage, ProviderOptions,
    ReasoningPart, ToolCallPart, display_value,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{Codec, ensure_non_empty};

pub const FIREWORKS_MODEL_PREFIX: &str = "accounts/fireworks/models/";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<ChatResponseMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ChatToolCall>>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub reasoning_content: Option<String>,
}

// Every field is optional: compatible servers send `null` as freely as they omit keys.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatToolCall {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<ChatFunctionCall>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatFunctionCall {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

/// A message encoded for the chat-completions API. Tool results do not fit the
/// message shape and are carried beside it as standalone fragments.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiFragment {
    pub message: Value,
    pub tool_results: Vec<Value>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiCodec;

impl Codec for OpenAiCodec {
    type Fragment = OpenAiFragment;
    type Response = ChatCompletionResponse;

    fn encode(&self, message: &ModelMessage) -> OpenAiFragment {
        encode_message(message)
    }

    fn decode(&self, response: &ChatCompletionResponse) -> Vec<ContentPart> {
        decode_response(response)
    }
}

pub fn encode_message(message: &ModelMessage) -> OpenAiFragment {
    let mut fragment = Map::new();
    fragment.insert("role".to_string(), json!(message.role.as_str()));
    let mut tool_results = Vec::new();

    match &message.content {
        MessageContent::Text(text) => {
            fragment.insert("content".to_string(), Value::String(text.clone()));
        }
        MessageContent::Parts(parts) => {
            let mut items = Vec::new();
            let mut tool_calls = Vec::new();

            for part in parts {
                match part {
                    ContentPart::Text(part) => {
                        items.push(json!({"type": "text", "text": part.text}));
                    }
                    ContentPart::Image(part) => items.push(image_item(part)),
                    ContentPart::File(part) => items.push(file_item(part)),
                    ContentPart::Reasoning(part) => items.push(reasoning_item(part)),
                    ContentPart::ToolCall(part) => tool_calls.push(tool_call_item(part)),
                    ContentPart::ToolResult(part) => tool_results.push(json!({
                        "type": "tool_result",
                        "tool_call_id": part.tool_call_id,
                        "content": part.output,
                    })),
                }
            }

            if let Some(content) = collapse_content(items) {
                fragment.insert("content".to_string(), content);
            }
            if !tool_calls.is_empty() {
                fragment.insert("tool_calls".to_string(), Value::Array(tool_calls));
            }
        }
    }

    OpenAiFragment {
        message: Value::Object(fragment),
        tool_results,
    }
}

fn image_item(part: &ImagePart) -> Value {
    let mut image_url = Map::new();
    image_url.insert("url".to_string(), Value::String(part.image.clone()));
    if let Some(detail) = forwarded_option(&part.provider_options, "detail") {
        image_url.insert("detail".to_string(), detail);
    }
    json!({"type": "image_url", "image_url": image_url})
}

// Image files become data-URI images with an empty companion text; anything
// else becomes a filename placeholder with no image payload.
fn file_item(part: &FilePart) -> Value {
    if part.is_image() {
        json!({
            "type": "image_url",
            "image_url": {"url": format!("data:{};base64,{}", part.media_type, part.data)},
            "text": "",
        })
    } else {
        json!({
            "type": "text",
            "image_url": {},
            "text": format!("File: {}", part.filename.as_deref().unwrap_or("unnamed")),
        })
    }
}

fn reasoning_item(part: &ReasoningPart) -> Value {
    json!({"type": "text", "text": format!("[Reasoning] {}", part.text)})
}

fn tool_call_item(part: &ToolCallPart) -> Value {
    json!({
        "id": part.tool_call_id,
        "type": "function",
        "function": {
            "name": part.tool_name,
            "arguments": display_value(&part.input),
        }
    })
}

fn forwarded_option(options: &ProviderOptions, key: &str) -> Option<Value> {
    options.get(key).cloned()
}

fn collapse_content(mut items: Vec<Value>) -> Option<Value> {
    match items.len() {
        0 => None,
        1 => {
            let item = items.pop()?;
            let is_text = item.get("type").and_then(Value::as_str) == Some("text");
            let text = match item.get("text").and_then(Value::as_str) {
                Some(text) if is_text => Some(text.to_string()),
                _ => None,
            };
            Some(text.map(Value::String).unwrap_or(item))
        }
        _ => Some(Value::Array(items)),
    }
}

/// Emits text, then every tool call in response order, then reasoning.
pub fn decode_response(response: &ChatCompletionResponse) -> Vec<ContentPart> {
    let mut parts = Vec::new();

    let message = response
        .choices
        .as_deref()
        .and_then(<[ChatChoice]>::first)
        .and_then(|choice| choice.message.as_ref());

    if let Some(message) = message {
        if let Some(text) = message.content.as_deref().filter(|text| !text.is_empty()) {
            parts.push(ContentPart::text(text));
        }

        for call in message.tool_calls.iter().flatten() {
            let function = call.function.as_ref();
            let name = function.and_then(|function| function.name.clone());
            let arguments = function
                .and_then(|function| function.arguments.clone())
                .map_or(Value::Null, Value::String);
            parts.push(ContentPart::ToolCall(ToolCallPart::new(
                call.id.clone().unwrap_or_default(),
                name.unwrap_or_default(),
                arguments,
            )));
        }

        let reasoning = [&message.reasoning, &message.reasoning_content]
            .into_iter()
            .flatten()
            .find(|text| !text.is_empty());
        if let Some(reasoning) = reasoning {
            parts.push(ContentPart::Reasoning(ReasoningPart::new(reasoning.clone())));
        }
    }

    ensure_non_empty(parts)
}
