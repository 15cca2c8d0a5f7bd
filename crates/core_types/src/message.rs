use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{LlmError, Result};
use crate::part::ContentPart;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// A string is plain text; anything else must be a list of parts, each
    /// checked against the closed tag set.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(text) => Ok(MessageContent::Text(text)),
            other => serde_json::from_value::<Vec<Value>>(other)?
                .into_iter()
                .map(ContentPart::from_value)
                .collect::<Result<Vec<_>>>()
                .map(MessageContent::Parts),
        }
    }
}

impl<'de> Deserialize<'de> for MessageContent {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        MessageContent::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl From<&str> for MessageContent {
    fn from(value: &str) -> Self {
        MessageContent::Text(value.to_string())
    }
}

impl From<String> for MessageContent {
    fn from(value: String) -> Self {
        MessageContent::Text(value)
    }
}

impl From<Vec<ContentPart>> for MessageContent {
    fn from(value: Vec<ContentPart>) -> Self {
        MessageContent::Parts(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMessage {
    pub role: Role,
    pub content: MessageContent,
}

#[derive(Deserialize)]
struct RawMessage {
    role: Role,
    content: Value,
}

impl ModelMessage {
    pub fn new(role: Role, content: impl Into<MessageContent>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Like deserializing, but keeps the typed error for unknown part tags.
    pub fn from_value(value: Value) -> Result<Self> {
        let raw: RawMessage = serde_json::from_value(value)?;
        Ok(Self::new(raw.role, MessageContent::from_value(raw.content)?))
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, MessageContent::Text(content.into()))
    }

    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Checks the role-specific content shape: system messages carry plain text,
    /// user parts are limited to text, image and file, assistant parts are unrestricted.
    pub fn validate(&self) -> Result<()> {
        let parts = match &self.content {
            MessageContent::Text(_) => return Ok(()),
            MessageContent::Parts(parts) => parts,
        };

        match self.role {
            Role::System => Err(LlmError::InvalidMessage {
                role: self.role,
                reason: "content must be plain text",
            }),
            Role::User => {
                let allowed = parts.iter().all(|part| {
                    matches!(
                        part,
                        ContentPart::Text(_) | ContentPart::Image(_) | ContentPart::File(_)
                    )
                });
                if allowed {
                    Ok(())
                } else {
                    Err(LlmError::InvalidMessage {
                        role: self.role,
                        reason: "parts are limited to text, image and file",
                    })
                }
            }
            Role::Assistant => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::part::{ImagePart, ReasoningPart, ToolCallPart};

    #[test]
    fn deserializes_text_and_part_content() {
        let plain: ModelMessage =
            serde_json::from_value(json!({"role": "user", "content": "hi"})).expect("plain");
        assert_eq!(plain.content, MessageContent::Text("hi".to_string()));

        let parts: ModelMessage = serde_json::from_value(json!({
            "role": "assistant",
            "content": [{"type": "reasoning", "text": "hmm"}]
        }))
        .expect("parts");
        assert_eq!(
            parts.content,
            MessageContent::Parts(vec![ContentPart::Reasoning(ReasoningPart::new("hmm"))])
        );
    }

    #[test]
    fn unknown_part_tag_in_message_is_named() {
        let value = json!({"role": "user", "content": [{"type": "audio", "data": "x"}]});

        let err = ModelMessage::from_value(value.clone()).expect_err("unknown tag");
        assert!(matches!(err, LlmError::UnrecognizedPartType { ref tag } if tag == "audio"));

        let err = serde_json::from_value::<ModelMessage>(value).expect_err("unknown tag");
        assert!(err.to_string().contains("`audio`"), "unexpected error: {err}");
    }

    #[test]
    fn message_content_must_be_text_or_parts() {
        let err = ModelMessage::from_value(json!({"role": "user", "content": 7}))
            .expect_err("number content");
        assert!(matches!(err, LlmError::MalformedPart(_)));

        let message = ModelMessage::from_value(json!({
            "role": "user",
            "content": [{"type": "text", "text": "hi"}]
        }))
        .expect("parts");
        assert_eq!(message, ModelMessage::user(vec![ContentPart::text("hi")]));
    }

    #[test]
    fn user_message_rejects_tool_calls() {
        let message = ModelMessage::user(vec![
            ContentPart::text("look"),
            ContentPart::ToolCall(ToolCallPart::new("c1", "f", json!({}))),
        ]);
        let err = message.validate().expect_err("tool call in user message");
        assert!(matches!(err, LlmError::InvalidMessage { role: Role::User, .. }));
    }

    #[test]
    fn system_message_rejects_parts() {
        let message = ModelMessage::new(Role::System, vec![ContentPart::text("be nice")]);
        assert!(message.validate().is_err());
        assert!(ModelMessage::system("be nice").validate().is_ok());
    }

    #[test]
    fn assistant_message_accepts_every_part() {
        let message = ModelMessage::assistant(vec![
            ContentPart::Image(ImagePart::new("https://example.com/a.png")),
            ContentPart::Reasoning(ReasoningPart::new("thinking")),
            ContentPart::ToolCall(ToolCallPart::new("c1", "f", json!({}))),
        ]);
        assert!(message.validate().is_ok());
    }
}
