use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use core_types::{ContentPart, ModelMessage, ModelProvider, ProviderId};
use tracing::{debug, warn};

pub mod anthropic;
mod http;
pub mod openai;

pub use anthropic::{AnthropicCodec, MessagesRequest, MessagesResponse};
pub use http::{HttpChatCompletionsClient, HttpMessagesClient};
pub use openai::{
    ChatCompletionRequest, ChatCompletionResponse, FIREWORKS_MODEL_PREFIX, OpenAiCodec,
    OpenAiFragment,
};

/// Translation between the normalized message model and one provider's wire shape.
pub trait Codec {
    type Fragment;
    type Response;

    fn encode(&self, message: &ModelMessage) -> Self::Fragment;
    fn decode(&self, response: &Self::Response) -> Vec<ContentPart>;
}

#[async_trait]
pub trait ChatCompletionsTransport: Send + Sync {
    async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse>;
}

#[async_trait]
pub trait MessagesTransport: Send + Sync {
    async fn create_message(&self, request: &MessagesRequest) -> Result<MessagesResponse>;
}

pub(crate) fn ensure_non_empty(mut parts: Vec<ContentPart>) -> Vec<ContentPart> {
    if parts.is_empty() {
        parts.push(ContentPart::empty_text());
    }
    parts
}

pub struct OpenAiCompatibleProvider {
    id: ProviderId,
    transport: Arc<dyn ChatCompletionsTransport>,
    model_prefix: Option<String>,
    codec: OpenAiCodec,
}

impl OpenAiCompatibleProvider {
    pub fn openai(transport: Arc<dyn ChatCompletionsTransport>) -> Self {
        Self {
            id: ProviderId::OpenAi,
            transport,
            model_prefix: None,
            codec: OpenAiCodec,
        }
    }

    /// Same wire format, but model ids are namespaced under the account path.
    pub fn fireworks(transport: Arc<dyn ChatCompletionsTransport>) -> Self {
        Self {
            id: ProviderId::Fireworks,
            transport,
            model_prefix: Some(FIREWORKS_MODEL_PREFIX.to_string()),
            codec: OpenAiCodec,
        }
    }

    pub fn build_request(&self, model: &str, messages: &[ModelMessage]) -> ChatCompletionRequest {
        let mut wire_messages = Vec::with_capacity(messages.len());
        for message in messages {
            let fragment = self.codec.encode(message);
            if !fragment.tool_results.is_empty() {
                debug!(
                    provider = %self.id,
                    dropped = fragment.tool_results.len(),
                    "tool result fragments are not sent on chat completions"
                );
            }
            wire_messages.push(fragment.message);
        }

        let model = match &self.model_prefix {
            Some(prefix) => format!("{prefix}{model}"),
            None => model.to_string(),
        };
        ChatCompletionRequest {
            model,
            messages: wire_messages,
        }
    }
}

#[async_trait]
impl ModelProvider for OpenAiCompatibleProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn generate_parts(
        &self,
        model: &str,
        messages: &[ModelMessage],
    ) -> Result<Vec<ContentPart>> {
        let request = self.build_request(model, messages);
        debug!(
            provider = %self.id,
            model = %request.model,
            messages = request.messages.len(),
            "sending chat completion"
        );
        let response = self.transport.create_chat_completion(&request).await?;
        let parts = self.codec.decode(&response);
        if response.choices.as_ref().is_none_or(Vec::is_empty) {
            warn!(
                provider = %self.id,
                model = %request.model,
                "chat completion returned no choices"
            );
        }
        Ok(parts)
    }
}

pub struct AnthropicProvider {
    transport: Arc<dyn MessagesTransport>,
    codec: AnthropicCodec,
}

impl AnthropicProvider {
    pub fn new(transport: Arc<dyn MessagesTransport>) -> Self {
        Self {
            transport,
            codec: AnthropicCodec,
        }
    }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    async fn generate_parts(
        &self,
        model: &str,
        messages: &[ModelMessage],
    ) -> Result<Vec<ContentPart>> {
        let request = self.codec.build_request(model, messages);
        debug!(
            model,
            turns = request.messages.len(),
            has_system = request.system.is_some(),
            "sending anthropic message"
        );
        let response = self.transport.create_message(&request).await?;
        if response.content.as_ref().is_none_or(Vec::is_empty) {
            warn!(model, "anthropic message returned no content blocks");
        }
        Ok(self.codec.decode(&response))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::anyhow;
    use core_types::{ToolResultPart, flatten_parts};
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct RecordingChat {
        requests: Mutex<Vec<ChatCompletionRequest>>,
    }

    #[async_trait]
    impl ChatCompletionsTransport for RecordingChat {
        async fn create_chat_completion(
            &self,
            request: &ChatCompletionRequest,
        ) -> Result<ChatCompletionResponse> {
            self.requests
                .lock()
                .map_err(|_| anyhow!("poisoned"))?
                .push(request.clone());
            Ok(serde_json::from_value(json!({
                "choices": [{"message": {"content": "pong"}}]
            }))?)
        }
    }

    struct FailingMessages;

    #[async_trait]
    impl MessagesTransport for FailingMessages {
        async fn create_message(&self, _request: &MessagesRequest) -> Result<MessagesResponse> {
            Err(anyhow!("rate limited"))
        }
    }

    #[tokio::test]
    async fn fireworks_prefixes_model_id() {
        let transport = Arc::new(RecordingChat::default());
        let provider = OpenAiCompatibleProvider::fireworks(transport.clone());
        let parts = provider
            .generate_parts("deepseek-r1", &[ModelMessage::user("ping")])
            .await
            .expect("parts");
        assert_eq!(flatten_parts(&parts), "pong");

        let requests = transport.requests.lock().expect("lock");
        assert_eq!(requests[0].model, "accounts/fireworks/models/deepseek-r1");
        assert_eq!(requests[0].messages, vec![json!({"role": "user", "content": "ping"})]);
    }

    #[test]
    fn openai_keeps_model_id_and_drops_tool_results() {
        let provider = OpenAiCompatibleProvider::openai(Arc::new(RecordingChat::default()));
        let request = provider.build_request(
            "gpt-4o",
            &[ModelMessage::assistant(vec![ContentPart::ToolResult(
                ToolResultPart::new("c1", "sum", json!(3)),
            )])],
        );
        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.messages, vec![json!({"role": "assistant"})]);
    }

    #[tokio::test]
    async fn transport_errors_pass_through() {
        let provider = AnthropicProvider::new(Arc::new(FailingMessages));
        let err = provider
            .generate_parts("claude-sonnet-4-5", &[ModelMessage::user("hi")])
            .await
            .expect_err("transport failure");
        assert_eq!(err.to_string(), "rate limited");
    }
}
