use std::sync::Arc;

use core_types::{ContentPart, FilePart, ModelMessage, ModelProvider, ToolCallPart, flatten_parts};
use providers::{
    AnthropicProvider, HttpChatCompletionsClient, HttpMessagesClient, OpenAiCompatibleProvider,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_body(message: serde_json::Value) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{"index": 0, "message": message, "finish_reason": "stop"}],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

#[tokio::test]
async fn openai_round_trip_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "messages": [{"role": "user", "content": "Hi"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(json!({
            "role": "assistant",
            "content": "Hello!",
            "tool_calls": [{
                "id": "call_01",
                "type": "function",
                "function": {"name": "bash", "arguments": "{\"cmd\":\"ls\"}"}
            }]
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpChatCompletionsClient::new(format!("{}/v1", server.uri()), "test-key");
    let provider = OpenAiCompatibleProvider::openai(Arc::new(transport));
    let parts = provider
        .generate_parts("gpt-4o", &[ModelMessage::user("Hi")])
        .await
        .expect("parts");

    assert_eq!(parts.len(), 2);
    assert_eq!(flatten_parts(&parts), "Hello! [Tool Call: bash]");
    let ContentPart::ToolCall(call) = &parts[1] else {
        panic!("expected tool call");
    };
    assert_eq!(call.input, json!("{\"cmd\":\"ls\"}"));
}

#[tokio::test]
async fn fireworks_sends_namespaced_model_and_extra_headers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/inference/v1/chat/completions"))
        .and(header("x-trace", "abc"))
        .and(body_partial_json(json!({
            "model": "accounts/fireworks/models/llama-v3p1-8b-instruct"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(json!({
            "role": "assistant",
            "content": null
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let transport =
        HttpChatCompletionsClient::new(format!("{}/inference/v1/", server.uri()), "fw-key")
            .with_extra_headers(vec![("x-trace".to_string(), "abc".to_string())]);
    let provider = OpenAiCompatibleProvider::fireworks(Arc::new(transport));
    let parts = provider
        .generate_parts("llama-v3p1-8b-instruct", &[ModelMessage::user("Hi")])
        .await
        .expect("parts");

    assert_eq!(parts, vec![ContentPart::empty_text()]);
}

#[tokio::test]
async fn http_error_status_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string(
            r#"{"error":{"message":"Incorrect API key provided","code":"invalid_api_key"}}"#,
        ))
        .mount(&server)
        .await;

    let transport = HttpChatCompletionsClient::new(format!("{}/v1", server.uri()), "bad-key");
    let provider = OpenAiCompatibleProvider::openai(Arc::new(transport));
    let err = provider
        .generate_parts("gpt-4o", &[ModelMessage::user("Hi")])
        .await
        .expect_err("401");
    let err = err.to_string();
    assert!(err.contains("401"), "expected 401 in error: {err}");
}

#[tokio::test]
async fn anthropic_round_trip_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "ant-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-sonnet-4-5",
            "max_tokens": 1024,
            "system": "be nice",
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": "read this"},
                    {"type": "document", "source": {"type": "base64", "media_type": "application/pdf", "data": "JVBERi0="}}
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [
                {"type": "text", "text": "It is a report."},
                {"type": "tool_use", "id": "toolu_01", "name": "save", "input": {"title": "report"}}
            ],
            "stop_reason": "tool_use"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpMessagesClient::new(server.uri(), "ant-key");
    let provider = AnthropicProvider::new(Arc::new(transport));
    let parts = provider
        .generate_parts(
            "claude-sonnet-4-5",
            &[
                ModelMessage::system("be nice"),
                ModelMessage::user(vec![
                    ContentPart::text("read this"),
                    ContentPart::File(FilePart::new("JVBERi0=", "application/pdf")),
                ]),
            ],
        )
        .await
        .expect("parts");

    assert_eq!(
        parts,
        vec![
            ContentPart::text("It is a report."),
            ContentPart::ToolCall(ToolCallPart::new(
                "toolu_01",
                "save",
                json!({"title": "report"})
            )),
        ]
    );
}
