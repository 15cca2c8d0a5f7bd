use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use core_types::ProviderConfig;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::anthropic::{MessagesRequest, MessagesResponse};
use crate::openai::{ChatCompletionRequest, ChatCompletionResponse};
use crate::{ChatCompletionsTransport, MessagesTransport};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Chat-completions client for OpenAI and wire-compatible endpoints.
#[derive(Debug, Clone)]
pub struct HttpChatCompletionsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    extra_headers: Vec<(String, String)>,
}

impl HttpChatCompletionsClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            extra_headers: Vec::new(),
        }
    }

    pub fn from_config(provider: &ProviderConfig) -> Result<Self> {
        let api_key = provider
            .resolve_api_key()
            .ok_or_else(|| anyhow!("provider {} missing api key", provider.id))?;
        Ok(Self::new(provider.base_url.clone(), api_key)
            .with_extra_headers(provider.extra_headers.clone()))
    }

    pub fn with_extra_headers(mut self, extra_headers: Vec<(String, String)>) -> Self {
        self.extra_headers = extra_headers;
        self
    }
}

#[async_trait]
impl ChatCompletionsTransport for HttpChatCompletionsClient {
    async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key.trim()))
                .context("invalid authorization header")?,
        );
        apply_extra_headers(&mut headers, &self.extra_headers)?;
        post_json(&self.client, &url, headers, request).await
    }
}

/// Client for the Anthropic messages API.
#[derive(Debug, Clone)]
pub struct HttpMessagesClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    extra_headers: Vec<(String, String)>,
}

impl HttpMessagesClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            extra_headers: Vec::new(),
        }
    }

    pub fn from_config(provider: &ProviderConfig) -> Result<Self> {
        let api_key = provider
            .resolve_api_key()
            .ok_or_else(|| anyhow!("provider {} missing api key", provider.id))?;
        Ok(Self::new(provider.base_url.clone(), api_key)
            .with_extra_headers(provider.extra_headers.clone()))
    }

    pub fn with_extra_headers(mut self, extra_headers: Vec<(String, String)>) -> Self {
        self.extra_headers = extra_headers;
        self
    }
}

#[async_trait]
impl MessagesTransport for HttpMessagesClient {
    async fn create_message(&self, request: &MessagesRequest) -> Result<MessagesResponse> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_str(self.api_key.trim()).context("invalid api key header")?,
        );
        headers.insert(
            HeaderName::from_static("anthropic-version"),
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        apply_extra_headers(&mut headers, &self.extra_headers)?;
        post_json(&self.client, &url, headers, request).await
    }
}

async fn post_json<B, R>(
    client: &reqwest::Client,
    url: &str,
    headers: HeaderMap,
    body: &B,
) -> Result<R>
where
    B: Serialize + Sync,
    R: DeserializeOwned + Send,
{
    let response = client
        .post(url)
        .headers(headers)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .json(body)
        .send()
        .await
        .context("failed to request provider")?;

    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        bail!("provider request failed: {status} {text}");
    }
    serde_json::from_str(&text).context("invalid provider response json")
}

fn apply_extra_headers(headers: &mut HeaderMap, extra_headers: &[(String, String)]) -> Result<()> {
    for (key, value) in extra_headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_| anyhow!("invalid header name: {key}"))?;
        let value =
            HeaderValue::from_str(value).map_err(|_| anyhow!("invalid header value for {key}"))?;
        headers.insert(name, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_extra_header_name() {
        let mut headers = HeaderMap::new();
        let err = apply_extra_headers(&mut headers, &[("bad header".to_string(), "x".to_string())])
            .expect_err("invalid name");
        assert!(err.to_string().contains("bad header"));
    }

    #[test]
    fn from_config_requires_api_key() {
        let provider = ProviderConfig {
            id: core_types::ProviderId::OpenAi,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "LLMS_TEST_DEFINITELY_UNSET".to_string(),
            api_key: None,
            extra_headers: Vec::new(),
            enabled: true,
        };
        let err = HttpChatCompletionsClient::from_config(&provider).expect_err("missing key");
        assert_eq!(err.to_string(), "provider openai missing api key");
    }
}
