use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use core_types::{GenerateTextResult, LlmError, ModelMessage, ModelProvider, ProviderId, Result};
use tracing::{info, warn};

mod registry;

pub use registry::ModelRegistry;

/// Resolves a model name to its provider and runs exactly one generation call.
/// No retries and no fallback between providers.
pub struct Dispatcher {
    registry: ModelRegistry,
    providers: HashMap<ProviderId, Arc<dyn ModelProvider>>,
}

impl Dispatcher {
    pub fn new(registry: ModelRegistry) -> Self {
        Self {
            registry,
            providers: HashMap::new(),
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn register(&mut self, provider: Arc<dyn ModelProvider>) {
        self.providers.insert(provider.id(), provider);
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub async fn generate_text(
        &self,
        model_name: &str,
        messages: &[ModelMessage],
    ) -> Result<GenerateTextResult> {
        let provider_id = self
            .registry
            .lookup(model_name)
            .ok_or_else(|| LlmError::UnknownModel {
                model: model_name.to_string(),
            })?;
        for message in messages {
            message.validate()?;
        }
        let provider = self
            .providers
            .get(&provider_id)
            .ok_or_else(|| LlmError::UnrecognizedProvider {
                provider: provider_id.to_string(),
            })?;

        info!(
            model = model_name,
            provider = %provider_id,
            messages = messages.len(),
            "generating text"
        );
        let parts = provider
            .generate_parts(model_name, messages)
            .await
            .map_err(|err| {
                warn!(
                    model = model_name,
                    provider = %provider_id,
                    "provider call failed: {err:#}"
                );
                LlmError::Transport(err)
            })?;

        Ok(GenerateTextResult::from_parts(parts))
    }
}

/// Synchronous front for [`Dispatcher`]. Owns a tokio runtime and blocks the
/// calling thread on the same codec path; must not be used from inside an
/// async context.
pub struct BlockingDispatcher {
    runtime: tokio::runtime::Runtime,
    inner: Dispatcher,
}

impl BlockingDispatcher {
    pub fn new(inner: Dispatcher) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
        Ok(Self { runtime, inner })
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner
    }

    pub fn generate_text(
        &self,
        model_name: &str,
        messages: &[ModelMessage],
    ) -> Result<GenerateTextResult> {
        self.runtime
            .block_on(self.inner.generate_text(model_name, messages))
    }
}
