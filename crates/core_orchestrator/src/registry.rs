use std::collections::HashMap;

use core_types::{ProviderId, Result};

const BUILTIN_MODELS: &[(&str, ProviderId)] = &[
    ("gpt-4o", ProviderId::OpenAi),
    ("gpt-5", ProviderId::OpenAi),
    ("claude-sonnet-4-5", ProviderId::Anthropic),
    ("deepseek-r1", ProviderId::Fireworks),
    ("llama-v3p1-8b-instruct", ProviderId::Fireworks),
    ("gpt-oss-120b", ProviderId::Fireworks),
];

/// Maps model names to the provider family that serves them.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, ProviderId>,
}

impl ModelRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for (name, provider) in BUILTIN_MODELS {
            registry.insert(*name, *provider);
        }
        registry
    }

    pub fn insert(&mut self, name: impl Into<String>, provider: ProviderId) {
        self.models.insert(name.into(), provider);
    }

    /// Registers a model under a provider tag such as `"fireworks"`.
    pub fn insert_tagged(&mut self, name: impl Into<String>, provider_tag: &str) -> Result<()> {
        let provider = provider_tag.parse::<ProviderId>()?;
        self.insert(name, provider);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<ProviderId> {
        self.models.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use core_types::LlmError;

    use super::*;

    #[test]
    fn builtin_models_resolve() {
        let registry = ModelRegistry::builtin();
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.lookup("gpt-4o"), Some(ProviderId::OpenAi));
        assert_eq!(
            registry.lookup("claude-sonnet-4-5"),
            Some(ProviderId::Anthropic)
        );
        assert_eq!(registry.lookup("gpt-oss-120b"), Some(ProviderId::Fireworks));
        assert_eq!(registry.lookup("not-a-real-model"), None);
    }

    #[test]
    fn tagged_insert_rejects_unknown_provider() {
        let mut registry = ModelRegistry::empty();
        registry
            .insert_tagged("qwen3-235b", "fireworks")
            .expect("known tag");
        assert!(registry.contains("qwen3-235b"));

        let err = registry
            .insert_tagged("gemini-2.5-pro", "gemini")
            .expect_err("unknown tag");
        assert!(matches!(err, LlmError::UnrecognizedProvider { .. }));
        assert!(!registry.contains("gemini-2.5-pro"));
    }
}
