use std::path::{Path, PathBuf};
use std::{env, fs, io};

use anyhow::{Context, Result};
use core_types::{ProviderConfig, ProviderId};
use serde::{Deserialize, Serialize};
use tracing::debug;

const CONFIG_FILE: &str = "config.json";
/// Overrides the config directory, mostly for scripted runs.
pub const CONFIG_DIR_ENV: &str = "LLMS_CONFIG_DIR";

/// A model served by one of the configured providers, on top of the built-in table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelEntry {
    pub name: String,
    /// Provider tag: `openai`, `anthropic` or `fireworks`.
    pub provider: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            providers: vec![
                builtin_provider(
                    ProviderId::OpenAi,
                    "https://api.openai.com/v1",
                    "OPENAI_API_KEY",
                ),
                builtin_provider(
                    ProviderId::Anthropic,
                    "https://api.anthropic.com",
                    "ANTHROPIC_API_KEY",
                ),
                builtin_provider(
                    ProviderId::Fireworks,
                    "https://api.fireworks.ai/inference/v1",
                    "FIREWORKS_API_KEY",
                ),
            ],
            models: Vec::new(),
        }
    }
}

fn builtin_provider(id: ProviderId, base_url: &str, api_key_env: &str) -> ProviderConfig {
    ProviderConfig {
        id,
        base_url: base_url.to_string(),
        api_key_env: api_key_env.to_string(),
        api_key: None,
        extra_headers: Vec::new(),
        enabled: true,
    }
}

impl AppConfig {
    pub fn provider(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers
            .iter()
            .find(|provider| provider.id == id && provider.enabled)
    }

    /// Appends the default entry of every built-in provider the file does not
    /// list. Returns the number added.
    fn fill_missing_providers(&mut self) -> usize {
        let missing: Vec<ProviderConfig> = AppConfig::default()
            .providers
            .into_iter()
            .filter(|builtin| !self.providers.iter().any(|listed| listed.id == builtin.id))
            .collect();
        let added = missing.len();
        self.providers.extend(missing);
        added
    }
}

/// Location of the JSON config file.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(CONFIG_FILE),
        }
    }

    /// `$LLMS_CONFIG_DIR` when set, otherwise `<config_dir>/llms`.
    pub fn from_default_location() -> Result<Self> {
        if let Some(dir) = env::var_os(CONFIG_DIR_ENV) {
            return Ok(Self::from_dir(PathBuf::from(dir)));
        }
        let dir = dirs::config_dir().context("failed to resolve config_dir")?;
        Ok(Self::from_dir(dir.join("llms")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes a default file on first run. Built-in providers left out of an
    /// existing file are filled in memory only.
    pub fn load_or_init(&self) -> Result<AppConfig> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let config = AppConfig::default();
                self.save(&config)?;
                debug!(path = %self.path.display(), "wrote default config");
                return Ok(config);
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {}", self.path.display()));
            }
        };

        let mut config: AppConfig = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        let added = config.fill_missing_providers();
        if added > 0 {
            debug!(added, "using default settings for unlisted providers");
        }
        Ok(config)
    }

    pub fn save(&self, config: &AppConfig) -> Result<()> {
        let dir = self.path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        let text = serde_json::to_string_pretty(config).context("failed to serialize config")?;
        fs::write(&self.path, text)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}
