use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::{env, fs};

use anyhow::{Result, bail};
use config::{AppConfig, ConfigStore};
use core_orchestrator::{BlockingDispatcher, Dispatcher, ModelRegistry};
use core_types::{ModelMessage, ModelProvider, ProviderConfig, ProviderId};
use providers::{
    AnthropicProvider, HttpChatCompletionsClient, HttpMessagesClient, OpenAiCompatibleProvider,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: llms [--system <text>] <model> <prompt>...";

fn main() -> ExitCode {
    let mut data_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    data_dir.push("llms");
    let _log_guard = init_local_logger(&data_dir.join("logs"));

    match run(env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<()> {
    let (model, messages) = parse_args(args)?;

    let config_store = ConfigStore::from_default_location()?;
    let config = config_store.load_or_init()?;
    info!(path = %config_store.path().display(), "config loaded");

    let dispatcher = BlockingDispatcher::new(build_dispatcher(&config)?)?;
    let result = dispatcher.generate_text(&model, &messages)?;
    println!("{}", result.text);
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<(String, Vec<ModelMessage>)> {
    let mut args = args.into_iter();
    let mut messages = Vec::new();

    let model = match args.next() {
        Some(flag) if flag == "--system" => {
            let Some(system) = args.next() else {
                bail!(USAGE);
            };
            messages.push(ModelMessage::system(system));
            args.next()
        }
        other => other,
    };
    let Some(model) = model else {
        bail!(USAGE);
    };

    let prompt = args.collect::<Vec<_>>().join(" ");
    if prompt.trim().is_empty() {
        bail!(USAGE);
    }
    messages.push(ModelMessage::user(prompt));
    Ok((model, messages))
}

fn build_dispatcher(config: &AppConfig) -> Result<Dispatcher> {
    let mut registry = ModelRegistry::builtin();
    for entry in &config.models {
        registry.insert_tagged(entry.name.clone(), &entry.provider)?;
    }

    let mut dispatcher = Dispatcher::new(registry);
    for provider in config.providers.iter().filter(|provider| provider.enabled) {
        match build_provider(provider) {
            Ok(built) => dispatcher.register(built),
            Err(err) => warn!(provider = %provider.id, "provider skipped: {err:#}"),
        }
    }
    Ok(dispatcher)
}

fn build_provider(provider: &ProviderConfig) -> Result<Arc<dyn ModelProvider>> {
    let built: Arc<dyn ModelProvider> = match provider.id {
        ProviderId::OpenAi => Arc::new(OpenAiCompatibleProvider::openai(Arc::new(
            HttpChatCompletionsClient::from_config(provider)?,
        ))),
        ProviderId::Fireworks => Arc::new(OpenAiCompatibleProvider::fireworks(Arc::new(
            HttpChatCompletionsClient::from_config(provider)?,
        ))),
        ProviderId::Anthropic => Arc::new(AnthropicProvider::new(Arc::new(
            HttpMessagesClient::from_config(provider)?,
        ))),
    };
    Ok(built)
}

fn init_local_logger(log_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    if let Err(err) = fs::create_dir_all(log_dir) {
        eprintln!("failed to create log dir `{}`: {err}", log_dir.display());
    }
    let file_appender = tracing_appender::rolling::daily(log_dir, "llms.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,app_cli=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .json()
        .with_writer(writer)
        .init();

    guard
}
