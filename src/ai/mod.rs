//! AI integration: providers, prompt templates and answer parsing.

pub mod extract;
pub mod prompts;
pub mod provider;

pub use extract::extract_json;
pub use provider::{
    GeminiProvider, ModelProvider, OfflineProvider, OpenaiProvider, ProviderType,
};

use std::time::Duration;

use crate::config::AiConfig;

/// Build the provider described by the `ai` config section.
pub fn provider_from_config(config: &AiConfig) -> Box<dyn ModelProvider> {
    let timeout = Duration::from_secs(config.timeout_secs.max(1));
    let endpoint = config.endpoint();

    match config.provider {
        ProviderType::Gemini => Box::new(GeminiProvider {
            endpoint,
            model: config.model(),
            api_key: config.api_key.clone(),
            timeout,
        }),
        ProviderType::Openai => Box::new(OpenaiProvider {
            endpoint,
            model: config.model(),
            api_key: config.api_key.clone(),
            timeout,
        }),
        ProviderType::Offline => Box::new(OfflineProvider),
    }
}
