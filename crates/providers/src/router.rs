//! Provider router — selects the model backend based on config.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sheetwise_config::AppConfig;
use sheetwise_core::provider::Provider;
use tracing::info;

use crate::gemini::GeminiProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// Routes model requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// The provider named in configuration.
    pub fn default_provider(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    pub fn list(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }
}

/// Build the configured provider.
///
/// `gemini` uses the native API; every other name is treated as an
/// OpenAI-compatible endpoint at `model.api_url` or its well-known URL.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let model = &config.model;
    let mut router = ProviderRouter::new(&model.provider);
    let api_key = model.api_key.clone().unwrap_or_default();
    let timeout = Duration::from_secs(model.timeout_secs);

    let provider: Arc<dyn Provider> = if model.provider == "gemini" {
        let mut p = GeminiProvider::new(api_key, timeout);
        if let Some(url) = &model.api_url {
            p = p.with_base_url(url);
        }
        Arc::new(p)
    } else {
        let base_url = model
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(&model.provider));
        Arc::new(OpenAiCompatProvider::new(
            &model.provider,
            base_url,
            api_key,
            timeout,
        ))
    };

    info!(provider = %model.provider, model = %model.model, "Model provider configured");
    router.register(model.provider.clone(), provider);
    router
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
