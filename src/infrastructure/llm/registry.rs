// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Registry
//
// Maps provider keys to adapter instances and resolves the provider for a
// request. Resolution favors availability over strictness: an unregistered
// key silently falls back to the primary provider (see DESIGN.md).

use crate::config::ServiceConfig;
use crate::domain::llm::LlmProvider;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::ollama::OllamaAdapter;
use super::openai_compat::OpenAiCompatAdapter;

/// Provider used when a requested key is not registered.
pub const PRIMARY_PROVIDER: &str = "ollama";

pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    default_provider: String,
}

impl ProviderRegistry {
    /// Create an empty registry with the given default provider key.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Build the process-wide registry from configuration.
    ///
    /// The OpenAI-compatible adapter is always constructed, even with no
    /// configured credential, so request-level overrides can supply one.
    pub fn from_config(config: &ServiceConfig) -> Self {
        info!("initializing LLM provider registry");

        let mut registry = Self::new(config.default_provider.clone());
        registry.register(
            PRIMARY_PROVIDER,
            Arc::new(OllamaAdapter::new(
                config.ollama_base_url.clone(),
                config.ollama_model.clone(),
                config.request_timeout,
            )),
        );
        registry.register(
            "openai_compat",
            Arc::new(OpenAiCompatAdapter::new(
                config.openai_compat_api_key.clone().unwrap_or_default(),
                config
                    .openai_compat_base_url
                    .clone()
                    .unwrap_or_else(|| "https://api.openai.com".to_string()),
                config
                    .openai_compat_model
                    .clone()
                    .unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
                config.request_timeout,
            )),
        );
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn LlmProvider>) {
        let name = name.into();
        info!(provider = %name, "registering LLM provider");
        self.providers.insert(name, provider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers.get(name).cloned()
    }

    /// Resolve the provider for a request: the explicit key if given, else
    /// the configured default; unregistered keys substitute the primary
    /// provider rather than erroring.
    pub fn resolve(&self, requested: Option<&str>) -> Option<Arc<dyn LlmProvider>> {
        let key = requested.unwrap_or(&self.default_provider);
        if let Some(provider) = self.providers.get(key) {
            return Some(provider.clone());
        }
        warn!(
            provider = %key,
            "requested provider not registered, substituting '{PRIMARY_PROVIDER}'"
        );
        self.providers.get(PRIMARY_PROVIDER).cloned()
    }
}
