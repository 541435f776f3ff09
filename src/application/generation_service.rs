// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Generation Orchestrator
//!
//! Resolves a request's template and provider, renders the prompt, and
//! exposes unified `stream`/`generate` operations. Constructed explicitly
//! from configuration at startup and passed into request handlers; there is
//! no process-wide singleton.

use crate::config::ServiceConfig;
use crate::domain::generation::GenerationRequest;
use crate::domain::llm::{FragmentStream, LlmError};
use crate::infrastructure::llm::registry::{ProviderRegistry, PRIMARY_PROVIDER};
use crate::infrastructure::prompt_templates::TemplateRegistry;
use futures::{stream, StreamExt};
use tracing::debug;

pub struct GenerationService {
    templates: TemplateRegistry,
    providers: ProviderRegistry,
}

impl GenerationService {
    pub fn new(providers: ProviderRegistry) -> Self {
        Self {
            templates: TemplateRegistry::new(),
            providers,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(ProviderRegistry::from_config(config))
    }

    /// Open a fragment stream for the request.
    ///
    /// Soft failures surface inside the stream so streaming clients always
    /// receive clean events: an unsupported mode yields one user-visible
    /// message, a provider failure yields one `Err` item.
    pub async fn stream(&self, request: &GenerationRequest) -> FragmentStream {
        let Some(template) = self.templates.get(&request.mode) else {
            let message = format!("不支持的模式：{}", request.mode);
            return Box::pin(stream::once(async move { Ok::<_, LlmError>(message) }));
        };

        let prompt = self.templates.render_user(template, &request.context);
        let system_prompt = template.system;

        let Some(provider) = self.providers.resolve(request.provider.as_deref()) else {
            return Box::pin(stream::once(async { Err::<String, _>(LlmError::NoProvider) }));
        };

        debug!(mode = %request.mode, "opening generation stream");
        match provider
            .generate_stream(&prompt, system_prompt, &request.overrides())
            .await
        {
            Ok(fragments) => fragments,
            Err(e) => Box::pin(stream::once(async move { Err::<String, _>(e) })),
        }
    }

    /// Drain `stream` fully and concatenate the fragments.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let mut fragments = self.stream(request).await;
        let mut text = String::new();
        while let Some(fragment) = fragments.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }

    /// Best-effort model list from the local provider.
    pub async fn local_models(&self) -> Vec<String> {
        match self.providers.get(PRIMARY_PROVIDER) {
            Some(provider) => provider.list_models().await,
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::{GenerationOverrides, LlmProvider};
    use async_trait::async_trait;
    use serde_json::Map;
    use std::sync::Arc;

    /// Echoes a tag plus the rendered prompt, so tests can observe which
    /// provider was selected and what reached it.
    struct EchoProvider {
        tag: &'static str,
    }

    #[async_trait]
    impl LlmProvider for EchoProvider {
        async fn generate_stream(
            &self,
            prompt: &str,
            system_prompt: Option<&str>,
            overrides: &GenerationOverrides,
        ) -> Result<FragmentStream, LlmError> {
            let fragments = vec![
                Ok(format!("[{}]", self.tag)),
                Ok(format!("model={:?}", overrides.model)),
                Ok(format!("system={}", system_prompt.is_some())),
                Ok(prompt.to_string()),
            ];
            Ok(Box::pin(stream::iter(fragments)))
        }

        async fn list_models(&self) -> Vec<String> {
            vec![format!("{}-model", self.tag)]
        }
    }

    fn service() -> GenerationService {
        let mut registry = ProviderRegistry::new("ollama");
        registry.register("ollama", Arc::new(EchoProvider { tag: "local" }));
        registry.register("openai_compat", Arc::new(EchoProvider { tag: "openai" }));
        GenerationService::new(registry)
    }

    fn request(mode: &str, provider: Option<&str>) -> GenerationRequest {
        GenerationRequest {
            mode: mode.to_string(),
            context: Map::new(),
            stream: true,
            provider: provider.map(str::to_string),
            model: None,
            api_key: None,
            base_url: None,
        }
    }

    #[tokio::test]
    async fn unsupported_mode_yields_one_fixed_message() {
        let text = service().generate(&request("haiku", None)).await.unwrap();
        assert_eq!(text, "不支持的模式：haiku");
    }

    #[tokio::test]
    async fn default_provider_is_used_when_none_requested() {
        let text = service().generate(&request("outline", None)).await.unwrap();
        assert!(text.starts_with("[local]"));
    }

    #[tokio::test]
    async fn explicit_provider_is_honored() {
        let text = service()
            .generate(&request("outline", Some("openai_compat")))
            .await
            .unwrap();
        assert!(text.starts_with("[openai]"));
    }

    #[tokio::test]
    async fn unregistered_provider_falls_back_to_primary() {
        // Deliberate availability-over-strictness behavior; see DESIGN.md.
        let text = service()
            .generate(&request("outline", Some("does-not-exist")))
            .await
            .unwrap();
        assert!(text.starts_with("[local]"));
    }

    #[tokio::test]
    async fn overrides_and_system_prompt_reach_the_provider() {
        let mut req = request("outline", None);
        req.model = Some("llama3.2".to_string());
        let text = service().generate(&req).await.unwrap();
        assert!(text.contains("model=Some(\"llama3.2\")"));
        assert!(text.contains("system=true"));
        assert!(text.contains("关键词："));
    }

    #[tokio::test]
    async fn empty_registry_surfaces_no_provider_error() {
        let service = GenerationService::new(ProviderRegistry::new("ollama"));
        let result = service.generate(&request("outline", None)).await;
        assert!(matches!(result, Err(LlmError::NoProvider)));
    }

    #[tokio::test]
    async fn local_models_come_from_the_primary_provider() {
        let models = service().local_models().await;
        assert_eq!(models, vec!["local-model"]);
    }
}
