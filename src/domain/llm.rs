// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Domain Interface (Anti-Corruption Layer)
//
// Defines the domain interface for streaming LLM providers. Prevents vendor
// lock-in by abstracting external LLM APIs; implementations live in
// infrastructure/llm/.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;

/// A lazy sequence of incremental text fragments from an upstream provider.
///
/// Fragments are delivered in the exact order the upstream produced them.
/// Dropping the stream releases the underlying network connection.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Request-scoped overrides merged against the adapter's configured defaults.
///
/// The service proxies arbitrary operator-supplied endpoints without a
/// restart, so credential, endpoint and model are all overridable per call.
#[derive(Debug, Clone, Default)]
pub struct GenerationOverrides {
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

/// Domain interface for LLM providers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Open a streaming generation call against the upstream backend.
    ///
    /// A non-2xx upstream response is a fatal error for the call and is
    /// surfaced here; failures while the body is being consumed surface as
    /// an `Err` item inside the returned stream.
    async fn generate_stream(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        overrides: &GenerationOverrides,
    ) -> Result<FragmentStream, LlmError>;

    /// Drain `generate_stream` fully and concatenate the fragments.
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        overrides: &GenerationOverrides,
    ) -> Result<String, LlmError> {
        let mut fragments = self.generate_stream(prompt, system_prompt, overrides).await?;
        let mut text = String::new();
        while let Some(fragment) = fragments.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }

    /// Best-effort list of model names available on this backend.
    ///
    /// Providers without a listing endpoint return an empty list; network
    /// failures degrade to an empty list rather than erroring.
    async fn list_models(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Errors that can occur during LLM operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("network error: {0}")]
    Network(String),

    #[error("upstream returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("upstream call timed out")]
    Timeout,

    #[error("no provider available")]
    NoProvider,
}
