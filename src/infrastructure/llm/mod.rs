// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Infrastructure - Anti-Corruption Layer Implementations
//
// One adapter per backend family. Each adapter translates between the
// domain's fragment-stream interface and the backend's wire format.

pub mod ollama;
pub mod openai_compat;
pub mod registry;

pub use registry::ProviderRegistry;

use crate::domain::llm::LlmError;

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

/// Fail the call on a non-2xx upstream status, capturing the body text.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(LlmError::Upstream {
        status: status.as_u16(),
        body,
    })
}
