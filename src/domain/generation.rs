// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::llm::GenerationOverrides;
use serde_json::{Map, Value};

/// One generation request, built fresh per call and immutable afterwards.
///
/// `mode` keys into the prompt template registry; `context` carries the
/// named string/collection values the templates substitute. The optional
/// fields override the selected provider's configured defaults.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub mode: String,
    pub context: Map<String, Value>,
    pub stream: bool,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl GenerationRequest {
    /// Collect the request-level provider overrides into one typed bag.
    pub fn overrides(&self) -> GenerationOverrides {
        GenerationOverrides {
            model: self.model.clone(),
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
        }
    }
}
