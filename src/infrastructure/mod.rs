// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod db;
pub mod llm;
pub mod prompt_templates;
pub mod rate_limiter;
pub mod repositories;
pub mod security;

pub use llm::ProviderRegistry;
pub use prompt_templates::TemplateRegistry;
pub use rate_limiter::{FixedWindowLimiter, RateLimitDecision};
