// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Environment-style service configuration.
//
// Every variable is optional; the defaults below are the documented
// behavior for an unconfigured process.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// `DATABASE_URL`: SQLite location (default `sqlite:novels.db`).
    pub database_url: String,
    /// `AUTH_SECRET`: HMAC signing secret. Rotating it invalidates every
    /// outstanding token at once.
    pub auth_secret: String,
    /// `AUTH_TOKEN_TTL_SECONDS`: token lifetime (default 7 days).
    pub auth_token_ttl_seconds: u64,
    /// `DEFAULT_PROVIDER`: provider key used when a request names none.
    pub default_provider: String,
    /// `OLLAMA_BASE_URL` / `OLLAMA_MODEL`: local inference endpoint.
    pub ollama_base_url: String,
    pub ollama_model: String,
    /// `OPENAI_COMPAT_*`: OpenAI-compatible endpoint. All optional; the
    /// adapter is constructed regardless so request-level overrides can
    /// supply whatever is missing.
    pub openai_compat_api_key: Option<String>,
    pub openai_compat_base_url: Option<String>,
    pub openai_compat_model: Option<String>,
    /// `REQUEST_TIMEOUT_SECONDS`: per upstream call (default 120s).
    pub request_timeout: Duration,
    /// `RATE_LIMIT_PER_WINDOW` / `RATE_LIMIT_WINDOW_SECONDS`.
    pub rate_limit_per_window: u32,
    pub rate_limit_window_seconds: u64,
    /// `HOST` / `PORT`: bind address.
    pub host: String,
    pub port: u16,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: env_or("DATABASE_URL", "sqlite:novels.db"),
            auth_secret: env_or("AUTH_SECRET", "change-me"),
            auth_token_ttl_seconds: env_parsed("AUTH_TOKEN_TTL_SECONDS", 604_800),
            default_provider: env_or("DEFAULT_PROVIDER", "ollama"),
            ollama_base_url: env_or("OLLAMA_BASE_URL", "http://localhost:11434"),
            ollama_model: env_or("OLLAMA_MODEL", "qwen2.5"),
            openai_compat_api_key: env_opt("OPENAI_COMPAT_API_KEY"),
            openai_compat_base_url: env_opt("OPENAI_COMPAT_BASE_URL"),
            openai_compat_model: env_opt("OPENAI_COMPAT_MODEL"),
            request_timeout: Duration::from_secs(env_parsed("REQUEST_TIMEOUT_SECONDS", 120)),
            rate_limit_per_window: env_parsed("RATE_LIMIT_PER_WINDOW", 60),
            rate_limit_window_seconds: env_parsed("RATE_LIMIT_WINDOW_SECONDS", 60),
            host: env_or("HOST", "127.0.0.1"),
            port: env_parsed("PORT", 5000),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
