// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Streaming AI generation backend for long-form writing projects.
//!
//! The core is a streaming generation pipeline: interchangeable LLM provider
//! adapters, a prompt template registry, a generation orchestrator with
//! request-scoped overrides, an SSE relay, plus signed-token authentication
//! and fixed-window rate limiting at the HTTP boundary.

pub mod config;
pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
