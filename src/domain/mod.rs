// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod auth;
pub mod generation;
pub mod llm;
pub mod novel;

pub use auth::{AuthError, Claims, UserRecord, UserStore};
pub use generation::GenerationRequest;
pub use llm::{FragmentStream, GenerationOverrides, LlmError, LlmProvider};
pub use novel::{ContextSource, NovelContext};
