// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod auth_service;
pub mod generation_service;

pub use auth_service::{AuthService, AuthSuccess};
pub use generation_service::GenerationService;
