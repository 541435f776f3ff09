// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Authentication domain types.
//
// Tokens are self-contained signed claim sets; there is no server-side
// session store. The user store is the one narrow interface the core needs
// from the persistence layer for credential verification.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Claim set carried inside a signed token.
///
/// Never mutated after issuance; validity is fully determined by
/// recomputing the signature and checking `exp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
}

/// A stored user record. The password hash is a salted PHC string; the
/// plaintext credential is never persisted.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

/// Narrow persistence interface for credential verification.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<UserRecord>>;

    async fn create(&self, username: &str, password_hash: &str) -> anyhow::Result<UserRecord>;
}

/// Errors resolved at the auth boundary; none of these reach the
/// generation orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("用户名或密码不能为空")]
    InvalidInput,

    #[error("用户名已存在")]
    UsernameTaken,

    /// Bad signature, expired token and wrong credentials all collapse to
    /// this variant so the boundary never leaks which check failed.
    #[error("用户名或密码错误")]
    InvalidCredentials,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
