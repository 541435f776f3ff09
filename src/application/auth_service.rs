// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Registration and login over the user store. Consulted independently at
// the boundary; orthogonal to the generation flow except for the shared
// configuration.

use crate::domain::auth::{AuthError, Claims, UserStore};
use crate::infrastructure::security;
use std::sync::Arc;

pub struct AuthService {
    users: Arc<dyn UserStore>,
    secret: String,
    token_ttl_seconds: u64,
}

/// Outcome of a successful register/login: a signed token plus the subject.
#[derive(Debug, Clone)]
pub struct AuthSuccess {
    pub token: String,
    pub user_id: i64,
    pub username: String,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, secret: String, token_ttl_seconds: u64) -> Self {
        Self {
            users,
            secret,
            token_ttl_seconds,
        }
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<AuthSuccess, AuthError> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidInput);
        }

        if self.users.find_by_username(username).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = security::hash_password(password)?;
        let user = self.users.create(username, &password_hash).await?;
        Ok(self.issue(user.id, user.username))
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthSuccess, AuthError> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidInput);
        }

        let Some(user) = self.users.find_by_username(username).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        if !security::verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(self.issue(user.id, user.username))
    }

    /// Check a bearer token. All failure causes collapse to one generic
    /// rejection.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        security::verify_token(&self.secret, token).ok_or(AuthError::InvalidCredentials)
    }

    fn issue(&self, user_id: i64, username: String) -> AuthSuccess {
        let token = security::create_token(&self.secret, &user_id.to_string(), self.token_ttl_seconds);
        AuthSuccess {
            token,
            user_id,
            username,
        }
    }
}
