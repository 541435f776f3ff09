// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// SQLite implementations of the narrow persistence interfaces the core
// consumes: user lookup for credential verification, and per-novel context
// assembly for prompt building.

use crate::domain::auth::{UserRecord, UserStore};
use crate::domain::novel::{truncate_to_suffix, ContextSource, NovelContext, PREVIOUS_TEXT_BUDGET};
use crate::infrastructure::db::Database;
use async_trait::async_trait;

pub struct SqliteUserStore {
    db: Database,
}

impl SqliteUserStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<UserRecord>> {
        let row: Option<(i64, String, String)> =
            sqlx::query_as("SELECT id, username, password_hash FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(self.db.pool())
                .await?;
        Ok(row.map(|(id, username, password_hash)| UserRecord {
            id,
            username,
            password_hash,
        }))
    }

    async fn create(&self, username: &str, password_hash: &str) -> anyhow::Result<UserRecord> {
        let result = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
            .bind(username)
            .bind(password_hash)
            .execute(self.db.pool())
            .await?;
        Ok(UserRecord {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        })
    }
}

pub struct SqliteContextSource {
    db: Database,
    max_chars: usize,
}

impl SqliteContextSource {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            max_chars: PREVIOUS_TEXT_BUDGET,
        }
    }

    pub fn with_budget(db: Database, max_chars: usize) -> Self {
        Self { db, max_chars }
    }
}

#[async_trait]
impl ContextSource for SqliteContextSource {
    async fn novel_context(&self, novel_id: i64) -> anyhow::Result<Option<NovelContext>> {
        let novel: Option<(String, Option<String>)> =
            sqlx::query_as("SELECT title, summary FROM novels WHERE id = ?")
                .bind(novel_id)
                .fetch_optional(self.db.pool())
                .await?;
        let Some((title, summary)) = novel else {
            return Ok(None);
        };

        let chapters: Vec<(Option<String>,)> = sqlx::query_as(
            "SELECT content FROM chapters WHERE novel_id = ? ORDER BY order_index ASC",
        )
        .bind(novel_id)
        .fetch_all(self.db.pool())
        .await?;
        let text = chapters
            .iter()
            .map(|(content,)| content.as_deref().unwrap_or(""))
            .collect::<Vec<_>>()
            .join("\n\n");
        let previous_text = truncate_to_suffix(&text, self.max_chars).to_string();

        let characters: Vec<(String, Option<String>)> =
            sqlx::query_as("SELECT name, profile FROM characters WHERE novel_id = ?")
                .bind(novel_id)
                .fetch_all(self.db.pool())
                .await?;
        let character_summary = characters
            .iter()
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, profile)| format!("{name}：{}", profile.as_deref().unwrap_or("").trim()))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(Some(NovelContext {
            novel_title: title,
            novel_summary: summary.unwrap_or_default().trim().to_string(),
            previous_text,
            character_summary,
        }))
    }
}
