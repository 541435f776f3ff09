// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;

/// Default character budget for assembled prior text.
pub const PREVIOUS_TEXT_BUDGET: usize = 6000;

/// Context assembled by the persistence layer for one writing project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NovelContext {
    pub novel_title: String,
    pub novel_summary: String,
    pub previous_text: String,
    pub character_summary: String,
}

/// Narrow interface over the persistence layer: assemble prior-text,
/// summary and character strings for a project.
#[async_trait]
pub trait ContextSource: Send + Sync {
    async fn novel_context(&self, novel_id: i64) -> anyhow::Result<Option<NovelContext>>;
}

/// Keep at most `max_chars` characters of `text`, retaining the suffix so
/// the most recent writing survives truncation.
pub fn truncate_to_suffix(text: &str, max_chars: usize) -> &str {
    let total = text.chars().count();
    if total <= max_chars {
        return text;
    }
    let cut = text
        .char_indices()
        .nth(total - max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    &text[cut..]
}
