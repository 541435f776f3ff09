// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Fixed-window rate limiter keyed by caller identity.
//!
//! The window boundary floors Unix time to a multiple of the window length,
//! so bursts straddling a boundary are allowed by design. Buckets live for
//! the process lifetime; there is no eviction (see DESIGN.md).

use dashmap::DashMap;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_in_seconds: u64,
}

struct Bucket {
    count: u32,
    window_start: u64,
}

pub struct FixedWindowLimiter {
    limit: u32,
    window_seconds: u64,
    buckets: DashMap<String, Bucket>,
}

impl FixedWindowLimiter {
    pub fn new(limit: u32, window_seconds: u64) -> Self {
        Self {
            limit,
            window_seconds: window_seconds.max(1),
            buckets: DashMap::new(),
        }
    }

    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, unix_now())
    }

    // The dashmap entry guard holds the per-key lock across the whole
    // read-modify-write; unrelated keys never contend.
    fn check_at(&self, key: &str, now: u64) -> RateLimitDecision {
        let window_start = now - now % self.window_seconds;
        let reset_in_seconds = window_start + self.window_seconds - now;

        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert(Bucket { count: 0, window_start });

        if bucket.window_start != window_start {
            bucket.count = 0;
            bucket.window_start = window_start;
        }

        if bucket.count >= self.limit {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_in_seconds,
            };
        }

        bucket.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: self.limit - bucket.count,
            reset_in_seconds,
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
