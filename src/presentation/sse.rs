// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! SSE Relay
//!
//! Converts a fragment stream into wire-level events: one
//! `data: {"content": ...}` event per fragment, a terminal `data: [DONE]`
//! on clean completion, and a single `data: {"error": ...}` terminal event
//! if draining fails. The relay never lets a provider failure abort the
//! HTTP response; it always closes cleanly after a terminal event.

use crate::domain::llm::FragmentStream;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{stream, Stream, StreamExt};
use serde_json::json;
use std::convert::Infallible;

pub const DONE_FRAME: &str = "[DONE]";

enum RelayState {
    Streaming(FragmentStream),
    Closed,
}

/// Frame a fragment stream as SSE data payloads.
///
/// Separated from the axum `Event` wrapping so the framing contract is
/// directly testable.
pub fn relay_frames(upstream: FragmentStream) -> impl Stream<Item = String> + Send {
    stream::unfold(RelayState::Streaming(upstream), |state| async move {
        match state {
            RelayState::Streaming(mut upstream) => match upstream.next().await {
                Some(Ok(fragment)) => {
                    let frame = json!({ "content": fragment }).to_string();
                    Some((frame, RelayState::Streaming(upstream)))
                }
                Some(Err(e)) => {
                    let frame = json!({ "error": e.to_string() }).to_string();
                    Some((frame, RelayState::Closed))
                }
                None => Some((DONE_FRAME.to_string(), RelayState::Closed)),
            },
            RelayState::Closed => None,
        }
    })
}

/// Wrap a fragment stream as a `text/event-stream` response.
pub fn sse_response(
    upstream: FragmentStream,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = relay_frames(upstream).map(|frame| Ok(Event::default().data(frame)));
    Sse::new(events).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::LlmError;
    use futures::stream;

    fn fragments(items: Vec<Result<String, LlmError>>) -> FragmentStream {
        Box::pin(stream::iter(items))
    }

    #[tokio::test]
    async fn frames_fragments_then_done() {
        let upstream = fragments(vec![Ok("a".to_string()), Ok("b".to_string())]);
        let frames: Vec<String> = relay_frames(upstream).collect().await;
        assert_eq!(
            frames,
            vec![
                "{\"content\":\"a\"}".to_string(),
                "{\"content\":\"b\"}".to_string(),
                DONE_FRAME.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn empty_stream_emits_only_done() {
        let frames: Vec<String> = relay_frames(fragments(Vec::new())).collect().await;
        assert_eq!(frames, vec![DONE_FRAME.to_string()]);
    }

    #[tokio::test]
    async fn mid_stream_failure_becomes_terminal_error_event() {
        let upstream = fragments(vec![
            Ok("a".to_string()),
            Err(LlmError::Network("connection reset".to_string())),
            Ok("never delivered".to_string()),
        ]);
        let frames: Vec<String> = relay_frames(upstream).collect().await;
        assert_eq!(frames.len(), 2, "error must close the stream without [DONE]");
        assert_eq!(frames[0], "{\"content\":\"a\"}");
        assert_eq!(
            frames[1],
            "{\"error\":\"network error: connection reset\"}"
        );
    }

    #[tokio::test]
    async fn non_ascii_content_is_preserved() {
        let upstream = fragments(vec![Ok("你好".to_string())]);
        let frames: Vec<String> = relay_frames(upstream).collect().await;
        assert_eq!(frames[0], "{\"content\":\"你好\"}");
    }
}
