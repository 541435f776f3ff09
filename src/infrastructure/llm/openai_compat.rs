// OpenAI-Compatible LLM Provider Adapter
//
// Works against any chat-completions endpoint speaking the OpenAI wire
// format (OpenAI, LM Studio, vLLM, operator-supplied proxies). Credential,
// base URL and model are all per-request overridable because the service
// proxies arbitrary endpoints without restarting.

use crate::domain::llm::{FragmentStream, GenerationOverrides, LlmError, LlmProvider};
use crate::infrastructure::llm::ensure_success;
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

pub struct OpenAiCompatAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    #[serde(default)]
    delta: ChatDelta,
}

#[derive(Deserialize, Default)]
struct ChatDelta {
    content: Option<String>,
}

impl OpenAiCompatAdapter {
    pub fn new(api_key: String, base_url: String, model: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatAdapter {
    async fn generate_stream(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        overrides: &GenerationOverrides,
    ) -> Result<FragmentStream, LlmError> {
        let api_key = overrides.api_key.clone().unwrap_or_else(|| self.api_key.clone());
        let base_url = overrides
            .base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| self.base_url.clone());
        let model = overrides.model.clone().unwrap_or_else(|| self.model.clone());

        let url = format!("{base_url}/v1/chat/completions");

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt.to_string(),
        });

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .bearer_auth(&api_key)
            .json(&ChatRequest {
                model,
                messages,
                stream: true,
            })
            .send()
            .await?;
        let response = ensure_success(response).await?;

        Ok(sse_fragments(response))
    }
}

/// Bridge a `data: <json>` event body into a fragment stream.
///
/// The stream ends at the literal `data: [DONE]` sentinel or when the
/// connection closes; lines that are not data events or fail to parse are
/// skipped.
fn sse_fragments(response: reqwest::Response) -> FragmentStream {
    let (tx, rx) = mpsc::channel::<Result<String, LlmError>>(32);

    tokio::spawn(async move {
        let mut body = response.bytes_stream();
        let mut buffer = String::new();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    let _ = tx.send(Err(LlmError::from(e))).await;
                    return;
                }
            };
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(newline) = buffer.find('\n') {
                let line = buffer[..newline].trim().to_string();
                buffer.drain(..=newline);
                match parse_data_line(&line) {
                    Some(DataEvent::Fragment(text)) => {
                        if tx.send(Ok(text)).await.is_err() {
                            return;
                        }
                    }
                    Some(DataEvent::Done) => return,
                    None => {}
                }
            }
        }
    });

    Box::pin(ReceiverStream::new(rx))
}

enum DataEvent {
    Fragment(String),
    Done,
}

fn parse_data_line(line: &str) -> Option<DataEvent> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload == "[DONE]" {
        return Some(DataEvent::Done);
    }
    let chunk: ChatChunk = serde_json::from_str(payload).ok()?;
    let content = chunk.choices.into_iter().next()?.delta.content?;
    if content.is_empty() {
        None
    } else {
        Some(DataEvent::Fragment(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn adapter(base_url: String) -> OpenAiCompatAdapter {
        OpenAiCompatAdapter::new(
            "default-key".to_string(),
            base_url,
            "gpt-3.5-turbo".to_string(),
            Duration::from_secs(5),
        )
    }

    fn delta_line(content: &str) -> String {
        format!("data: {{\"choices\":[{{\"delta\":{{\"content\":\"{content}\"}}}}]}}\n")
    }

    async fn collect(mut stream: FragmentStream) -> Vec<Result<String, LlmError>> {
        let mut items = Vec::new();
        while let Some(item) = stream.next().await {
            items.push(item);
        }
        items
    }

    #[tokio::test]
    async fn streams_deltas_until_done_sentinel() {
        let mut server = mockito::Server::new_async().await;
        let body = [
            delta_line("Once"),
            "data: {\"choices\":[{\"delta\":{}}]}\n".to_string(),
            ": keep-alive comment\n".to_string(),
            delta_line(" upon"),
            "data: [DONE]\n".to_string(),
            delta_line(" never"),
        ]
        .concat();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let stream = adapter(server.url())
            .generate_stream("prompt", Some("system"), &GenerationOverrides::default())
            .await
            .unwrap();
        let items = collect(stream).await;
        mock.assert_async().await;

        let fragments: Vec<String> = items.into_iter().map(|i| i.unwrap()).collect();
        assert_eq!(fragments, vec!["Once", " upon"]);
    }

    #[tokio::test]
    async fn request_overrides_replace_defaults() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer override-key")
            .match_body(mockito::Matcher::PartialJsonString(
                "{\"model\":\"gpt-4o\"}".to_string(),
            ))
            .with_status(200)
            .with_body("data: [DONE]\n")
            .create_async()
            .await;

        // base_url override points the default adapter at the mock server.
        let overrides = GenerationOverrides {
            model: Some("gpt-4o".to_string()),
            api_key: Some("override-key".to_string()),
            base_url: Some(format!("{}/", server.url())),
        };
        let stream = adapter("http://unused.invalid".to_string())
            .generate_stream("prompt", None, &overrides)
            .await
            .unwrap();
        collect(stream).await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unauthorized_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .with_body("invalid key")
            .create_async()
            .await;

        let result = adapter(server.url())
            .generate_stream("prompt", None, &GenerationOverrides::default())
            .await;
        match result {
            Err(LlmError::Upstream { status, .. }) => assert_eq!(status, 401),
            Err(other) => panic!("expected upstream error, got {other:?}"),
            Ok(_) => panic!("expected upstream error, got Ok(stream)"),
        }
    }

    #[test]
    fn malformed_data_lines_are_skipped() {
        assert!(parse_data_line("data: {not json").is_none());
        assert!(parse_data_line("event: ping").is_none());
        assert!(parse_data_line("data: {\"choices\":[]}").is_none());
        assert!(matches!(parse_data_line("data: [DONE]"), Some(DataEvent::Done)));
    }
}
