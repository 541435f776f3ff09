// Ollama LLM Provider Adapter
//
// Streams completions from a local Ollama endpoint. The response body is
// newline-delimited JSON; malformed lines are skipped, a `done` line ends
// the stream.

use crate::domain::llm::{FragmentStream, GenerationOverrides, LlmError, LlmProvider};
use crate::infrastructure::llm::ensure_success;
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

const MODEL_LIST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct OllamaAdapter {
    client: reqwest::Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Deserialize)]
struct OllamaChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

#[derive(Deserialize)]
struct OllamaTags {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

impl OllamaAdapter {
    pub fn new(base_url: String, model: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout,
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaAdapter {
    async fn generate_stream(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        overrides: &GenerationOverrides,
    ) -> Result<FragmentStream, LlmError> {
        let model = overrides.model.clone().unwrap_or_else(|| self.model.clone());
        let url = format!("{}/api/generate", self.base_url);

        let request = OllamaRequest {
            model,
            prompt: prompt.to_string(),
            stream: true,
            system: system_prompt.map(str::to_string),
        };

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        Ok(ndjson_fragments(response))
    }

    async fn list_models(&self) -> Vec<String> {
        let url = format!("{}/api/tags", self.base_url);

        let response = match self
            .client
            .get(&url)
            .timeout(MODEL_LIST_TIMEOUT)
            .send()
            .await
        {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                debug!(status = %r.status(), "model listing returned non-success status");
                return Vec::new();
            }
            Err(e) => {
                debug!(error = %e, "model listing unreachable");
                return Vec::new();
            }
        };

        match response.json::<OllamaTags>().await {
            Ok(tags) => tags.models.into_iter().map(|m| m.name).collect(),
            Err(e) => {
                debug!(error = %e, "model listing returned malformed body");
                Vec::new()
            }
        }
    }
}

/// Bridge the NDJSON response body into a fragment stream.
///
/// The reader task ends when the upstream signals `done`, the connection
/// closes, or the consumer drops the receiver; dropping the response on any
/// of those paths releases the connection.
fn ndjson_fragments(response: reqwest::Response) -> FragmentStream {
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
                match parse_line(&line) {
                    LineEvent::Fragment(text) => {
                        if tx.send(Ok(text)).await.is_err() {
                            return;
                        }
                    }
                    LineEvent::Done => return,
                    LineEvent::Skip => {}
                }
            }
        }

        // Connection closed without a done marker; flush any trailing line.
        if let LineEvent::Fragment(text) = parse_line(buffer.trim()) {
            let _ = tx.send(Ok(text)).await;
        }
    });

    Box::pin(ReceiverStream::new(rx))
}

enum LineEvent {
    Fragment(String),
    Done,
    Skip,
}

fn parse_line(line: &str) -> LineEvent {
    if line.is_empty() {
        return LineEvent::Skip;
    }
    let chunk: OllamaChunk = match serde_json::from_str(line) {
        Ok(c) => c,
        Err(_) => return LineEvent::Skip,
    };
    if chunk.done {
        return LineEvent::Done;
    }
    if chunk.response.is_empty() {
        LineEvent::Skip
    } else {
        LineEvent::Fragment(chunk.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn adapter(base_url: String) -> OllamaAdapter {
        OllamaAdapter::new(base_url, "qwen2.5".to_string(), Duration::from_secs(5))
    }

    async fn collect(mut stream: FragmentStream) -> Vec<Result<String, LlmError>> {
        let mut items = Vec::new();
        while let Some(item) = stream.next().await {
            items.push(item);
        }
        items
    }

    #[tokio::test]
    async fn streams_fragments_until_done() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body(concat!(
                "{\"response\":\"你好\",\"done\":false}\n",
                "not json at all\n",
                "{\"response\":\"\",\"done\":false}\n",
                "{\"response\":\"世界\",\"done\":false}\n",
                "{\"response\":\"\",\"done\":true}\n",
                "{\"response\":\"after done\",\"done\":false}\n",
            ))
            .create_async()
            .await;

        let stream = adapter(server.url())
            .generate_stream("prompt", Some("system"), &GenerationOverrides::default())
            .await
            .unwrap();
        let items = collect(stream).await;
        mock.assert_async().await;

        let fragments: Vec<String> = items.into_iter().map(|i| i.unwrap()).collect();
        assert_eq!(fragments, vec!["你好", "世界"]);
    }

    #[tokio::test]
    async fn non_success_status_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let result = adapter(server.url())
            .generate_stream("prompt", None, &GenerationOverrides::default())
            .await;
        match result {
            Err(LlmError::Upstream { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            Err(other) => panic!("expected upstream error, got {other:?}"),
            Ok(_) => panic!("expected upstream error, got Ok(stream)"),
        }
    }

    #[tokio::test]
    async fn model_override_reaches_the_wire() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/generate")
            .match_body(mockito::Matcher::PartialJsonString(
                "{\"model\":\"llama3.2\"}".to_string(),
            ))
            .with_status(200)
            .with_body("{\"response\":\"\",\"done\":true}\n")
            .create_async()
            .await;

        let overrides = GenerationOverrides {
            model: Some("llama3.2".to_string()),
            ..Default::default()
        };
        let stream = adapter(server.url())
            .generate_stream("prompt", None, &overrides)
            .await
            .unwrap();
        collect(stream).await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_models_returns_names() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_status(200)
            .with_body("{\"models\":[{\"name\":\"qwen2.5\"},{\"name\":\"llama3.2\"}]}")
            .create_async()
            .await;

        let models = adapter(server.url()).list_models().await;
        assert_eq!(models, vec!["qwen2.5", "llama3.2"]);
    }

    #[tokio::test]
    async fn list_models_degrades_to_empty_on_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_status(503)
            .create_async()
            .await;

        assert!(adapter(server.url()).list_models().await.is_empty());

        // Unreachable endpoint behaves the same.
        let dead = adapter("http://127.0.0.1:1".to_string());
        assert!(dead.list_models().await.is_empty());
    }
}
