//! OpenAI-compatible chat-completions client with SSE streaming.

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, trace};

use super::{ChatMessage, GenerationParams, ModelService, StreamHandle, StreamSender};
use crate::errors::ModelError;

const DONE_SENTINEL: &str = "[DONE]";

/// Request body for `POST {endpoint}/chat/completions`.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

/// One `data:` payload of the SSE response.
#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Decoded meaning of one SSE data line.
#[derive(Debug, PartialEq)]
enum SseData {
    Done,
    /// A chunk; `None` for keepalive/metadata chunks without text.
    Chunk(Option<String>),
}

fn decode_sse_data(raw: &str) -> Result<SseData, ModelError> {
    if raw.trim() == DONE_SENTINEL {
        return Ok(SseData::Done);
    }

    let json: Value = serde_json::from_str(raw)
        .map_err(|e| ModelError::Decode(format!("{}, data: {}", e, raw)))?;

    if let Some(err) = json.get("error") {
        let message = err
            .get("message")
            .and_then(|m| m.as_str())
            .or_else(|| err.as_str())
            .unwrap_or("An error occurred during streaming");
        return Err(ModelError::Stream(message.to_string()));
    }

    let chunk: CompletionChunk =
        serde_json::from_value(json).map_err(|e| ModelError::Decode(e.to_string()))?;
    let text = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty());
    Ok(SseData::Chunk(text))
}

/// Client for any server speaking the OpenAI chat-completions protocol.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        }
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn pump(response: reqwest::Response, sender: StreamSender) {
        let mut events = response.bytes_stream().eventsource();

        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    error!(error = %e, "SSE stream error");
                    sender.fault(ModelError::Stream(e.to_string()));
                    return;
                }
            };
            trace!(data = %event.data, "SSE event");

            match decode_sse_data(&event.data) {
                Ok(SseData::Done) => {
                    sender.complete();
                    return;
                }
                Ok(SseData::Chunk(Some(text))) => {
                    if !sender.fragment(text) {
                        debug!("stream consumer dropped; stopping");
                        return;
                    }
                }
                Ok(SseData::Chunk(None)) => continue,
                Err(e) => {
                    error!(error = %e, "bad SSE payload");
                    sender.fault(e);
                    return;
                }
            }
        }

        // Some servers close the body without a [DONE] sentinel.
        sender.complete();
    }
}

#[async_trait]
impl ModelService for OpenAiClient {
    async fn open_stream(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<StreamHandle, ModelError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            stream: true,
        };

        let mut request = self.http.post(self.completions_url()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        debug!(
            url = %self.completions_url(),
            messages = messages.len(),
            temperature = params.temperature,
            max_tokens = params.max_tokens,
            "opening model stream"
        );

        let response = request
            .send()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let (sender, handle) = StreamHandle::channel();
        tokio::spawn(Self::pump(response, sender));
        Ok(handle)
    }
}
