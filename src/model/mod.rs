//! Language-model service boundary.
//!
//! The tutor never talks to an inference engine directly. It hands an ordered
//! list of role-tagged [`ChatMessage`]s plus [`GenerationParams`] to a
//! [`ModelService`] and gets back a [`StreamHandle`]: a subscription that yields
//! text fragments until it reports completion or a fault. The consumer decides
//! when to stop pulling.
//!
//! [`OpenAiClient`] is the production implementation (any OpenAI-compatible
//! `/chat/completions` endpoint, e.g. a local llama.cpp or Ollama server).

mod openai;

pub use openai::OpenAiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::errors::ModelError;

/// Instruction given to the model for every summarization call.
pub const SUMMARY_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that summarizes chat history for future context.";

/// Role of a message sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message of a model request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Sampling parameters for a single call. Streaming is always on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationParams {
    /// Parameters for the main conversational call.
    pub fn chat() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1500,
        }
    }

    /// Parameters for summarization calls.
    pub fn summary() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 200,
        }
    }
}

/// What a [`StreamHandle`] yields on each pull.
#[derive(Debug)]
pub enum StreamItem {
    /// An incremental piece of generated text.
    Fragment(String),
    /// The model finished normally.
    Completed,
    /// The call failed; no further fragments follow.
    Fault(ModelError),
}

/// Producer half of a stream, held by the model service implementation.
#[derive(Debug, Clone)]
pub struct StreamSender {
    tx: mpsc::UnboundedSender<StreamItem>,
}

impl StreamSender {
    /// Forward a fragment. Returns false once the consumer has gone away.
    pub fn fragment(&self, text: impl Into<String>) -> bool {
        self.tx.send(StreamItem::Fragment(text.into())).is_ok()
    }

    pub fn complete(self) {
        let _ = self.tx.send(StreamItem::Completed);
    }

    pub fn fault(self, error: ModelError) {
        let _ = self.tx.send(StreamItem::Fault(error));
    }
}

/// Consumer half of a streamed model response.
#[derive(Debug)]
pub struct StreamHandle {
    rx: mpsc::UnboundedReceiver<StreamItem>,
    terminated: bool,
}

impl StreamHandle {
    /// Create a connected sender/handle pair.
    pub fn channel() -> (StreamSender, StreamHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            StreamSender { tx },
            StreamHandle {
                rx,
                terminated: false,
            },
        )
    }

    /// A handle that replays a fixed sequence of items.
    pub fn scripted(items: impl IntoIterator<Item = StreamItem>) -> Self {
        let (sender, handle) = Self::channel();
        for item in items {
            let _ = sender.tx.send(item);
        }
        handle
    }

    /// Pull the next item.
    ///
    /// A producer that disappears without sending `Completed` is reported as
    /// `Fault(ModelError::Interrupted)`. After a terminal item every further
    /// pull yields `Completed`.
    pub async fn next(&mut self) -> StreamItem {
        if self.terminated {
            return StreamItem::Completed;
        }
        let item = self
            .rx
            .recv()
            .await
            .unwrap_or(StreamItem::Fault(ModelError::Interrupted));
        if !matches!(item, StreamItem::Fragment(_)) {
            self.terminated = true;
        }
        item
    }

    /// Drain the stream into a single string, failing on the first fault.
    pub async fn collect_text(mut self) -> Result<String, ModelError> {
        let mut text = String::new();
        loop {
            match self.next().await {
                StreamItem::Fragment(fragment) => text.push_str(&fragment),
                StreamItem::Completed => return Ok(text),
                StreamItem::Fault(e) => return Err(e),
            }
        }
    }
}

/// A language-model inference service.
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Start a streamed completion for `messages`.
    async fn open_stream(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<StreamHandle, ModelError>;
}

/// Ask the model for a summary of `prompt`.
///
/// Never fails: any fault is logged and yields an empty string.
pub async fn collect_summary(
    model: &dyn ModelService,
    prompt: &str,
    params: &GenerationParams,
) -> String {
    let messages = [
        ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
        ChatMessage::user(prompt),
    ];

    let result = match model.open_stream(&messages, params).await {
        Ok(stream) => stream.collect_text().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(text) => {
            let summary = text.trim().to_string();
            debug!(chars = summary.len(), "summary generated");
            summary
        }
        Err(e) => {
            warn!(error = %e, "summarization call failed; using empty summary");
            String::new()
        }
    }
}
