//! Completion service boundary

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::{timeout_at, Instant};

/// A prompt plus its sampling parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
        }
    }
}

/// How a backend delivered its answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The whole answer at once
    Atomic(String),
    /// Fragments in arrival order, plus any final value the backend also returned
    Streamed {
        fragments: Vec<String>,
        echo: Option<String>,
    },
}

impl Delivery {
    /// Reduce to the final answer text
    ///
    /// When at least one fragment arrived the fragments are authoritative and
    /// the echo is ignored, so streamed output is never duplicated.
    pub fn into_text(self) -> String {
        match self {
            Delivery::Atomic(text) => text,
            Delivery::Streamed { fragments, echo } if fragments.is_empty() => {
                echo.unwrap_or_default()
            }
            Delivery::Streamed { fragments, .. } => fragments.concat(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("LLM call failed: {0}")]
    Transport(String),

    #[error("LLM call failed: {0}")]
    Other(String),
}

/// Backend HTTP failures, including the client's own connect and read
/// timeouts. Only [`generate`] reports `DeadlineExceeded`.
impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        CompletionError::Transport(err.to_string())
    }
}

/// A language model that turns prompts into answers
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Model name being used
    fn model_name(&self) -> &str;

    /// Produce an answer for `request`
    async fn complete(&self, request: &CompletionRequest) -> Result<Delivery, CompletionError>;
}

/// Run a completion that must finish before `deadline`
pub async fn generate(
    service: &dyn CompletionService,
    deadline: Instant,
    request: &CompletionRequest,
) -> Result<String, CompletionError> {
    match timeout_at(deadline, service.complete(request)).await {
        Ok(delivery) => delivery.map(Delivery::into_text),
        Err(_) => Err(CompletionError::DeadlineExceeded),
    }
}
