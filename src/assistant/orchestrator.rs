//! The question/answer loop

use super::prompt::{build_prompt, effective_query};
use crate::config::ModelConfig;
use crate::llm::{generate, CompletionError, CompletionRequest, CompletionService};
use crate::memory::{ConversationMemory, ConversationTurn};
use crate::search::{SearchError, SearchTool};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

pub const INPUT_PROMPT: &str = "Enter your question (or 'quit' to exit): ";
pub const GENERATING_STATUS: &str = "\nGenerating response...";
pub const QUIT_COMMAND: &str = "quit";

/// Where the loop is within a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingInput,
    Searching,
    PromptBuilding,
    Generating,
    Reporting,
    Exiting,
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Answer(String),
    Captcha,
    SearchFailed(String),
    TimedOut(Duration),
    CompletionFailed(String),
}

impl TurnOutcome {
    /// Line shown to the user
    pub fn message(&self) -> String {
        match self {
            TurnOutcome::Answer(text) => text.clone(),
            TurnOutcome::Captcha => {
                "CAPTCHA detected. Please try again later or use a different IP.".to_string()
            }
            TurnOutcome::SearchFailed(err) => format!("Search failed: {}", err),
            TurnOutcome::TimedOut(timeout) => {
                format!("Operation timed out after {} seconds", timeout.as_secs_f64())
            }
            TurnOutcome::CompletionFailed(err) => format!("Error: {}", err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TurnOutcome::Answer(_))
    }
}

/// Search-augmented assistant
///
/// Owns the conversation memory and model configuration; turns run one at a
/// time and only successful turns are remembered.
pub struct Assistant {
    config: ModelConfig,
    memory: ConversationMemory,
    search: Arc<dyn SearchTool>,
    completion: Arc<dyn CompletionService>,
    state: TurnState,
}

impl Assistant {
    pub fn new(
        config: ModelConfig,
        search: Arc<dyn SearchTool>,
        completion: Arc<dyn CompletionService>,
    ) -> Self {
        Self {
            config,
            memory: ConversationMemory::new(),
            search,
            completion,
            state: TurnState::AwaitingInput,
        }
    }

    /// Replace the conversation memory
    pub fn with_memory(mut self, memory: ConversationMemory) -> Self {
        self.memory = memory;
        self
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    fn enter(&mut self, state: TurnState) {
        debug!("{:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Read questions from `input` until "quit" or end of input
    ///
    /// Lines are decoded lossily; bytes that are not UTF-8 become U+FFFD.
    pub async fn run<R, W>(&mut self, mut input: R, out: &mut W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut buf = Vec::new();

        loop {
            self.enter(TurnState::AwaitingInput);
            write!(out, "{}", INPUT_PROMPT)?;
            out.flush()?;

            buf.clear();
            if input.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let question = line.trim();

            if question.eq_ignore_ascii_case(QUIT_COMMAND) {
                break;
            }
            if question.is_empty() {
                continue;
            }

            let outcome = self.run_turn(question, out).await?;
            writeln!(out, "{}", outcome.message())?;
            out.flush()?;
        }

        self.enter(TurnState::Exiting);
        info!("Exiting after {} remembered turns", self.memory.len());
        Ok(())
    }

    /// Process one question
    ///
    /// A single deadline covers the search and the completion. Memory is
    /// updated only when an answer was produced.
    pub async fn run_turn<W: Write>(
        &mut self,
        question: &str,
        out: &mut W,
    ) -> io::Result<TurnOutcome> {
        self.enter(TurnState::Searching);
        let deadline = Instant::now() + self.config.timeout;
        let query = effective_query(&self.memory, question);

        let outcome = match timeout_at(deadline, self.search.invoke(&query)).await {
            Err(_) => Err(TurnOutcome::TimedOut(self.config.timeout)),
            Ok(Err(SearchError::CaptchaDetected)) => Err(TurnOutcome::Captcha),
            Ok(Err(e)) => Err(TurnOutcome::SearchFailed(e.to_string())),
            Ok(Ok(results)) => Ok(results),
        };

        let results = match outcome {
            Ok(results) => results,
            Err(outcome) => return Ok(self.report(outcome)),
        };
        debug!("{} returned {} hits", self.search.name(), results.len());

        self.enter(TurnState::PromptBuilding);
        let prompt = build_prompt(&self.memory.transcript(), question, &results.render());
        drop(results);

        writeln!(out, "{}", GENERATING_STATUS)?;
        out.flush()?;

        self.enter(TurnState::Generating);
        let request = CompletionRequest::new(prompt, self.config.temperature);
        let outcome = match generate(self.completion.as_ref(), deadline, &request).await {
            Ok(answer) => {
                self.memory.append(ConversationTurn::user(question));
                self.memory.append(ConversationTurn::assistant(answer.clone()));
                TurnOutcome::Answer(answer)
            }
            Err(CompletionError::DeadlineExceeded) => TurnOutcome::TimedOut(self.config.timeout),
            Err(e) => TurnOutcome::CompletionFailed(e.to_string()),
        };

        Ok(self.report(outcome))
    }

    fn report(&mut self, outcome: TurnOutcome) -> TurnOutcome {
        self.enter(TurnState::Reporting);
        if !outcome.is_success() {
            warn!("Turn failed: {}", outcome.message());
        }
        outcome
    }
}
