//! Search-augmented assistant
//!
//! Runs the question/answer loop: search, prompt assembly, completion under a
//! per-turn deadline, memory update and reporting.

mod orchestrator;
mod prompt;

pub use orchestrator::{
    Assistant, TurnOutcome, TurnState, GENERATING_STATUS, INPUT_PROMPT, QUIT_COMMAND,
};
pub use prompt::{build_prompt, effective_query};
