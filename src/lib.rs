//! SearchChat-RS: a conversational assistant grounded in live web search
//!
//! Each question is searched on DuckDuckGo, the hits and recent conversation
//! are folded into a prompt, and a language model answers under a per-turn
//! deadline.

pub mod assistant;
pub mod config;
pub mod llm;
pub mod memory;
pub mod network;
pub mod search;

pub use assistant::{Assistant, TurnOutcome};
pub use config::{ModelConfig, Settings};
pub use llm::{CompletionError, CompletionService, OllamaClient};
pub use memory::{ConversationMemory, ConversationTurn, Role};
pub use search::{Retriever, SearchError, SearchHit, SearchOutcome, SearchTool};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
